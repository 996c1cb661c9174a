//! Memory types for Recollect.
//!
//! A memory is a short text fragment scoped to an owner. Records are
//! append-only: created by insert, never updated or deleted by the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MemoryError;

/// Category tag applied when the caller does not supply one.
pub const DEFAULT_MEMORY_TYPE: &str = "thought";

/// Maximum owner identifier length, in characters.
pub const MAX_OWNER_ID_LEN: usize = 100;

/// Maximum text length, in bytes, accepted by backends that cap it.
pub const MAX_TEXT_LEN: usize = 10_000;

/// Backend-assigned record identifier.
///
/// UUIDv7, so identifiers sort in insertion order within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Allocate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant identity a collection is scoped to.
///
/// Never empty. Construction is the only validation point, so any
/// `OwnerId` in hand is known-good.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Result<Self, MemoryError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(MemoryError::Validation(
                "owner_id must not be empty".to_string(),
            ));
        }
        let len = value.chars().count();
        if len > MAX_OWNER_ID_LEN {
            return Err(MemoryError::Validation(format!(
                "owner_id is {len} characters, maximum is {MAX_OWNER_ID_LEN}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = MemoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted memory as held by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub owner_id: OwnerId,
    /// Seconds since the Unix epoch, shared by every record of one insert call.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub memory_type: String,
}

/// Read-shaped projection of a [`MemoryRecord`] plus its distance to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    pub record_id: RecordId,
    /// Smaller is more similar.
    pub distance: f32,
    pub text: String,
    pub owner_id: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub memory_type: String,
}

impl MemoryHit {
    /// The insert time as a UTC datetime, if the stored timestamp is in range.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
