//! Collection, index and row types exchanged with vector backends.
//!
//! These are the typed shapes validated once at the adapter boundary.
//! Adapters translate them to whatever the concrete backend speaks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::memory::{MAX_OWNER_ID_LEN, MAX_TEXT_LEN, RecordId};

pub const FIELD_ID: &str = "id";
pub const FIELD_TEXT: &str = "text";
pub const FIELD_EMBEDDING: &str = "embedding";
pub const FIELD_OWNER_ID: &str = "owner_id";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_MEMORY_TYPE: &str = "memory_type";

/// Maximum memory type tag length, in bytes.
pub const MAX_MEMORY_TYPE_LEN: usize = 100;

/// Distance function used by a collection's similarity index.
///
/// Smaller is always more similar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// `1 - cosine similarity`.
    Cosine,
    /// `1 - dot product`.
    Dot,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::L2 => write!(f, "l2"),
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Dot => write!(f, "dot"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(DistanceMetric::L2),
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" => Ok(DistanceMetric::Dot),
            other => Err(format!("invalid distance metric: '{other}'")),
        }
    }
}

/// Storage type of a collection field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Backend-generated unique key.
    RecordId,
    Text { max_len: usize },
    Int64,
    Vector { dimension: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Field layout of an owner's collection. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub dimension: usize,
    pub fields: Vec<FieldSpec>,
}

impl CollectionSchema {
    /// The memory collection layout for embeddings of `dimension`.
    pub fn memory(dimension: usize) -> Self {
        Self {
            dimension,
            fields: vec![
                FieldSpec {
                    name: FIELD_ID,
                    kind: FieldKind::RecordId,
                },
                FieldSpec {
                    name: FIELD_TEXT,
                    kind: FieldKind::Text {
                        max_len: MAX_TEXT_LEN,
                    },
                },
                FieldSpec {
                    name: FIELD_EMBEDDING,
                    kind: FieldKind::Vector { dimension },
                },
                FieldSpec {
                    name: FIELD_OWNER_ID,
                    kind: FieldKind::Text {
                        max_len: MAX_OWNER_ID_LEN,
                    },
                },
                FieldSpec {
                    name: FIELD_TIMESTAMP,
                    kind: FieldKind::Int64,
                },
                FieldSpec {
                    name: FIELD_MEMORY_TYPE,
                    kind: FieldKind::Text {
                        max_len: MAX_MEMORY_TYPE_LEN,
                    },
                },
            ],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Index family requested for the embedding field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexKind {
    /// Let the backend pick its default accuracy/speed trade-off.
    #[default]
    Auto,
}

/// Similarity index built over a collection's embedding field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: &'static str,
    pub metric: DistanceMetric,
    pub kind: IndexKind,
}

impl IndexSpec {
    pub fn on_embedding(metric: DistanceMetric) -> Self {
        Self {
            field: FIELD_EMBEDDING,
            metric,
            kind: IndexKind::Auto,
        }
    }
}

/// Query-time accuracy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Number of index partitions probed by approximate search.
    pub nprobes: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { nprobes: 10 }
    }
}

/// Verified collection for one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    pub name: String,
    /// Embedding width every row of the collection must have.
    pub dimension: usize,
}

/// A row handed to the backend for insertion. The backend assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRow {
    pub text: String,
    pub embedding: Vec<f32>,
    pub owner_id: String,
    pub timestamp: i64,
    pub memory_type: String,
}

/// Scalar fields returned alongside a search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFields {
    pub text: String,
    pub owner_id: String,
    pub timestamp: i64,
    pub memory_type: String,
}

/// One nearest-neighbour result, in backend rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHit {
    pub id: RecordId,
    pub distance: f32,
    pub fields: StoredFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_schema_has_six_fields() {
        let schema = CollectionSchema::memory(384);
        assert_eq!(schema.fields.len(), 6);
        assert_eq!(
            schema.field(FIELD_EMBEDDING).map(|f| &f.kind),
            Some(&FieldKind::Vector { dimension: 384 })
        );
        assert_eq!(
            schema.field(FIELD_ID).map(|f| &f.kind),
            Some(&FieldKind::RecordId)
        );
        assert!(schema.field("vector").is_none());
    }

    #[test]
    fn test_distance_metric_parse_and_display() {
        assert_eq!("L2".parse::<DistanceMetric>().unwrap(), DistanceMetric::L2);
        assert_eq!(
            "euclidean".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::L2
        );
        assert_eq!(DistanceMetric::Cosine.to_string(), "cosine");
        assert!("manhattan".parse::<DistanceMetric>().is_err());
        assert_eq!(DistanceMetric::default(), DistanceMetric::L2);
    }

    #[test]
    fn test_index_spec_targets_embedding() {
        let spec = IndexSpec::on_embedding(DistanceMetric::L2);
        assert_eq!(spec.field, FIELD_EMBEDDING);
        assert_eq!(spec.kind, IndexKind::Auto);
    }

    #[test]
    fn test_default_search_params() {
        assert_eq!(SearchParams::default().nprobes, 10);
    }
}
