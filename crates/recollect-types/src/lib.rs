//! Shared domain types for Recollect.
//!
//! This crate contains the types used across the workspace: memory records
//! and hits, collection/index/row shapes exchanged with vector backends,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod collection;
pub mod config;
pub mod error;
pub mod memory;
