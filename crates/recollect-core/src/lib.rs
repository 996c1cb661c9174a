//! Memory store logic and port traits for Recollect.
//!
//! This crate defines the "ports" (embedder and vector backend traits) that
//! the infrastructure layer implements, plus the collection registry and the
//! `MemoryStore` built on them. It depends only on `recollect-types` -- never
//! on `recollect-infra` or any database/model crate.

pub mod memory;
