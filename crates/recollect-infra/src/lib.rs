//! Infrastructure layer for Recollect.
//!
//! Contains implementations of the port traits defined in `recollect-core`:
//! the LanceDB and in-process vector backends, the fastembed and
//! feature-hashing embedders, plus config loading and data directory layout.

pub mod config;
pub mod filesystem;
pub mod vector;
