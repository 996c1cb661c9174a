//! Vector backends and embedders.
//!
//! Provides the LanceDB backend (embedded directory or LanceDB Cloud), an
//! in-process backend with an explicit flush barrier, fastembed-based local
//! embedding and an offline feature-hashing embedder. Arrow schemas define
//! the LanceDB table structures.

pub mod embedder;
pub mod hashing;
pub mod lance;
pub mod memory;
pub mod schema;

pub use embedder::{FastEmbedModel, FastEmbedder, build_embedder};
pub use hashing::HashingEmbedder;
pub use lance::{LanceConnectOptions, LanceVectorBackend};
pub use memory::InMemoryVectorBackend;
