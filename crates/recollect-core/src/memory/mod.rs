//! Semantic memory: embed text, store it per owner, recall it by similarity.
//!
//! `MemoryStore` is the entry point. It is generic over an [`Embedder`]
//! (text to vector) and a [`VectorBackend`] (per-owner collections with
//! nearest-neighbour search); concrete implementations live in
//! recollect-infra.

pub mod backend;
pub mod box_embedder;
pub mod clock;
pub mod embedder;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod fakes;

pub use backend::VectorBackend;
pub use box_embedder::BoxEmbedder;
pub use embedder::Embedder;
pub use registry::{CollectionRegistry, collection_name};
pub use store::MemoryStore;
