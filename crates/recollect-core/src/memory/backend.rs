//! Vector index backend trait.
//!
//! Defines the interface for per-collection vector storage and
//! nearest-neighbour search. Implementations (LanceDB, in-process) live in
//! recollect-infra.

use recollect_types::collection::{
    BackendHit, CollectionSchema, DistanceMetric, IndexSpec, NewRow, SearchParams,
};
use recollect_types::error::BackendError;
use recollect_types::memory::RecordId;

/// Trait for a vector store holding one collection per owner.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// The handle is shared read-mostly across concurrent calls.
pub trait VectorBackend: Send + Sync {
    /// Whether a collection with this name exists.
    fn exists(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<bool, BackendError>> + Send;

    /// Define a collection and its similarity index.
    ///
    /// Returns [`BackendError::AlreadyExists`] if another caller created it
    /// first; the existing collection is left untouched.
    fn create(
        &self,
        name: &str,
        schema: &CollectionSchema,
        index: &IndexSpec,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    /// Persist a batch of rows, assigning one id per row in input order.
    ///
    /// Rows may stay invisible to searches until [`VectorBackend::flush`].
    fn insert(
        &self,
        name: &str,
        rows: Vec<NewRow>,
    ) -> impl std::future::Future<Output = Result<Vec<RecordId>, BackendError>> + Send;

    /// Commit buffered writes so subsequent searches observe them.
    fn flush(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;

    /// Nearest neighbours of `query`, ordered by ascending distance.
    ///
    /// Returns at most `top_k` hits; fewer if the collection is smaller.
    fn search(
        &self,
        name: &str,
        query: &[f32],
        metric: DistanceMetric,
        params: &SearchParams,
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<BackendHit>, BackendError>> + Send;

    /// Number of visible rows in a collection.
    fn count(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<u64, BackendError>> + Send;
}
