use thiserror::Error;

/// Errors surfaced by the memory store to its callers.
///
/// None of these are recovered internally. Callers decide retry/backoff.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Caller input was rejected before any backend or embedder call.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("vector backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Provider failure or a malformed embedding response.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// The backend refused to define a collection for an owner.
    #[error("collection setup failed: {0}")]
    Collection(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("search failed: {0}")]
    Search(String),
}

impl MemoryError {
    /// Lift a backend error raised while inserting or flushing.
    pub fn from_insert(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => MemoryError::BackendUnavailable(msg),
            other => MemoryError::Insert(other.to_string()),
        }
    }

    /// Lift a backend error raised while searching or counting.
    pub fn from_search(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => MemoryError::BackendUnavailable(msg),
            other => MemoryError::Search(other.to_string()),
        }
    }

    /// Lift a backend error raised while checking or creating a collection.
    pub fn from_collection(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => MemoryError::BackendUnavailable(msg),
            other => MemoryError::Collection(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for MemoryError {
    fn from(err: EmbeddingError) -> Self {
        MemoryError::Embedding(err.to_string())
    }
}

/// Errors reported by a vector index backend adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection or transport failure.
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    #[error("collection '{0}' already exists")]
    AlreadyExists(String),

    #[error("collection '{0}' not found")]
    NotFound(String),

    /// The backend understood the request and refused it.
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// A response did not match the expected shape.
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Errors reported by an embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}
