//! Embedder trait for text-to-vector conversion.
//!
//! Defines the interface for embedding text into fixed-dimension vectors.
//! Implementations (fastembed ONNX models, feature hashing) live in
//! recollect-infra.

use recollect_types::error::EmbeddingError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// Returns one vector per input text, in input order. Identical input
    /// must produce identical output within a call.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// The model name used for embeddings (e.g., "all-MiniLM-L6-v2").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}

/// Check an embedder response against the request before anything is stored.
///
/// The count must match the input and every vector must have `dimension`
/// entries. Nothing is truncated or padded.
pub fn validate_embeddings(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            expected: expected_count,
            actual: vectors.len(),
        });
    }
    if let Some((index, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            index,
            expected: dimension,
            actual: v.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_matching_batch() {
        let vectors = vec![vec![0.0; 4], vec![1.0; 4]];
        assert!(validate_embeddings(&vectors, 2, 4).is_ok());
    }

    #[test]
    fn test_validate_rejects_short_batch() {
        let vectors = vec![vec![0.0; 4]];
        let err = validate_embeddings(&vectors, 2, 4).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_validate_reports_first_bad_dimension() {
        let vectors = vec![vec![0.0; 4], vec![0.0; 3], vec![0.0; 5]];
        let err = validate_embeddings(&vectors, 3, 4).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                index: 1,
                expected: 4,
                actual: 3
            }
        ));
    }
}
