//! Feature-hashing embedder.
//!
//! Maps each lowercase alphanumeric token to a bucket with 64-bit FNV-1a,
//! counts tokens per bucket, then L2-normalises. No model files, no
//! network, fully deterministic; texts sharing words land close together.
//! Meant for tests and air-gapped installs, not for semantic quality.

use recollect_core::memory::embedder::Embedder;
use recollect_types::error::EmbeddingError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const MODEL_NAME: &'static str = "feature-hashing-fnv1a";

    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::Provider(
                "hashing embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    /// Embed one text. Text without any alphanumeric token maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(token.to_lowercase().as_bytes()) % self.dimension as u64;
            vector[bucket as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
