//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `recollect-core` using fastembed's
//! ONNX runtime inference. Two 384-dimensional sentence models are
//! supported; model files are downloaded once into the cache directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use recollect_core::memory::box_embedder::BoxEmbedder;
use recollect_core::memory::embedder::Embedder;
use recollect_types::config::{EmbeddingConfig, EmbeddingProviderKind};
use recollect_types::error::EmbeddingError;

use super::hashing::HashingEmbedder;
use crate::filesystem::models_dir;

/// Sentence embedding models available through fastembed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastEmbedModel {
    /// sentence-transformers/all-MiniLM-L6-v2
    AllMiniLmL6V2,
    /// BAAI/bge-small-en-v1.5
    BgeSmallEnV15,
}

impl FastEmbedModel {
    /// Parse a configured model name. Accepts short and hub-qualified names.
    pub fn from_name(name: &str) -> Result<Self, EmbeddingError> {
        match name.trim().to_lowercase().as_str() {
            "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
                Ok(Self::AllMiniLmL6V2)
            }
            "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => Ok(Self::BgeSmallEnV15),
            _ => Err(EmbeddingError::Provider(format!(
                "unsupported embedding model '{name}' (expected all-MiniLM-L6-v2 or bge-small-en-v1.5)"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
        }
    }

    pub fn dimension(self) -> usize {
        384
    }

    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            Self::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            Self::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        }
    }
}

/// Local ONNX embedder.
///
/// fastembed needs exclusive access to run inference, so the model sits
/// behind a mutex and every batch runs on the blocking pool.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    kind: FastEmbedModel,
}

impl FastEmbedder {
    /// Load (downloading on first use) `kind` into `cache_dir`.
    ///
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn new(kind: FastEmbedModel, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let options = InitOptions::new(kind.fastembed_model())
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);

        let model = TextEmbedding::try_new(options).map_err(|e| {
            EmbeddingError::Provider(format!("Failed to load {}: {e}", kind.name()))
        })?;

        tracing::info!(model = kind.name(), "Loaded embedding model");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            kind,
        })
    }
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbeddingError::Provider("embedding model lock poisoned".to_string()))?;
            model
                .embed(batch, None)
                .map_err(|e| EmbeddingError::Provider(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::Provider(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        self.kind.name()
    }

    fn dimension(&self) -> usize {
        self.kind.dimension()
    }
}

/// Build the embedder selected in `[embedding]`.
///
/// `dimension` is the store dimension; the hashing embedder adopts it, a
/// fastembed model must already match it. Blocking when a model is loaded.
pub fn build_embedder(
    config: &EmbeddingConfig,
    dimension: usize,
    data_dir: &Path,
) -> Result<BoxEmbedder, EmbeddingError> {
    match config.provider {
        EmbeddingProviderKind::Hashing => Ok(BoxEmbedder::new(HashingEmbedder::new(dimension)?)),
        EmbeddingProviderKind::FastEmbed => {
            let kind = FastEmbedModel::from_name(&config.model)?;
            if kind.dimension() != dimension {
                return Err(EmbeddingError::Provider(format!(
                    "{} produces {}-dimensional vectors, store expects {dimension}",
                    kind.name(),
                    kind.dimension()
                )));
            }
            let cache_dir = config
                .cache_dir
                .clone()
                .unwrap_or_else(|| models_dir(data_dir));
            Ok(BoxEmbedder::new(FastEmbedder::new(kind, cache_dir)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_parse() {
        assert_eq!(
            FastEmbedModel::from_name("all-MiniLM-L6-v2").unwrap(),
            FastEmbedModel::AllMiniLmL6V2
        );
        assert_eq!(
            FastEmbedModel::from_name("sentence-transformers/all-MiniLM-L6-v2").unwrap(),
            FastEmbedModel::AllMiniLmL6V2
        );
        assert_eq!(
            FastEmbedModel::from_name("BAAI/bge-small-en-v1.5").unwrap(),
            FastEmbedModel::BgeSmallEnV15
        );
        assert!(FastEmbedModel::from_name("text-embedding-3-small").is_err());
    }

    #[test]
    fn test_build_hashing_embedder_adopts_store_dimension() {
        let config = EmbeddingConfig {
            provider: EmbeddingProviderKind::Hashing,
            ..EmbeddingConfig::default()
        };
        let embedder = build_embedder(&config, 128, Path::new("/unused")).unwrap();
        assert_eq!(embedder.dimension(), 128);
        assert_eq!(embedder.model_name(), HashingEmbedder::MODEL_NAME);
    }

    #[test]
    fn test_build_fastembed_rejects_dimension_mismatch_before_loading() {
        let config = EmbeddingConfig::default();
        let err = build_embedder(&config, 768, Path::new("/unused")).err();
        assert!(matches!(err, Some(EmbeddingError::Provider(ref m)) if m.contains("768")));
    }

    #[tokio::test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    async fn test_fastembed_produces_384_dimensional_vectors() {
        let cache = tempfile::tempdir().unwrap();
        let embedder =
            FastEmbedder::new(FastEmbedModel::AllMiniLmL6V2, cache.path().to_path_buf()).unwrap();
        let vectors = embedder
            .embed(&["I want to save more money".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 384);
    }
}
