//! Configuration types for Recollect.
//!
//! `RecollectConfig` represents the top-level `config.toml`. Every field has a
//! default, so an empty file (or no file) yields a working local setup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::collection::{DistanceMetric, SearchParams};

/// Top-level configuration.
///
/// Loaded from `~/.recollect/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecollectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Settings fixed for a store's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Embedding dimension `D` shared by every collection.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default)]
    pub metric: DistanceMetric,

    /// Result count used when a search does not specify one.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_nprobes")]
    pub nprobes: usize,
}

fn default_dimension() -> usize {
    384
}

fn default_top_k() -> usize {
    3
}

fn default_nprobes() -> usize {
    SearchParams::default().nprobes
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            metric: DistanceMetric::default(),
            default_top_k: default_top_k(),
            nprobes: default_nprobes(),
        }
    }
}

impl StoreConfig {
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            nprobes: self.nprobes,
        }
    }
}

/// Vector backend connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Local directory or `db://` URI. Defaults to `{data_dir}/vector_store`.
    #[serde(default)]
    pub uri: Option<String>,

    /// Name of the environment variable holding the remote API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Cloud region for remote URIs.
    #[serde(default)]
    pub region: Option<String>,
}

fn default_api_key_env() -> String {
    "RECOLLECT_API_KEY".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            uri: None,
            api_key_env: default_api_key_env(),
            region: None,
        }
    }
}

/// Which embedding implementation to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local ONNX model via fastembed.
    #[default]
    FastEmbed,
    /// Deterministic feature hashing; offline.
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    #[serde(default = "default_model")]
    pub model: String,

    /// Where downloaded model files are cached. Defaults to `{data_dir}/models`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_model(),
            cache_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = RecollectConfig::default();
        assert_eq!(config.store.dimension, 384);
        assert_eq!(config.store.metric, DistanceMetric::L2);
        assert_eq!(config.store.default_top_k, 3);
        assert_eq!(config.store.search_params().nprobes, 10);
        assert_eq!(config.backend.api_key_env, "RECOLLECT_API_KEY");
        assert!(config.backend.uri.is_none());
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::FastEmbed);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: RecollectConfig = toml::from_str("").unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.backend, BackendConfig::default());
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[store]
dimension = 8
metric = "cosine"
default_top_k = 5

[backend]
uri = "db://memories"
region = "us-east-1"

[embedding]
provider = "hashing"
"#;
        let config: RecollectConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.dimension, 8);
        assert_eq!(config.store.metric, DistanceMetric::Cosine);
        assert_eq!(config.store.default_top_k, 5);
        assert_eq!(config.store.nprobes, 10);
        assert_eq!(config.backend.uri.as_deref(), Some("db://memories"));
        assert_eq!(config.backend.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hashing);
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn test_config_rejects_unknown_metric() {
        let result: Result<RecollectConfig, _> = toml::from_str("[store]\nmetric = \"hamming\"\n");
        assert!(result.is_err());
    }
}
