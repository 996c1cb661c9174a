//! Application state shared by CLI commands.
//!
//! AppState holds the resolved data directory and configuration. The memory
//! store is pinned to the concrete infra implementations and only opened by
//! commands that need it, so `rcl config` never loads an embedding model.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use recollect_core::memory::{BoxEmbedder, MemoryStore};
use recollect_infra::config::{load_config, resolve_api_key, resolve_backend_uri};
use recollect_infra::filesystem::resolve_data_dir;
use recollect_infra::vector::{LanceConnectOptions, LanceVectorBackend, build_embedder};
use recollect_types::config::{EmbeddingProviderKind, RecollectConfig};

/// The store type used by the CLI.
pub type ConcreteMemoryStore = MemoryStore<BoxEmbedder, LanceVectorBackend>;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: RecollectConfig,
}

impl AppState {
    /// Resolve the data directory and load `config.toml` from it.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        Ok(Self { data_dir, config })
    }

    /// Connect the backend, load the embedder and build the store.
    ///
    /// `show_progress` draws a spinner on stderr while a model loads.
    pub async fn open_store(&self, show_progress: bool) -> anyhow::Result<ConcreteMemoryStore> {
        let backend_config = &self.config.backend;
        let uri = resolve_backend_uri(backend_config, &self.data_dir);
        tracing::debug!(uri = %uri, "Opening memory store");
        let options = LanceConnectOptions {
            uri,
            api_key: resolve_api_key(backend_config),
            region: backend_config.region.clone(),
        };
        let backend = LanceVectorBackend::connect(options)
            .await
            .context("Failed to connect to the vector backend")?;

        let spinner = (show_progress
            && self.config.embedding.provider == EmbeddingProviderKind::FastEmbed)
            .then(|| loading_spinner(&self.config.embedding.model));

        let embedding = self.config.embedding.clone();
        let dimension = self.config.store.dimension;
        let data_dir = self.data_dir.clone();
        let embedder =
            tokio::task::spawn_blocking(move || build_embedder(&embedding, dimension, &data_dir))
                .await
                .context("Embedding model loader panicked")?;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let embedder = embedder.context("Failed to load the embedding model")?;
        let store = MemoryStore::new(self.config.store.clone(), embedder, backend)?;
        Ok(store)
    }
}

fn loading_spinner(model: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Loading {model}..."));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
