//! `rcl config`: show the configuration a command would run with.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use serde::Serialize;

use recollect_infra::config::{resolve_api_key, resolve_backend_uri};
use recollect_infra::filesystem::config_path;
use recollect_types::config::{EmbeddingConfig, StoreConfig};

use crate::state::AppState;

/// Resolved settings. The API key itself is never part of this view.
#[derive(Debug, Serialize)]
struct ConfigView {
    data_dir: PathBuf,
    config_file: PathBuf,
    config_file_exists: bool,
    backend_uri: String,
    remote: bool,
    api_key_env: String,
    api_key_set: bool,
    region: Option<String>,
    store: StoreConfig,
    embedding: EmbeddingConfig,
}

impl ConfigView {
    fn resolve(state: &AppState) -> Self {
        let config_file = config_path(&state.data_dir);
        let backend = &state.config.backend;
        let backend_uri = resolve_backend_uri(backend, &state.data_dir);
        Self {
            data_dir: state.data_dir.clone(),
            config_file_exists: config_file.is_file(),
            config_file,
            remote: backend_uri.starts_with("db://"),
            backend_uri,
            api_key_env: backend.api_key_env.clone(),
            api_key_set: resolve_api_key(backend).is_some(),
            region: backend.region.clone(),
            store: state.config.store.clone(),
            embedding: state.config.embedding.clone(),
        }
    }
}

pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    let view = ConfigView::resolve(state);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let row = |label: &str, value: String| {
        println!("  {:<16} {}", style(label).dim(), value);
    };

    println!();
    println!("  {}", style("Recollect configuration").bold());
    println!();
    row("Data dir", view.data_dir.display().to_string());
    row(
        "Config file",
        if view.config_file_exists {
            view.config_file.display().to_string()
        } else {
            format!("{} {}", view.config_file.display(), style("(defaults)").dim())
        },
    );
    println!();
    row("Backend", style(&view.backend_uri).cyan().to_string());
    if view.remote {
        row(
            "API key",
            if view.api_key_set {
                format!("{} from ${}", style("set").green(), view.api_key_env)
            } else {
                format!("{} (${})", style("missing").red(), view.api_key_env)
            },
        );
        row("Region", view.region.clone().unwrap_or_else(|| "-".to_string()));
    }
    println!();
    row("Dimension", view.store.dimension.to_string());
    row("Metric", view.store.metric.to_string());
    row("Default top-k", view.store.default_top_k.to_string());
    row("nprobes", view.store.nprobes.to_string());
    println!();
    row("Embedder", format!("{:?}", view.embedding.provider).to_lowercase());
    row("Model", view.embedding.model.clone());
    if let Some(dir) = &view.embedding.cache_dir {
        row("Model cache", dir.display().to_string());
    }
    println!();

    Ok(())
}
