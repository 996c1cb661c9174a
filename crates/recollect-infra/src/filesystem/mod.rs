//! Data directory layout.
//!
//! Everything Recollect writes locally lives under one directory:
//! `config.toml`, the LanceDB `vector_store/` and the cached embedding
//! `models/`.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "RECOLLECT_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `RECOLLECT_DATA_DIR` environment variable
/// 2. `~/.recollect`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".recollect");
    }

    // Last resort: current directory
    PathBuf::from(".recollect")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Default location of the embedded LanceDB database.
pub fn vector_store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("vector_store")
}

/// Default fastembed model cache.
pub fn models_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("models")
}
