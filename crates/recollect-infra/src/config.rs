//! Configuration loader for Recollect.
//!
//! Reads `config.toml` from the data directory (`~/.recollect/` in production)
//! and deserializes it into [`RecollectConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use secrecy::SecretString;

use recollect_types::config::{BackendConfig, RecollectConfig};

use crate::filesystem::{config_path, vector_store_dir};

/// Environment variable overriding `[backend] uri`.
pub const BACKEND_URI_ENV: &str = "RECOLLECT_BACKEND_URI";

/// Load configuration from `{data_dir}/config.toml`, then apply env overrides.
///
/// - If the file does not exist, starts from [`RecollectConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and uses the default.
/// - If the file exists and parses successfully, uses the parsed config.
pub async fn load_config(data_dir: &Path) -> RecollectConfig {
    let mut config = read_config_file(data_dir).await;
    apply_overrides(&mut config, std::env::var(BACKEND_URI_ENV).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> RecollectConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return RecollectConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return RecollectConfig::default();
        }
    };

    match toml::from_str::<RecollectConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            RecollectConfig::default()
        }
    }
}

fn apply_overrides(config: &mut RecollectConfig, backend_uri: Option<String>) {
    if let Some(uri) = backend_uri.filter(|u| !u.trim().is_empty()) {
        tracing::debug!(uri = %uri, "Backend URI overridden from {BACKEND_URI_ENV}");
        config.backend.uri = Some(uri);
    }
}

/// The backend URI to connect to: the configured one, else the local store.
pub fn resolve_backend_uri(backend: &BackendConfig, data_dir: &Path) -> String {
    match &backend.uri {
        Some(uri) => uri.clone(),
        None => vector_store_dir(data_dir).display().to_string(),
    }
}

/// Read the remote API key from the env var named in `[backend] api_key_env`.
///
/// Unset, empty or non-Unicode values all mean "no key".
pub fn resolve_api_key(backend: &BackendConfig) -> Option<SecretString> {
    match std::env::var(&backend.api_key_env) {
        Ok(value) if !value.trim().is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}
