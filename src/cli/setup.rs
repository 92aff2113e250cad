use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable whose value, when set, is written as `api_key`.
pub const API_KEY_ENV: &str = "FXQ_API_KEY";

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");
const EMPTY_API_KEY_LINE: &str = "api_key: \"\"";

/// Writes the example configuration to the default location, filling in the
/// App ID from `FXQ_API_KEY` when it is set.
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    let api_key = std::env::var(API_KEY_ENV).ok();
    setup_at_path(path, api_key.as_deref())
}

/// Writes the example configuration to `path`. Refuses to overwrite an
/// existing file.
pub fn setup_at_path<P: AsRef<Path>>(path: P, api_key: Option<&str>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, render_config(api_key)?)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        api_key_set = api_key.is_some_and(|k| !k.trim().is_empty()),
        "Created configuration"
    );
    Ok(())
}

fn render_config(api_key: Option<&str>) -> Result<String> {
    match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            // A JSON string is a valid double-quoted YAML scalar
            let quoted = serde_json::to_string(key)?;
            Ok(EXAMPLE_CONFIG.replacen(EMPTY_API_KEY_LINE, &format!("api_key: {quoted}"), 1))
        }
        None => Ok(EXAMPLE_CONFIG.to_string()),
    }
}
