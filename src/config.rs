//! Viewer configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILVIEW_CONFIG` (environment variable)
//! 2. `~/.config/mailview/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailview\config.toml` (Windows)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Load-controller behavior.
    pub load: LoadConfig,
    /// Extension-resolution overrides.
    pub extensions: ExtensionsConfig,
}

/// Load-controller behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Publish an intermediate snapshot (previous content, `is_loading`
    /// raised) when a load starts. Disable to publish only on completion.
    pub publish_loading: bool,
    /// Number of decoded messages kept by the bundled file loader's LRU
    /// cache.
    pub cache_size: usize,
}

/// Extension-resolution overrides layered over the portable default table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// `"media/subtype"` → extension (without the dot).
    pub overrides: BTreeMap<String, String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            publish_loading: true,
            cache_size: 50,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> ViewerConfig {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<ViewerConfig>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    ViewerConfig::default()
}

/// Save configuration to the standard location.
///
/// Returns the path written to.
pub fn save_config(config: &ViewerConfig) -> std::io::Result<PathBuf> {
    let path = config_file_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not determine config file path",
        )
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    // 1. Environment variable override
    if let Ok(env_path) = std::env::var("MAILVIEW_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    // 2. Standard config directory
    dirs::config_dir().map(|d| d.join("mailview").join("config.toml"))
}
