/// Application configuration
///
/// Settings are layered: built-in defaults, then an optional JSON file in
/// the user's config directory, then environment variables.
/// - Linux: ~/.config/pet-stylist/config.json
/// - macOS: ~/Library/Application Support/pet-stylist/config.json
/// - Windows: %APPDATA%\pet-stylist\config.json

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DOWNLOAD_NAME: &str = "pet-glamour-style.png";

/// Errors reading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolved runtime settings
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Credential for the image API (never logged)
    pub api_key: Option<String>,
    /// Model name used in the endpoint path
    pub model: String,
    /// Base URL of the API, without the model path
    pub api_base: String,
    /// Filename suggested when saving a result
    pub download_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            download_name: DEFAULT_DOWNLOAD_NAME.to_string(),
        }
    }
}

/// Shape of config.json; every field is optional
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub download_name: Option<String>,
}

impl Config {
    /// Load the configuration from the config file and process environment.
    ///
    /// A broken config file is logged and ignored; loading never fails.
    pub fn load() -> Self {
        let file = match config_path() {
            Some(path) => match read_file(&path) {
                Ok(file) => file,
                Err(err) => {
                    tracing::warn!(error = %err, "Ignoring config file");
                    None
                }
            },
            None => None,
        };

        let config = Self::from_sources(file, |key| std::env::var(key).ok());

        if config.api_key.is_none() {
            tracing::warn!("No API key configured; set GEMINI_API_KEY before generating");
        }
        tracing::info!(model = %config.model, api_base = %config.api_base, "Configuration loaded");

        config
    }

    /// Merge defaults, file values, and environment lookups (in that order)
    pub fn from_sources<F>(file: Option<FileConfig>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(file) = file {
            if let Some(key) = non_empty(file.api_key) {
                config.api_key = Some(key);
            }
            if let Some(model) = non_empty(file.model) {
                config.model = model;
            }
            if let Some(base) = non_empty(file.api_base) {
                config.api_base = base;
            }
            if let Some(name) = non_empty(file.download_name) {
                config.download_name = name;
            }
        }

        // GEMINI_API_KEY takes precedence over the generic API_KEY
        if let Some(key) = non_empty(env("GEMINI_API_KEY")).or_else(|| non_empty(env("API_KEY"))) {
            config.api_key = Some(key);
        }
        if let Some(model) = non_empty(env("PET_STYLIST_MODEL")) {
            config.model = model;
        }
        if let Some(base) = non_empty(env("PET_STYLIST_API_BASE")) {
            config.api_base = base;
        }

        config
    }
}

// Never print the key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("has_api_key", &self.api_key.is_some())
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("download_name", &self.download_name)
            .finish()
    }
}

/// Get the path where the config file is expected
pub fn config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("pet-stylist");
    path.push("config.json");
    Some(path)
}

/// Read and parse a config file. A missing file is not an error.
pub fn read_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
