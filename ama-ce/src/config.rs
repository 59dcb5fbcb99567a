//! Configuration resolution for ama-ce
//!
//! Values resolve with CLI > environment > TOML file > compiled default
//! priority. The classifier API key is the one required secret: it comes
//! from the environment or the TOML file and its absence is fatal at
//! startup, before anything is served.

use ama_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5731;
pub const DEFAULT_DATABASE: &str = "ama_log.db";
pub const DEFAULT_CONFIG_FILE: &str = "ama-ce.toml";

pub const DEFAULT_CLASSIFIER_BASE_URL: &str = "https://api.straico.com";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the classifier API key
pub const API_KEY_ENV: &str = "AMA_CLASSIFIER_API_KEY";

/// Raw TOML file contents (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub classifier: ClassifierToml,
}

/// `[classifier]` section of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database: PathBuf,
    pub classifier: ClassifierConfig,
}

/// Fully resolved classification service settings
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

/// Validate an API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Parse a TOML config file.
pub fn load_toml(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolve the full configuration from CLI values and the TOML file.
///
/// An explicitly passed config path must exist; the default config file is
/// used only when present in the working directory.
pub fn resolve(
    port: Option<u16>,
    database: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<Config> {
    let file = match config_path {
        Some(path) => load_toml(path)?,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default.exists() {
                load_toml(&default)?
            } else {
                TomlConfig::default()
            }
        }
    };

    let port = port.or(file.port).unwrap_or(DEFAULT_PORT);
    let database = database
        .or(file.database)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

    let classifier = resolve_classifier(file.classifier)?;

    Ok(Config {
        port,
        database,
        classifier,
    })
}

fn resolve_classifier(file: ClassifierToml) -> Result<ClassifierConfig> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = file.api_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        tracing::warn!(
            "Classifier API key found in both environment and TOML. Using environment (highest priority)."
        );
    }

    let api_key = env_key.or(toml_key).ok_or_else(|| {
        Error::Config(format!(
            "Classifier API key not configured. Please configure using one of:\n\
             1. Environment: {}=your-key-here\n\
             2. TOML config: [classifier] api_key = \"your-key\"",
            API_KEY_ENV
        ))
    })?;

    let batch_size = file.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
    if batch_size == 0 {
        return Err(Error::Config(
            "classifier.batch_size must be positive".to_string(),
        ));
    }

    Ok(ClassifierConfig {
        base_url: file
            .base_url
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_BASE_URL.to_string()),
        model: file
            .model
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
        api_key,
        batch_size,
        timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    })
}
