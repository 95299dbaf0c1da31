//! Loads the optional YAML config file and injects the API key from the
//! environment.
//!
//! The file never holds secrets. Every section and key is optional; missing
//! values fall back to the library defaults. Example:
//!
//! ```yaml
//! inference:
//!   text_model_url: https://api-inference.huggingface.co/models/gpt2
//!   timeout_secs: 60
//! generation:
//!   hashtag_count: 5
//!   retry_style: professional
//! export:
//!   output_dir: ./out
//! ```
//!
//! Errors are `anyhow` errors carrying the offending path.

use anyhow::{Context, Result};
use postgen_core::config::{GenerationConfig, InferenceConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Environment variable holding the inference API key.
pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub inference: InferenceConfig,
    pub generation: GenerationConfig,
    pub export: ExportSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub output_dir: PathBuf,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

fn inject_secrets(config: &mut CliConfig) {
    match std::env::var(API_KEY_ENV) {
        Ok(key) => {
            config.inference.api_key = Some(key);
            if !config.inference.is_configured() {
                warn!(env = API_KEY_ENV, "API key is empty or still the placeholder value");
            }
        }
        Err(_) => warn!(env = API_KEY_ENV, "API key not set, remote generation disabled"),
    }
}

/// Reads a YAML config file and injects secrets from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            e
        })
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let mut config: CliConfig = if content.trim().is_empty() {
        CliConfig::default()
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                e
            })
            .with_context(|| format!("Failed to parse config YAML {}", path_ref.display()))?
    };
    info!(config_path = ?path_ref, "Parsed config YAML successfully");

    inject_secrets(&mut config);
    Ok(config)
}

/// Uses the file at `path` when given, built-in defaults otherwise.
pub fn load_or_default(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            let mut config = CliConfig::default();
            inject_secrets(&mut config);
            Ok(config)
        }
    }
}
