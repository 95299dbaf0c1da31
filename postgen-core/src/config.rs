use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Value shipped in sample `.env` files; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

pub const DEFAULT_TEXT_MODEL_URL: &str = "https://api-inference.huggingface.co/models/gpt2";
pub const DEFAULT_IMAGE_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1";

/// Connection settings for the inference provider.
///
/// The API key is never read from or written to config files; it is injected
/// from the environment by the caller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub text_model_url: String,
    pub image_model_url: String,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model_url: DEFAULT_TEXT_MODEL_URL.to_string(),
            image_model_url: DEFAULT_IMAGE_MODEL_URL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key_set", &self.is_configured())
            .field("text_model_url", &self.text_model_url)
            .field("image_model_url", &self.image_model_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl InferenceConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The bearer credential, if one is present and not the placeholder.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn is_configured(&self) -> bool {
        self.credential().is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            text_model_url = %self.text_model_url,
            image_model_url = %self.image_model_url,
            api_key_set = self.is_configured(),
            timeout_secs = self.timeout_secs,
            "Loaded inference config"
        );
    }
}

/// Knobs for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub hashtag_count: usize,
    /// How long the success notice stays visible after a run.
    pub notice_ttl_secs: u64,
    /// Image style used when a failed run is retried.
    pub retry_style: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            hashtag_count: 5,
            notice_ttl_secs: 3,
            retry_style: "professional".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            hashtag_count = self.hashtag_count,
            notice_ttl_secs = self.notice_ttl_secs,
            retry_style = %self.retry_style,
            "Loaded generation config"
        );
        debug!(?self, "Generation config loaded (full debug)");
    }
}
