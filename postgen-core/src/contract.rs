//! Shared request/outcome types and the generator traits the orchestrator
//! depends on. Real adapters live in [`crate::text_gen`] and
//! [`crate::image_gen`]; tests substitute the generated mocks.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::platform::Platform;

pub const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("topic is {len} characters long, the maximum is {max}")]
    TopicTooLong { len: usize, max: usize },
}

/// A submitted generation request. Fields are validated on construction and
/// cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    topic: String,
    platform: Platform,
    image_style: String,
}

impl GenerationRequest {
    pub fn new(
        topic: impl AsRef<str>,
        platform: Platform,
        image_style: impl Into<String>,
    ) -> Result<Self, InvalidRequest> {
        let topic = topic.as_ref().trim();
        if topic.is_empty() {
            return Err(InvalidRequest::EmptyTopic);
        }
        let len = topic.chars().count();
        if len > MAX_TOPIC_CHARS {
            return Err(InvalidRequest::TopicTooLong {
                len,
                max: MAX_TOPIC_CHARS,
            });
        }
        Ok(Self {
            topic: topic.to_string(),
            platform,
            image_style: image_style.into(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn image_style(&self) -> &str {
        &self.image_style
    }

    /// Prompt sent to the image model.
    pub fn image_prompt(&self) -> String {
        format!(
            "{} style, {}, high quality, detailed",
            self.image_style, self.topic
        )
    }

    /// Same topic and platform with another image style.
    pub fn with_style(&self, image_style: impl Into<String>) -> Self {
        Self {
            topic: self.topic.clone(),
            platform: self.platform,
            image_style: image_style.into(),
        }
    }
}

/// A generated image: raw bytes plus their MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Self-contained `data:` URL, usable as an image reference in exports.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Parses a base64 `data:` URL. Returns `None` for anything else.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime_type = meta.strip_suffix(";base64")?;
        let bytes = BASE64.decode(payload.trim()).ok()?;
        Some(Self::new(mime_type, bytes))
    }
}

/// Why the image channel failed. Always surfaced to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Hugging Face API key not configured. Set HUGGINGFACE_API_KEY in the environment or a .env file")]
    Unconfigured,
    #[error("Model is loading. Please try again in a few moments.")]
    ModelLoading,
    #[error("Invalid API key. Please check your Hugging Face API key.")]
    Unauthorized,
    #[error("Failed to generate image: {0}")]
    Generic(String),
}

impl ImageError {
    /// Whether re-running the request can reasonably succeed without a config change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImageError::ModelLoading | ImageError::Generic(_))
    }
}

/// Result of one generation run. Every channel is resolved independently:
/// the image slot may hold a failure while caption and hashtags are populated.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub run_id: Uuid,
    pub request: GenerationRequest,
    pub image: Result<ImageData, ImageError>,
    pub caption: String,
    pub hashtags: Vec<String>,
}

impl GenerationOutcome {
    pub fn image_failed(&self) -> bool {
        self.image.is_err()
    }
}

/// Caption and hashtag source. Implementations absorb their own failures.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_caption(&self, topic: &str, platform: Platform) -> String;

    /// At most `count` tags, each `#` followed by word characters.
    async fn generate_hashtags(&self, topic: &str, count: usize) -> Vec<String>;
}

/// Image source. Failures are typed and propagated.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImageData, ImageError>;
}
