//! Image generation on top of a remote image-synthesis model.
//!
//! Unlike the text adapter, nothing here is masked: a missing credential,
//! a loading model or a rejected key each surface as their own
//! [`ImageError`] so the caller can show the reason and offer a retry.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::InferenceConfig;
use crate::contract::{ImageData, ImageError, ImageGenerator};
use crate::transport::{InferenceTransport, TransportResponse};

/// Used when the endpoint does not say what it returned.
pub const DEFAULT_IMAGE_MIME: &str = "application/octet-stream";

/// Maps a non-success response to the failure the caller sees.
pub fn classify_failure(response: &TransportResponse) -> ImageError {
    match response.status {
        503 => ImageError::ModelLoading,
        401 => ImageError::Unauthorized,
        _ => ImageError::Generic(response.status_text.clone()),
    }
}

fn mime_type_of(response: &TransportResponse) -> String {
    response
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string()
}

pub struct ImageGenerationAdapter {
    config: InferenceConfig,
    transport: Arc<dyn InferenceTransport>,
}

impl ImageGenerationAdapter {
    pub fn new(config: InferenceConfig, transport: Arc<dyn InferenceTransport>) -> Self {
        Self { config, transport }
    }

    /// Probes the image endpoint. A loading model counts as available.
    pub async fn check_availability(&self) -> bool {
        if !self.config.is_configured() {
            warn!("[CHECK] No API key configured, image endpoint treated as unavailable");
            return false;
        }
        let body = json!({ "inputs": "test" });
        match self
            .transport
            .post_json(&self.config.image_model_url, &body)
            .await
        {
            Ok(response) => {
                let available = response.is_success() || response.status == 503;
                info!(status = response.status, available, "[CHECK] Image endpoint probed");
                available
            }
            Err(e) => {
                warn!(error = %e, "[CHECK] Image endpoint unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageGenerationAdapter {
    async fn generate_image(&self, prompt: &str) -> Result<ImageData, ImageError> {
        if !self.config.is_configured() {
            error!("[GEN][IMAGE] API key not configured, refusing to call image endpoint");
            return Err(ImageError::Unconfigured);
        }

        let body = json!({
            "inputs": prompt,
            "options": {
                "wait_for_model": true,
            }
        });
        let response = self
            .transport
            .post_json(&self.config.image_model_url, &body)
            .await
            .map_err(|e| {
                error!(error = %e, "[GEN][IMAGE] Transport failure");
                ImageError::Generic(e.to_string())
            })?;

        if !response.is_success() {
            let failure = classify_failure(&response);
            error!(status = response.status, error = %failure, "[GEN][IMAGE] Image endpoint rejected request");
            return Err(failure);
        }
        if response.body.is_empty() {
            error!("[GEN][IMAGE] Image endpoint returned an empty payload");
            return Err(ImageError::Generic("empty image payload".to_string()));
        }

        let image = ImageData::new(mime_type_of(&response), response.body);
        info!(mime_type = %image.mime_type, bytes = image.bytes.len(), "[GEN][IMAGE] Image generated");
        Ok(image)
    }
}
