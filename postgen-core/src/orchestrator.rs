//! High-level run: fans out image, caption and hashtag generation and joins them.
//!
//! # Responsibilities
//! - Starts the three channels concurrently through [`settle3`] and waits for
//!   all of them; a failing channel never empties another.
//! - Surfaces image failures as typed [`ImageError`]s (no placeholder image).
//! - Substitutes canned text if a text channel dies outright; the text adapter
//!   already falls back for every anticipated failure.
//! - Publishes a short-lived success notice after every completed run.
//!
//! # Retry
//! [`GenerationOrchestrator::retry`] re-runs everything for the last topic and
//! platform with the configured retry style. Nothing is cached between runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{GenerationConfig, InferenceConfig};
use crate::contract::{
    GenerationOutcome, GenerationRequest, ImageError, ImageGenerator, TextGenerator,
};
use crate::image_gen::ImageGenerationAdapter;
use crate::settle::{settle3, settle_all, Settled};
use crate::text_gen::TextGenerationAdapter;
use crate::transport::{HttpTransport, TransportError};

pub const SUCCESS_NOTICE: &str = "✅ Content generated successfully!";

/// Last-resort tags when the hashtag channel dies.
pub const DEFAULT_HASHTAGS: [&str; 3] = ["#socialmedia", "#content", "#trending"];

/// Last-resort caption when the caption channel dies.
pub fn default_caption(topic: &str) -> String {
    format!("Check out this amazing content about {topic}! 🚀")
}

/// A transient acknowledgement shown after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

struct NoticeBoard {
    tx: watch::Sender<Option<Notice>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct GenerationOrchestrator {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    config: GenerationConfig,
    notices: Arc<NoticeBoard>,
}

impl GenerationOrchestrator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        config: GenerationConfig,
    ) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            text,
            image,
            config,
            notices: Arc::new(NoticeBoard {
                tx,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Wires both adapters to one HTTP transport built from `inference`.
    pub fn from_config(
        inference: &InferenceConfig,
        config: GenerationConfig,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(inference)?);
        let text = TextGenerationAdapter::new(inference.clone(), transport.clone());
        let image = ImageGenerationAdapter::new(inference.clone(), transport);
        Ok(Self::new(Arc::new(text), Arc::new(image), config))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Receives `Some(notice)` after each run and `None` once it expires.
    pub fn subscribe_notices(&self) -> watch::Receiver<Option<Notice>> {
        self.notices.tx.subscribe()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("generate", %run_id, platform = %request.platform());
        self.run(run_id, request).instrument(span).await
    }

    /// Re-runs the last request with the configured retry style.
    pub async fn retry(&self, last: &GenerationRequest) -> GenerationOutcome {
        info!(topic = %last.topic(), style = %self.config.retry_style, "[GEN] Retrying generation");
        let request = last.with_style(self.config.retry_style.clone());
        self.generate(&request).await
    }

    /// Runs several requests concurrently, one settled slot per request.
    pub async fn generate_batch(
        &self,
        requests: Vec<GenerationRequest>,
    ) -> Vec<Settled<GenerationOutcome>> {
        info!(requests = requests.len(), "[GEN] Starting batch generation");
        let runs = requests.into_iter().map(|request| {
            let this = self.clone();
            async move { this.generate(&request).await }
        });
        settle_all(runs).await
    }

    async fn run(&self, run_id: Uuid, request: &GenerationRequest) -> GenerationOutcome {
        info!(topic = %request.topic(), style = %request.image_style(), "[GEN] Starting generation");

        let image = Arc::clone(&self.image);
        let prompt = request.image_prompt();
        let image_task = async move { image.generate_image(&prompt).await };

        let text = Arc::clone(&self.text);
        let topic = request.topic().to_string();
        let platform = request.platform();
        let caption_task = async move { text.generate_caption(&topic, platform).await };

        let text = Arc::clone(&self.text);
        let topic = request.topic().to_string();
        let count = self.config.hashtag_count;
        let hashtag_task = async move { text.generate_hashtags(&topic, count).await };

        let (image_result, caption_result, hashtag_result) =
            settle3(image_task, caption_task, hashtag_task).await;

        let image = match image_result {
            Ok(Ok(data)) => {
                info!(mime_type = %data.mime_type, bytes = data.bytes.len(), "[GEN] Image channel succeeded");
                Ok(data)
            }
            Ok(Err(e)) => {
                warn!(error = %e, retryable = e.is_retryable(), "[GEN] Image channel failed");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "[GEN][ERROR] Image channel terminated unexpectedly");
                Err(ImageError::Generic(
                    "image channel terminated unexpectedly".to_string(),
                ))
            }
        };

        let caption = caption_result.unwrap_or_else(|e| {
            error!(error = %e, "[GEN][ERROR] Caption channel terminated, using default caption");
            default_caption(request.topic())
        });

        let hashtags = hashtag_result.unwrap_or_else(|e| {
            error!(error = %e, "[GEN][ERROR] Hashtag channel terminated, using default hashtags");
            DEFAULT_HASHTAGS.iter().map(|t| t.to_string()).collect()
        });

        info!(
            image_ok = image.is_ok(),
            caption_chars = caption.chars().count(),
            hashtags = hashtags.len(),
            "[GEN] Generation complete"
        );
        self.publish_notice();

        GenerationOutcome {
            run_id,
            request: request.clone(),
            image,
            caption,
            hashtags,
        }
    }

    fn publish_notice(&self) {
        let id = self.notices.next_id.fetch_add(1, Ordering::SeqCst);
        self.notices.tx.send_replace(Some(Notice {
            id,
            message: SUCCESS_NOTICE.to_string(),
        }));

        let board = Arc::clone(&self.notices);
        let ttl = self.config.notice_ttl();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Only clear our own notice; a later run may have replaced it.
            board.tx.send_if_modified(|current| {
                if current.as_ref().map(|n| n.id) == Some(id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}
