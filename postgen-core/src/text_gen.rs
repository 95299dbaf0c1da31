//! Caption and hashtag generation on top of a remote text-completion model.
//!
//! Every remote call is wrapped with [`or_fallback`]: whatever goes wrong
//! (missing credential, network, non-success status, unusable output) the
//! caller gets a locally computed caption or tag set instead of an error.
//! The fallback generators are pure and take their random source explicitly.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::{json, Value};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InferenceConfig;
use crate::contract::TextGenerator;
use crate::platform::Platform;
use crate::transport::{InferenceTransport, TransportError};

/// Generic tags used to pad fallback hashtag sets, in order.
pub const GENERIC_HASHTAGS: [&str; 8] = [
    "#socialmedia",
    "#content",
    "#trending",
    "#viral",
    "#instagood",
    "#photooftheday",
    "#amazing",
    "#awesome",
];

/// Remote captions shorter than this are replaced by the fallback.
pub const MIN_CAPTION_CHARS: usize = 10;

const CAPTION_TEMPERATURE: f64 = 0.7;
const HASHTAG_TEMPERATURE: f64 = 0.8;
const HASHTAG_MAX_LENGTH: usize = 100;
const TOP_P: f64 = 0.9;

/// Reasons a remote text call was not used. Never leaves this module's
/// public operations; it only feeds the fallback log line.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("API key not configured")]
    Unconfigured,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("model is loading")]
    ModelLoading,
    #[error("remote returned {status} {status_text}")]
    Status { status: u16, status_text: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response did not contain a usable result")]
    Unusable,
}

/// Runs a fallible call and substitutes `fallback()` on error.
pub async fn or_fallback<T, E, Fut, F>(call: Fut, channel: &'static str, fallback: F) -> T
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    F: FnOnce() -> T,
{
    match call.await {
        Ok(value) => value,
        Err(e) => {
            warn!(channel, error = %e, "[GEN][TEXT] Remote result unavailable, using local fallback");
            fallback()
        }
    }
}

pub fn caption_prompt(topic: &str, platform: Platform) -> String {
    format!(
        "Write a {} social media caption about {}. Caption:",
        platform.style(),
        topic
    )
}

pub fn hashtag_prompt(topic: &str, count: usize) -> String {
    format!("Generate {count} relevant hashtags for a post about {topic}. Hashtags:")
}

fn completion_body(prompt: &str, max_length: usize, temperature: f64) -> Value {
    json!({
        "inputs": prompt,
        "parameters": {
            "max_length": max_length,
            "temperature": temperature,
            "top_p": TOP_P,
            "do_sample": true,
            "return_full_text": false,
        },
        "options": {
            "wait_for_model": true,
        }
    })
}

/// `[0].generated_text` of a completion response, or empty.
pub fn generated_text(response: &Value) -> String {
    response
        .get(0)
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Strips the echoed prompt, keeps the first line, and rejects results
/// shorter than [`MIN_CAPTION_CHARS`].
pub fn clean_caption(generated: &str, prompt: &str) -> Option<String> {
    let stripped = generated.replacen(prompt, "", 1);
    let first_line = stripped.trim().split('\n').next().unwrap_or_default();
    if first_line.chars().count() < MIN_CAPTION_CHARS {
        return None;
    }
    Some(first_line.to_string())
}

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#[A-Za-z0-9_]+").expect("static hashtag pattern"))
}

/// First `count` distinct `#word` tokens in `text`, in order of appearance.
pub fn extract_hashtags(text: &str, count: usize) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for m in hashtag_pattern().find_iter(text) {
        if tags.len() >= count {
            break;
        }
        if !tags.iter().any(|t| t == m.as_str()) {
            tags.push(m.as_str().to_string());
        }
    }
    tags
}

pub fn caption_templates(platform: Platform) -> [&'static str; 3] {
    match platform {
        Platform::Instagram => [
            "✨ Excited to share this amazing {topic}! 💫",
            "Check out this incredible {topic}! 🌟",
            "Loving everything about {topic}! ❤️",
        ],
        Platform::Twitter => [
            "Thoughts on {topic}? Let's discuss! 💭",
            "Just discovered something amazing about {topic}!",
            "{topic} is game-changing! 🚀",
        ],
        Platform::LinkedIn => [
            "Sharing insights on {topic} and its impact on our industry.",
            "Exploring the latest developments in {topic}.",
            "Key takeaways from my research on {topic}.",
        ],
    }
}

/// One of the platform's canned captions, picked uniformly with `rng`.
pub fn fallback_caption<R: Rng + ?Sized>(topic: &str, platform: Platform, rng: &mut R) -> String {
    let templates = caption_templates(platform);
    let template = templates[rng.gen_range(0..templates.len())];
    template.replace("{topic}", topic)
}

/// Deterministic hashtags derived from the topic, padded with
/// [`GENERIC_HASHTAGS`]. Contains no duplicates and at most `count` tags.
pub fn fallback_hashtags(topic: &str, count: usize) -> Vec<String> {
    let normalized: String = topic
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    let mut tags: Vec<String> = Vec::with_capacity(count);
    let push = |tag: String, tags: &mut Vec<String>| {
        if tags.len() < count && !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    let compound = words.concat();
    if !compound.is_empty() {
        push(format!("#{compound}"), &mut tags);
    }
    for word in words.iter().filter(|w| w.len() > 2) {
        push(format!("#{word}"), &mut tags);
    }
    for generic in GENERIC_HASHTAGS {
        push(generic.to_string(), &mut tags);
    }

    tags.truncate(count);
    tags
}

/// Text adapter backed by a remote completion endpoint.
pub struct TextGenerationAdapter {
    config: InferenceConfig,
    transport: Arc<dyn InferenceTransport>,
    rng: Mutex<StdRng>,
}

impl TextGenerationAdapter {
    pub fn new(config: InferenceConfig, transport: Arc<dyn InferenceTransport>) -> Self {
        Self {
            config,
            transport,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeds the fallback caption picker, making fallbacks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn pick_fallback_caption(&self, topic: &str, platform: Platform) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        fallback_caption(topic, platform, &mut *rng)
    }

    async fn complete(
        &self,
        prompt: &str,
        max_length: usize,
        temperature: f64,
    ) -> Result<Value, TextError> {
        if !self.config.is_configured() {
            return Err(TextError::Unconfigured);
        }
        let body = completion_body(prompt, max_length, temperature);
        let response = self
            .transport
            .post_json(&self.config.text_model_url, &body)
            .await?;
        if !response.is_success() {
            if response.status == 503 {
                return Err(TextError::ModelLoading);
            }
            return Err(TextError::Status {
                status: response.status,
                status_text: response.status_text,
            });
        }
        response
            .json()
            .map_err(|e| TextError::Malformed(e.to_string()))
    }

    async fn remote_caption(&self, topic: &str, platform: Platform) -> Result<String, TextError> {
        let prompt = caption_prompt(topic, platform);
        let response = self
            .complete(&prompt, platform.limits().generation, CAPTION_TEMPERATURE)
            .await?;
        let caption =
            clean_caption(&generated_text(&response), &prompt).ok_or(TextError::Unusable)?;
        info!(platform = %platform, chars = caption.chars().count(), "[GEN][TEXT] Remote caption accepted");
        Ok(caption)
    }

    async fn remote_hashtags(&self, topic: &str, count: usize) -> Result<Vec<String>, TextError> {
        let prompt = hashtag_prompt(topic, count);
        let response = self
            .complete(&prompt, HASHTAG_MAX_LENGTH, HASHTAG_TEMPERATURE)
            .await?;
        let tags = extract_hashtags(&generated_text(&response), count);
        if tags.is_empty() {
            return Err(TextError::Unusable);
        }
        debug!(?tags, "[GEN][TEXT] Remote hashtags accepted");
        Ok(tags)
    }
}

#[async_trait]
impl TextGenerator for TextGenerationAdapter {
    async fn generate_caption(&self, topic: &str, platform: Platform) -> String {
        or_fallback(self.remote_caption(topic, platform), "caption", || {
            self.pick_fallback_caption(topic, platform)
        })
        .await
    }

    async fn generate_hashtags(&self, topic: &str, count: usize) -> Vec<String> {
        or_fallback(self.remote_hashtags(topic, count), "hashtags", || {
            fallback_hashtags(topic, count)
        })
        .await
    }
}
