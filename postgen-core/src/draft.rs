//! Editable post assembled from a generation outcome.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::{GenerationOutcome, ImageData};
use crate::csv_export::PostRecord;
use crate::export;
use crate::platform::Platform;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("caption is {len} characters, {platform} allows at most {limit}")]
    CaptionTooLong {
        len: usize,
        limit: usize,
        platform: Platform,
    },
    #[error("no hashtag at position {index} (draft has {len})")]
    HashtagIndex { index: usize, len: usize },
}

/// Character budget of the current caption against the platform display limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionUsage {
    pub length: usize,
    pub limit: usize,
    /// More than 90% of the limit is used.
    pub near_limit: bool,
}

#[derive(Debug, Clone)]
pub struct PostDraft {
    topic: String,
    platform: Platform,
    image: Option<ImageData>,
    caption: String,
    hashtags: Vec<String>,
}

impl PostDraft {
    pub fn new(
        topic: impl Into<String>,
        platform: Platform,
        image: Option<ImageData>,
        caption: impl Into<String>,
        hashtags: Vec<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            platform,
            image,
            caption: caption.into(),
            hashtags,
        }
    }

    /// Takes the outcome's values; a failed image leaves the draft without one.
    pub fn from_outcome(outcome: &GenerationOutcome) -> Self {
        Self::new(
            outcome.request.topic(),
            outcome.request.platform(),
            outcome.image.as_ref().ok().cloned(),
            outcome.caption.clone(),
            outcome.hashtags.clone(),
        )
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    /// Replaces the caption unless it exceeds the platform display limit.
    pub fn edit_caption(&mut self, caption: impl Into<String>) -> Result<(), DraftError> {
        let caption = caption.into();
        let len = caption.chars().count();
        let limit = self.platform.limits().display;
        if len > limit {
            return Err(DraftError::CaptionTooLong {
                len,
                limit,
                platform: self.platform,
            });
        }
        self.caption = caption;
        Ok(())
    }

    pub fn caption_usage(&self) -> CaptionUsage {
        let length = self.caption.chars().count();
        let limit = self.platform.limits().display;
        CaptionUsage {
            length,
            limit,
            near_limit: length * 10 > limit * 9,
        }
    }

    /// Removes and returns the tag at `index`.
    pub fn remove_hashtag(&mut self, index: usize) -> Result<String, DraftError> {
        if index >= self.hashtags.len() {
            return Err(DraftError::HashtagIndex {
                index,
                len: self.hashtags.len(),
            });
        }
        Ok(self.hashtags.remove(index))
    }

    /// Clipboard payload for the hashtags.
    pub fn hashtags_text(&self) -> String {
        self.hashtags.join(" ")
    }

    /// Contents of the plain-text export.
    pub fn text_export(&self) -> String {
        export::text_content(&self.caption, &self.hashtags)
    }

    pub fn can_download(&self) -> bool {
        self.image.is_some() && !self.caption.is_empty() && !self.hashtags.is_empty()
    }

    pub fn to_record(&self, timestamp: DateTime<Utc>) -> PostRecord {
        PostRecord {
            timestamp,
            topic: self.topic.clone(),
            caption: self.caption.clone(),
            hashtags: self.hashtags.clone(),
            image_ref: self.image.as_ref().map(ImageData::to_data_url),
        }
    }
}
