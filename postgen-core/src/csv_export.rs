//! CSV encoding of post records.
//!
//! Quoting follows the minimal RFC 4180 rule: only fields containing a comma,
//! a double quote or a newline are quoted. Rows are separated by `\n` and the
//! output has no trailing newline.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::borrow::Cow;
use tracing::info;

use crate::export::ExportError;

pub const CSV_HEADERS: [&str; 5] = ["Timestamp", "Topic", "Caption", "Hashtags", "Image URL"];

/// One exported post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    /// Image reference (data URL or path), if the post has an image.
    pub image_ref: Option<String>,
}

impl PostRecord {
    /// A record stamped with the current time.
    pub fn new(
        topic: impl Into<String>,
        caption: impl Into<String>,
        hashtags: Vec<String>,
        image_ref: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            topic: topic.into(),
            caption: caption.into(),
            hashtags,
            image_ref,
        }
    }

    /// ISO-8601 timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn fields(&self) -> [String; 5] {
        [
            self.timestamp_iso(),
            self.topic.clone(),
            self.caption.clone(),
            self.hashtags.join(" "),
            self.image_ref.clone().unwrap_or_default(),
        ]
    }
}

pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header row plus one row per record.
pub fn encode(records: &[PostRecord]) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::EmptyInput);
    }
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(CSV_HEADERS.join(","));
    rows.extend(records.iter().map(|r| encode_row(&r.fields())));
    info!(records = records.len(), "[EXPORT] Encoded CSV");
    Ok(rows.join("\n"))
}
