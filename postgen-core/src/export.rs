//! Writing posts to disk.
//!
//! Every export builds its content in memory first, writes it to a temporary
//! file in the destination directory and renames it into place, so a failed
//! export never leaves a partial file behind.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

use crate::contract::ImageData;
use crate::csv_export::{self, PostRecord};
use crate::draft::PostDraft;
use crate::render::{self, RenderError};

pub const IMAGE_FILE_NAME: &str = "social-media-image.png";
pub const TEXT_FILE_NAME: &str = "post-content.txt";
pub const CSV_FILE_NAME: &str = "post-data.csv";
pub const COMPOSITE_FILE_NAME: &str = "social-media-post.png";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No posts to export")]
    EmptyInput,
    #[error("post has no image to export")]
    MissingImage,
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<PathBuf, ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!(path = %path.display(), bytes = contents.len(), "[EXPORT] Wrote file");
    Ok(path.to_path_buf())
}

/// Caption, a blank line, then the space-joined hashtags.
pub fn text_content(caption: &str, hashtags: &[String]) -> String {
    format!("{}\n\n{}", caption, hashtags.join(" "))
}

/// Writes the raw image bytes as received from the image model.
pub fn save_image(path: &Path, image: &ImageData) -> Result<PathBuf, ExportError> {
    write_atomic(path, &image.bytes)
}

pub fn save_text(path: &Path, caption: &str, hashtags: &[String]) -> Result<PathBuf, ExportError> {
    write_atomic(path, text_content(caption, hashtags).as_bytes())
}

pub fn save_csv(path: &Path, records: &[PostRecord]) -> Result<PathBuf, ExportError> {
    let encoded = csv_export::encode(records)?;
    write_atomic(path, encoded.as_bytes())
}

pub fn save_composite(
    path: &Path,
    image: &ImageData,
    caption: &str,
    hashtags: &[String],
) -> Result<PathBuf, ExportError> {
    let png = render::render(&image.bytes, caption, hashtags)?;
    write_atomic(path, &png)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    Image,
    Text,
    Composite,
    Csv,
}

#[derive(Debug, Error)]
#[error("unknown export kind `{0}` (expected image, text, composite or csv)")]
pub struct UnknownExportKind(pub String);

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::Image,
        ExportKind::Text,
        ExportKind::Composite,
        ExportKind::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Image => "image",
            ExportKind::Text => "text",
            ExportKind::Composite => "composite",
            ExportKind::Csv => "csv",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Image => IMAGE_FILE_NAME,
            ExportKind::Text => TEXT_FILE_NAME,
            ExportKind::Composite => COMPOSITE_FILE_NAME,
            ExportKind::Csv => CSV_FILE_NAME,
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = UnknownExportKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ExportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownExportKind(s.to_string()))
    }
}

/// Result of one export attempt.
#[derive(Debug)]
pub struct ExportReport {
    pub kind: ExportKind,
    pub result: Result<PathBuf, ExportError>,
}

/// `post-content.txt` becomes `post-content-2.txt` for the second of several posts.
fn numbered(file_name: &str, index: usize, total: usize) -> String {
    if total <= 1 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{}.{ext}", index + 1),
        None => format!("{file_name}-{}", index + 1),
    }
}

fn export_one(
    dir: &Path,
    kind: ExportKind,
    draft: &PostDraft,
    position: (usize, usize),
    now: DateTime<Utc>,
) -> ExportReport {
    let (index, total) = position;
    let path = dir.join(numbered(kind.file_name(), index, total));
    let result = match kind {
        ExportKind::Image => draft
            .image()
            .ok_or(ExportError::MissingImage)
            .and_then(|image| save_image(&path, image)),
        ExportKind::Text => save_text(&path, draft.caption(), draft.hashtags()),
        ExportKind::Composite => draft
            .image()
            .ok_or(ExportError::MissingImage)
            .and_then(|image| save_composite(&path, image, draft.caption(), draft.hashtags())),
        ExportKind::Csv => save_csv(&path, &[draft.to_record(now)]),
    };
    ExportReport { kind, result }
}

/// Runs every requested export. Per-post kinds produce one file per draft;
/// `Csv` produces a single file holding every draft.
pub fn export_posts(
    dir: &Path,
    drafts: &[PostDraft],
    kinds: &[ExportKind],
    now: DateTime<Utc>,
) -> Vec<ExportReport> {
    let mut reports = Vec::new();
    for &kind in kinds {
        if kind == ExportKind::Csv {
            let records: Vec<PostRecord> = drafts.iter().map(|d| d.to_record(now)).collect();
            reports.push(ExportReport {
                kind,
                result: save_csv(&dir.join(CSV_FILE_NAME), &records),
            });
            continue;
        }
        if drafts.is_empty() {
            reports.push(ExportReport {
                kind,
                result: Err(ExportError::EmptyInput),
            });
            continue;
        }
        for (index, draft) in drafts.iter().enumerate() {
            reports.push(export_one(dir, kind, draft, (index, drafts.len()), now));
        }
    }

    for report in &reports {
        if let Err(e) = &report.result {
            error!(kind = %report.kind, error = %e, "[EXPORT] Export failed");
        }
    }
    reports
}
