//! Shared pipeline types: search results, image candidates and download outcomes.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One item of a search listing. The ordinal doubles as the DOM handle: the browsing
/// session re-resolves the nth thumbnail whenever the result is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub index: usize,
}

impl SearchResult {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

/// A prospective image source, not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImageCandidate {
    pub url: String,
    pub alt_text: Option<String>,
    /// Declared width in pixels (only known for source-page images).
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Page the candidate was found on or linked from.
    pub origin_source_url: Option<String>,
}

impl ImageCandidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_alt(mut self, alt: Option<String>) -> Self {
        self.alt_text = alt.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_origin(mut self, origin: Option<String>) -> Self {
        self.origin_source_url = origin;
        self
    }

    /// Declared pixel area; missing dimensions count as 0.
    pub fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Decoded image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Why a fetch did not produce a saved image. Every variant is recoverable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureReason {
    #[error("HTTP status {code}")]
    HttpStatus { code: u32 },
    #[error("not an image content type: {content_type:?}")]
    WrongContentType { content_type: Option<String> },
    #[error("downloaded bytes are not a valid image: {detail}")]
    CorruptImage { detail: String },
    #[error("transport: {detail}")]
    Transport { detail: String, timed_out: bool },
    #[error("storage: {detail}")]
    Storage { detail: String },
}

impl FailureReason {
    /// Stable short name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::HttpStatus { .. } => "http-status",
            FailureReason::WrongContentType { .. } => "wrong-content-type",
            FailureReason::CorruptImage { .. } => "corrupt-image",
            FailureReason::Transport { .. } => "transport",
            FailureReason::Storage { .. } => "storage",
        }
    }
}

/// Terminal result of fetch-and-verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum DownloadOutcome {
    Saved {
        path: PathBuf,
        /// `None` when decode verification is disabled.
        dimensions: Option<Dimensions>,
        sha256: String,
    },
    Failed { reason: FailureReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub url: String,
    /// Bytes received from the body (0 when rejected before streaming).
    pub bytes: u64,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    pub fn failed(url: impl Into<String>, bytes: u64, reason: FailureReason) -> Self {
        Self {
            url: url.into(),
            bytes,
            outcome: DownloadOutcome::Failed { reason },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Saved { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.outcome {
            DownloadOutcome::Failed { reason } => Some(reason),
            DownloadOutcome::Saved { .. } => None,
        }
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            DownloadOutcome::Saved { path, .. } => Some(path),
            DownloadOutcome::Failed { .. } => None,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        match &self.outcome {
            DownloadOutcome::Saved { dimensions, .. } => *dimensions,
            DownloadOutcome::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_alt_is_dropped() {
        let c = ImageCandidate::new("https://a/b.jpg").with_alt(Some("   ".to_string()));
        assert!(c.alt_text.is_none());
        let c = ImageCandidate::new("https://a/b.jpg").with_alt(Some("cat".to_string()));
        assert_eq!(c.alt_text.as_deref(), Some("cat"));
    }

    #[test]
    fn area_treats_missing_as_zero() {
        let mut c = ImageCandidate::new("https://a/b.jpg");
        c.width = Some(400);
        assert_eq!(c.area(), 0);
        c.height = Some(300);
        assert_eq!(c.area(), 120_000);
    }

    #[test]
    fn failure_reason_names() {
        assert_eq!(FailureReason::HttpStatus { code: 404 }.as_str(), "http-status");
        assert_eq!(
            FailureReason::WrongContentType { content_type: None }.as_str(),
            "wrong-content-type"
        );
        assert_eq!(
            FailureReason::CorruptImage { detail: String::new() }.as_str(),
            "corrupt-image"
        );
    }

    #[test]
    fn download_result_accessors() {
        let r = DownloadResult::failed("https://a/x.png", 0, FailureReason::HttpStatus { code: 500 });
        assert!(!r.is_success());
        assert_eq!(r.failure().map(|f| f.as_str()), Some("http-status"));
        assert!(r.saved_path().is_none());
        assert!(r.dimensions().is_none());
    }
}
