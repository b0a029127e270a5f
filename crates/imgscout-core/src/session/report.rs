//! Per-query counters and the run summary.

use super::pipeline::{ResultOutcome, SkipReason};
use crate::candidate::{DownloadOutcome, FailureReason, ImageCandidate};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Skipped results broken down by why they were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub not_activated: usize,
    pub extraction_miss: usize,
    pub placeholder: usize,
    pub rescue_miss: usize,
    pub http_status: usize,
    pub wrong_content_type: usize,
    pub corrupt_image: usize,
    pub transport: usize,
    pub storage: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.not_activated
            + self.extraction_miss
            + self.placeholder
            + self.rescue_miss
            + self.http_status
            + self.wrong_content_type
            + self.corrupt_image
            + self.transport
            + self.storage
    }

    fn record(&mut self, reason: &SkipReason) {
        let slot = match reason {
            SkipReason::NotActivated => &mut self.not_activated,
            SkipReason::ExtractionMiss => &mut self.extraction_miss,
            SkipReason::Placeholder(_) => &mut self.placeholder,
            SkipReason::RescueMiss => &mut self.rescue_miss,
            SkipReason::Fetch(f) => match f {
                FailureReason::HttpStatus { .. } => &mut self.http_status,
                FailureReason::WrongContentType { .. } => &mut self.wrong_content_type,
                FailureReason::CorruptImage { .. } => &mut self.corrupt_image,
                FailureReason::Transport { .. } => &mut self.transport,
                FailureReason::Storage { .. } => &mut self.storage,
            },
        };
        *slot += 1;
    }
}

/// One saved file and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub index: usize,
    pub path: PathBuf,
    pub url: String,
    pub origin_source_url: Option<String>,
    pub rescued: bool,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub listing_url: String,
    /// Thumbnails found in the listing.
    pub results_seen: usize,
    /// Results actually run through the pipeline (quota may stop early).
    pub processed: usize,
    pub downloaded: usize,
    /// Downloads that came from a source-page rescue.
    pub rescued: usize,
    pub skipped: SkipCounts,
    pub quota_reached: bool,
    /// Set when the listing itself could not be opened.
    pub error: Option<String>,
    pub saved: Vec<SavedImage>,
}

impl QueryReport {
    pub fn new(query: impl Into<String>, listing_url: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            listing_url: listing_url.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, index: usize, outcome: &ResultOutcome) {
        self.processed += 1;
        match outcome {
            ResultOutcome::Downloaded {
                result,
                candidate,
                rescued,
            } => {
                self.downloaded += 1;
                if *rescued {
                    self.rescued += 1;
                }
                if let DownloadOutcome::Saved { path, sha256, .. } = &result.outcome {
                    self.saved.push(saved_image(index, path, candidate, *rescued, sha256));
                }
            }
            ResultOutcome::Skipped(reason) => self.skipped.record(reason),
        }
    }
}

fn saved_image(index: usize, path: &Path, candidate: &ImageCandidate, rescued: bool, sha256: &str) -> SavedImage {
    SavedImage {
        index,
        path: path.to_path_buf(),
        url: candidate.url.clone(),
        origin_source_url: candidate.origin_source_url.clone(),
        rescued,
        sha256: sha256.to_string(),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSummary {
    pub queries: Vec<QueryReport>,
    pub total_downloaded: usize,
    pub total_skipped: usize,
}

impl SessionSummary {
    pub fn push(&mut self, report: QueryReport) {
        self.total_downloaded += report.downloaded;
        self.total_skipped += report.skipped.total();
        self.queries.push(report);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
