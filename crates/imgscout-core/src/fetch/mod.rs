//! Fetch-and-verify: stream a candidate to disk, verify it, and name it without collisions.
//!
//! Pipeline per candidate:
//! allocate name → stream into `<name>.part` (status/content-type gated) →
//! optional decode check → rename to `<name>`.
//! Every failure removes the `.part` file and releases the name.

mod http;
mod naming;
mod verify;

pub use http::{check_response_head, is_image_content_type, parse_status_line};
pub use naming::{
    base_name, extension_from_url, sanitize_stem, temp_path, NameAllocator, DEFAULT_EXTENSION,
    IMAGE_EXTENSIONS,
};
pub use verify::decode_dimensions;

use crate::candidate::{DownloadOutcome, DownloadResult, FailureReason, ImageCandidate};
use crate::config::FetchConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct Fetcher {
    cfg: FetchConfig,
    names: NameAllocator,
}

impl Fetcher {
    /// Creates the output directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>, cfg: FetchConfig) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;
        Ok(Self {
            cfg,
            names: NameAllocator::new(output_dir),
        })
    }

    pub fn output_dir(&self) -> &Path {
        self.names.dir()
    }

    pub fn config(&self) -> &FetchConfig {
        &self.cfg
    }

    /// Downloads `candidate`; `ordinal` names the file when the candidate has no alt text.
    pub fn fetch_and_verify(&mut self, candidate: &ImageCandidate, ordinal: usize) -> DownloadResult {
        let url = candidate.url.trim();
        let stem = base_name(candidate.alt_text.as_deref(), ordinal, self.cfg.max_alt_len);
        let final_path = self.names.allocate(&stem, extension_from_url(url));
        let part_path = temp_path(&final_path);

        let report = match http::stream_to_file(url, &self.cfg, &part_path) {
            Ok(report) => report,
            Err(failure) => {
                return self.discard(url, &final_path, failure.bytes, failure.reason);
            }
        };
        if let Some(ct) = report.content_type.as_deref() {
            tracing::debug!(%url, content_type = ct, bytes = report.bytes, "body received");
        }

        let dimensions = if self.cfg.verify_decodable {
            match decode_dimensions(&part_path) {
                Ok(d) => Some(d),
                Err(detail) => {
                    return self.discard(url, &final_path, report.bytes, FailureReason::CorruptImage { detail });
                }
            }
        } else {
            None
        };

        if let Err(e) = std::fs::rename(&part_path, &final_path) {
            return self.discard(
                url,
                &final_path,
                report.bytes,
                FailureReason::Storage {
                    detail: format!("rename to {}: {}", final_path.display(), e),
                },
            );
        }

        match dimensions {
            Some(d) => tracing::info!(
                path = %final_path.display(),
                width = d.width,
                height = d.height,
                bytes = report.bytes,
                "downloaded"
            ),
            None => tracing::info!(path = %final_path.display(), bytes = report.bytes, "downloaded"),
        }

        DownloadResult {
            url: url.to_string(),
            bytes: report.bytes,
            outcome: DownloadOutcome::Saved {
                path: final_path,
                dimensions,
                sha256: report.sha256,
            },
        }
    }

    fn discard(&mut self, url: &str, final_path: &Path, bytes: u64, reason: FailureReason) -> DownloadResult {
        let part_path = temp_path(final_path);
        if part_path.exists() {
            if let Err(e) = std::fs::remove_file(&part_path) {
                tracing::warn!(path = %part_path.display(), "could not remove partial download: {}", e);
            }
        }
        self.names.release(final_path);
        tracing::info!(%url, reason = reason.as_str(), "download rejected: {}", reason);
        DownloadResult::failed(url, bytes, reason)
    }
}
