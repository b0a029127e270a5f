//! Source-page rescue: when a result only offers a thumbnail, visit the page it links to
//! and take the largest declared image there.
//!
//! The visit happens in a temporary browsing context that is always closed again, so the
//! listing survives whatever the source page does.

mod rank;

pub use rank::{best_image, is_large_enough, rank_images};

use crate::browser::{with_temporary_context, BrowsingSession};
use crate::candidate::ImageCandidate;
use anyhow::Result;
use std::time::Duration;

/// Alt text used when neither the source image nor the listing provide one.
pub const DEFAULT_RESCUE_ALT: &str = "source_image";

#[derive(Debug, Clone, Copy)]
pub struct Rescuer {
    min_dimension: u32,
    load_wait: Duration,
}

impl Rescuer {
    pub fn new(min_dimension: u32, load_wait: Duration) -> Self {
        Self {
            min_dimension,
            load_wait,
        }
    }

    /// Returns the best image on `origin_source_url` as a candidate, or `None` when the page
    /// does not load or holds no image above the size threshold.
    pub fn rescue<S: BrowsingSession + ?Sized>(
        &self,
        session: &mut S,
        origin_source_url: &str,
        fallback_alt: Option<&str>,
    ) -> Result<Option<ImageCandidate>> {
        let min_dimension = self.min_dimension;
        with_temporary_context(session, origin_source_url, self.load_wait, |session, loaded| {
            if !loaded {
                tracing::info!(url = origin_source_url, "source page did not load");
                return Ok(None);
            }
            let images = session.snapshot_images()?;
            let Some(best) = best_image(&images, min_dimension) else {
                tracing::info!(
                    url = origin_source_url,
                    scanned = images.len(),
                    "no qualifying image on source page"
                );
                return Ok(None);
            };
            tracing::debug!(
                url = origin_source_url,
                src = %best.src,
                width = best.width,
                height = best.height,
                "rescued image from source page"
            );
            let alt = best
                .alt
                .clone()
                .filter(|a| !a.trim().is_empty())
                .or_else(|| fallback_alt.map(str::to_string))
                .unwrap_or_else(|| DEFAULT_RESCUE_ALT.to_string());
            let mut candidate = ImageCandidate::new(best.src.trim())
                .with_alt(Some(alt))
                .with_origin(Some(origin_source_url.to_string()));
            candidate.width = Some(best.width);
            candidate.height = Some(best.height);
            Ok(Some(candidate))
        })
    }
}
