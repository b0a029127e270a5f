//! Candidate extraction for a single search result.
//!
//! Fallback chain, first marker present wins:
//! activate result → primary marker → broader marker. A marker that is present but has no
//! `src` still wins; it just yields no candidate. The origin source link is resolved
//! independently and travels as metadata; known resizer URLs get their quality maxed.

mod quality;

pub use quality::maximize_quality;

use crate::browser::{pause, BrowsingSession, ElementSnapshot};
use crate::candidate::{ImageCandidate, SearchResult};
use crate::config::{BrowserConfig, QualityRule, SelectorConfig};
use anyhow::Result;

/// Which marker produced the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSource {
    Primary,
    Broader,
}

/// What extraction found for one result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Ordered by preference; at most one entry today.
    pub candidates: Vec<ImageCandidate>,
    pub origin_source_url: Option<String>,
    pub marker: Option<MarkerSource>,
    /// False when the result vanished from the listing before it could be clicked.
    pub activated: bool,
}

impl Extraction {
    /// Alt text of the best candidate, used as a fallback name for rescued images.
    pub fn best_alt(&self) -> Option<&str> {
        self.candidates.first().and_then(|c| c.alt_text.as_deref())
    }
}

pub struct Extractor<'a> {
    selectors: &'a SelectorConfig,
    browser: &'a BrowserConfig,
    quality_rules: &'a [QualityRule],
}

impl<'a> Extractor<'a> {
    pub fn new(
        selectors: &'a SelectorConfig,
        browser: &'a BrowserConfig,
        quality_rules: &'a [QualityRule],
    ) -> Self {
        Self {
            selectors,
            browser,
            quality_rules,
        }
    }

    pub fn extract<S: BrowsingSession + ?Sized>(
        &self,
        session: &mut S,
        result: SearchResult,
    ) -> Result<Extraction> {
        let mut extraction = Extraction {
            activated: self.activate(session, result)?,
            ..Default::default()
        };
        if !extraction.activated {
            tracing::debug!(index = result.index, "result no longer in listing");
            return Ok(extraction);
        }

        let wait = self.browser.marker_wait();
        let marked = match session.wait_for_element(&self.selectors.primary_marker, wait)? {
            Some(el) => Some((MarkerSource::Primary, el)),
            None => session
                .wait_for_element(&self.selectors.broader_marker, wait)?
                .map(|el| (MarkerSource::Broader, el)),
        };

        extraction.origin_source_url = session
            .find_element(&self.selectors.source_link)?
            .and_then(|el| el.href)
            .filter(|href| !href.trim().is_empty());

        if let Some((marker, el)) = marked {
            extraction.marker = Some(marker);
            match usable_src(&el) {
                Some(src) => {
                    let url = maximize_quality(src, self.quality_rules);
                    if url != src {
                        tracing::debug!(index = result.index, "rewrote resizer URL to maximum quality");
                    }
                    extraction.candidates.push(
                        ImageCandidate::new(url)
                            .with_alt(el.alt.clone())
                            .with_origin(extraction.origin_source_url.clone()),
                    );
                }
                None => tracing::debug!(index = result.index, ?marker, "marker has no src"),
            }
        }

        tracing::debug!(
            index = result.index,
            marker = ?extraction.marker,
            origin = extraction.origin_source_url.as_deref().unwrap_or("-"),
            "extraction finished"
        );
        Ok(extraction)
    }

    /// Scrolls the result into view and clicks it, pausing after each step for the page.
    fn activate<S: BrowsingSession + ?Sized>(&self, session: &mut S, result: SearchResult) -> Result<bool> {
        let selector = &self.selectors.thumbnail;
        if !session.scroll_result_into_view(selector, result.index)? {
            return Ok(false);
        }
        pause(self.browser.scroll_settle_ms);
        if !session.click_result(selector, result.index)? {
            return Ok(false);
        }
        pause(self.browser.click_settle_ms);
        Ok(true)
    }
}

/// The marker's `src`, unless it is missing or blank.
fn usable_src(el: &ElementSnapshot) -> Option<&str> {
    el.src.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
