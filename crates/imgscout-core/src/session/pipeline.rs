//! One search result through extract → validate → (rescue) → fetch.

use crate::browser::BrowsingSession;
use crate::candidate::{DownloadOutcome, DownloadResult, FailureReason, ImageCandidate, SearchResult};
use crate::config::ScoutConfig;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::rescue::Rescuer;
use crate::validate::{Rejection, Validator};
use anyhow::Result;

/// Why a result produced no file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The result could not be scrolled to or clicked.
    NotActivated,
    /// Neither marker appeared and no source link was found.
    ExtractionMiss,
    /// Only a placeholder or thumbnail was offered and there was no source link to rescue from.
    Placeholder(Rejection),
    /// The source page did not load or had nothing usable.
    RescueMiss,
    Fetch(FailureReason),
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotActivated => "not-activated",
            SkipReason::ExtractionMiss => "extraction-miss",
            SkipReason::Placeholder(_) => "placeholder",
            SkipReason::RescueMiss => "rescue-miss",
            SkipReason::Fetch(reason) => reason.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResultOutcome {
    Downloaded {
        result: DownloadResult,
        candidate: ImageCandidate,
        rescued: bool,
    },
    Skipped(SkipReason),
}

impl ResultOutcome {
    pub fn is_download(&self) -> bool {
        matches!(self, ResultOutcome::Downloaded { .. })
    }
}

pub struct Pipeline<'a> {
    extractor: Extractor<'a>,
    validator: Validator,
    rescuer: Rescuer,
}

impl<'a> Pipeline<'a> {
    pub fn new(cfg: &'a ScoutConfig) -> Self {
        Self {
            extractor: Extractor::new(&cfg.selectors, &cfg.browser, &cfg.quality_rules),
            validator: Validator::new(&cfg.validator),
            rescuer: Rescuer::new(cfg.rescue.min_dimension, cfg.browser.rescue_load_wait()),
        }
    }

    /// Runs one result to completion. Only environment failures (the browser going away)
    /// are returned as errors; everything else is a [`ResultOutcome::Skipped`].
    pub fn process_result<S: BrowsingSession + ?Sized>(
        &self,
        session: &mut S,
        fetcher: &mut Fetcher,
        result: SearchResult,
    ) -> Result<ResultOutcome> {
        let extraction = self.extractor.extract(session, result)?;
        if !extraction.activated {
            return Ok(ResultOutcome::Skipped(SkipReason::NotActivated));
        }

        let mut first_rejection = None;
        let mut accepted = None;
        for candidate in &extraction.candidates {
            match self.validator.rejection(candidate) {
                None => {
                    accepted = Some(candidate.clone());
                    break;
                }
                Some(rejection) => {
                    tracing::debug!(index = result.index, url = %candidate.url, "candidate rejected: {}", rejection);
                    first_rejection.get_or_insert(rejection);
                }
            }
        }

        if let Some(candidate) = accepted {
            return Ok(self.fetch(fetcher, candidate, result, false));
        }

        let Some(origin) = extraction.origin_source_url.as_deref() else {
            return Ok(ResultOutcome::Skipped(match first_rejection {
                Some(rejection) => SkipReason::Placeholder(rejection),
                None => SkipReason::ExtractionMiss,
            }));
        };

        tracing::info!(index = result.index, origin, "no direct image; trying source page");
        let Some(rescued) = self.rescuer.rescue(session, origin, extraction.best_alt())? else {
            return Ok(ResultOutcome::Skipped(SkipReason::RescueMiss));
        };
        if let Some(rejection) = self.validator.rejection(&rescued) {
            tracing::debug!(index = result.index, url = %rescued.url, "rescued image rejected: {}", rejection);
            return Ok(ResultOutcome::Skipped(SkipReason::RescueMiss));
        }
        Ok(self.fetch(fetcher, rescued, result, true))
    }

    fn fetch(
        &self,
        fetcher: &mut Fetcher,
        candidate: ImageCandidate,
        result: SearchResult,
        rescued: bool,
    ) -> ResultOutcome {
        let download = fetcher.fetch_and_verify(&candidate, result.index);
        match download.outcome {
            DownloadOutcome::Saved { .. } => ResultOutcome::Downloaded {
                result: download,
                candidate,
                rescued,
            },
            DownloadOutcome::Failed { reason } => ResultOutcome::Skipped(SkipReason::Fetch(reason)),
        }
    }
}
