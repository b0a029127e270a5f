//! Session driver: one listing per query, results processed in order until the quota is met.

mod pipeline;
mod report;

pub use pipeline::{Pipeline, ResultOutcome, SkipReason};
pub use report::{QueryReport, SavedImage, SessionSummary, SkipCounts};

use crate::browser::{pause, BrowsingSession};
use crate::candidate::SearchResult;
use crate::config::ScoutConfig;
use crate::fetch::Fetcher;
use anyhow::Result;

/// Fills `{query}` in `template` with the form-encoded query.
pub fn listing_url(template: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    template.replace("{query}", &encoded)
}

pub struct SessionDriver<'a> {
    cfg: &'a ScoutConfig,
    pipeline: Pipeline<'a>,
}

impl<'a> SessionDriver<'a> {
    pub fn new(cfg: &'a ScoutConfig) -> Self {
        Self {
            cfg,
            pipeline: Pipeline::new(cfg),
        }
    }

    pub fn pipeline(&self) -> &Pipeline<'a> {
        &self.pipeline
    }

    /// Runs every query in order. A query whose listing fails to open is recorded and skipped.
    pub fn run<S: BrowsingSession + ?Sized>(
        &self,
        session: &mut S,
        fetcher: &mut Fetcher,
        queries: &[String],
    ) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        for query in queries {
            let report = self.run_query(session, fetcher, query)?;
            summary.push(report);
        }
        tracing::info!(
            queries = summary.queries.len(),
            downloaded = summary.total_downloaded,
            skipped = summary.total_skipped,
            "session finished"
        );
        Ok(summary)
    }

    pub fn run_query<S: BrowsingSession + ?Sized>(
        &self,
        session: &mut S,
        fetcher: &mut Fetcher,
        query: &str,
    ) -> Result<QueryReport> {
        let url = listing_url(&self.cfg.search_url_template, query);
        let mut report = QueryReport::new(query, url.clone());
        tracing::info!(query, %url, "opening listing");

        if let Err(e) = session.open_listing(&url) {
            tracing::error!(query, "failed to open listing: {:#}", e);
            report.error = Some(format!("{:#}", e));
            return Ok(report);
        }

        let quota = self.cfg.per_query_quota;
        report.results_seen =
            session.count_results(&self.cfg.selectors.thumbnail, self.cfg.browser.listing_wait())?;
        tracing::info!(query, results = report.results_seen, quota, "listing loaded");

        for index in 0..report.results_seen {
            if report.downloaded >= quota {
                report.quota_reached = true;
                break;
            }
            let outcome = self
                .pipeline
                .process_result(session, fetcher, SearchResult::new(index))?;
            if let ResultOutcome::Skipped(reason) = &outcome {
                tracing::info!(query, index, reason = reason.as_str(), "result skipped");
            }
            report.record(index, &outcome);
            pause(self.cfg.browser.between_results_ms);
        }
        if report.downloaded >= quota {
            report.quota_reached = true;
        }

        tracing::info!(
            query,
            downloaded = report.downloaded,
            rescued = report.rescued,
            skipped = report.skipped.total(),
            "query finished"
        );
        Ok(report)
    }
}
