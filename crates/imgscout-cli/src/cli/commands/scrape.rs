//! `imgscout scrape` – drive the browser over every query.

use anyhow::{bail, Context, Result};
use imgscout_core::browser::ChromeSession;
use imgscout_core::config::ScoutConfig;
use imgscout_core::fetch::Fetcher;
use imgscout_core::session::{SessionDriver, SessionSummary};
use std::path::PathBuf;

pub struct ScrapeOptions {
    pub queries: Vec<String>,
    pub report: Option<PathBuf>,
}

pub fn run_scrape(cfg: &ScoutConfig, opts: ScrapeOptions) -> Result<()> {
    if opts.queries.is_empty() {
        bail!("no queries given and none configured");
    }

    let mut fetcher = Fetcher::new(&cfg.output_dir, cfg.fetch.clone())?;
    let mut session = ChromeSession::launch(&cfg.browser)?;
    let driver = SessionDriver::new(cfg);
    let summary = driver.run(&mut session, &mut fetcher, &opts.queries)?;

    print_summary(&summary);
    if let Some(path) = opts.report {
        let json = summary.to_json()?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "{:<30} {:>7} {:>10} {:>7} {:>7}",
        "QUERY", "RESULTS", "DOWNLOADED", "RESCUED", "SKIPPED"
    );
    for q in &summary.queries {
        match &q.error {
            Some(err) => println!("{:<30} failed: {}", q.query, err),
            None => println!(
                "{:<30} {:>7} {:>10} {:>7} {:>7}",
                q.query,
                q.results_seen,
                q.downloaded,
                q.rescued,
                q.skipped.total()
            ),
        }
    }
    println!(
        "Total: {} downloaded, {} skipped",
        summary.total_downloaded, summary.total_skipped
    );
}
