//! `imgscout fetch` – fetch-and-verify one URL.

use anyhow::Result;
use imgscout_core::candidate::{DownloadOutcome, ImageCandidate};
use imgscout_core::config::ScoutConfig;
use imgscout_core::fetch::Fetcher;
use imgscout_core::validate::Validator;

pub fn run_fetch(cfg: &ScoutConfig, url: &str, alt: Option<String>) -> Result<()> {
    let candidate = ImageCandidate::new(url).with_alt(alt);
    if let Some(rejection) = Validator::new(&cfg.validator).rejection(&candidate) {
        println!("Rejected: {}", rejection);
        return Ok(());
    }

    let mut fetcher = Fetcher::new(&cfg.output_dir, cfg.fetch.clone())?;
    let result = fetcher.fetch_and_verify(&candidate, 0);
    match &result.outcome {
        DownloadOutcome::Saved {
            path,
            dimensions,
            sha256,
        } => {
            let size = dimensions
                .map(|d| format!("{}x{}", d.width, d.height))
                .unwrap_or_else(|| "-".to_string());
            println!("Saved {} ({} bytes, {})", path.display(), result.bytes, size);
            println!("{}  {}", sha256, path.display());
        }
        DownloadOutcome::Failed { reason } => {
            println!("Failed ({}): {}", reason.as_str(), reason);
        }
    }
    Ok(())
}
