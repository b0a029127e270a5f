//! CLI for imgscout.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use imgscout_core::config;
use std::path::PathBuf;

use commands::{run_augment, run_fetch, run_scrape, ScrapeOptions};

/// Top-level CLI for imgscout.
#[derive(Debug, Parser)]
#[command(name = "imgscout")]
#[command(about = "imgscout: collect full-resolution images from image search results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Search each query and download the best image behind every result.
    Scrape {
        /// Search queries (defaults to `queries` from the config file).
        queries: Vec<String>,

        /// Successful downloads per query.
        #[arg(long, value_name = "N")]
        quota: Option<usize>,

        /// Directory receiving the images.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Skip content-type and decode checks when fetching.
        #[arg(long)]
        lenient: bool,

        /// Show the browser window.
        #[arg(long)]
        headful: bool,

        /// Write the run report as JSON to FILE.
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Download and verify a single image URL.
    Fetch {
        /// Direct image URL.
        url: String,

        /// Alt text used to name the file.
        #[arg(long)]
        alt: Option<String>,

        /// Directory receiving the image.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Skip content-type and decode checks.
        #[arg(long)]
        lenient: bool,
    },

    /// Write rotated, contrast, brightness, flipped and noisy variants of every image in a directory.
    Augment {
        /// Directory of source images.
        input_dir: PathBuf,

        /// Directory receiving the variants.
        output_dir: PathBuf,

        /// Seed for the noise variant.
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scrape {
                queries,
                quota,
                output_dir,
                lenient,
                headful,
                report,
            } => {
                if let Some(q) = quota {
                    cfg.per_query_quota = q;
                }
                if let Some(dir) = output_dir {
                    cfg.output_dir = dir;
                }
                if lenient {
                    cfg.fetch = cfg.fetch.lenient();
                }
                if headful {
                    cfg.browser.headless = false;
                }
                let queries = if queries.is_empty() {
                    cfg.queries.clone()
                } else {
                    queries
                };
                run_scrape(&cfg, ScrapeOptions { queries, report })?;
            }
            CliCommand::Fetch {
                url,
                alt,
                output_dir,
                lenient,
            } => {
                if let Some(dir) = output_dir {
                    cfg.output_dir = dir;
                }
                if lenient {
                    cfg.fetch = cfg.fetch.lenient();
                }
                run_fetch(&cfg, &url, alt)?;
            }
            CliCommand::Augment {
                input_dir,
                output_dir,
                seed,
            } => {
                if seed.is_some() {
                    cfg.augment.noise_seed = seed;
                }
                run_augment(&cfg.augment, &input_dir, &output_dir)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
