//! `imgscout augment` – write augmented variants of a directory of images.

use anyhow::Result;
use imgscout_core::augment;
use imgscout_core::config::AugmentConfig;
use std::path::Path;

pub fn run_augment(cfg: &AugmentConfig, input: &Path, output: &Path) -> Result<()> {
    let summary = augment::augment_dir(input, output, cfg)?;
    println!(
        "Augmented {} image(s) into {} ({} files, {} failed)",
        summary.processed,
        output.display(),
        summary.written,
        summary.failed
    );
    Ok(())
}
