//! Offline augmentation of a directory of downloaded images.
//!
//! Each input (sorted by file name, position `i`) yields `rotated_{i}_{angle}.jpg`,
//! `contrast_{i}.jpg`, `bright_{i}.jpg`, `flip_{i}.jpg` and `noise_{i}.jpg`.

mod transforms;

pub use transforms::{add_noise, brightness, contrast, flip, rotate};

use crate::config::AugmentConfig;
use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AugmentSummary {
    /// Inputs for which every variant was written.
    pub processed: usize,
    pub failed: usize,
    /// Total output files written.
    pub written: usize,
}

/// Regular files directly inside `dir`, sorted by name.
fn input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn load_rgb(path: &Path) -> Result<RgbImage, AugmentError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| AugmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let img = reader.decode().map_err(|source| AugmentError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

fn save_jpeg(img: &RgbImage, path: PathBuf) -> Result<(), AugmentError> {
    img.save_with_format(&path, ImageFormat::Jpeg)
        .map_err(|source| AugmentError::Write { path, source })
}

/// Writes every variant of `img`; returns how many files were written.
fn augment_one(
    img: &RgbImage,
    index: usize,
    output: &Path,
    cfg: &AugmentConfig,
    rng: &mut StdRng,
) -> Result<usize, AugmentError> {
    let mut written = 0;
    for angle in &cfg.rotation_angles {
        save_jpeg(
            &rotate(img, f64::from(*angle)),
            output.join(format!("rotated_{}_{}.jpg", index, angle)),
        )?;
        written += 1;
    }
    save_jpeg(&contrast(img, cfg.contrast), output.join(format!("contrast_{}.jpg", index)))?;
    save_jpeg(&brightness(img, cfg.brightness), output.join(format!("bright_{}.jpg", index)))?;
    written += 2;
    if cfg.flip {
        save_jpeg(&flip(img), output.join(format!("flip_{}.jpg", index)))?;
        written += 1;
    }
    if cfg.noise_max > 0 {
        save_jpeg(
            &add_noise(img, cfg.noise_max, rng),
            output.join(format!("noise_{}.jpg", index)),
        )?;
        written += 1;
    }
    Ok(written)
}

/// Augments every image in `input` into `output`. A file that cannot be decoded or written is
/// counted as failed and the rest continue.
pub fn augment_dir(input: &Path, output: &Path, cfg: &AugmentConfig) -> Result<AugmentSummary> {
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output dir {}", output.display()))?;
    let mut rng = match cfg.noise_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut summary = AugmentSummary::default();
    for (index, path) in input_files(input)?.iter().enumerate() {
        let result = load_rgb(path).and_then(|img| augment_one(&img, index, output, cfg, &mut rng));
        match result {
            Ok(written) => {
                tracing::debug!(path = %path.display(), index, written, "augmented");
                summary.processed += 1;
                summary.written += written;
            }
            Err(e) => {
                tracing::warn!(index, "skipping: {}", e);
                summary.failed += 1;
            }
        }
    }
    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        written = summary.written,
        "augmentation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn augments_every_image_and_counts_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_dir = output.path().join("aug");

        RgbImage::from_pixel(16, 12, Rgb([120, 60, 30]))
            .save_with_format(input.path().join("a.png"), ImageFormat::Png)
            .unwrap();
        fs::write(input.path().join("b.jpg"), b"not an image").unwrap();
        RgbImage::from_pixel(8, 8, Rgb([0, 200, 0]))
            .save_with_format(input.path().join("c.jpg"), ImageFormat::Jpeg)
            .unwrap();
        fs::create_dir(input.path().join("nested")).unwrap();

        let cfg = AugmentConfig {
            noise_seed: Some(1),
            ..Default::default()
        };
        let summary = augment_dir(input.path(), &out_dir, &cfg).unwrap();
        assert_eq!(
            summary,
            AugmentSummary {
                processed: 2,
                failed: 1,
                written: 16
            }
        );

        for name in [
            "rotated_0_-30.jpg",
            "rotated_0_-15.jpg",
            "rotated_0_15.jpg",
            "rotated_0_30.jpg",
            "contrast_0.jpg",
            "bright_0.jpg",
            "flip_0.jpg",
            "noise_0.jpg",
            "noise_2.jpg",
        ] {
            assert!(out_dir.join(name).exists(), "missing {}", name);
        }
        assert!(!out_dir.join("contrast_1.jpg").exists());

        let rotated = image::open(out_dir.join("rotated_0_15.jpg")).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (16, 12));
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let output = tempfile::tempdir().unwrap();
        let missing = output.path().join("nope");
        assert!(augment_dir(&missing, output.path(), &AugmentConfig::default()).is_err());
    }
}
