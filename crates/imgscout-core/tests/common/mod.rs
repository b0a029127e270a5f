#![allow(dead_code)]

pub mod fake_session;
pub mod image_server;

use image::{ImageFormat, Rgb, RgbImage};
use imgscout_core::config::ScoutConfig;
use std::io::Cursor;
use std::path::Path;

/// PNG bytes of a `w`×`h` solid image.
pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::from_pixel(w, h, Rgb([200, 40, 40]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Defaults with all pacing removed and output under `dir`.
pub fn test_config(dir: &Path) -> ScoutConfig {
    let mut cfg = ScoutConfig::default();
    cfg.output_dir = dir.to_path_buf();
    cfg.search_url_template = "http://listing.test/search?q={query}".to_string();
    cfg.browser = cfg.browser.without_pacing();
    cfg.fetch.connect_timeout_secs = 2;
    cfg.fetch.timeout_secs = 5;
    cfg
}

/// File names in `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
