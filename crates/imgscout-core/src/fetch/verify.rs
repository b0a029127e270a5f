//! Decode check for persisted downloads.

use crate::candidate::Dimensions;
use image::ImageReader;
use std::path::Path;

/// Fully decodes the file at `path` (format sniffed from content, not the extension)
/// and returns its size. The error string is a human-readable decode failure.
pub fn decode_dimensions(path: &Path) -> Result<Dimensions, String> {
    let img = ImageReader::open(path)
        .map_err(|e| format!("open {}: {}", path.display(), e))?
        .with_guessed_format()
        .map_err(|e| format!("sniff {}: {}", path.display(), e))?
        .decode()
        .map_err(|e| e.to_string())?;
    Ok(Dimensions {
        width: img.width(),
        height: img.height(),
    })
}
