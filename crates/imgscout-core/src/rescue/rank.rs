//! Ranking of source-page images by declared area.

use crate::browser::ImageSnapshot;
use crate::validate::is_data_uri;

/// Whether an image is big enough to be content rather than an icon or UI chrome:
/// at least one declared dimension must exceed `min_dimension`.
pub fn is_large_enough(img: &ImageSnapshot, min_dimension: u32) -> bool {
    img.width > min_dimension || img.height > min_dimension
}

fn area(img: &ImageSnapshot) -> u64 {
    u64::from(img.width) * u64::from(img.height)
}

/// Images worth downloading, largest declared area first. Equal areas keep DOM order.
pub fn rank_images(images: &[ImageSnapshot], min_dimension: u32) -> Vec<&ImageSnapshot> {
    let mut survivors: Vec<&ImageSnapshot> = images
        .iter()
        .filter(|img| {
            let src = img.src.trim();
            !src.is_empty() && !is_data_uri(src) && is_large_enough(img, min_dimension)
        })
        .collect();
    // sort_by is stable, so ties stay in first-seen order.
    survivors.sort_by(|a, b| area(b).cmp(&area(a)));
    survivors
}

/// The single best image, if any survives filtering.
pub fn best_image(images: &[ImageSnapshot], min_dimension: u32) -> Option<&ImageSnapshot> {
    rank_images(images, min_dimension).into_iter().next()
}
