//! Pixel transforms on RGB images. All of them keep the input size.

use image::{imageops, Rgb, RgbImage};
use rand::Rng;

/// Rotates counter-clockwise by `degrees` about the centre. The canvas keeps its size;
/// corners that uncover are black. Nearest-neighbour sampling.
pub fn rotate(img: &RgbImage, degrees: f64) -> RgbImage {
    let (w, h) = img.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = f64::from(w) / 2.0;
    let cy = f64::from(h) / 2.0;

    RgbImage::from_fn(w, h, |x, y| {
        let dx = f64::from(x) + 0.5 - cx;
        let dy = f64::from(y) + 0.5 - cy;
        // Inverse mapping: where did this output pixel come from?
        let sx = (dx * cos - dy * sin + cx).floor();
        let sy = (dx * sin + dy * cos + cy).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < f64::from(w) && sy < f64::from(h) {
            *img.get_pixel(sx as u32, sy as u32)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn luminance(p: &Rgb<u8>) -> f64 {
    let [r, g, b] = p.0;
    (299.0 * f64::from(r) + 587.0 * f64::from(g) + 114.0 * f64::from(b)) / 1000.0
}

fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Scales each channel's distance from the mean luminance by `factor`.
pub fn contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let count = u64::from(img.width()) * u64::from(img.height());
    if count == 0 {
        return img.clone();
    }
    let mean = (img.pixels().map(luminance).sum::<f64>() / count as f64).round();
    let factor = f64::from(factor);
    let mut out = img.clone();
    for p in out.pixels_mut() {
        for c in p.0.iter_mut() {
            *c = clamp_channel(mean + factor * (f64::from(*c) - mean));
        }
    }
    out
}

/// Multiplies every channel by `factor`, clamped to 255.
pub fn brightness(img: &RgbImage, factor: f32) -> RgbImage {
    let factor = f64::from(factor);
    let mut out = img.clone();
    for p in out.pixels_mut() {
        for c in p.0.iter_mut() {
            *c = clamp_channel(f64::from(*c) * factor);
        }
    }
    out
}

pub fn flip(img: &RgbImage) -> RgbImage {
    imageops::flip_horizontal(img)
}

/// Adds uniform noise in `[0, max)` to every channel, saturating at 255.
pub fn add_noise<R: Rng + ?Sized>(img: &RgbImage, max: u8, rng: &mut R) -> RgbImage {
    let mut out = img.clone();
    if max == 0 {
        return out;
    }
    for p in out.pixels_mut() {
        for c in p.0.iter_mut() {
            *c = c.saturating_add(rng.gen_range(0..max));
        }
    }
    out
}
