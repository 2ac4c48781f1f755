//! Image → feature vector.
//!
//! Both the corpus loader and the per-request path go through
//! `extract_from_image`, so reference and query vectors are always computed
//! from the same canonical resize.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::error::ExtractionError;
use crate::features::feature_vector::FeatureVector;

/// Side length of the square every image is resampled to before measuring.
pub const CANONICAL_SIZE: u32 = 224;

/// Decodes image bytes (PNG/JPEG/GIF/BMP) and computes their feature vector.
pub fn extract_features(bytes: &[u8]) -> Result<FeatureVector, ExtractionError> {
    let img = image::load_from_memory(bytes)?;
    extract_from_image(&img)
}

/// Reads an image file from disk and computes its feature vector.
pub fn extract_features_from_path(path: &Path) -> Result<FeatureVector, ExtractionError> {
    let bytes = std::fs::read(path)?;
    extract_features(&bytes)
}

/// Computes the feature vector of an already decoded image.
///
/// The image is resized to `CANONICAL_SIZE × CANONICAL_SIZE` and converted to
/// 8-bit RGB (alpha dropped) before any statistic is taken.
pub fn extract_from_image(img: &DynamicImage) -> Result<FeatureVector, ExtractionError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ExtractionError::Empty { width, height });
    }

    let resized = img.resize_exact(CANONICAL_SIZE, CANONICAL_SIZE, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();
    let pixel_count = rgb.width() as usize * rgb.height() as usize;
    if pixel_count == 0 {
        return Err(ExtractionError::Empty { width: rgb.width(), height: rgb.height() });
    }

    let mut sums = [0u64; 3];
    for p in rgb.pixels() {
        sums[0] += p.0[0] as u64;
        sums[1] += p.0[1] as u64;
        sums[2] += p.0[2] as u64;
    }
    let n = pixel_count as f64;
    let red_mean   = sums[0] as f64 / n;
    let green_mean = sums[1] as f64 / n;
    let blue_mean  = sums[2] as f64 / n;
    let brightness = (red_mean + green_mean + blue_mean) / 3.0;

    // Spread of per-pixel intensity, not of the individual channels.
    let variance = rgb
        .pixels()
        .map(|p| {
            let intensity = (p.0[0] as f64 + p.0[1] as f64 + p.0[2] as f64) / 3.0;
            (intensity - brightness) * (intensity - brightness)
        })
        .sum::<f64>()
        / n;
    let contrast = variance.sqrt();

    Ok(FeatureVector::new(red_mean, green_mean, blue_mean, brightness, contrast)?)
}
