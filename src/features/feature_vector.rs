use serde::Serialize;

use crate::error::NonFiniteFeature;

/// Number of components in a feature vector.
pub const FEATURE_LEN: usize = 5;

/// Component names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_LEN] =
    ["red_mean", "green_mean", "blue_mean", "brightness", "contrast"];

/// Crude pixel statistics summarising one image.
///
/// Fields:
/// - `red_mean`, `green_mean`, `blue_mean`: per-channel means on the 0–255 scale
/// - `brightness`: mean of the three channel means
/// - `contrast`: population standard deviation of per-pixel intensity
///   `(r + g + b) / 3` around `brightness`
///
/// Every component is finite; the constructors refuse anything else, so a
/// `FeatureVector` in hand is always safe to measure distances with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    red_mean: f64,
    green_mean: f64,
    blue_mean: f64,
    brightness: f64,
    contrast: f64,
}

impl FeatureVector {
    pub fn new(
        red_mean: f64,
        green_mean: f64,
        blue_mean: f64,
        brightness: f64,
        contrast: f64,
    ) -> Result<FeatureVector, NonFiniteFeature> {
        FeatureVector::from_array([red_mean, green_mean, blue_mean, brightness, contrast])
    }

    /// Builds a vector from components in `FEATURE_NAMES` order.
    pub fn from_array(components: [f64; FEATURE_LEN]) -> Result<FeatureVector, NonFiniteFeature> {
        if let Some((i, &value)) = components.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(NonFiniteFeature { name: FEATURE_NAMES[i], value });
        }
        let [red_mean, green_mean, blue_mean, brightness, contrast] = components;
        Ok(FeatureVector { red_mean, green_mean, blue_mean, brightness, contrast })
    }

    pub fn to_array(&self) -> [f64; FEATURE_LEN] {
        [self.red_mean, self.green_mean, self.blue_mean, self.brightness, self.contrast]
    }

    pub fn red_mean(&self) -> f64 { self.red_mean }
    pub fn green_mean(&self) -> f64 { self.green_mean }
    pub fn blue_mean(&self) -> f64 { self.blue_mean }
    pub fn brightness(&self) -> f64 { self.brightness }
    pub fn contrast(&self) -> f64 { self.contrast }

    /// Euclidean distance in the 5-dimensional feature space.
    ///
    /// Can overflow to infinity for absurdly large components even though
    /// both inputs are finite; callers that need a finite answer must check.
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}
