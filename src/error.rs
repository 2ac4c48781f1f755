use thiserror::Error;

use crate::corpus::label::Label;

/// A feature component came out as NaN or infinity.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("feature `{name}` is not finite ({value})")]
pub struct NonFiniteFeature {
    pub name: &'static str,
    pub value: f64,
}

/// Why an image could not be turned into a feature vector.
///
/// Every variant is local to a single image: the caller rejects that image
/// (a client error for uploads, a skipped file for the corpus loader) and
/// carries on.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read image: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error(transparent)]
    NonFinite(#[from] NonFiniteFeature),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("distance to the nearest {label} reference is not finite")]
    NonFiniteDistance { label: Label },
}

/// Outcome of a failed prediction. `Extraction` is the caller's fault,
/// `Classify` is ours.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl PredictError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, PredictError::Extraction(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("User already exists")]
    AlreadyExists,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Field `{0}` is required")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
