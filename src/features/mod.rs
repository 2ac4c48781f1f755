pub mod extractor;
pub mod feature_vector;

pub use extractor::{extract_features, extract_features_from_path, extract_from_image, CANONICAL_SIZE};
pub use feature_vector::{FeatureVector, FEATURE_LEN, FEATURE_NAMES};
