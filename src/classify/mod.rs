pub mod nearest;
pub mod result;

pub use nearest::{classify, classify_with_rng, CONFIDENCE_FLOOR, NO_DATA_CONFIDENCE, SINGLE_CLASS_CONFIDENCE, TIE_CONFIDENCE};
pub use result::{ClassificationBasis, ClassificationResult, NeighborDistances};
