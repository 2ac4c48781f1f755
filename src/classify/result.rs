use serde::Serialize;

use crate::corpus::Label;

/// Which path of the classifier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBasis {
    /// Both classes had references; label and confidence come from distances.
    NearestNeighbor,
    /// Only one class had references; its label is returned with a random
    /// confidence.
    SingleClass,
    /// No references at all; a fixed label with a random confidence.
    NoReferenceData,
}

/// Nearest-neighbor distances to each class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeighborDistances {
    pub infected:     f64,
    pub not_infected: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label:      Label,
    /// Pseudo-probability in [0, 1]; not calibrated.
    pub confidence: f64,
    pub basis:      ClassificationBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distances:  Option<NeighborDistances>,
}

impl ClassificationResult {
    /// True when the result was not derived from reference data on both
    /// sides and should not be presented as a real classification.
    pub fn is_placeholder(&self) -> bool {
        self.basis != ClassificationBasis::NearestNeighbor
    }
}
