use rand::Rng;

use crate::classify::result::{ClassificationBasis, ClassificationResult, NeighborDistances};
use crate::corpus::{Label, ReferenceCorpus};
use crate::error::ClassifyError;
use crate::features::FeatureVector;

/// Confidence range reported when there are no references at all.
pub const NO_DATA_CONFIDENCE: (f64, f64) = (0.50, 0.75);
/// Confidence range reported when only one class has references.
pub const SINGLE_CLASS_CONFIDENCE: (f64, f64) = (0.60, 0.80);
/// Lowest confidence a nearest-neighbor decision reports.
pub const CONFIDENCE_FLOOR: f64 = 0.55;
/// Confidence for the degenerate case where both nearest distances are zero.
pub const TIE_CONFIDENCE: f64 = 0.55;

/// Classifies `query` against `corpus` using the thread-local RNG for the
/// placeholder branches.
pub fn classify(query: &FeatureVector, corpus: &ReferenceCorpus) -> Result<ClassificationResult, ClassifyError> {
    classify_with_rng(query, corpus, &mut rand::thread_rng())
}

/// Classifies `query` against `corpus`.
///
/// 1. No references → `not_infected`, confidence uniform in `NO_DATA_CONFIDENCE`.
/// 2. One class empty → the other label, confidence uniform in `SINGLE_CLASS_CONFIDENCE`.
/// 3. Otherwise the class with the nearer nearest neighbor wins, with
///    confidence `max(0.55, 1 - d_winner / (d_infected + d_not_infected))`.
///    Equal distances go to `not_infected`; both distances zero goes to
///    `infected` at `TIE_CONFIDENCE`.
///
/// The random source is only consulted in branches 1 and 2.
pub fn classify_with_rng<R: Rng>(
    query: &FeatureVector,
    corpus: &ReferenceCorpus,
    rng: &mut R,
) -> Result<ClassificationResult, ClassifyError> {
    let infected     = corpus.references(Label::Infected);
    let not_infected = corpus.references(Label::NotInfected);

    match (infected.is_empty(), not_infected.is_empty()) {
        (true, true) => {
            return Ok(placeholder(Label::NotInfected, NO_DATA_CONFIDENCE, ClassificationBasis::NoReferenceData, rng));
        }
        (true, false) => {
            return Ok(placeholder(Label::NotInfected, SINGLE_CLASS_CONFIDENCE, ClassificationBasis::SingleClass, rng));
        }
        (false, true) => {
            return Ok(placeholder(Label::Infected, SINGLE_CLASS_CONFIDENCE, ClassificationBasis::SingleClass, rng));
        }
        (false, false) => {}
    }

    let d_infected     = nearest_distance(query, infected, Label::Infected)?;
    let d_not_infected = nearest_distance(query, not_infected, Label::NotInfected)?;
    let distances = Some(NeighborDistances { infected: d_infected, not_infected: d_not_infected });

    let total = d_infected + d_not_infected;
    if total == 0.0 {
        return Ok(ClassificationResult {
            label: Label::Infected,
            confidence: TIE_CONFIDENCE,
            basis: ClassificationBasis::NearestNeighbor,
            distances,
        });
    }
    if !total.is_finite() {
        // Each distance is finite but their sum overflowed.
        return Err(ClassifyError::NonFiniteDistance { label: Label::NotInfected });
    }

    let (label, winning) = if d_infected < d_not_infected {
        (Label::Infected, d_infected)
    } else {
        (Label::NotInfected, d_not_infected)
    };
    let confidence = (1.0 - winning / total).max(CONFIDENCE_FLOOR).clamp(0.0, 1.0);

    Ok(ClassificationResult { label, confidence, basis: ClassificationBasis::NearestNeighbor, distances })
}

/// Minimum Euclidean distance from `query` to any vector in `references`.
fn nearest_distance(query: &FeatureVector, references: &[FeatureVector], label: Label) -> Result<f64, ClassifyError> {
    let nearest = references
        .iter()
        .map(|r| query.distance(r))
        .fold(f64::INFINITY, f64::min);
    if nearest.is_finite() {
        Ok(nearest)
    } else {
        Err(ClassifyError::NonFiniteDistance { label })
    }
}

fn placeholder<R: Rng>(
    label: Label,
    (low, high): (f64, f64),
    basis: ClassificationBasis,
    rng: &mut R,
) -> ClassificationResult {
    let confidence = rng.gen_range(low..=high).clamp(0.0, 1.0);
    ClassificationResult { label, confidence, basis, distances: None }
}
