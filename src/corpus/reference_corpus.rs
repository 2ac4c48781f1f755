use chrono::{DateTime, Local};

use crate::corpus::label::Label;
use crate::features::FeatureVector;

/// Reference feature vectors for both classes.
///
/// A corpus is never edited after construction: reloading builds a new one
/// and the store swaps it in whole.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCorpus {
    infected:     Vec<FeatureVector>,
    not_infected: Vec<FeatureVector>,
    /// When the loader produced this corpus; `None` for the startup placeholder.
    loaded_at:    Option<DateTime<Local>>,
}

impl ReferenceCorpus {
    /// The placeholder corpus installed before the first load completes.
    pub fn empty() -> Self {
        ReferenceCorpus::default()
    }

    pub fn new(infected: Vec<FeatureVector>, not_infected: Vec<FeatureVector>) -> Self {
        ReferenceCorpus { infected, not_infected, loaded_at: Some(Local::now()) }
    }

    pub fn references(&self, label: Label) -> &[FeatureVector] {
        match label {
            Label::Infected    => &self.infected,
            Label::NotInfected => &self.not_infected,
        }
    }

    pub fn len(&self, label: Label) -> usize {
        self.references(label).len()
    }

    pub fn total(&self) -> usize {
        self.infected.len() + self.not_infected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Both classes have at least one reference vector.
    pub fn is_ready(&self) -> bool {
        !self.infected.is_empty() && !self.not_infected.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }
}
