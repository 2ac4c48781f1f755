use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{classify, ClassificationResult};
use crate::corpus::{count_images, CorpusSource, CorpusStore, Label, LoadReport, ReferenceCorpus};
use crate::error::PredictError;
use crate::features::{extract_features, FeatureVector};

/// Sizes after a corpus reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub infected_samples: usize,
    pub healthy_samples:  usize,
    pub total_samples:    usize,
    /// Reference images that failed extraction and were left out.
    pub skipped_files:    usize,
}

/// Whether the service has reference data for both classes.
///
/// `infected_count` / `healthy_count` come from the directory listings
/// (uncapped); the `loaded_*` fields describe the corpus actually in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub infected_count:        usize,
    pub healthy_count:         usize,
    pub total_training_images: usize,
    pub model_ready:           bool,
    pub loaded_infected:       usize,
    pub loaded_healthy:        usize,
}

/// The classification pipeline as seen by the HTTP layer.
///
/// Owns the corpus store; all methods take `&self` and may be called from
/// any number of request threads at once.
#[derive(Debug)]
pub struct DetectionService {
    source: CorpusSource,
    store:  CorpusStore,
}

impl DetectionService {
    /// Creates a service with an empty corpus. Call `reload_corpus` to load
    /// reference images.
    pub fn new(source: CorpusSource) -> Self {
        DetectionService { source, store: CorpusStore::default() }
    }

    pub fn source(&self) -> &CorpusSource {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<ReferenceCorpus> {
        self.store.snapshot()
    }

    /// Extracts features from an uploaded image and classifies them.
    pub fn predict(&self, image_bytes: &[u8]) -> Result<ClassificationResult, PredictError> {
        let features = extract_features(image_bytes)?;
        self.classify_features(&features)
    }

    pub fn classify_features(&self, features: &FeatureVector) -> Result<ClassificationResult, PredictError> {
        let corpus = self.store.snapshot();
        let result = classify(features, &corpus)?;
        debug!(
            label = %result.label,
            confidence = result.confidence,
            basis = ?result.basis,
            "sample classified"
        );
        Ok(result)
    }

    /// Rebuilds the corpus from disk and swaps it in.
    pub fn reload_corpus(&self) -> ReloadSummary {
        self.reload_corpus_with_report().1
    }

    /// As `reload_corpus`, also returning the per-class load report.
    pub fn reload_corpus_with_report(&self) -> (LoadReport, ReloadSummary) {
        let (corpus, report) = self.store.rebuild_with(|| {
            let load = self.source.load();
            (load.corpus, load.report)
        });

        let summary = ReloadSummary {
            infected_samples: corpus.len(Label::Infected),
            healthy_samples:  corpus.len(Label::NotInfected),
            total_samples:    corpus.total(),
            skipped_files:    report.skipped_count(),
        };
        info!(
            infected = summary.infected_samples,
            healthy = summary.healthy_samples,
            skipped = summary.skipped_files,
            "reference corpus reloaded"
        );
        (report, summary)
    }

    pub fn corpus_readiness(&self) -> Readiness {
        let infected_count = count_images(self.source.dir(Label::Infected));
        let healthy_count  = count_images(self.source.dir(Label::NotInfected));
        let corpus = self.store.snapshot();
        Readiness {
            infected_count,
            healthy_count,
            total_training_images: infected_count + healthy_count,
            model_ready:           infected_count > 0 && healthy_count > 0,
            loaded_infected:       corpus.len(Label::Infected),
            loaded_healthy:        corpus.len(Label::NotInfected),
        }
    }
}
