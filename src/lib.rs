pub mod accounts;
pub mod classify;
pub mod corpus;
pub mod error;
pub mod features;
pub mod history;
pub mod service;
pub mod settings;

// Convenience re-exports
pub use accounts::{UserProfile, UserStore};
pub use classify::{classify, ClassificationBasis, ClassificationResult};
pub use corpus::{load_corpus, CorpusSource, CorpusStore, Label, ReferenceCorpus};
pub use error::{AccountError, ClassifyError, ConfigError, ExtractionError, PredictError};
pub use features::{extract_features, extract_features_from_path, FeatureVector};
pub use history::{PredictionLog, PredictionRecord, PredictionSummary};
pub use service::{DetectionService, Readiness, ReloadSummary};
pub use settings::ServiceConfig;
