use std::sync::Arc;

use arsenic_detect::{DetectionService, Label, PredictionLog, ServiceConfig, UserStore};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything a request handler may touch.
///
/// Each member synchronises itself internally, so the state is shared as a
/// plain `Arc` and handlers never hold a lock across another component.
pub struct AppState {
    pub config:      ServiceConfig,
    /// Feature extraction, reference corpus and classification.
    pub detector:    DetectionService,
    pub users:       UserStore,
    pub predictions: PredictionLog,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let detector = DetectionService::new(config.corpus_source());
        AppState {
            config,
            detector,
            users:       UserStore::new(),
            predictions: PredictionLog::new(),
        }
    }

    /// Creates the upload directory and both reference directories if they
    /// are missing.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config.upload_dir)?;
        for label in Label::ALL {
            std::fs::create_dir_all(self.config.class_dir(label))?;
        }
        Ok(())
    }
}

/// Handle cloned into every request thread.
pub type SharedState = Arc<AppState>;

/// Fresh state rooted in a temporary directory, with directories created
/// and a 64 KiB upload limit.
#[cfg(test)]
pub fn test_state() -> (tempfile::TempDir, SharedState) {
    let dir = tempfile::TempDir::new().unwrap();
    let config = ServiceConfig {
        training_dir:     dir.path().join("training_data"),
        upload_dir:       dir.path().join("uploads"),
        max_upload_bytes: 64 * 1024,
        ..ServiceConfig::default()
    };
    let state = AppState::new(config);
    state.ensure_directories().unwrap();
    (dir, Arc::new(state))
}
