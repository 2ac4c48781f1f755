use serde_json::json;
use tracing::info;

use crate::routes::{json_response, HttpResponse};
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// GET /training-stats
// ---------------------------------------------------------------------------

pub fn handle_training_stats(state: &SharedState) -> HttpResponse {
    json_response(200, &state.detector.corpus_readiness())
}

// ---------------------------------------------------------------------------
// POST /retrain
// ---------------------------------------------------------------------------

/// Reloads the reference corpus from disk. Predictions running meanwhile
/// keep using the corpus they started with.
pub fn handle_retrain(state: &SharedState) -> HttpResponse {
    info!("corpus reload requested");
    let summary = state.detector.reload_corpus();
    json_response(200, &json!({
        "success":          true,
        "message":          "Model retrained successfully",
        "infected_samples": summary.infected_samples,
        "healthy_samples":  summary.healthy_samples,
        "total_samples":    summary.total_samples,
        "skipped_files":    summary.skipped_files,
    }))
}
