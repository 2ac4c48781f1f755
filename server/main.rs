//! Arsenic detection HTTP service.
//!
//! Loads settings from `arsenic-detect.toml` and `ARSENIC_*` variables,
//! fetches the training archive if configured and missing, builds the
//! reference corpus from `<training_dir>/{infected,not_infected}`
//! and serves the JSON API on `bind_addr`.
//!
//! Run with:
//!   cargo run --release
//! Then POST an image to http://127.0.0.1:8000/predict

mod bootstrap;
mod handlers;
mod routes;
mod state;
mod util;

use std::error::Error;
use std::sync::Arc;

use tiny_http::Server;
use tracing::{info, warn};

use arsenic_detect::ServiceConfig;

use state::AppState;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = ServiceConfig::load()?;
    tracing_subscriber::fmt().with_max_level(config.level()?).init();

    let state = Arc::new(AppState::new(config));
    if let Err(e) = bootstrap::bootstrap_training_data(&state.config) {
        warn!(error = %e, "training archive unavailable; starting with local data only");
    }
    state.ensure_directories()?;

    let summary = state.detector.reload_corpus();
    let readiness = state.detector.corpus_readiness();
    info!(
        infected = summary.infected_samples,
        healthy = summary.healthy_samples,
        skipped = summary.skipped_files,
        model_ready = readiness.model_ready,
        "startup corpus loaded"
    );

    let addr = state.config.bind_addr.clone();
    let server = Server::http(addr.as_str())?;
    info!(addr = %addr, training_dir = %state.config.training_dir.display(), "arsenic-detect listening");

    // One thread per request; a reload never blocks concurrent predictions.
    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }
    Ok(())
}
