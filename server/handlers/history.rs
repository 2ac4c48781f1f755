use serde::Serialize;

use arsenic_detect::PredictionSummary;

use crate::routes::{json_response, HttpResponse};
use crate::state::SharedState;

/// `GET /predictions`
pub fn handle_predictions(state: &SharedState) -> HttpResponse {
    json_response(200, &state.predictions.all())
}

#[derive(Serialize)]
struct DashboardStats {
    total_users: usize,
    #[serde(flatten)]
    predictions: PredictionSummary,
}

/// `GET /stats`: user count plus prediction totals for the admin dashboard.
pub fn handle_stats(state: &SharedState) -> HttpResponse {
    json_response(200, &DashboardStats {
        total_users: state.users.len(),
        predictions: state.predictions.summary(),
    })
}
