use serde_json::json;

use crate::routes::{json_response, HttpResponse};

/// `GET /`
pub fn handle_root() -> HttpResponse {
    json_response(200, &json!({
        "message": "Arsenic Detection API",
        "status":  "running",
    }))
}
