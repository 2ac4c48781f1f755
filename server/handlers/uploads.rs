use crate::routes::{bytes_response, not_found, HttpResponse};
use crate::state::SharedState;

/// `GET /uploads/{name}`
///
/// Serves a stored upload. Only bare file names are accepted.
pub fn handle_get(name: &str, state: &SharedState) -> HttpResponse {
    if !is_plain_file_name(name) {
        return not_found();
    }

    match std::fs::read(state.config.upload_path(name)) {
        Ok(bytes) => bytes_response(200, content_type_for(name), bytes),
        Err(_) => not_found(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.contains('%')
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "png"          => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif"          => "image/gif",
        "bmp"          => "image/bmp",
        "webp"         => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _              => "application/octet-stream",
    }
}
