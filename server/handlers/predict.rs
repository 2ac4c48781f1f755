use std::io::Read;

use serde_json::json;
use tiny_http::Request;
use tracing::{error, info, warn};
use uuid::Uuid;

use arsenic_detect::{Label, PredictError};

use crate::routes::{error_response, json_response, request_header, HttpResponse};
use crate::state::SharedState;
use crate::util::form::{form_get, parse_form};
use crate::util::multipart::{extract_boundary, find_file, text_field};

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

/// Accepts one image under the multipart field `file`, stores it in the
/// upload directory and classifies it against the current corpus.
///
/// An optional `user_id` (multipart text field or query parameter) is kept
/// with the history record.
pub fn handle_predict(request: &mut Request, query: &str, state: &SharedState) -> HttpResponse {
    let limit = state.config.max_upload_bytes;
    if request.body_length().map_or(false, |len| len > limit) {
        return error_response(413, "File too large");
    }

    let content_type = request_header(request, "Content-Type").unwrap_or_default();
    let mut body: Vec<u8> = Vec::new();
    if let Err(e) = request.as_reader().take(limit as u64 + 1).read_to_end(&mut body) {
        warn!(error = %e, "failed to read upload body");
        return error_response(400, "Could not read request body");
    }
    process_upload(&content_type, &body, query, state)
}

/// Everything after the body has been read. `body` may be one byte over the
/// limit, which is answered with 413.
fn process_upload(content_type: &str, body: &[u8], query: &str, state: &SharedState) -> HttpResponse {
    if body.len() > state.config.max_upload_bytes {
        return error_response(413, "File too large");
    }

    let boundary = match extract_boundary(content_type) {
        Some(b) if content_type.starts_with("multipart/form-data") => b,
        _ => return error_response(400, "Expected a multipart/form-data upload"),
    };

    let part = match find_file(body, &boundary, "file") {
        Some(p) if !p.data.is_empty() => p,
        _ => return error_response(400, "No file was uploaded"),
    };
    let is_image = part.content_type.as_deref().map_or(false, |ct| ct.starts_with("image/"));
    if !is_image {
        return error_response(400, "File must be an image");
    }

    let user_id = text_field(body, &boundary, "user_id")
        .or_else(|| form_get(&parse_form(query), "user_id").map(str::to_owned))
        .and_then(|s| s.trim().parse::<u64>().ok());

    let extension = file_extension(&part.filename, part.content_type.as_deref());
    let filename  = format!("{}.{}", Uuid::new_v4().simple(), extension);
    let path      = state.config.upload_path(&filename);

    if let Err(e) = std::fs::write(&path, &part.data) {
        error!(error = %e, path = %path.display(), "failed to store upload");
        return error_response(500, "Could not store uploaded file");
    }

    let result = match state.detector.predict(&part.data) {
        Ok(r) => r,
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            return prediction_failure(&e);
        }
    };

    let record = state.predictions.record(&filename, &result, user_id);
    info!(
        id = record.id,
        filename = %filename,
        label = %result.label,
        confidence = result.confidence,
        "prediction recorded"
    );

    let recommendation = match result.label {
        Label::Infected    => "Seek expert advice for treatment",
        Label::NotInfected => "Sample is healthy",
    };
    json_response(200, &json!({
        "success":        true,
        "result":         result.label,
        "confidence":     result.confidence,
        "basis":          result.basis,
        "placeholder":    result.is_placeholder(),
        "filename":       filename,
        "image_url":      record.image_url,
        "message":        format!("Sample appears to be {}", result.label.human()),
        "recommendation": recommendation,
    }))
}

fn prediction_failure(e: &PredictError) -> HttpResponse {
    if e.is_client_error() {
        warn!(error = %e, "upload could not be processed");
        error_response(400, "Could not process image")
    } else {
        error!(error = %e, "prediction failed");
        error_response(500, "Prediction error")
    }
}

/// Extension for the stored copy: the client's own if it is short and
/// alphanumeric, else one derived from the part's content type.
fn file_extension(filename: &str, content_type: Option<&str>) -> String {
    let from_name = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext.to_ascii_lowercase();
    }

    match content_type.and_then(|ct| ct.strip_prefix("image/")) {
        Some("jpeg") => "jpg".to_owned(),
        Some(sub) if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()) => sub.to_ascii_lowercase(),
        _ => "img".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response_json;
    use crate::state::test_state;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const MULTIPART: &str = "multipart/form-data; boundary=XyZ";

    fn png(v: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([v, v, v])))
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    fn upload(filename: &str, part_type: &str, data: &[u8], user_id: Option<&str>) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(id) = user_id {
            out.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n");
            out.extend_from_slice(id.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!(
            "--XyZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            filename, part_type
        ).as_bytes());
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n--XyZ--\r\n");
        out
    }

    fn stored_uploads(state: &SharedState) -> usize {
        std::fs::read_dir(&state.config.upload_dir).unwrap().count()
    }

    #[test]
    fn accepted_image_is_stored_classified_and_logged() {
        let (_dir, state) = test_state();
        let body = upload("leaf.png", "image/png", &png(90), Some("7"));

        let (status, json) = response_json(process_upload(MULTIPART, &body, "", &state));
        assert_eq!(status, 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["result"], "not_infected");
        assert_eq!(json["basis"], "no_reference_data");
        assert_eq!(json["placeholder"], true);
        assert_eq!(json["message"], "Sample appears to be not infected");
        assert_eq!(json["recommendation"], "Sample is healthy");

        let filename = json["filename"].as_str().unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(json["image_url"], format!("/uploads/{}", filename));
        assert!(state.config.upload_path(filename).is_file());

        let history = state.predictions.all();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, filename);
        assert_eq!(history[0].user_id, Some(7));
    }

    #[test]
    fn user_id_may_come_from_the_query() {
        let (_dir, state) = test_state();
        let body = upload("a.png", "image/png", &png(10), None);
        assert_eq!(response_json(process_upload(MULTIPART, &body, "user_id=3", &state)).0, 200);
        assert_eq!(state.predictions.all()[0].user_id, Some(3));
    }

    #[test]
    fn oversized_body_is_413() {
        let (_dir, state) = test_state();
        let body = vec![b'x'; state.config.max_upload_bytes + 1];
        let (status, json) = response_json(process_upload(MULTIPART, &body, "", &state));
        assert_eq!(status, 413);
        assert_eq!(json["detail"], "File too large");
        assert_eq!(stored_uploads(&state), 0);
    }

    #[test]
    fn non_image_part_is_rejected() {
        let (_dir, state) = test_state();
        let body = upload("notes.txt", "text/plain", b"hello", None);
        let (status, json) = response_json(process_upload(MULTIPART, &body, "", &state));
        assert_eq!(status, 400);
        assert_eq!(json["detail"], "File must be an image");
        assert_eq!(stored_uploads(&state), 0);
        assert!(state.predictions.is_empty());
    }

    #[test]
    fn undecodable_image_is_400_and_leaves_nothing_behind() {
        let (_dir, state) = test_state();
        let body = upload("fake.png", "image/png", b"\x89PNG but truncated", None);
        let (status, json) = response_json(process_upload(MULTIPART, &body, "", &state));
        assert_eq!(status, 400);
        assert_eq!(json["detail"], "Could not process image");
        assert_eq!(stored_uploads(&state), 0);
        assert!(state.predictions.is_empty());
    }

    #[test]
    fn missing_multipart_or_file_is_400() {
        let (_dir, state) = test_state();
        let (status, _) = response_json(process_upload("application/json", b"{}", "", &state));
        assert_eq!(status, 400);

        let only_text = b"--XyZ\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n1\r\n--XyZ--\r\n";
        let (status, json) = response_json(process_upload(MULTIPART, only_text, "", &state));
        assert_eq!(status, 400);
        assert_eq!(json["detail"], "No file was uploaded");
    }

    #[test]
    fn keeps_client_extension_lowercased() {
        assert_eq!(file_extension("Leaf.PNG", Some("image/png")), "png");
        assert_eq!(file_extension("a.b.jpeg", None), "jpeg");
    }

    #[test]
    fn falls_back_to_content_type() {
        assert_eq!(file_extension("noext", Some("image/jpeg")), "jpg");
        assert_eq!(file_extension("x.../../etc", Some("image/bmp")), "bmp");
        assert_eq!(file_extension("", Some("image/svg+xml")), "img");
        assert_eq!(file_extension("", None), "img");
    }
}
