use std::io::Cursor;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use crate::handlers;
use crate::state::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Builds a header, dropping it if either side is not a valid header token.
pub fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

pub fn bytes_response(status: u16, content_type: &str, bytes: Vec<u8>) -> HttpResponse {
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        header("Content-Type", content_type).into_iter().collect(),
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => bytes_response(status, "application/json", bytes),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            error_response(500, "Internal Server Error")
        }
    }
}

/// `{"detail": "..."}` with the given status.
pub fn error_response(status: u16, detail: &str) -> HttpResponse {
    let body = serde_json::json!({ "detail": detail }).to_string().into_bytes();
    bytes_response(status, "application/json", body)
}

pub fn not_found() -> HttpResponse {
    error_response(404, "Not Found")
}

pub fn no_content() -> HttpResponse {
    Response::new(StatusCode(204), Vec::new(), Cursor::new(Vec::new()), Some(0), None)
}

/// Case-insensitive lookup of a request header.
pub fn request_header(request: &Request, name: &'static str) -> Option<String> {
    request.headers().iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_owned())
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// Headers attached to every response for the given request `Origin`.
///
/// A listed origin (or any origin when `*` is listed) is echoed back with
/// credentials allowed. Requests without an `Origin` get nothing.
pub fn cors_headers(origin: Option<&str>, allowed: &[String]) -> Vec<Header> {
    let Some(origin) = origin else { return Vec::new() };
    let permitted = allowed.iter().any(|o| o == "*" || o == origin);
    if !permitted {
        return Vec::new();
    }
    [
        header("Access-Control-Allow-Origin", origin),
        header("Access-Control-Allow-Credentials", "true"),
        header("Vary", "Origin"),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Answer to an `OPTIONS` preflight: every method the API serves and
/// whatever headers the browser asked for.
fn preflight(request: &Request) -> HttpResponse {
    let requested = request_header(request, "Access-Control-Request-Headers")
        .unwrap_or_else(|| "Content-Type".to_owned());
    [
        header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        header("Access-Control-Allow-Headers", &requested),
        header("Access-Control-Max-Age", "600"),
    ]
    .into_iter()
    .flatten()
    .fold(no_content(), |resp, h| resp.with_header(h))
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request to its handler and sends the response.
///
/// Handlers borrow the request so the dispatcher keeps ownership and can
/// attach CORS headers before responding.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();

    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p.to_owned(), q.to_owned()),
        None         => (url.clone(), String::new()),
    };
    debug!(%method, path = %path, "request");

    let origin = request_header(&request, "Origin");
    let cors   = cors_headers(origin.as_deref(), &state.config.allowed_origins);

    let response = if method == Method::Options {
        preflight(&request)
    } else if method == Method::Get && path.starts_with("/uploads/") {
        let name = path.strip_prefix("/uploads/").unwrap_or("");
        handlers::uploads::handle_get(name, &state)
    } else {
        match (method, path.as_str()) {
            // ── Status ───────────────────────────────────────────────────
            (Method::Get, "/") => handlers::status::handle_root(),

            // ── Accounts ─────────────────────────────────────────────────
            (Method::Post, "/register") => handlers::accounts::handle_register(&mut request, &query, &state),
            (Method::Post, "/login")    => handlers::accounts::handle_login(&mut request, &query, &state),
            (Method::Get,  "/users")    => handlers::accounts::handle_users(&state),

            // ── Prediction ───────────────────────────────────────────────
            (Method::Post, "/predict")     => handlers::predict::handle_predict(&mut request, &query, &state),
            (Method::Get,  "/predictions") => handlers::history::handle_predictions(&state),
            (Method::Get,  "/stats")       => handlers::history::handle_stats(&state),

            // ── Reference corpus ─────────────────────────────────────────
            (Method::Get,  "/training-stats") => handlers::training::handle_training_stats(&state),
            (Method::Post, "/retrain")        => handlers::training::handle_retrain(&state),

            // ── 404 ──────────────────────────────────────────────────────
            _ => not_found(),
        }
    };

    let response = cors.into_iter().fold(response, |resp, h| resp.with_header(h));
    if let Err(e) = request.respond(response) {
        warn!(error = %e, path = %path, "failed to send response");
    }
}

/// Status and decoded JSON body of a response built by a handler.
#[cfg(test)]
pub fn response_json(response: HttpResponse) -> (u16, serde_json::Value) {
    let status = response.status_code().0;
    let body = response.into_reader().into_inner();
    (status, serde_json::from_slice(&body).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    /// Sends one raw HTTP request through `dispatch` and returns the raw reply.
    fn exchange(state: SharedState, raw: &str) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();

        let request = server.recv().unwrap();
        dispatch(request, state);

        let mut reply = String::new();
        stream.read_to_string(&mut reply).unwrap();
        reply
    }

    fn origins(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn names(headers: &[Header]) -> Vec<String> {
        headers.iter().map(|h| h.field.as_str().as_str().to_owned()).collect()
    }

    #[test]
    fn listed_origin_is_echoed_with_credentials() {
        let hs = cors_headers(Some("http://localhost:5173"), &origins(&["http://localhost:5173"]));
        assert_eq!(names(&hs), vec!["Access-Control-Allow-Origin", "Access-Control-Allow-Credentials", "Vary"]);
        assert_eq!(hs[0].value.as_str(), "http://localhost:5173");
    }

    #[test]
    fn wildcard_admits_any_origin() {
        let hs = cors_headers(Some("http://example.org"), &origins(&["*"]));
        assert_eq!(hs[0].value.as_str(), "http://example.org");
    }

    #[test]
    fn unlisted_or_missing_origin_gets_no_headers() {
        let allowed = origins(&["http://localhost:3000"]);
        assert!(cors_headers(Some("http://evil.test"), &allowed).is_empty());
        assert!(cors_headers(None, &allowed).is_empty());
    }

    #[test]
    fn unknown_path_is_json_404() {
        let (_dir, state) = test_state();
        let reply = exchange(state, "GET /nope HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n");
        assert!(reply.starts_with("HTTP/1.1 404"), "{reply}");
        assert!(reply.ends_with(r#"{"detail":"Not Found"}"#), "{reply}");
    }

    #[test]
    fn preflight_answers_204_with_cors() {
        let (_dir, state) = test_state();
        let reply = exchange(
            state,
            "OPTIONS /predict HTTP/1.1\r\nHost: x\r\nOrigin: http://localhost:5173\r\n\
             Access-Control-Request-Method: POST\r\nAccess-Control-Request-Headers: content-type\r\n\
             Connection: close\r\n\r\n",
        );
        assert!(reply.starts_with("HTTP/1.1 204"), "{reply}");
        assert!(reply.contains("Access-Control-Allow-Origin: http://localhost:5173"), "{reply}");
        assert!(reply.contains("Access-Control-Allow-Methods: GET, POST, OPTIONS"), "{reply}");
        assert!(reply.contains("Access-Control-Allow-Headers: content-type"), "{reply}");
    }

    #[test]
    fn root_reports_running_and_echoes_origin() {
        let (_dir, state) = test_state();
        let reply = exchange(
            state,
            "GET / HTTP/1.1\r\nHost: x\r\nOrigin: http://localhost:3000\r\nConnection: close\r\n\r\n",
        );
        assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
        assert!(reply.contains("Access-Control-Allow-Credentials: true"), "{reply}");
        assert!(reply.contains(r#""status":"running""#), "{reply}");
    }
}
