use std::io::Read;

use serde_json::json;
use tiny_http::Request;
use tracing::{info, warn};

use arsenic_detect::AccountError;

use crate::routes::{error_response, json_response, request_header, HttpResponse};
use crate::state::SharedState;
use crate::util::form::{form_get, parse_form};

/// Largest urlencoded body read for account forms.
const MAX_FORM_BYTES: u64 = 64 * 1024;

/// Reads the request's parameters, or the error response to send instead.
fn read_params(request: &mut Request, query: &str) -> Result<Vec<(String, String)>, HttpResponse> {
    let is_form = request_header(request, "Content-Type")
        .map_or(false, |ct| ct.starts_with("application/x-www-form-urlencoded"));

    let mut body = Vec::new();
    if is_form {
        if let Err(e) = request.as_reader().take(MAX_FORM_BYTES).read_to_end(&mut body) {
            warn!(error = %e, "failed to read form body");
            return Err(error_response(400, "Could not read request body"));
        }
    }
    Ok(merge_params(query, &body))
}

/// Query-string parameters followed by urlencoded body fields. Lookups take
/// the first match, so the query wins. Invalid UTF-8 in the body is replaced
/// rather than rejected.
fn merge_params(query: &str, body: &[u8]) -> Vec<(String, String)> {
    let mut pairs = parse_form(query);
    if !body.is_empty() {
        pairs.extend(parse_form(&String::from_utf8_lossy(body)));
    }
    pairs
}

fn account_error(e: &AccountError) -> HttpResponse {
    error_response(400, &e.to_string())
}

// ---------------------------------------------------------------------------
// POST /register
// ---------------------------------------------------------------------------

pub fn handle_register(request: &mut Request, query: &str, state: &SharedState) -> HttpResponse {
    match read_params(request, query) {
        Ok(params) => register(&params, state),
        Err(resp)  => resp,
    }
}

fn register(params: &[(String, String)], state: &SharedState) -> HttpResponse {
    let email    = form_get(params, "email").unwrap_or("");
    let password = form_get(params, "password").unwrap_or("");
    let name     = form_get(params, "name").unwrap_or("");

    match state.users.register(email, password, name) {
        Ok(user) => {
            info!(user_id = user.id, "user registered");
            json_response(200, &json!({
                "success": true,
                "message": "User registered successfully",
                "user_id": user.id,
            }))
        }
        Err(e) => account_error(&e),
    }
}

// ---------------------------------------------------------------------------
// POST /login
// ---------------------------------------------------------------------------

pub fn handle_login(request: &mut Request, query: &str, state: &SharedState) -> HttpResponse {
    match read_params(request, query) {
        Ok(params) => login(&params, state),
        Err(resp)  => resp,
    }
}

fn login(params: &[(String, String)], state: &SharedState) -> HttpResponse {
    let email    = form_get(params, "email").unwrap_or("");
    let password = form_get(params, "password").unwrap_or("");

    match state.users.login(email, password) {
        Ok(user) => json_response(200, &json!({
            "success": true,
            "message": "Login successful",
            "user_id": user.id,
            "email":   user.email,
            "name":    user.name,
        })),
        Err(e) => account_error(&e),
    }
}

// ---------------------------------------------------------------------------
// GET /users
// ---------------------------------------------------------------------------

pub fn handle_users(state: &SharedState) -> HttpResponse {
    json_response(200, &state.users.profiles())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response_json;
    use crate::state::test_state;

    #[test]
    fn non_utf8_form_body_still_registers() {
        let (_dir, state) = test_state();
        let params = merge_params("", b"email=z%40y.z&password=p&name=\xff");
        assert_eq!(form_get(&params, "email"), Some("z@y.z"));

        let (status, body) = response_json(register(&params, &state));
        assert_eq!(status, 200);
        assert_eq!(body["user_id"], 1);
        assert_eq!(state.users.profiles()[0].name, "\u{FFFD}");
    }

    #[test]
    fn query_takes_precedence_over_body() {
        let params = merge_params("email=q%40x.y", b"email=b%40x.y&password=pw");
        assert_eq!(form_get(&params, "email"), Some("q@x.y"));
        assert_eq!(form_get(&params, "password"), Some("pw"));
    }

    #[test]
    fn duplicate_and_bad_login_are_client_errors() {
        let (_dir, state) = test_state();
        let params = merge_params("email=a%40b.c&password=pw&name=A", b"");
        assert_eq!(response_json(register(&params, &state)).0, 200);

        let (status, body) = response_json(register(&params, &state));
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "User already exists");

        let wrong = merge_params("email=a%40b.c&password=nope", b"");
        let (status, body) = response_json(login(&wrong, &state));
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "Invalid email or password");
    }

    #[test]
    fn login_returns_profile_fields() {
        let (_dir, state) = test_state();
        register(&merge_params("email=a%40b.c&password=pw&name=Ann", b""), &state);

        let (status, body) = response_json(login(&merge_params("email=a%40b.c&password=pw", b""), &state));
        assert_eq!(status, 200);
        assert_eq!(body["user_id"], 1);
        assert_eq!(body["email"], "a@b.c");
        assert_eq!(body["name"], "Ann");

        let (_, users) = response_json(handle_users(&state));
        assert_eq!(users[0]["email"], "a@b.c");
        assert!(users[0].get("password").is_none());
    }
}
