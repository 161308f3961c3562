//! HTTP Basic authentication middleware

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::AppState;
use super::pages::AUTH_REQUIRED_PAGE;

const REALM: &str = r#"Basic realm="Loged""#;

/// Rejects requests without the configured credentials when auth is enabled
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.config.auth;
    if !auth.enabled {
        return next.run(request).await;
    }

    match basic_credentials(request.headers()) {
        Some((username, password)) if username == auth.username && password == auth.password => {
            next.run(request).await
        }
        _ => {
            tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, REALM)],
        Html(AUTH_REQUIRED_PAGE),
    )
        .into_response()
}

/// Extract `username:password` from an `Authorization: Basic` header
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
