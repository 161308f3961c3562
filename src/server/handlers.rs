//! HTTP route handlers
//!
//! - `/` - index page, or the viewer page for `?file=`
//! - `/api/loadmore` - historical line window as JSON

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use super::AppState;
use super::pages;
use crate::error::Error;

/// Header set by the reverse proxy with the request URI before rewriting
const ORIGINAL_URI_HEADER: &str = "x-original-uri";
const PROXY_BASE_PATH: &str = "/loged";

/// Query string shared by every route
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    pub file: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl FileQuery {
    /// The `file` parameter, if present and non-empty
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref().filter(|file| !file.is_empty())
    }
}

/// GET / - index or viewer page
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
) -> Response {
    let base_path = base_path(&headers);

    let Some(file) = query.file() else {
        let mut available = Vec::new();
        for entry in &state.config.log_files {
            if tokio::fs::try_exists(&entry.path).await.unwrap_or(false) {
                available.push(entry);
            }
        }
        return Html(pages::index_page(base_path, &available)).into_response();
    };

    if !tokio::fs::try_exists(file).await.unwrap_or(false) {
        return (StatusCode::NOT_FOUND, format!("File not found: {}", file)).into_response();
    }

    tracing::debug!(path = %file, "serving log viewer");
    Html(pages::viewer_page(
        base_path,
        file,
        state.service.settings(),
        state.config.stream.page_limit,
    ))
    .into_response()
}

/// GET /api/loadmore - JSON window of historical lines
pub async fn load_more(State(state): State<AppState>, Query(query): Query<FileQuery>) -> Response {
    let Some(file) = query.file() else {
        return (StatusCode::BAD_REQUEST, "file parameter required").into_response();
    };

    let offset = parse_or(query.offset.as_deref(), 0);
    let limit = parse_or(query.limit.as_deref(), state.config.stream.page_limit);

    match state.service.get_page(file, offset, limit).await {
        Ok(window) => Json(window).into_response(),
        Err(Error::NotFound { path }) => {
            (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response()
        }
        Err(e) => {
            tracing::warn!(path = %file, error = %e, "load more failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Cannot open file").into_response()
        }
    }
}

/// URL prefix when served behind the `/loged` reverse proxy location
pub(crate) fn base_path(headers: &HeaderMap) -> &'static str {
    let behind_proxy = headers
        .get(ORIGINAL_URI_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|uri| uri.starts_with(PROXY_BASE_PATH));

    if behind_proxy { PROXY_BASE_PATH } else { "" }
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
