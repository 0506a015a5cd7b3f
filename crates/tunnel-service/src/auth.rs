//! API key gate for the `/api` routes.
//!
//! CUSPI sends the shared secret in the `API-KEY` header. Some of its HTTP
//! clients escape quotes and backslashes, so escapes are removed before the
//! comparison. Preflight `OPTIONS` requests pass through untouched.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "api-key";

/// Reject requests whose `API-KEY` header does not match the configured key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let expected = state
        .config
        .api_key
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(strip_slashes)
        .ok_or(ApiError::Unauthorized)?;

    if provided != expected {
        tracing::warn!(path = %request.uri().path(), "Rejected API key");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Remove backslash escapes: `\x` becomes `x` and `\\` becomes `\`.
#[must_use]
pub fn strip_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
