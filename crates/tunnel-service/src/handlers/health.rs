//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Storage backend name.
    pub backend: String,
    /// Database ping result.
    pub database: String,
}

/// Health check endpoint. Answers 503 when the database does not respond.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match state.store.ping().await {
        Ok(()) => ("ok", StatusCode::OK, "ok".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            service: "tunnelcuspi".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: state.store.backend().to_string(),
            database,
        }),
    )
}
