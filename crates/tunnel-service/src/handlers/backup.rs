//! Backup handlers (`/api/backup`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tunnel_backup::BackupRunner;
use tunnel_core::TunnelError;

use super::Envelope;
use crate::error::ApiError;
use crate::extract::{ValidJson, ValidPath};
use crate::state::AppState;

/// Backup request.
#[derive(Debug, Deserialize)]
pub struct BackupRequest {
    /// Receiver of the completion or failure notice.
    pub webhook_url: String,
}

/// Accepted job.
#[derive(Debug, Serialize)]
pub struct BackupJob {
    /// Job id, `backup_<hex>`.
    pub job_id: String,
    /// Always `processing`.
    pub status: &'static str,
}

/// Cleanup result.
#[derive(Debug, Serialize)]
pub struct CleanupData {
    /// Deleted archive names.
    pub eliminados: Vec<String>,
    /// Number deleted.
    pub total: usize,
}

fn runner(state: &AppState) -> Result<&Arc<BackupRunner>, ApiError> {
    state
        .backups
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Backups no configurados".into()))
}

fn validate_webhook(url: &str) -> Result<(), ApiError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(TunnelError::validation("El campo webhook_url debe ser una URL válida").into()),
    }
}

/// Start a backup job and return at once.
pub async fn full(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<BackupRequest>,
) -> Result<(StatusCode, Json<Envelope<BackupJob>>), ApiError> {
    validate_webhook(&req.webhook_url)?;
    let runner = runner(&state)?;

    let job_id = BackupRunner::new_job_id();
    tracing::info!(%job_id, webhook_url = %req.webhook_url, "Backup iniciado");
    runner.spawn(job_id.clone(), req.webhook_url);

    Ok((
        StatusCode::ACCEPTED,
        Json(Envelope::with_message(
            "Backup iniciado",
            BackupJob {
                job_id,
                status: "processing",
            },
        )),
    ))
}

/// Serve one archive as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    ValidPath(filename): ValidPath<String>,
) -> Result<Response, ApiError> {
    let runner = runner(&state)?;
    let path = runner.resolve_download(&filename).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {e}", path.display())))?;

    tracing::info!(%filename, size = bytes.len(), "Descarga de backup");
    Ok((
        [
            (header::CONTENT_TYPE, "application/gzip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Delete expired archives.
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<CleanupData>>, ApiError> {
    let runner = runner(&state)?;
    let eliminados = runner.cleanup_expired().await?;
    let total = eliminados.len();
    tracing::info!(total, "Backups expirados eliminados");

    Ok(Json(Envelope::with_message(
        format!("{total} archivos eliminados"),
        CleanupData { eliminados, total },
    )))
}
