//! API error types and responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tunnel_backup::BackupError;
use tunnel_core::TunnelError;
use tunnel_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or wrong `API-KEY` header.
    #[error("unauthorized")]
    Unauthorized,

    /// Validation, lookup or business rule failure raised by a workflow.
    #[error(transparent)]
    Domain(#[from] TunnelError),

    /// Resource not found outside a workflow (backup archives).
    #[error("not found: {0}")]
    NotFound(String),

    /// A feature is not configured on this instance.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

/// Body of a rejected API key, in the shape CUSPI already handles.
#[derive(Debug, Serialize)]
struct UnauthorizedResponse {
    ok: bool,
    mensaje: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized => {
                let body = UnauthorizedResponse {
                    ok: false,
                    mensaje: "Unauthorized",
                };
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            Self::Domain(err) if err.is_client_error() => {
                tracing::warn!(code = err.code(), error = %err, "Request rejected");
                (StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            Self::Domain(err) => {
                tracing::error!(error = %err, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code(),
                    "Error interno del servidor".to_string(),
                )
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Feature unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Error interno del servidor".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::InvalidFilename(_) => Self::Domain(TunnelError::validation(err.to_string())),
            BackupError::NotFound(name) => Self::NotFound(format!("Archivo no encontrado: {name}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Domain(TunnelError::validation(format!(
            "Datos inválidos: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Domain(TunnelError::validation(format!(
            "Datos inválidos: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Domain(TunnelError::validation(format!(
            "Datos inválidos: {}",
            rejection.body_text()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                TunnelError::validation("x").into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                TunnelError::LimitExceeded {
                    what: "monto",
                    limit_label: "el saldo pendiente",
                    limit: dec!(1),
                    requested: dec!(2),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                TunnelError::Storage("down".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::NotFound("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Unavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_backup_error_mapping() {
        let err: ApiError = BackupError::InvalidFilename("../x".into()).into();
        assert!(matches!(err, ApiError::Domain(TunnelError::Validation(_))));

        let err: ApiError = BackupError::NotFound("backup_ab_x.gz".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
