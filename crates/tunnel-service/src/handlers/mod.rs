//! API handlers.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

pub mod abonos;
pub mod backup;
pub mod catalogo;
pub mod clientes;
pub mod cotizaciones;
pub mod health;
pub mod pedidos;
pub mod proveedores;
pub mod ventas;

/// Success body: `{"success": true, "message"?, ...data}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true`; failures go through [`ApiError`](crate::error::ApiError).
    pub success: bool,
    /// Human readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload fields, inlined.
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Envelope without a message.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Envelope with a message.
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// 201 response wrapping `data`.
pub(crate) fn created<T: Serialize>(
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::with_message(message, data)))
}
