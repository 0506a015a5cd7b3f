//! Supplier-article link handlers (`/api/articulo`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use tunnel_store::{SupplierArticleView, UpsertOutcome};

use super::Envelope;
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::workflows::suppliers::{self, AssignRequest, BatchAssignRequest, BatchOutcome};

/// Single link response payload.
#[derive(Debug, Serialize)]
pub struct AssignData {
    /// Whether the link was updated or inserted.
    pub operacion: UpsertOutcome,
    /// The link joined with article and supplier names.
    pub data: SupplierArticleView,
}

/// Insert or update one link. 201 when inserted, 200 when updated.
pub async fn asignar(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<AssignRequest>,
) -> Result<(StatusCode, Json<Envelope<AssignData>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let assigned = suppliers::assign_supplier(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    let (status, message) = match assigned.operacion {
        UpsertOutcome::Insert => (
            StatusCode::CREATED,
            "Relación proveedor-artículo creada correctamente",
        ),
        UpsertOutcome::Update => (
            StatusCode::OK,
            "Relación proveedor-artículo actualizada correctamente",
        ),
    };
    tracing::info!(
        art_id = %assigned.link.art_id,
        pro_id = %assigned.link.pro_id,
        operacion = ?assigned.operacion,
        "Proveedor asignado"
    );

    let body = AssignData {
        operacion: assigned.operacion,
        data: assigned.link,
    };
    Ok((status, Json(Envelope::with_message(message, body))))
}

/// Apply a spreadsheet of links in one transaction.
pub async fn asignar_masivo(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<BatchAssignRequest>,
) -> Result<Json<Envelope<BatchOutcome>>, ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = suppliers::assign_suppliers_batch(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    let stats = outcome.stats;
    tracing::info!(
        total = stats.total_procesados,
        exitosos = stats.exitosos,
        errores = stats.errores,
        "Asignación masiva procesada"
    );

    let message = format!(
        "Asignación masiva procesada: {} exitosos, {} errores",
        stats.exitosos, stats.errores
    );
    Ok(Json(Envelope::with_message(message, outcome)))
}
