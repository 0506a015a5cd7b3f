//! Purchase order handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{created, Envelope};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::workflows::orders::{self, PurchaseOrderOutcome, PurchaseOrderRequest};

/// Create a purchase order.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<PurchaseOrderRequest>,
) -> Result<(StatusCode, Json<Envelope<PurchaseOrderOutcome>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = orders::create_order(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    tracing::info!(
        ped_id = %outcome.pedido.ped_id,
        total = %outcome.pedido.total,
        articulos = outcome.pedido.articulos,
        "Pedido creado"
    );
    Ok(created("Pedido creado correctamente en SICAR", outcome))
}
