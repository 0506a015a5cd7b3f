//! Sale handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{created, Envelope};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::workflows::sales::{self, SaleOutcome, SaleRequest};

/// Sale response payload, nested under `data`.
#[derive(Debug, Serialize)]
pub struct SaleData {
    /// The written sale.
    pub data: SaleOutcome,
}

/// Write a complete sale.
pub async fn store(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SaleRequest>,
) -> Result<(StatusCode, Json<Envelope<SaleData>>), ApiError> {
    let ctx = state.write_context();
    let cli_id = req.venta.cli_id;
    let total = req.venta.total;

    let mut session = state.store.begin().await?;
    let outcome = match sales::create_sale(session.as_mut(), &ctx, req).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(%cli_id, %total, error = %e, "Venta revertida");
            return Err(e.into());
        }
    };
    session.commit().await?;

    tracing::info!(
        ven_id = %outcome.ven_id,
        %cli_id,
        %total,
        articulos = outcome.articulos,
        "Venta insertada"
    );
    Ok(created("Venta insertada exitosamente", SaleData { data: outcome }))
}
