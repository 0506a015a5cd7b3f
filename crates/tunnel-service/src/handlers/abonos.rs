//! Customer payment handlers (`/api/abonos`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use tunnel_core::CreditId;

use super::{created, Envelope};
use crate::error::ApiError;
use crate::extract::{ValidJson, ValidPath, ValidQuery};
use crate::state::AppState;
use crate::workflows::payments::{
    self, BalanceOutcome, MultiPaymentOutcome, MultiPaymentRequest, PaymentOutcome,
    PaymentRequest, SyncOutcome, SyncQuery,
};

/// Post one payment against one credit.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<PaymentRequest>,
) -> Result<(StatusCode, Json<Envelope<PaymentOutcome>>), ApiError> {
    let ctx = state.write_context();
    let ccl_id = req.ccl_id;

    let mut session = state.store.begin().await?;
    let outcome = payments::post_payment(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    tracing::info!(
        acl_id = %outcome.acl_id,
        %ccl_id,
        monto = %outcome.monto_abonado,
        liquidado = outcome.credito_liquidado,
        "Abono registrado"
    );

    let message = if outcome.credito_liquidado {
        "Abono registrado exitosamente. Crédito liquidado."
    } else {
        "Abono registrado exitosamente"
    };
    Ok(created(message, outcome))
}

/// Split one payment over several credits of the same customer.
pub async fn multipago(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<MultiPaymentRequest>,
) -> Result<(StatusCode, Json<Envelope<MultiPaymentOutcome>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = payments::post_multi_payment(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    tracing::info!(
        acp_id = %outcome.acp_id,
        legs = outcome.distribucion.len(),
        liquidados = outcome.liquidados.len(),
        "Multipago registrado"
    );

    let message = format!(
        "Pago distribuido en {} créditos",
        outcome.distribucion.len()
    );
    Ok(created(message, outcome))
}

/// Payments newer than a watermark.
pub async fn sync(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<SyncQuery>,
) -> Result<Json<Envelope<SyncOutcome>>, ApiError> {
    let mut session = state.store.begin().await?;
    let outcome = payments::sync_payments(session.as_mut(), query).await?;
    tracing::debug!(desde = %outcome.desde, total = outcome.total, "Sync de abonos");
    Ok(Json(Envelope::ok(outcome)))
}

/// Current balance of one credit.
pub async fn saldo(
    State(state): State<Arc<AppState>>,
    ValidPath(ccl_id): ValidPath<CreditId>,
) -> Result<Json<Envelope<BalanceOutcome>>, ApiError> {
    let ctx = state.write_context();
    let mut session = state.store.begin().await?;
    let outcome = payments::credit_status(session.as_mut(), &ctx, ccl_id).await?;
    Ok(Json(Envelope::ok(outcome)))
}
