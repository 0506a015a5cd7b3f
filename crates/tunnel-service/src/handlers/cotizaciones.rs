//! Quotation handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{created, Envelope};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::workflows::quotations::{
    self, AddArticleOutcome, AddArticleRequest, CuspiQuotationOutcome, CuspiQuotationRequest,
    EmptyQuotationOutcome,
};

/// Create an empty quotation for the default customer.
pub async fn vacia(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Envelope<EmptyQuotationOutcome>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = quotations::create_empty(session.as_mut(), &ctx).await?;
    session.commit().await?;

    tracing::info!(cot_id = %outcome.cotizacion.cot_id, "Cotización vacía creada");
    Ok(created("Cotización creada exitosamente", outcome))
}

/// Add one catalog-priced line to a quotation.
pub async fn agregar_articulo(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<AddArticleRequest>,
) -> Result<(StatusCode, Json<Envelope<AddArticleOutcome>>), ApiError> {
    let mut session = state.store.begin().await?;
    let outcome = quotations::add_article(session.as_mut(), req).await?;
    session.commit().await?;

    tracing::info!(
        cot_id = %outcome.detalle.cot_id,
        art_id = %outcome.detalle.art_id,
        orden = outcome.detalle.orden,
        "Artículo agregado a cotización"
    );
    Ok(created("Artículo agregado correctamente", outcome))
}

/// Create a full quotation from a CUSPI document.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CuspiQuotationRequest>,
) -> Result<(StatusCode, Json<Envelope<CuspiQuotationOutcome>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = quotations::create_from_cuspi(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    tracing::info!(
        cot_id = %outcome.cot_id,
        lineas = outcome.articulos_agregados,
        "Cotización CUSPI creada"
    );
    Ok(created("Cotización creada exitosamente", outcome))
}
