//! Customer handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{created, Envelope};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;
use crate::workflows::clients::{self, ClientOutcome, ClientRequest};

/// Create a customer.
pub async fn crear(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<ClientRequest>,
) -> Result<(StatusCode, Json<Envelope<ClientOutcome>>), ApiError> {
    let ctx = state.write_context();

    let mut session = state.store.begin().await?;
    let outcome = clients::create_client(session.as_mut(), &ctx, req).await?;
    session.commit().await?;

    tracing::info!(cli_id = %outcome.cli_id, "Cliente creado");
    Ok(created("Cliente creado exitosamente", outcome))
}
