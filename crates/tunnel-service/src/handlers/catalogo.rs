//! Article reads used by CUSPI's catalog sync.
//!
//! These endpoints answer in the older `{ok, ...}` shape.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tunnel_core::ArticleId;
use tunnel_store::ArticleSyncRow;

use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

/// Articles returned by the sync read.
const SYNC_LIMIT: u32 = 100;

/// Stock request.
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    /// Article.
    pub art_id: ArticleId,
}

/// Stock response.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    /// Always `true`.
    pub ok: bool,
    /// Units on hand.
    pub existencia: Decimal,
}

/// Article sync response.
#[derive(Debug, Serialize)]
pub struct ArticleSyncResponse {
    /// Always `true`.
    pub ok: bool,
    /// Newest articles first.
    pub articulos: Vec<ArticleSyncRow>,
}

#[derive(Debug, Serialize)]
struct NotFoundBody {
    ok: bool,
    mensaje: &'static str,
}

/// Stock of one article.
pub async fn existencia(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<StockRequest>,
) -> Result<Response, ApiError> {
    let mut session = state.store.begin().await?;
    let article = session.get_article(req.art_id).await?;

    Ok(match article {
        Some(article) => Json(StockResponse {
            ok: true,
            existencia: article.existencia,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(NotFoundBody {
                ok: false,
                mensaje: "Artículo no encontrado",
            }),
        )
            .into_response(),
    })
}

/// Newest articles by id.
pub async fn sync_articulos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArticleSyncResponse>, ApiError> {
    let mut session = state.store.begin().await?;
    let articulos = session.recent_articles(SYNC_LIMIT).await?;
    Ok(Json(ArticleSyncResponse {
        ok: true,
        articulos,
    }))
}
