//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::handlers::{
    abonos, backup, catalogo, clientes, cotizaciones, health, pedidos, proveedores, ventas,
};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
/// Every write holds a database connection and row locks.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check and database ping
///
/// ## Payments (API key)
/// - `POST /api/abonos/crear` - Single payment
/// - `POST /api/abonos/multipago` - One payment split over several credits
/// - `GET /api/abonos/sync` - Payments after a watermark
/// - `GET /api/abonos/saldo/:ccl_id` - Credit balance
///
/// ## ERP writes (API key)
/// - `POST /api/clientes` - Create customer
/// - `POST /api/cotizaciones/vacia` - Empty quotation
/// - `POST /api/cotizaciones/agregar-articulo` - Add a line to a quotation
/// - `POST /api/cotizaciones/crear` - Quotation from a CUSPI document
/// - `POST /api/sicar/ventas/store` - Create sale
/// - `POST /api/pedidos/crear` - Create purchase order
/// - `POST /api/articulo/asignar-proveedor` - Upsert supplier-article link
/// - `POST /api/articulo/asignar-proveedor-masivo` - Batch upsert
///
/// ## Catalog (API key)
/// - `POST /api/existencia` - Article stock
/// - `GET /api/sync/articulos` - Newest articles
///
/// ## Backups (API key)
/// - `POST /api/backup/full` - Start a backup job
/// - `GET /api/backup/download/:filename` - Download an archive
/// - `DELETE /api/backup/cleanup` - Remove expired archives
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Payments
        .route("/abonos/crear", post(abonos::crear))
        .route("/abonos/multipago", post(abonos::multipago))
        .route("/abonos/sync", get(abonos::sync))
        .route("/abonos/saldo/:ccl_id", get(abonos::saldo))
        // Customers
        .route("/clientes", post(clientes::crear))
        // Quotations
        .route("/cotizaciones/vacia", post(cotizaciones::vacia))
        .route(
            "/cotizaciones/agregar-articulo",
            post(cotizaciones::agregar_articulo),
        )
        .route("/cotizaciones/crear", post(cotizaciones::crear))
        // Sales
        .route("/sicar/ventas/store", post(ventas::store))
        // Purchase orders and suppliers
        .route("/pedidos/crear", post(pedidos::crear))
        .route("/articulo/asignar-proveedor", post(proveedores::asignar))
        .route(
            "/articulo/asignar-proveedor-masivo",
            post(proveedores::asignar_masivo),
        )
        // Catalog
        .route("/existencia", post(catalogo::existencia))
        .route("/sync/articulos", get(catalogo::sync_articulos))
        // Backups
        .route("/backup/full", post(backup::full))
        .route("/backup/download/:filename", get(backup::download))
        .route("/backup/cleanup", delete(backup::cleanup))
        .route_layer(from_fn_with_state(state.clone(), require_api_key))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
