//! Supplier links and catalog read integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use tunnel_core::{ArticleId, SupplierId};

// ============================================================================
// Supplier Links
// ============================================================================

#[tokio::test]
async fn assign_inserts_then_updates() {
    let harness = TestHarness::new().await;
    let link = |precio: f64| json!({"art_id": 7, "pro_id": 4, "claveProveedor": "AN-77", "precioCompra": precio});

    let response = harness
        .post("/api/articulo/asignar-proveedor")
        .json(&link(45.0))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["operacion"], "INSERT");
    assert_eq!(body["data"]["proveedor_nombre"], "Aceros del Norte");
    assert_eq!(body["data"]["articulo_clave"], "TOR-01");

    let response = harness
        .post("/api/articulo/asignar-proveedor")
        .json(&link(47.5))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["operacion"], "UPDATE");
    assert_eq!(
        body["message"],
        "Relación proveedor-artículo actualizada correctamente"
    );

    let tables = harness.tables().await;
    assert_eq!(tables.supplier_articles.len(), 1);
    let stored = &tables.supplier_articles[&(SupplierId::new(4), ArticleId::new(7))];
    assert_eq!(stored.precio_compra, dec!(47.5));
    assert_eq!(stored.clave_proveedor, "AN-77");
}

#[tokio::test]
async fn assign_to_inactive_article_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/articulo/asignar-proveedor")
        .json(&json!({"art_id": 8, "pro_id": 4, "precioCompra": 10}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Artículo no existe o está inactivo");
    assert!(harness.tables().await.supplier_articles.is_empty());
}

#[tokio::test]
async fn batch_reports_each_row() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/articulo/asignar-proveedor-masivo")
        .json(&json!({
            "asignaciones": [
                {"art_id": 7, "pro_id": 4, "precioCompra": 45, "fila_excel": 2},
                {"art_id": 8, "pro_id": 4, "precioCompra": 10, "fila_excel": 3},
                {"art_id": 7, "pro_id": 99, "precioCompra": 10, "fila_excel": 4},
                {"art_id": 7, "pro_id": 4, "precioCompra": 46, "fila_excel": 5}
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "Asignación masiva procesada: 2 exitosos, 2 errores"
    );
    assert_eq!(body["stats"]["total_procesados"], 4);
    assert_eq!(body["stats"]["inserciones"], 1);
    assert_eq!(body["stats"]["actualizaciones"], 1);

    let errores = body["errores"].as_array().unwrap();
    assert_eq!(errores[0]["fila_excel"], 3);
    assert_eq!(errores[0]["codigo_error"], "ARTICULO_NO_EXISTE");
    assert_eq!(errores[1]["fila_excel"], 4);
    assert_eq!(errores[1]["codigo_error"], "PROVEEDOR_NO_EXISTE");

    let exitosos = body["exitosos"].as_array().unwrap();
    assert_eq!(exitosos[1]["fila_excel"], 5);
    assert_eq!(exitosos[1]["operacion"], "UPDATE");

    let tables = harness.tables().await;
    let stored = &tables.supplier_articles[&(SupplierId::new(4), ArticleId::new(7))];
    assert_eq!(stored.precio_compra, dec!(46));
}

#[tokio::test]
async fn batch_with_negative_price_writes_nothing() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/articulo/asignar-proveedor-masivo")
        .json(&json!({
            "asignaciones": [
                {"art_id": 7, "pro_id": 4, "precioCompra": 45, "fila_excel": 2},
                {"art_id": 7, "pro_id": 4, "precioCompra": -1, "fila_excel": 3}
            ]
        }))
        .await;

    response.assert_status_bad_request();
    assert!(harness.tables().await.supplier_articles.is_empty());
}

// ============================================================================
// Catalog Reads
// ============================================================================

#[tokio::test]
async fn stock_of_known_article() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/existencia")
        .json(&json!({"art_id": 7}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["existencia"].as_f64(), Some(10.0));
}

#[tokio::test]
async fn stock_of_unknown_article_is_404() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/existencia")
        .json(&json!({"art_id": 70}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body, json!({"ok": false, "mensaje": "Artículo no encontrado"}));
}

#[tokio::test]
async fn article_sync_lists_newest_first() {
    let harness = TestHarness::new().await;

    let response = harness.get("/api/sync/articulos").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let articulos = body["articulos"].as_array().unwrap();
    assert_eq!(articulos.len(), 2);
    assert_eq!(articulos[0]["art_id"], 8);
    assert_eq!(articulos[1]["clave"], "TOR-01");
}
