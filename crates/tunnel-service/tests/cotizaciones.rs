//! Quotation integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use tunnel_core::QuotationId;

async fn empty_quotation(harness: &TestHarness) -> i64 {
    let response = harness.post("/api/cotizaciones/vacia").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["cotizacion"]["cot_id"].as_i64().unwrap()
}

#[tokio::test]
async fn empty_quotation_for_walk_in_client() {
    let harness = TestHarness::new().await;

    let response = harness.post("/api/cotizaciones/vacia").await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["cotizacion"]["cliente"], "PUBLICO EN GENERAL");
    assert_eq!(body["cotizacion"]["moneda"], "MXN");
    assert_eq!(body["cotizacion"]["total"].as_f64(), Some(0.0));

    let tables = harness.tables().await;
    assert_eq!(tables.history[0].tabla, "cotizacion");
}

#[tokio::test]
async fn add_article_recomputes_totals() {
    let harness = TestHarness::new().await;
    let cot_id = empty_quotation(&harness).await;

    let response = harness
        .post("/api/cotizaciones/agregar-articulo")
        .json(&json!({"cot_id": cot_id, "art_id": 7, "cantidad": 3}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["detalle"]["orden"], 1);
    assert_eq!(body["detalle"]["clave"], "TOR-01");
    assert_eq!(body["detalle"]["importe"].as_f64(), Some(348.0));

    let tables = harness.tables().await;
    let record = &tables.quotations[&QuotationId::new(cot_id)];
    assert_eq!(record.header.total, dec!(348.00));
    assert_eq!(tables.quotation_lines[0].precio_sin, dec!(100.00));
}

#[tokio::test]
async fn add_article_twice_is_a_conflict() {
    let harness = TestHarness::new().await;
    let cot_id = empty_quotation(&harness).await;
    let line = json!({"cot_id": cot_id, "art_id": 7, "cantidad": 1});

    harness
        .post("/api/cotizaciones/agregar-articulo")
        .json(&line)
        .await
        .assert_status(StatusCode::CREATED);
    let response = harness
        .post("/api/cotizaciones/agregar-articulo")
        .json(&line)
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "state_conflict");
    assert_eq!(harness.tables().await.quotation_lines.len(), 1);
}

#[tokio::test]
async fn add_inactive_article_is_rejected() {
    let harness = TestHarness::new().await;
    let cot_id = empty_quotation(&harness).await;

    let response = harness
        .post("/api/cotizaciones/agregar-articulo")
        .json(&json!({"cot_id": cot_id, "art_id": 8, "cantidad": 1}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn cuspi_document_is_written_as_sent() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/cotizaciones/crear")
        .json(&json!({
            "fecha": "2025-03-01",
            "subtotal": 300.0,
            "total": 348.0,
            "descuento": 0,
            "cli_id": 2,
            "usu_id": 1,
            "detalles": [
                {"art_id": 7, "cantidad": 3, "precioCon": 116.0, "importeCon": 348.0}
            ]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["articulos_agregados"], 1);
    assert_eq!(body["cotizacion"]["cliente"], "Juan Pérez");
    assert_eq!(body["cotizacion"]["usuario"], "Sistema");
    assert_eq!(body["cotizacion"]["total"].as_f64(), Some(348.0));
    assert!(body["cotizacion"]["descuento"].is_null());
}

#[tokio::test]
async fn cuspi_document_lists_every_invalid_article() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/cotizaciones/crear")
        .json(&json!({
            "fecha": "2025-03-01",
            "subtotal": 10.0,
            "total": 10.0,
            "cli_id": 2,
            "detalles": [
                {"art_id": 8, "cantidad": 1, "precioCon": 5.0, "importeCon": 5.0},
                {"art_id": 99, "cantidad": 1, "precioCon": 5.0, "importeCon": 5.0}
            ]
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Artículos inválidos o inactivos: 8, 99");
    assert!(harness.tables().await.quotations.is_empty());
}

#[tokio::test]
async fn cuspi_document_for_inactive_client_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/cotizaciones/crear")
        .json(&json!({
            "fecha": "2025-03-01",
            "subtotal": 116.0,
            "total": 116.0,
            "cli_id": 3,
            "detalles": [{"art_id": 7, "cantidad": 1, "precioCon": 116.0, "importeCon": 116.0}]
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "El cliente 3 está inactivo");
}
