//! Sale creation integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use tunnel_core::{ArticleId, SaleId};

fn sale(cantidad: f64, credito: bool) -> Value {
    let total = 116.0 * cantidad;
    let mut body = json!({
        "venta": {
            "fecha": "2025-03-01 12:45:00",
            "subtotal": 100.0 * cantidad,
            "total": total,
            "cli_id": 2,
            "usu_id": 1,
            "suc_id": 1,
            "status": 1,
            "comentario": "Venta CUSPI"
        },
        "detalles": [{
            "art_id": 7,
            "cantidad": cantidad,
            "precioSin": 100.0,
            "precioCon": 116.0,
            "importeSin": 100.0 * cantidad,
            "importeCon": total,
            "precioCompra": 50.0
        }],
        "detallesImpuestos": [
            {"art_id": 7, "imp_id": 1, "base": 100.0 * cantidad, "tasa": 16.0, "importe": 16.0 * cantidad}
        ],
        "impuestos": [{"imp_id": 1, "base": 100.0 * cantidad, "importe": 16.0 * cantidad}],
        "formasPago": [{"tpa_id": 1, "importe": total}],
        "notasCredito": [{"ncr_id": 5, "importe": 10.0}]
    });
    if credito {
        body["creditoCliente"] = json!({"fechaLimite": "2025-04-01", "total": total});
    }
    body
}

#[tokio::test]
async fn sale_is_written_in_one_transaction() {
    let harness = TestHarness::new().await;

    let response = harness.post("/api/sicar/ventas/store").json(&sale(2.0, true)).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "Venta insertada exitosamente");
    assert_eq!(body["data"]["ven_id"], 1);
    assert_eq!(
        body["data"]["letra"],
        "(DOSCIENTOS TREINTA Y DOS PESOS 00/100 MN)"
    );
    assert!(body["data"]["ccl_id"].is_number());

    let tables = harness.tables().await;
    let venta = &tables.sales[&SaleId::new(1)];
    assert_eq!(venta.comentario, "Venta CUSPI");
    assert_eq!(venta.total_compra, dec!(100.00));
    assert_eq!(venta.subtotal_utilidad, dec!(100.00));
    assert_eq!(venta.decimales, 2);
    assert_eq!(tables.sale_lines.len(), 1);
    assert_eq!(tables.sale_line_taxes.len(), 1);
    assert_eq!(tables.sale_taxes.len(), 1);
    assert_eq!(tables.sale_payments.len(), 1);
    assert_eq!(tables.sale_credit_notes.len(), 1);
    assert_eq!(tables.new_credits.len(), 1);
    assert_eq!(tables.articles[&ArticleId::new(7)].existencia, dec!(8));
}

#[tokio::test]
async fn sale_without_credit_omits_ccl_id() {
    let harness = TestHarness::new().await;

    let response = harness.post("/api/sicar/ventas/store").json(&sale(1.0, false)).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["data"].get("ccl_id").is_none());
    assert!(harness.tables().await.new_credits.is_empty());
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() {
    let harness = TestHarness::new().await;

    let response = harness.post("/api/sicar/ventas/store").json(&sale(11.0, true)).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "limit_exceeded");

    let tables = harness.tables().await;
    assert!(tables.sales.is_empty());
    assert!(tables.sale_lines.is_empty());
    assert_eq!(tables.articles[&ArticleId::new(7)].existencia, dec!(10));
}

#[tokio::test]
async fn unknown_tax_is_not_found() {
    let harness = TestHarness::new().await;
    let mut body = sale(1.0, false);
    body["detallesImpuestos"][0]["imp_id"] = json!(9);

    let response = harness.post("/api/sicar/ventas/store").json(&body).await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Impuesto ID 9 no encontrado");
    assert!(harness.tables().await.sales.is_empty());
}

#[tokio::test]
async fn sale_needs_lines_and_payments() {
    let harness = TestHarness::new().await;

    let mut no_lines = sale(1.0, false);
    no_lines["detalles"] = json!([]);
    let mut no_payments = sale(1.0, false);
    no_payments["formasPago"] = json!([]);
    let mut bad_date = sale(1.0, false);
    bad_date["venta"]["fecha"] = json!("01/03/2025");

    for body in [no_lines, no_payments, bad_date] {
        let response = harness.post("/api/sicar/ventas/store").json(&body).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "validation");
    }
}
