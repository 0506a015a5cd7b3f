//! Customer payment integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use tunnel_core::{CashDrawerId, CreditId};

// ============================================================================
// Single Payment
// ============================================================================

#[tokio::test]
async fn partial_payment_writes_every_row() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({
            "ccl_id": 10,
            "monto": 150.0,
            "tpa_id": 1,
            "referencia": "Depósito CUSPI"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Abono registrado exitosamente");
    assert_eq!(body["creditoLiquidado"], false);
    assert_eq!(body["saldoAnterior"].as_f64(), Some(500.0));
    assert_eq!(body["nuevoSaldo"].as_f64(), Some(350.0));
    assert!(body.get("pendientes").is_none());
    assert_eq!(body["insertados"]["movimiento"]["comentario"], "Depósito CUSPI");
    let fecha = body["insertados"]["historial"][0]["fecha"].as_str().unwrap();
    assert!(
        chrono::NaiveDateTime::parse_from_str(fecha, "%Y-%m-%d %H:%M:%S").is_ok(),
        "unexpected timestamp: {fecha}"
    );

    let tables = harness.tables().await;
    assert_eq!(tables.payments.len(), 1);
    assert_eq!(tables.movements.len(), 1);
    assert_eq!(
        tables.cash_drawers[&CashDrawerId::new(1)].total,
        dec!(1150.00)
    );
    assert_eq!(tables.credits[&CreditId::new(10)].status, 1);
}

#[tokio::test]
async fn full_payment_settles_credit() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({
            "ccl_id": 12,
            "monto": 200.0,
            "tpa_id": 6,
            "tipo_tarjeta": "debito"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["creditoLiquidado"], true);
    assert_eq!(
        body["message"],
        "Abono registrado exitosamente. Crédito liquidado."
    );
    assert!(body["insertados"]["tarjeta"].is_object());

    let tables = harness.tables().await;
    assert_eq!(tables.credits[&CreditId::new(12)].status, 2);
    assert_eq!(tables.card_details.len(), 1);
    assert_eq!(tables.history.len(), 2);
}

#[tokio::test]
async fn overpayment_is_rejected_without_writes() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 12, "monto": 200.01, "tpa_id": 1}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "limit_exceeded");

    let tables = harness.tables().await;
    assert!(tables.payments.is_empty());
    assert_eq!(
        tables.cash_drawers[&CashDrawerId::new(1)].total,
        dec!(1000.00)
    );
}

#[tokio::test]
async fn rejected_method_and_card_rules() {
    let harness = TestHarness::new().await;

    for body in [
        json!({"ccl_id": 10, "monto": 10, "tpa_id": 3}),
        json!({"ccl_id": 10, "monto": 10, "tpa_id": 6}),
        json!({"ccl_id": 10, "monto": 10, "tpa_id": 1, "tipo_tarjeta": "credito"}),
        json!({"ccl_id": 10, "monto": 0, "tpa_id": 1}),
    ] {
        let response = harness.post("/api/abonos/crear").json(&body).await;
        response.assert_status_bad_request();
    }
    assert!(harness.tables().await.payments.is_empty());
}

#[tokio::test]
async fn unknown_credit_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 999, "monto": 10, "tpa_id": 1}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": "diez"}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Datos inválidos"));
}

#[tokio::test]
async fn sub_cent_amounts_are_rejected_not_rounded() {
    let harness = TestHarness::new().await;

    for body in [
        json!({"ccl_id": 12, "monto": 200.004, "tpa_id": 1}),
        json!({"ccl_id": 10, "monto": 10.005, "tpa_id": 1}),
    ] {
        let response = harness.post("/api/abonos/crear").json(&body).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "validation");
    }

    let tables = harness.tables().await;
    assert!(tables.payments.is_empty());
    assert_eq!(tables.credits[&CreditId::new(12)].status, 1);

    harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 10, "monto": 10.5, "tpa_id": 1}))
        .await
        .assert_status(StatusCode::CREATED);
    let tables = harness.tables().await;
    let stored = tables.payments.values().next().unwrap();
    assert_eq!(stored.total, dec!(10.50));
}

#[tokio::test]
async fn pending_payments_exclude_the_new_one() {
    let harness = TestHarness::new().await;

    harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 10, "monto": 10, "tpa_id": 1}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 10, "monto": 20, "tpa_id": 1, "ultimo_acl_id": 0}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let pendientes = body["pendientes"].as_array().unwrap();
    assert_eq!(pendientes.len(), 1);
    assert_eq!(pendientes[0]["abonocliente"]["acl_id"], 1);
    assert_eq!(body["acl_id"], 2);
}

// ============================================================================
// Multi Payment
// ============================================================================

#[tokio::test]
async fn split_fills_credits_in_order() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/multipago")
        .json(&json!({
            "ccl_ids": [12, 10, 11],
            "monto": 350.0,
            "tpa_id": 4,
            "referencia": "Transferencia"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["liquidados"], json!([12]));
    assert_eq!(body["parciales"], json!([10]));
    assert_eq!(body["sin_aplicar"], json!([11]));

    let distribucion = body["distribucion"].as_array().unwrap();
    assert_eq!(distribucion.len(), 2);
    assert_eq!(distribucion[1]["montoAplicado"].as_f64(), Some(150.0));
    assert_eq!(distribucion[1]["nuevoSaldo"].as_f64(), Some(350.0));

    let tables = harness.tables().await;
    assert_eq!(tables.payment_groups.len(), 1);
    assert!(tables.payments.values().all(|p| p.acp_id.is_some()));
    assert!(tables.payments.values().all(|p| p.comentario.is_empty()));
}

#[tokio::test]
async fn split_over_total_balance_rolls_back() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/multipago")
        .json(&json!({"ccl_ids": [10, 12], "monto": 800, "tpa_id": 1}))
        .await;

    response.assert_status_bad_request();
    let tables = harness.tables().await;
    assert!(tables.payment_groups.is_empty());
    assert!(tables.payments.is_empty());
}

#[tokio::test]
async fn split_needs_two_credits() {
    let harness = TestHarness::new().await;

    let response = harness
        .post("/api/abonos/multipago")
        .json(&json!({"ccl_ids": [10], "monto": 10, "tpa_id": 1}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation");
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn sync_and_balance_reads() {
    let harness = TestHarness::new().await;

    harness
        .post("/api/abonos/crear")
        .json(&json!({"ccl_id": 11, "monto": 100, "tpa_id": 1}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = harness.get("/api/abonos/sync?desde=0&ccl_id=11").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 1);
    assert!(body["abonos"][0]["movimiento"].is_object());

    let response = harness.get("/api/abonos/saldo/11").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["saldo"].as_f64(), Some(200.0));
    assert_eq!(body["liquidado"], false);
}

#[tokio::test]
async fn balance_with_non_numeric_id_is_a_json_validation_error() {
    let harness = TestHarness::new().await;

    let response = harness.get("/api/abonos/saldo/abc").await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Datos inválidos"));
}
