//! Common test utilities for tunnel integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::path::Path;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use tunnel_backup::BackupConfig;
use tunnel_service::{create_router, AppState, ServiceConfig};
use tunnel_store::{MemoryStore, SalesConfig, Tables};

/// Shared secret used by every harness.
pub const API_KEY: &str = "test-api-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct access to the tables behind the server.
    pub store: MemoryStore,
    /// Temporary backup directory (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a harness over the standard fixture.
    pub async fn new() -> Self {
        Self::with_config(|_, _| {}).await
    }

    /// Create a harness, letting the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut ServiceConfig, &Path)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MemoryStore::new();
        store.seed(fixture).await;

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            api_key: Some(API_KEY.into()),
            backup: BackupConfig::new()
                .with_backup_dir(temp_dir.path())
                .with_public_url("http://tunnel.test"),
            ..ServiceConfig::default()
        };
        adjust(&mut config, temp_dir.path());

        let state = AppState::new(Arc::new(store.clone()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// The `API-KEY` header pair.
    pub fn api_key() -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("api-key"),
            HeaderValue::from_static(API_KEY),
        )
    }

    /// Authenticated `POST`.
    pub fn post(&self, path: &str) -> TestRequest {
        let (name, value) = Self::api_key();
        self.server.post(path).add_header(name, value)
    }

    /// Authenticated `GET`.
    pub fn get(&self, path: &str) -> TestRequest {
        let (name, value) = Self::api_key();
        self.server.get(path).add_header(name, value)
    }

    /// Authenticated `DELETE`.
    pub fn delete(&self, path: &str) -> TestRequest {
        let (name, value) = Self::api_key();
        self.server.delete(path).add_header(name, value)
    }

    /// A copy of the committed tables.
    pub async fn tables(&self) -> Tables {
        self.store.snapshot().await
    }
}

/// Standard data: a walk-in client, a credit customer with three open
/// credits, a taxed article with stock and one supplier.
fn fixture(t: &mut Tables) {
    t.sales_config = Some(SalesConfig {
        cot_header: "Cotización".into(),
        decimales: 2,
        ..SalesConfig::default()
    });
    t.add_currency(1, "MXN", true);
    t.add_vendor(3, "Mostrador");
    t.add_user(1, "Sistema", Some(3));
    t.add_user(23, "Bot CUSPI", None);
    t.add_cash_drawer(1, dec!(1000.00));

    t.add_client(1, "PUBLICO EN GENERAL");
    t.add_client(2, "Juan Pérez");
    t.add_client(3, "Baja Temporal").status = -1;

    t.add_credit(10, 2, dec!(500.00));
    t.add_credit(11, 2, dec!(300.00));
    t.add_credit(12, 2, dec!(200.00));

    let article = t.add_article(7, "TOR-01", dec!(116.00));
    article.pre_compra_prom = dec!(50.00);
    article.existencia = dec!(10);
    article.unidad_compra = Some("CAJA".into());
    t.add_tax(1, "IVA", dec!(16), &[7]);
    t.add_article(8, "TOR-02", dec!(20.00)).status = 0;

    t.add_supplier(4, "Aceros del Norte");
}
