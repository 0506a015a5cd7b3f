//! Storage layer for TunnelCUSPI.
//!
//! Every write endpoint runs inside one database transaction. A [`Store`]
//! hands out [`Session`]s; a session exposes the table-level reads and writes
//! the workflows need and is either committed or dropped (rolled back).
//!
//! # Backends
//!
//! - [`MySqlStore`]: the SICAR database itself, through `sqlx`. Credit and
//!   cash drawer rows are read with `SELECT ... FOR UPDATE` so concurrent
//!   payments against the same account serialize.
//! - [`MemoryStore`]: in-process tables for tests and local runs. Sessions
//!   take an exclusive lock and work on a staged copy that is published only
//!   on commit.
//!
//! # Example
//!
//! ```no_run
//! use tunnel_store::{MemoryStore, Store};
//! use tunnel_core::CreditId;
//!
//! # async fn example() -> tunnel_store::Result<()> {
//! let store = MemoryStore::new();
//! let mut session = store.begin().await?;
//! let _credit = session.lock_credit(CreditId::new(1)).await?;
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)] // every Session method fails only on backend errors

pub mod error;
pub mod memory;
pub mod mysql;
pub mod rows;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, Tables};
pub use mysql::MySqlStore;
pub use rows::*;

use async_trait::async_trait;
use rust_decimal::Decimal;

use tunnel_core::{
    ArticleId, CashDrawerId, ClientGroupId, ClientId, CreditId, NoteFact, PaymentFact,
    PaymentId, PurchaseOrderId, QuotationId, SaleId, SupplierId, TaxId, TaxRegimeId, UserId,
    VendorId,
};

/// A storage backend able to open transactional sessions.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `MySQL`, in-memory for testing).
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn Session>>;

    /// Check connectivity.
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// One open transaction.
///
/// Dropping a session without calling [`Session::commit`] discards every
/// write made through it.
#[async_trait]
pub trait Session: Send {
    /// Make every write visible.
    async fn commit(self: Box<Self>) -> Result<()>;

    // =========================================================================
    // Credits and payments
    // =========================================================================

    /// Read a credit account and hold a write lock on it until the session ends.
    async fn lock_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>>;

    /// Read a credit account without locking it.
    async fn get_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>>;

    /// Payments recorded against a credit, with their receipt state.
    async fn payment_facts(&mut self, ccl_id: CreditId) -> Result<Vec<PaymentFact>>;

    /// Credit notes applied to a credit.
    async fn note_facts(&mut self, ccl_id: CreditId) -> Result<Vec<NoteFact>>;

    /// Read a cash drawer and hold a write lock on it.
    async fn lock_cash_drawer(&mut self, caj_id: CashDrawerId) -> Result<Option<CashDrawerRow>>;

    /// Add `amount` to a drawer's running total.
    async fn add_to_cash_drawer(
        &mut self,
        caj_id: CashDrawerId,
        amount: Decimal,
    ) -> Result<CashDrawerChange>;

    /// Insert a payment group.
    async fn insert_payment_group(
        &mut self,
        fecha: chrono::NaiveDate,
        total: Decimal,
        comentario: &str,
    ) -> Result<PaymentGroupRow>;

    /// Insert a payment.
    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentRow>;

    /// Insert the cash movement for a payment.
    async fn insert_movement(&mut self, movement: NewMovement) -> Result<MovementRow>;

    /// Insert the card kind of a card payment.
    async fn insert_card_detail(&mut self, detail: CardDetailRow) -> Result<()>;

    /// Append an audit entry.
    async fn insert_history(&mut self, entry: HistoryRow) -> Result<()>;

    /// Change a credit's status.
    async fn set_credit_status(&mut self, ccl_id: CreditId, status: i32) -> Result<()>;

    /// Payments with `acl_id > after`, ascending, optionally for one credit.
    async fn payments_after(
        &mut self,
        after: PaymentId,
        credit: Option<CreditId>,
    ) -> Result<Vec<SyncedPayment>>;

    /// Insert a credit account created by a sale.
    async fn insert_credit(&mut self, credit: NewCredit) -> Result<CreditId>;

    // =========================================================================
    // Customers
    // =========================================================================

    /// Read a customer.
    async fn get_client(&mut self, cli_id: ClientId) -> Result<Option<ClientRow>>;

    /// The walk-in customer: an active one named like "público general",
    /// otherwise the first active customer.
    async fn default_client(&mut self) -> Result<Option<ClientRow>>;

    /// Whether any customer already uses `clave`.
    async fn client_key_exists(&mut self, clave: &str) -> Result<bool>;

    /// Whether a customer group exists and is active.
    async fn client_group_active(&mut self, grc_id: ClientGroupId) -> Result<bool>;

    /// Whether a tax regime exists.
    async fn tax_regime_exists(&mut self, rgf_id: TaxRegimeId) -> Result<bool>;

    /// Insert a customer.
    async fn insert_client(&mut self, client: NewClient) -> Result<ClientId>;

    // =========================================================================
    // Configuration and reference data
    // =========================================================================

    /// The sales configuration row, if the ERP has one.
    async fn sales_config(&mut self) -> Result<Option<SalesConfig>>;

    /// The national active currency, otherwise the first active one.
    async fn default_currency(&mut self) -> Result<Option<CurrencyRow>>;

    /// Read a user.
    async fn get_user(&mut self, usu_id: UserId) -> Result<Option<UserRow>>;

    /// Whether a sales person exists and is active.
    async fn vendor_active(&mut self, vnd_id: VendorId) -> Result<bool>;

    // =========================================================================
    // Articles and taxes
    // =========================================================================

    /// Read an article.
    async fn get_article(&mut self, art_id: ArticleId) -> Result<Option<ArticleRow>>;

    /// Active taxes linked to an article.
    async fn article_taxes(&mut self, art_id: ArticleId) -> Result<Vec<TaxRow>>;

    /// Read a tax.
    async fn get_tax(&mut self, imp_id: TaxId) -> Result<Option<TaxRow>>;

    /// Add `delta` (usually negative) to an article's stock.
    async fn adjust_stock(&mut self, art_id: ArticleId, delta: Decimal) -> Result<()>;

    /// The newest articles by id.
    async fn recent_articles(&mut self, limit: u32) -> Result<Vec<ArticleSyncRow>>;

    // =========================================================================
    // Quotations
    // =========================================================================

    /// Insert a quotation header.
    async fn insert_quotation(&mut self, quotation: NewQuotation) -> Result<QuotationId>;

    /// Read a quotation header.
    async fn get_quotation(&mut self, cot_id: QuotationId) -> Result<Option<QuotationRow>>;

    /// Whether the article is already a line of the quotation.
    async fn quotation_has_article(&mut self, cot_id: QuotationId, art_id: ArticleId)
        -> Result<bool>;

    /// Highest line number used, 0 when empty.
    async fn max_quotation_order(&mut self, cot_id: QuotationId) -> Result<i32>;

    /// Insert a quotation line.
    async fn insert_quotation_line(&mut self, line: NewQuotationLine) -> Result<()>;

    /// Recompute subtotal and total as the sum of the lines. Returns the total.
    async fn refresh_quotation_totals(&mut self, cot_id: QuotationId) -> Result<Decimal>;

    /// Overwrite the header totals.
    async fn set_quotation_totals(
        &mut self,
        cot_id: QuotationId,
        subtotal: Decimal,
        descuento: Option<Decimal>,
        total: Decimal,
    ) -> Result<()>;

    /// Header joined with customer, user, sales person and currency.
    async fn quotation_view(&mut self, cot_id: QuotationId) -> Result<Option<QuotationView>>;

    // =========================================================================
    // Sales
    // =========================================================================

    /// Insert a sale header.
    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleId>;

    /// Insert a sale line.
    async fn insert_sale_line(&mut self, line: NewSaleLine) -> Result<()>;

    /// Insert a per-line tax.
    async fn insert_sale_line_tax(&mut self, tax: NewSaleLineTax) -> Result<()>;

    /// Insert a sale tax summary.
    async fn insert_sale_tax(&mut self, tax: NewSaleTax) -> Result<()>;

    /// Insert a sale payment method.
    async fn insert_sale_payment(&mut self, payment: NewSalePayment) -> Result<()>;

    /// Insert a credit note applied to a sale.
    async fn insert_sale_credit_note(&mut self, note: NewSaleCreditNote) -> Result<()>;

    // =========================================================================
    // Suppliers and purchase orders
    // =========================================================================

    /// Read a supplier.
    async fn get_supplier(&mut self, pro_id: SupplierId) -> Result<Option<SupplierRow>>;

    /// Insert a purchase order header.
    async fn insert_purchase_order(&mut self, order: NewPurchaseOrder) -> Result<PurchaseOrderId>;

    /// Insert a purchase order line.
    async fn insert_purchase_order_line(&mut self, line: PurchaseOrderLine) -> Result<()>;

    /// Insert or update a supplier-article link.
    async fn upsert_supplier_article(&mut self, link: SupplierArticle) -> Result<UpsertOutcome>;

    /// A link joined with article and supplier names.
    async fn supplier_article_view(
        &mut self,
        pro_id: SupplierId,
        art_id: ArticleId,
    ) -> Result<Option<SupplierArticleView>>;
}
