//! Core types and rules for the TunnelCUSPI bridge.
//!
//! This crate holds the pure domain logic shared by the store and the HTTP
//! service. Nothing in here performs I/O:
//!
//! - **Identifiers**: `CreditId`, `PaymentId`, `CashDrawerId`, `ClientId`, ...
//! - **Money**: two-decimal rounding and the settle tolerance
//! - **Credits**: `CreditStatus`, `PaymentFact`, `outstanding_balance`
//! - **Payments**: `PaymentMethod`, `CardKind`, `PaymentTerms`
//! - **Splits**: `plan_split` for one amount spread over several credits
//! - **Pricing**: tax-inclusive/exclusive prices, quotation lines, sale costing
//! - **Words**: Mexican peso amounts rendered as text
//!
//! # Money
//!
//! Every amount is a `rust_decimal::Decimal`. Values are rounded to cents
//! (midpoint away from zero) before they are compared or persisted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credit;
pub mod error;
pub mod ids;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod split;
pub mod validation;
pub mod words;

pub use credit::{
    is_settled, outstanding_balance, CreditStatus, NoteFact, PaymentFact, PaymentStatus, VoidRule,
};
pub use error::{Result, TunnelError};
pub use ids::{
    ArticleId, CashDrawerId, ClientGroupId, ClientId, CreditId, CreditNoteId, CurrencyId, IdError,
    PaymentGroupId, PaymentId, PurchaseOrderId, QuotationId, SaleId, SupplierId, TaxId,
    TaxRegimeId, UserId, VendorId,
};
pub use money::{round2, SETTLE_TOLERANCE};
pub use payment::{CardKind, PaymentMethod, PaymentTerms};
pub use split::{plan_split, SplitAccount, SplitLeg, SplitPlan};
pub use words::amount_to_words;
