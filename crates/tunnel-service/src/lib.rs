//! TunnelCUSPI HTTP API.
//!
//! A thin service between the CUSPI web application and a SICAR point-of-sale
//! database. CUSPI posts JSON; this crate validates it and writes the same
//! rows SICAR's desktop client would write:
//!
//! - Customer payments, single and split over several credits
//! - Customers, quotations, sales and purchase orders
//! - Supplier-article links, one at a time or from a spreadsheet
//! - Catalog reads and database backups
//!
//! # Authentication
//!
//! Every `/api` route requires the shared secret in the `API-KEY` header.
//! `GET /health` is public.
//!
//! # Transactions
//!
//! Each write runs in one [`Session`](tunnel_store::Session). Handlers commit
//! on success; on any error the session is dropped and nothing is written.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod workflows;

pub use config::{Defaults, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, WriteContext};
