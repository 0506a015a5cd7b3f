//! Fixed column values of the SICAR schema.
//!
//! The schema belongs to the ERP; nothing here creates or migrates it.

/// `historial.tabla` values.
pub mod audit {
    /// Payment rows.
    pub const PAYMENT: &str = "AbonoCliente";
    /// Credit status changes.
    pub const CREDIT: &str = "CreditoCliente";
    /// Customers.
    pub const CLIENT: &str = "Cliente";
    /// Quotations.
    pub const QUOTATION: &str = "cotizacion";

    /// `historial.movimiento` for an insert or change made through the bridge.
    pub const MOVE_WRITE: i32 = 0;
    /// `historial.movimiento` for a document created in the ERP flow.
    pub const MOVE_CREATE: i32 = 1;
}

/// `movimiento.tipo` for money coming into a drawer.
pub const MOVEMENT_INFLOW: i32 = 1;

/// Name fragments that identify the walk-in customer.
pub const DEFAULT_CLIENT_KEYWORDS: [&str; 3] = ["PÚBLICO", "PUBLICO", "GENERAL"];

/// Unit used when an article has no sale unit.
pub const DEFAULT_UNIT: &str = "PZA";

/// Currency written on sales.
pub const DEFAULT_CURRENCY: &str = "MXN";
