//! Identifier types for ERP rows.
//!
//! Every SICAR table is keyed by a signed integer column (`ccl_id`, `acl_id`,
//! `caj_id`, ...). These newtypes keep a credit id from being passed where a
//! payment id is expected.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for integer identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define an integer identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as a JSON number)
/// - `FromStr`, `Display`, `Debug`
/// - `From<i64>`, `Into<i64>`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(42);
/// let parsed: MyId = "42".parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new identifier from its raw column value.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw column value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| IdError::InvalidInteger(s.to_string()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Error parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The value is not an integer.
    #[error("invalid integer id: {0}")]
    InvalidInteger(String),
}

int_id_type!(CreditId, "Credit account (`creditocliente.ccl_id`).");
int_id_type!(PaymentId, "Client payment (`abonocliente.acl_id`).");
int_id_type!(PaymentGroupId, "Payment group (`abonoclientepago.acp_id`).");
int_id_type!(CashDrawerId, "Cash drawer (`caja.caj_id`).");
int_id_type!(UserId, "ERP user (`usuario.usu_id`).");
int_id_type!(ClientId, "Customer (`cliente.cli_id`).");
int_id_type!(ClientGroupId, "Customer group (`grupocliente.grc_id`).");
int_id_type!(TaxRegimeId, "Tax regime (`regimenfiscal.rgf_id`).");
int_id_type!(ArticleId, "Article (`articulo.art_id`).");
int_id_type!(SupplierId, "Supplier (`proveedor.pro_id`).");
int_id_type!(QuotationId, "Quotation (`cotizacion.cot_id`).");
int_id_type!(SaleId, "Sale (`venta.ven_id`).");
int_id_type!(PurchaseOrderId, "Purchase order (`pedido.ped_id`).");
int_id_type!(TaxId, "Tax (`impuesto.imp_id`).");
int_id_type!(CurrencyId, "Currency (`moneda.mon_id`).");
int_id_type!(VendorId, "Sales person (`vendedor.vnd_id`).");
int_id_type!(CreditNoteId, "Credit note (`notacredito.ncr_id`).");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: CreditId = " 120 ".parse().unwrap();
        assert_eq!(id, CreditId::new(120));
        assert_eq!(id.to_string(), "120");
        assert_eq!(format!("{id:?}"), "CreditId(120)");
    }

    #[test]
    fn test_parse_rejects_text() {
        assert!("abc".parse::<PaymentId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ArticleId::new(1634);
        assert_eq!(serde_json::to_string(&id).unwrap(), "1634");
        let back: ArticleId = serde_json::from_str("1634").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let mut ids = vec![CreditId::new(9), CreditId::new(3), CreditId::new(5)];
        ids.sort();
        assert_eq!(ids, vec![CreditId::new(3), CreditId::new(5), CreditId::new(9)]);
    }
}
