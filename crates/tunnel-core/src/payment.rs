//! Payment methods (`tipopago.tpa_id`) and card details.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunnelError};

/// Payment method codes accepted for client payments.
///
/// Codes 3 (store credit) and 7 (advance) exist in the ERP but cannot be used
/// to pay down a credit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Efectivo.
    Cash,
    /// Cheque.
    Cheque,
    /// Transferencia.
    Transfer,
    /// Vales.
    Vouchers,
    /// Tarjeta.
    Card,
}

impl PaymentMethod {
    /// Every accepted code, in ERP order.
    pub const ALLOWED_CODES: [i32; 5] = [1, 2, 4, 5, 6];

    /// Decode a `tpa_id`.
    ///
    /// # Errors
    ///
    /// Returns `TunnelError::Validation` for codes outside the allowed set.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Self::Cash),
            2 => Ok(Self::Cheque),
            4 => Ok(Self::Transfer),
            5 => Ok(Self::Vouchers),
            6 => Ok(Self::Card),
            other => Err(TunnelError::validation(format!(
                "Tipo de pago inválido ({other}). Valores permitidos: 1, 2, 4, 5, 6"
            ))),
        }
    }

    /// Column value.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Cash => 1,
            Self::Cheque => 2,
            Self::Transfer => 4,
            Self::Vouchers => 5,
            Self::Card => 6,
        }
    }
}

/// Card kind stored in `abonoclientetarjeta.tipo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Tarjeta de crédito.
    Credito,
    /// Tarjeta de débito.
    Debito,
}

impl CardKind {
    /// Column value.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Credito => 1,
            Self::Debito => 2,
        }
    }

    /// Decode from the column value.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Credito),
            2 => Some(Self::Debito),
            _ => None,
        }
    }
}

impl std::str::FromStr for CardKind {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "credito" | "crédito" | "credit" | "1" => Ok(Self::Credito),
            "debito" | "débito" | "debit" | "2" => Ok(Self::Debito),
            other => Err(TunnelError::validation(format!(
                "Tipo de tarjeta inválido ({other}). Valores permitidos: credito, debito"
            ))),
        }
    }
}

/// A validated method plus its card kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTerms {
    /// Method.
    pub method: PaymentMethod,
    /// Present exactly when `method` is `Card`.
    pub card: Option<CardKind>,
}

impl PaymentTerms {
    /// Validate a method code and an optional card kind together.
    ///
    /// # Errors
    ///
    /// Returns `TunnelError::Validation` when the code is not accepted, when
    /// a card payment has no card kind, or when a card kind is sent with a
    /// non-card method.
    pub fn parse(tpa_id: i32, card: Option<&str>) -> Result<Self> {
        let method = PaymentMethod::from_code(tpa_id)?;
        let card = card
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::parse::<CardKind>)
            .transpose()?;

        match (method, card) {
            (PaymentMethod::Card, None) => Err(TunnelError::validation(
                "El tipo de tarjeta es obligatorio cuando el tipo de pago es tarjeta",
            )),
            (PaymentMethod::Card, Some(kind)) => Ok(Self {
                method,
                card: Some(kind),
            }),
            (_, Some(_)) => Err(TunnelError::validation(
                "El tipo de tarjeta solo aplica cuando el tipo de pago es tarjeta",
            )),
            (_, None) => Ok(Self { method, card: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_codes_round_trip() {
        for code in PaymentMethod::ALLOWED_CODES {
            assert_eq!(PaymentMethod::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_store_credit_and_advance_rejected() {
        for code in [3, 7, 0, 99] {
            let err = PaymentMethod::from_code(code).unwrap_err();
            assert_eq!(err.code(), "validation");
        }
    }

    #[test]
    fn test_card_requires_kind() {
        assert!(PaymentTerms::parse(6, None).is_err());
        assert!(PaymentTerms::parse(6, Some("  ")).is_err());
        let terms = PaymentTerms::parse(6, Some("Débito")).unwrap();
        assert_eq!(terms.card, Some(CardKind::Debito));
    }

    #[test]
    fn test_kind_only_with_card() {
        assert!(PaymentTerms::parse(1, Some("credito")).is_err());
        let terms = PaymentTerms::parse(1, None).unwrap();
        assert_eq!(terms.method, PaymentMethod::Cash);
        assert!(terms.card.is_none());
    }

    #[test]
    fn test_unknown_card_kind() {
        assert!(PaymentTerms::parse(6, Some("amex")).is_err());
    }
}
