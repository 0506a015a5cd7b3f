//! Error types for TunnelCUSPI.

use rust_decimal::Decimal;

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, TunnelError>;

/// Errors that can occur while validating or applying a write.
///
/// The variants are tagged so callers can react without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    /// Request shape or field rule violated.
    #[error("{0}")]
    Validation(String),

    /// A referenced row does not exist.
    #[error("{entity} ID {id} no encontrado")]
    NotFound {
        /// Human readable entity name.
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// The row exists but is in a state that forbids the operation.
    #[error("{0}")]
    StateConflict(String),

    /// An amount or quantity exceeds what is available.
    #[error("El {what} ({requested}) excede {limit_label} ({limit})")]
    LimitExceeded {
        /// What was requested (e.g. "monto").
        what: &'static str,
        /// Label for the limit (e.g. "el saldo pendiente").
        limit_label: &'static str,
        /// The available limit.
        limit: Decimal,
        /// The requested amount.
        requested: Decimal,
    },

    /// Invalid identifier.
    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl TunnelError {
    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a state conflict.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::StateConflict(msg.into())
    }

    /// Stable machine-readable code for the variant.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::StateConflict(_) => "state_conflict",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::Storage(_) => "internal",
        }
    }

    /// Whether the failure is caused by the caller rather than the backend.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_message() {
        let err = TunnelError::LimitExceeded {
            what: "monto",
            limit_label: "el saldo pendiente",
            limit: dec!(50.00),
            requested: dec!(80.00),
        };
        assert_eq!(
            err.to_string(),
            "El monto (80.00) excede el saldo pendiente (50.00)"
        );
        assert_eq!(err.code(), "limit_exceeded");
    }

    #[test]
    fn test_codes() {
        assert_eq!(TunnelError::validation("x").code(), "validation");
        assert_eq!(
            TunnelError::NotFound {
                entity: "Caja",
                id: 9
            }
            .to_string(),
            "Caja ID 9 no encontrado"
        );
        assert!(!TunnelError::Storage("down".into()).is_client_error());
    }
}
