//! Credit accounts and how their outstanding balance is derived.
//!
//! A credit account (`creditocliente`) carries only its original principal.
//! The balance is never stored: it is recomputed from the payments and credit
//! notes that reference the account every time it is needed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{floor_zero, round2, SETTLE_TOLERANCE};

/// Lifecycle of a credit account (`creditocliente.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    /// Open, accepting payments.
    Open,
    /// Paid off.
    Settled,
    /// Any other status code the ERP may use (cancelled sales, etc.).
    Other(i32),
}

impl CreditStatus {
    /// Decode from the column value.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Open,
            2 => Self::Settled,
            other => Self::Other(other),
        }
    }

    /// Column value.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::Settled => 2,
            Self::Other(code) => code,
        }
    }
}

/// Lifecycle of a payment (`abonocliente.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Counted towards the balance.
    Active,
    /// Voided in the ERP.
    Voided,
}

impl PaymentStatus {
    /// Decode from the column value. Anything other than -1 counts as active.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        if code == -1 {
            Self::Voided
        } else {
            Self::Active
        }
    }

    /// Column value.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Active => 1,
            Self::Voided => -1,
        }
    }
}

/// How a voided fiscal receipt (`recepcionpago.status = -1`) affects payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoidRule {
    /// A voided receipt on any leg excludes every payment in the same group.
    ///
    /// This is what the ERP's own balance query does.
    #[default]
    Group,
    /// Only the leg whose receipt was voided is excluded.
    Leg,
}

impl std::str::FromStr for VoidRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" | "grupo" => Ok(Self::Group),
            "leg" | "abono" => Ok(Self::Leg),
            other => Err(format!("unknown void rule: {other}")),
        }
    }
}

/// What the balance query needs to know about one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFact {
    /// Amount applied (`abonocliente.total`).
    pub amount: Decimal,
    /// Payment status.
    pub status: PaymentStatus,
    /// A receipt linked to this payment is voided.
    pub receipt_voided: bool,
    /// A receipt linked to any payment of the same group is voided.
    pub group_receipt_voided: bool,
}

impl PaymentFact {
    /// An active payment with no receipts.
    #[must_use]
    pub fn active(amount: Decimal) -> Self {
        Self {
            amount,
            status: PaymentStatus::Active,
            receipt_voided: false,
            group_receipt_voided: false,
        }
    }

    /// Whether this payment reduces the balance under `rule`.
    #[must_use]
    pub fn counts(&self, rule: VoidRule) -> bool {
        if self.status == PaymentStatus::Voided || self.receipt_voided {
            return false;
        }
        match rule {
            VoidRule::Group => !self.group_receipt_voided,
            VoidRule::Leg => true,
        }
    }
}

/// What the balance query needs to know about one credit note application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteFact {
    /// Amount (`creditoclientenotcre.total`).
    pub amount: Decimal,
    /// Only status 1 counts.
    pub active: bool,
}

/// Outstanding balance of a credit account.
///
/// `principal - counted payments - active notes`, rounded to cents and
/// floored at zero.
#[must_use]
pub fn outstanding_balance(
    principal: Decimal,
    payments: &[PaymentFact],
    notes: &[NoteFact],
    rule: VoidRule,
) -> Decimal {
    let paid: Decimal = payments
        .iter()
        .filter(|p| p.counts(rule))
        .map(|p| p.amount)
        .sum();
    let noted: Decimal = notes.iter().filter(|n| n.active).map(|n| n.amount).sum();

    floor_zero(round2(principal - paid - noted))
}

/// Whether a balance is low enough to settle the account.
#[must_use]
pub fn is_settled(balance: Decimal) -> bool {
    balance <= SETTLE_TOLERANCE
}
