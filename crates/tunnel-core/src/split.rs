//! Spreading one payment over several credit accounts.
//!
//! Accounts are filled greedily in the order the caller lists them. Each one
//! takes `min(remaining, balance)` until nothing is left; the rest are
//! reported as untouched.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::credit::is_settled;
use crate::error::{Result, TunnelError};
use crate::ids::{ClientId, CreditId};
use crate::money::{floor_zero, round2};

/// An account taking part in a split, with its balance at lock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAccount {
    /// Credit account.
    pub credit_id: CreditId,
    /// Owning customer.
    pub client_id: ClientId,
    /// Outstanding balance before the split.
    pub balance: Decimal,
}

/// One planned leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitLeg {
    /// Credit account.
    pub credit_id: CreditId,
    /// Balance before the leg.
    pub balance_before: Decimal,
    /// Amount applied.
    pub amount: Decimal,
    /// Balance after the leg.
    pub balance_after: Decimal,
    /// Whether this leg pays the account off.
    pub settles: bool,
}

/// The full distribution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitPlan {
    /// Legs in application order.
    pub legs: Vec<SplitLeg>,
    /// Accounts that receive nothing.
    pub untouched: Vec<CreditId>,
}

impl SplitPlan {
    /// Accounts fully paid off by this plan.
    #[must_use]
    pub fn settled(&self) -> Vec<CreditId> {
        self.legs
            .iter()
            .filter(|l| l.settles)
            .map(|l| l.credit_id)
            .collect()
    }

    /// Accounts that receive a leg but stay open.
    #[must_use]
    pub fn partial(&self) -> Vec<CreditId> {
        self.legs
            .iter()
            .filter(|l| !l.settles)
            .map(|l| l.credit_id)
            .collect()
    }

    /// Sum of every leg.
    #[must_use]
    pub fn applied(&self) -> Decimal {
        self.legs.iter().map(|l| l.amount).sum()
    }
}

/// Plan a split of `total` over `accounts`, keeping their order.
///
/// # Errors
///
/// - `Validation` when fewer than two accounts are given, an account repeats,
///   or `total` is not positive.
/// - `StateConflict` when the accounts belong to different customers.
/// - `LimitExceeded` when the combined balance is lower than `total`.
pub fn plan_split(accounts: &[SplitAccount], total: Decimal) -> Result<SplitPlan> {
    let total = round2(total);

    if accounts.len() < 2 {
        return Err(TunnelError::validation(
            "Se requieren al menos 2 créditos para un multipago",
        ));
    }
    if total <= Decimal::ZERO {
        return Err(TunnelError::validation("El monto debe ser mayor a 0"));
    }

    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        if !seen.insert(account.credit_id) {
            return Err(TunnelError::validation(format!(
                "El crédito {} está repetido en la lista",
                account.credit_id
            )));
        }
    }

    let owner = accounts[0].client_id;
    if let Some(other) = accounts.iter().find(|a| a.client_id != owner) {
        return Err(TunnelError::conflict(format!(
            "Todos los créditos deben pertenecer al mismo cliente (crédito {} es del cliente {}, se esperaba {})",
            other.credit_id, other.client_id, owner
        )));
    }

    let available: Decimal = accounts.iter().map(|a| round2(a.balance)).sum();
    if total > available {
        return Err(TunnelError::LimitExceeded {
            what: "monto",
            limit_label: "el saldo pendiente total",
            limit: available,
            requested: total,
        });
    }

    let mut remaining = total;
    let mut plan = SplitPlan::default();

    for account in accounts {
        let balance = round2(account.balance);
        if remaining <= Decimal::ZERO || balance <= Decimal::ZERO {
            plan.untouched.push(account.credit_id);
            continue;
        }

        let amount = remaining.min(balance);
        let balance_after = floor_zero(round2(balance - amount));
        remaining = round2(remaining - amount);

        plan.legs.push(SplitLeg {
            credit_id: account.credit_id,
            balance_before: balance,
            amount,
            balance_after,
            settles: is_settled(balance_after),
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(id: i64, balance: Decimal) -> SplitAccount {
        SplitAccount {
            credit_id: CreditId::new(id),
            client_id: ClientId::new(7),
            balance,
        }
    }

    #[test]
    fn test_fills_in_caller_order() {
        let plan = plan_split(&[account(1, dec!(100)), account(2, dec!(50))], dec!(120)).unwrap();

        assert_eq!(plan.legs.len(), 2);
        assert_eq!(plan.legs[0].amount, dec!(100));
        assert_eq!(plan.legs[0].balance_after, Decimal::ZERO);
        assert!(plan.legs[0].settles);
        assert_eq!(plan.legs[1].amount, dec!(20));
        assert_eq!(plan.legs[1].balance_after, dec!(30));
        assert!(!plan.legs[1].settles);
        assert_eq!(plan.settled(), vec![CreditId::new(1)]);
        assert_eq!(plan.partial(), vec![CreditId::new(2)]);
        assert_eq!(plan.applied(), dec!(120));
    }

    #[test]
    fn test_order_not_balance_size() {
        let plan = plan_split(&[account(2, dec!(50)), account(1, dec!(100))], dec!(60)).unwrap();
        assert_eq!(plan.legs[0].credit_id, CreditId::new(2));
        assert_eq!(plan.legs[0].amount, dec!(50));
        assert_eq!(plan.legs[1].amount, dec!(10));
    }

    #[test]
    fn test_untouched_after_exhausted() {
        let plan = plan_split(
            &[account(1, dec!(80)), account(2, dec!(50)), account(3, dec!(10))],
            dec!(80),
        )
        .unwrap();
        assert_eq!(plan.legs.len(), 1);
        assert_eq!(plan.untouched, vec![CreditId::new(2), CreditId::new(3)]);
        assert_eq!(plan.applied(), dec!(80));
    }

    #[test]
    fn test_sum_of_legs_equals_total_with_cents() {
        let plan = plan_split(
            &[account(1, dec!(33.33)), account(2, dec!(33.33)), account(3, dec!(33.34))],
            dec!(70.01),
        )
        .unwrap();
        assert_eq!(plan.applied(), dec!(70.01));
        assert_eq!(plan.legs[2].amount, dec!(3.35));
    }

    #[test]
    fn test_rejects_single_account() {
        let err = plan_split(&[account(1, dec!(10))], dec!(5)).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = plan_split(&[account(1, dec!(10)), account(1, dec!(10))], dec!(5)).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_rejects_mixed_clients() {
        let mut other = account(2, dec!(10));
        other.client_id = ClientId::new(8);
        let err = plan_split(&[account(1, dec!(10)), other], dec!(5)).unwrap_err();
        assert_eq!(err.code(), "state_conflict");
    }

    #[test]
    fn test_rejects_over_total_balance() {
        let err = plan_split(&[account(1, dec!(10)), account(2, dec!(10))], dec!(20.01)).unwrap_err();
        assert_eq!(err.code(), "limit_exceeded");
    }

    #[test]
    fn test_rejects_non_positive_total() {
        let err = plan_split(&[account(1, dec!(10)), account(2, dec!(10))], Decimal::ZERO).unwrap_err();
        assert_eq!(err.code(), "validation");
    }
}
