//! Money helpers.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// A credit whose balance is at or below this amount is considered paid off.
pub const SETTLE_TOLERANCE: Decimal = dec!(0.01);

/// Round to cents, midpoint away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    round_dp(value, 2)
}

/// Round to `dp` places, midpoint away from zero.
#[must_use]
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp negative values to zero.
#[must_use]
pub fn floor_zero(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Render with a fixed number of decimals, as the ERP stores them.
#[must_use]
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, round_dp(value, dp))
}
