//! Price derivation for quotation and sale lines.
//!
//! Mirrors the ERP calculator: taxes are applied on top of a base price
//! (IEPS quota first, then every active article tax) and the untaxed price is
//! recovered by dividing out the percentage taxes only.

use rust_decimal::Decimal;
use serde::Serialize;

/// One tax linked to an article (`articuloimpuesto` joined to `impuesto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleTax {
    /// `impuesto.porcentaje`: a rate when `percentage`, an amount otherwise.
    pub rate: Decimal,
    /// `impuesto.aplicacion = 1`.
    pub percentage: bool,
}

/// IEPS settings of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ieps {
    /// `articulo.iepsActivo`.
    pub active: bool,
    /// `articulo.cuotaIeps`.
    pub quota: Decimal,
}

/// Base price plus IEPS plus every tax.
///
/// Percentage taxes apply to the base after IEPS; fixed taxes add their rate
/// as an amount.
#[must_use]
pub fn price_with_taxes(base: Decimal, ieps: Ieps, taxes: &[ArticleTax]) -> Decimal {
    let mut base = base;
    if ieps.active && ieps.quota > Decimal::ZERO {
        base += ieps.quota;
    }

    taxes.iter().fold(base, |acc, tax| {
        if tax.percentage {
            acc + base * tax.rate / Decimal::ONE_HUNDRED
        } else {
            acc + tax.rate
        }
    })
}

/// Remove percentage taxes from a tax-inclusive price.
#[must_use]
pub fn price_without_taxes(price_with: Decimal, taxes: &[ArticleTax]) -> Decimal {
    let factor = taxes
        .iter()
        .filter(|t| t.percentage)
        .fold(Decimal::ONE, |acc, t| acc + t.rate / Decimal::ONE_HUNDRED);

    if factor > Decimal::ONE {
        price_with / factor
    } else {
        price_with
    }
}

/// Average purchase cost per sale unit (`preCompraProm / factor`).
#[must_use]
pub fn unit_cost(average_cost: Decimal, factor: Decimal) -> Decimal {
    if factor.is_zero() {
        average_cost
    } else {
        average_cost / factor
    }
}

/// Pick the sale price for a client.
///
/// When `per_client` (`ventaconf.numPreCli`) is off, or the level is outside
/// 1..=4, `precio1` is used.
#[must_use]
pub fn select_price_level(prices: [Decimal; 4], level: i32, per_client: bool) -> Decimal {
    if !per_client {
        return prices[0];
    }
    match level {
        2 => prices[1],
        3 => prices[2],
        4 => prices[3],
        _ => prices[0],
    }
}

/// Derived amounts of one quotation line (`detallecot`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotationLineAmounts {
    /// Quantity.
    pub quantity: Decimal,
    /// Purchase price with taxes.
    pub purchase_price: Decimal,
    /// Sale price with taxes.
    pub price_with: Decimal,
    /// Sale price without taxes.
    pub price_without: Decimal,
    /// `quantity * purchase_price`.
    pub purchase_amount: Decimal,
    /// `quantity * price_without`.
    pub amount_without: Decimal,
    /// `quantity * price_with`.
    pub amount_with: Decimal,
    /// `amount_with - purchase_amount`.
    pub difference: Decimal,
    /// Margin over cost in percent, 0 when there is no positive margin.
    pub margin: Decimal,
}

impl QuotationLineAmounts {
    /// Compute a line from its unit prices.
    #[must_use]
    pub fn compute(
        quantity: Decimal,
        purchase_price: Decimal,
        price_with: Decimal,
        price_without: Decimal,
    ) -> Self {
        let purchase_amount = purchase_price * quantity;
        let amount_without = price_without * quantity;
        let amount_with = price_with * quantity;
        let difference = amount_with - purchase_amount;
        let margin = if difference > Decimal::ZERO && purchase_amount > Decimal::ZERO {
            difference / purchase_amount * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Self {
            quantity,
            purchase_price,
            price_with,
            price_without,
            purchase_amount,
            amount_without,
            amount_with,
            difference,
            margin,
        }
    }
}

/// Cost and profit totals stored on a `venta` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SaleCosting {
    /// `totalCompra`.
    pub total_cost: Decimal,
    /// `subtotalCompra`.
    pub subtotal_cost: Decimal,
    /// `totalUtilidad = total - totalCompra`.
    pub total_profit: Decimal,
    /// `subtotalUtilidad = subtotal - subtotalCompra`.
    pub subtotal_profit: Decimal,
}

impl SaleCosting {
    /// Compute from `(purchase price, quantity)` pairs and the sale totals.
    pub fn compute(
        lines: impl IntoIterator<Item = (Decimal, Decimal)>,
        subtotal: Decimal,
        total: Decimal,
    ) -> Self {
        let cost: Decimal = lines.into_iter().map(|(price, qty)| price * qty).sum();
        Self {
            total_cost: cost,
            subtotal_cost: cost,
            total_profit: total - cost,
            subtotal_profit: subtotal - cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const IVA: ArticleTax = ArticleTax {
        rate: dec!(16),
        percentage: true,
    };

    #[test]
    fn test_price_with_taxes_percentage_and_fixed() {
        let taxes = [
            IVA,
            ArticleTax {
                rate: dec!(2.5),
                percentage: false,
            },
        ];
        assert_eq!(
            price_with_taxes(dec!(100), Ieps::default(), &taxes),
            dec!(118.5)
        );
    }

    #[test]
    fn test_ieps_quota_added_before_percentage() {
        let ieps = Ieps {
            active: true,
            quota: dec!(10),
        };
        assert_eq!(price_with_taxes(dec!(100), ieps, &[IVA]), dec!(127.6));

        let inactive = Ieps {
            active: false,
            quota: dec!(10),
        };
        assert_eq!(price_with_taxes(dec!(100), inactive, &[IVA]), dec!(116));
    }

    #[test]
    fn test_price_without_taxes_ignores_fixed() {
        let taxes = [
            IVA,
            ArticleTax {
                rate: dec!(3),
                percentage: false,
            },
        ];
        assert_eq!(price_without_taxes(dec!(116), &taxes), dec!(100));
        assert_eq!(price_without_taxes(dec!(50), &[]), dec!(50));
    }

    #[test]
    fn test_unit_cost_zero_factor() {
        assert_eq!(unit_cost(dec!(24), Decimal::ZERO), dec!(24));
        assert_eq!(unit_cost(dec!(24), dec!(12)), dec!(2));
    }

    #[test]
    fn test_select_price_level() {
        let prices = [dec!(10), dec!(9), dec!(8), dec!(7)];
        assert_eq!(select_price_level(prices, 3, true), dec!(8));
        assert_eq!(select_price_level(prices, 3, false), dec!(10));
        assert_eq!(select_price_level(prices, 5, true), dec!(10));
    }

    #[test]
    fn test_quotation_line_margin() {
        let line = QuotationLineAmounts::compute(dec!(2), dec!(50), dec!(116), dec!(100));
        assert_eq!(line.purchase_amount, dec!(100));
        assert_eq!(line.amount_with, dec!(232));
        assert_eq!(line.amount_without, dec!(200));
        assert_eq!(line.difference, dec!(132));
        assert_eq!(line.margin, dec!(132));
    }

    #[test]
    fn test_quotation_line_zero_cost_has_no_margin() {
        let line = QuotationLineAmounts::compute(dec!(1), Decimal::ZERO, dec!(10), dec!(10));
        assert_eq!(line.margin, Decimal::ZERO);
    }

    #[test]
    fn test_sale_costing() {
        let costing = SaleCosting::compute(
            [(dec!(10), dec!(2)), (dec!(5.5), dec!(1))],
            dec!(30),
            dec!(34.8),
        );
        assert_eq!(costing.total_cost, dec!(25.5));
        assert_eq!(costing.subtotal_cost, dec!(25.5));
        assert_eq!(costing.total_profit, dec!(9.3));
        assert_eq!(costing.subtotal_profit, dec!(4.5));
    }
}
