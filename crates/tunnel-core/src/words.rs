//! Peso amounts written out in words, as printed on SICAR sale tickets.
//!
//! `242.44` becomes `(DOSCIENTOS CUARENTA Y DOS PESOS 44/100 MN)`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::money::round2;

const UNITS: [&str; 10] = [
    "", "UN", "DOS", "TRES", "CUATRO", "CINCO", "SEIS", "SIETE", "OCHO", "NUEVE",
];
const TEENS: [&str; 10] = [
    "DIEZ",
    "ONCE",
    "DOCE",
    "TRECE",
    "CATORCE",
    "QUINCE",
    "DIECISÉIS",
    "DIECISIETE",
    "DIECIOCHO",
    "DIECINUEVE",
];
const TENS: [&str; 10] = [
    "", "", "VEINTE", "TREINTA", "CUARENTA", "CINCUENTA", "SESENTA", "SETENTA", "OCHENTA",
    "NOVENTA",
];
const HUNDREDS: [&str; 10] = [
    "",
    "CIENTO",
    "DOSCIENTOS",
    "TRESCIENTOS",
    "CUATROCIENTOS",
    "QUINIENTOS",
    "SEISCIENTOS",
    "SETECIENTOS",
    "OCHOCIENTOS",
    "NOVECIENTOS",
];

/// Render a non-negative amount as `(<WORDS> PESO[S] NN/100 MN)`.
///
/// The amount is rounded to cents first. Negative amounts are rendered by
/// absolute value.
#[must_use]
pub fn amount_to_words(amount: Decimal) -> String {
    let amount = round2(amount.abs());
    let whole = amount.trunc();
    let cents = ((amount - whole) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u64()
        .unwrap_or(0);
    let whole = whole.to_u64().unwrap_or(0);

    let letters = if whole == 0 {
        "CERO".to_string()
    } else {
        group(whole)
    };
    let currency = if whole == 1 { "PESO" } else { "PESOS" };

    format!("({letters} {currency} {cents:02}/100 MN)")
}

#[allow(clippy::cast_possible_truncation)]
fn group(n: u64) -> String {
    if n >= 1_000_000 {
        let millions = n / 1_000_000;
        let rest = n % 1_000_000;
        let mut text = if millions == 1 {
            "UN MILLÓN".to_string()
        } else {
            format!("{} MILLONES", group(millions))
        };
        if rest > 0 {
            text.push(' ');
            text.push_str(&group(rest));
        }
        return text;
    }

    if n >= 1000 {
        let thousands = n / 1000;
        let rest = n % 1000;
        let mut text = if thousands == 1 {
            "MIL".to_string()
        } else {
            format!("{} MIL", group(thousands))
        };
        if rest > 0 {
            text.push(' ');
            text.push_str(&group(rest));
        }
        return text;
    }

    if n >= 100 {
        if n == 100 {
            return "CIEN".to_string();
        }
        let mut text = HUNDREDS[(n / 100) as usize].to_string();
        let rest = n % 100;
        if rest > 0 {
            text.push(' ');
            text.push_str(&group(rest));
        }
        return text;
    }

    if n >= 20 {
        let mut text = TENS[(n / 10) as usize].to_string();
        let unit = n % 10;
        if unit > 0 {
            text.push_str(" Y ");
            text.push_str(UNITS[unit as usize]);
        }
        return text;
    }

    if n >= 10 {
        return TEENS[(n - 10) as usize].to_string();
    }

    UNITS[n as usize].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticket_example() {
        assert_eq!(
            amount_to_words(dec!(242.44)),
            "(DOSCIENTOS CUARENTA Y DOS PESOS 44/100 MN)"
        );
    }

    #[test]
    fn test_singular_and_zero() {
        assert_eq!(amount_to_words(dec!(1)), "(UN PESO 00/100 MN)");
        assert_eq!(amount_to_words(dec!(0.5)), "(CERO PESOS 50/100 MN)");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(amount_to_words(dec!(100)), "(CIEN PESOS 00/100 MN)");
        assert_eq!(amount_to_words(dec!(101)), "(CIENTO UN PESOS 00/100 MN)");
        assert_eq!(amount_to_words(dec!(516)), "(QUINIENTOS DIECISÉIS PESOS 00/100 MN)");
    }

    #[test]
    fn test_thousands_and_millions() {
        assert_eq!(amount_to_words(dec!(1000)), "(MIL PESOS 00/100 MN)");
        assert_eq!(
            amount_to_words(dec!(21350.07)),
            "(VEINTE Y UN MIL TRESCIENTOS CINCUENTA PESOS 07/100 MN)"
        );
        assert_eq!(amount_to_words(dec!(1000000)), "(UN MILLÓN PESOS 00/100 MN)");
        assert_eq!(
            amount_to_words(dec!(2500100)),
            "(DOS MILLONES QUINIENTOS MIL CIEN PESOS 00/100 MN)"
        );
    }

    #[test]
    fn test_rounds_cents_first() {
        assert_eq!(amount_to_words(dec!(9.999)), "(DIEZ PESOS 00/100 MN)");
    }
}
