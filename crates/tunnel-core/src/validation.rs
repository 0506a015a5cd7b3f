//! Field validators shared by the write endpoints.
//!
//! Messages are in Spanish since they are shown to CUSPI operators as-is.

use rust_decimal::Decimal;

use crate::error::{Result, TunnelError};

// =============================================================================
// String Validators
// =============================================================================

/// Require a non-blank string.
///
/// # Errors
///
/// Returns `Validation` when the value is missing or blank.
pub fn require_text<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TunnelError::validation(format!(
            "El campo {field} es obligatorio"
        ))),
    }
}

/// Limit a string to `max` characters.
///
/// # Errors
///
/// Returns `Validation` when the value is longer than `max` characters.
pub fn max_len(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    if let Some(v) = value {
        if v.chars().count() > max {
            return Err(TunnelError::validation(format!(
                "El campo {field} no debe ser mayor a {max} caracteres"
            )));
        }
    }
    Ok(())
}

/// Check that a timestamp uses `Y-m-d H:i:s`.
///
/// # Errors
///
/// Returns `Validation` when the value does not parse.
pub fn datetime(field: &str, value: &str) -> Result<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S").map_err(|_| {
        TunnelError::validation(format!(
            "El campo {field} no corresponde al formato Y-m-d H:i:s"
        ))
    })
}

/// Check that a date uses `Y-m-d`, also accepting a trailing time.
///
/// # Errors
///
/// Returns `Validation` when the value does not parse.
pub fn date(field: &str, value: &str) -> Result<chrono::NaiveDate> {
    let value = value.trim();
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|_| TunnelError::validation(format!("El campo {field} no es una fecha válida")))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Require `value >= min`.
///
/// # Errors
///
/// Returns `Validation` when the value is below `min`.
pub fn min_decimal(field: &str, value: Decimal, min: Decimal) -> Result<Decimal> {
    if value < min {
        return Err(TunnelError::validation(format!(
            "El campo {field} debe ser al menos {min}"
        )));
    }
    Ok(value)
}

/// Reject values with more than `dp` decimal places.
///
/// # Errors
///
/// Returns `Validation` when the value carries more precision than `dp`.
pub fn max_decimals(field: &str, value: Decimal, dp: u32) -> Result<Decimal> {
    if value.normalize().scale() > dp {
        return Err(TunnelError::validation(format!(
            "El campo {field} no debe tener más de {dp} decimales"
        )));
    }
    Ok(value)
}

/// Require an integer within `range`.
///
/// # Errors
///
/// Returns `Validation` when the value is outside `range`.
pub fn int_in(field: &str, value: i32, range: std::ops::RangeInclusive<i32>) -> Result<i32> {
    if !range.contains(&value) {
        return Err(TunnelError::validation(format!(
            "El campo {field} debe estar entre {} y {}",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

/// Require a status of 1 or -1.
///
/// # Errors
///
/// Returns `Validation` for any other value.
pub fn status_flag(field: &str, value: i32) -> Result<i32> {
    if value == 1 || value == -1 {
        Ok(value)
    } else {
        Err(TunnelError::validation(format!(
            "El campo {field} debe ser 1 o -1"
        )))
    }
}

/// Require a non-empty list with at most `max` entries.
///
/// # Errors
///
/// Returns `Validation` when the list is empty or too long.
pub fn list_len<T>(field: &str, items: &[T], min: usize, max: usize) -> Result<()> {
    if items.len() < min {
        return Err(TunnelError::validation(format!(
            "El campo {field} debe tener al menos {min} elemento(s)"
        )));
    }
    if items.len() > max {
        return Err(TunnelError::validation(format!(
            "El campo {field} no debe tener más de {max} elementos"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("nombre", Some(" Ana ")).unwrap(), "Ana");
        assert!(require_text("nombre", Some("   ")).is_err());
        assert!(require_text("nombre", None).is_err());
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(max_len("estado", Some("Michoacán"), 9).is_ok());
        assert!(max_len("estado", Some("Michoacán"), 8).is_err());
        assert!(max_len("estado", None, 1).is_ok());
    }

    #[test]
    fn test_datetime() {
        assert!(datetime("fecha", "2025-03-01 10:15:00").is_ok());
        assert!(datetime("fecha", "2025-03-01").is_err());
    }

    #[test]
    fn test_date_accepts_both_forms() {
        assert!(date("fechaLimite", "2025-03-01").is_ok());
        assert!(date("fechaLimite", "2025-03-01 00:00:00").is_ok());
        assert!(date("fechaLimite", "01/03/2025").is_err());
    }

    #[test]
    fn test_numeric() {
        assert!(min_decimal("monto", dec!(0.01), dec!(0.01)).is_ok());
        assert!(min_decimal("monto", dec!(0.001), dec!(0.01)).is_err());
        assert!(int_in("precio", 5, 1..=5).is_ok());
        assert!(int_in("precio", 6, 1..=5).is_err());
        assert!(status_flag("status", -1).is_ok());
        assert!(status_flag("status", 0).is_err());
    }

    #[test]
    fn test_max_decimals() {
        assert_eq!(max_decimals("monto", dec!(10.50), 2).unwrap(), dec!(10.50));
        assert_eq!(max_decimals("monto", dec!(10.5000), 2).unwrap(), dec!(10.5000));
        assert!(max_decimals("monto", dec!(10.005), 2).is_err());
        assert!(max_decimals("monto", dec!(200.004), 2).is_err());
    }

    #[test]
    fn test_list_len() {
        assert!(list_len::<i32>("detalles", &[], 1, 10).is_err());
        assert!(list_len("detalles", &[1, 2], 1, 1).is_err());
        assert!(list_len("detalles", &[1], 1, 1).is_ok());
    }
}
