//! Integer money helpers.
//!
//! All amounts are stored as whole cents. Percentages are whole numbers in
//! `0..=100` and always round down, so a computed discount or commission never
//! exceeds the exact fractional value.

use rust_decimal::Decimal;

/// An amount in cents (minor currency units).
pub type Cents = i64;

/// `floor(amount * percent / 100)` without intermediate overflow.
///
/// ```
/// use vitrine_core::percentage_of;
///
/// assert_eq!(percentage_of(10_000, 10), 1_000);
/// assert_eq!(percentage_of(999, 15), 149);
/// ```
#[must_use]
pub fn percentage_of(amount: Cents, percent: i64) -> Cents {
    let product = i128::from(amount) * i128::from(percent);
    let floored = product.div_euclid(100);
    Cents::try_from(floored).unwrap_or(if floored.is_negative() {
        Cents::MIN
    } else {
        Cents::MAX
    })
}

/// Formats cents as a display amount, e.g. `5000` as `R$ 50.00`.
#[must_use]
pub fn format_brl(amount: Cents) -> String {
    let value = Decimal::new(amount, 2);
    format!("R$ {value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_down() {
        assert_eq!(percentage_of(20_000, 15), 3_000);
        assert_eq!(percentage_of(1, 50), 0);
        assert_eq!(percentage_of(199, 50), 99);
        assert_eq!(percentage_of(12_345, 0), 0);
        assert_eq!(percentage_of(12_345, 100), 12_345);
    }

    #[test]
    fn test_percentage_does_not_overflow() {
        assert_eq!(percentage_of(i64::MAX, 100), i64::MAX);
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(5_000), "R$ 50.00");
        assert_eq!(format_brl(1_999), "R$ 19.99");
        assert_eq!(format_brl(0), "R$ 0.00");
    }
}
