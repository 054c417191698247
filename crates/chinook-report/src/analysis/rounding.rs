//! Rounding of the ratios the analyses report.
//!
//! Every reported figure is a quotient of integers (line counts, invoice
//! counts, or cents over a count), so rounding happens on the exact
//! rational value, half away from zero, before anything becomes an `f64`.
//! A float-first `ROUND` would instead inherit binary representation error
//! (`3 / 40` is stored just below `0.075` and rounds down to `0.07`); exact
//! decimal rounding gives `0.08`.

/// `numerator / denominator` rounded half away from zero to `places`
/// decimals, or `None` when the denominator is zero.
#[must_use]
pub fn ratio(numerator: i64, denominator: i64, places: u32) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    let scaled = round_scaled(i128::from(numerator), i128::from(denominator), places);
    Some(scaled as f64 / 10f64.powi(places as i32))
}

/// A cent amount divided by a count, in currency units rounded to cents.
#[must_use]
pub fn cents_ratio(cents: i64, count: usize, places: u32) -> Option<f64> {
    let count = i64::try_from(count).ok()?;
    ratio(cents, count.checked_mul(100)?, places)
}

/// The quotient scaled by `10^places` and rounded to the nearest integer,
/// ties away from zero.
fn round_scaled(numerator: i128, denominator: i128, places: u32) -> i128 {
    let scale = 10i128.pow(places);
    let magnitude =
        (2 * numerator.abs() * scale + denominator.abs()) / (2 * denominator.abs());
    if (numerator < 0) != (denominator < 0) {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::{cents_ratio, ratio};

    #[test]
    fn rounds_exact_halves_away_from_zero() {
        assert_eq!(ratio(3, 40, 2), Some(0.08));
        assert_eq!(ratio(7, 40, 2), Some(0.18));
        assert_eq!(ratio(427, 800, 4), Some(0.5338));
        assert_eq!(ratio(5, 2, 0), Some(3.0));
        assert_eq!(ratio(-5, 2, 0), Some(-3.0));
        assert_eq!(ratio(5, -2, 0), Some(-3.0));
    }

    #[test]
    fn rounds_non_halves_to_nearest() {
        assert_eq!(ratio(1, 3, 2), Some(0.33));
        assert_eq!(ratio(2, 3, 4), Some(0.6667));
        assert_eq!(ratio(40, 40, 3), Some(1.0));
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(10, 0, 2), None);
        assert_eq!(ratio(10, 4, 2), Some(2.5));
    }

    #[test]
    fn cents_ratio_reports_currency_units() {
        assert_eq!(cents_ratio(1000, 3, 2), Some(3.33));
        assert_eq!(cents_ratio(1750, 2, 2), Some(8.75));
        // 0.15 split two ways is exactly 0.075
        assert_eq!(cents_ratio(15, 2, 2), Some(0.08));
        assert_eq!(cents_ratio(1750, 0, 2), None);
    }
}
