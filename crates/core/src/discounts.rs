//! Discount arithmetic
//!
//! Minor-unit rounding and apportionment utilities shared by the pricing
//! evaluator. All rounding happens here, half away from zero, so the
//! evaluator rounds exactly where the pricing pipeline says it does.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// A percentage or ratio calculation overflowed or could not be safely
    /// represented in minor units.
    #[error("discount conversion overflowed or was not finite")]
    Conversion,
}

/// Calculate a percentage of a minor-unit amount, rounded half away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::Conversion`] if the multiplication overflows or
/// the rounded result does not fit in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    // Percentage does not expose its inner Decimal; multiplying by one does.
    fraction_of_minor((*percent) * Decimal::ONE, minor)
}

/// Calculate a decimal fraction (`0.15` for 15%) of a minor-unit amount,
/// rounded half away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::Conversion`] if the multiplication overflows or
/// the rounded result does not fit in minor units.
pub fn fraction_of_minor(fraction: Decimal, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::Conversion)?;

    round_to_minor(fraction.checked_mul(minor).ok_or(DiscountError::Conversion)?)
}

/// The fraction of `whole` contributed by `part`, as a decimal ratio.
///
/// A non-positive `whole` yields a zero ratio, so an empty cart apportions
/// nothing rather than dividing by zero.
#[must_use]
pub fn ratio_of_minor(part: i64, whole: i64) -> Decimal {
    if whole <= 0 {
        return Decimal::ZERO;
    }

    Decimal::from(part)
        .checked_div(Decimal::from(whole))
        .unwrap_or(Decimal::ZERO)
}

/// Apply `fraction` to the share of `amount` selected by `ratio`, rounding
/// once at the end.
///
/// This is the coupon step of the pricing pipeline: the discount percentage
/// is taken from the already-discounted amount apportioned by the eligible
/// ratio, not from the raw eligible subtotal.
///
/// # Errors
///
/// Returns [`DiscountError::Conversion`] if the multiplications overflow or
/// the rounded result does not fit in minor units.
pub fn apportioned_minor(amount: i64, ratio: Decimal, fraction: Decimal) -> Result<i64, DiscountError> {
    let share = Decimal::from(amount)
        .checked_mul(ratio)
        .ok_or(DiscountError::Conversion)?;

    round_to_minor(share.checked_mul(fraction).ok_or(DiscountError::Conversion)?)
}

fn round_to_minor(amount: Decimal) -> Result<i64, DiscountError> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::Conversion)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(0.15);

        assert_eq!(percent_of_minor(&percent, 1000)?, 150);

        Ok(())
    }

    #[test]
    fn fraction_of_minor_rounds_half_away_from_zero() -> TestResult {
        // 0.15 * 50 = 7.5 rounds up to 8, not to even.
        assert_eq!(fraction_of_minor(Decimal::new(15, 2), 50)?, 8);

        Ok(())
    }

    #[test]
    fn fraction_of_minor_overflow_returns_error() {
        let huge = Decimal::from_i64(i64::MAX).unwrap_or(Decimal::MAX);

        let result = fraction_of_minor(huge, i64::MAX);

        assert!(matches!(result, Err(DiscountError::Conversion)));
    }

    #[test]
    fn ratio_of_minor_zero_whole_is_zero() {
        assert_eq!(ratio_of_minor(100, 0), Decimal::ZERO);
        assert_eq!(ratio_of_minor(100, -5), Decimal::ZERO);
    }

    #[test]
    fn ratio_of_minor_is_part_over_whole() {
        assert_eq!(ratio_of_minor(250, 1000), Decimal::new(25, 2));
    }

    #[test]
    fn apportioned_minor_rounds_once_at_the_end() -> TestResult {
        // 850 * (2/3) * 0.10 = 56.66... rounds to 57; intermediate values
        // are never rounded.
        let ratio = ratio_of_minor(2, 3);

        assert_eq!(apportioned_minor(850, ratio, Decimal::new(10, 2))?, 57);

        Ok(())
    }

    #[test]
    fn apportioned_minor_full_ratio_matches_fraction_of_minor() -> TestResult {
        let fraction = Decimal::new(10, 2);

        assert_eq!(
            apportioned_minor(900, Decimal::ONE, fraction)?,
            fraction_of_minor(fraction, 900)?,
        );

        Ok(())
    }
}
