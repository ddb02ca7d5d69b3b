//! Money
//!
//! Amounts are carried as integer minor units. Percentages are applied in decimal space and
//! rounded half away from zero.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso};
use thiserror::Error;

/// Unsigned amount in minor units (prices, fees, totals).
pub type Amount = u64;

/// Signed amount in minor units (ledger entries, balances).
pub type SignedAmount = i64;

/// Errors raised by money arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Amount arithmetic overflowed.
    #[error("amount overflowed")]
    Overflow,
}

/// Build a percentage from whole percent points, e.g. `15` for 15%.
#[must_use]
pub fn percent_points(points: u16) -> Percentage {
    Percentage::from(Decimal::from(points) / Decimal::ONE_HUNDRED)
}

/// Calculate `percent` of a minor unit amount.
///
/// # Errors
///
/// Returns [`MoneyError::PercentConversion`] if the calculation cannot be represented.
pub fn percent_of(percent: &Percentage, amount: Amount) -> Result<Amount, MoneyError> {
    let amount = Decimal::from_u64(amount).ok_or(MoneyError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(amount)
        .ok_or(MoneyError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(MoneyError::PercentConversion)
}

/// Convert an unsigned amount into a signed ledger amount.
///
/// # Errors
///
/// Returns [`MoneyError::Overflow`] when the amount does not fit in an `i64`.
pub fn signed(amount: Amount) -> Result<SignedAmount, MoneyError> {
    SignedAmount::try_from(amount).map_err(|_overflow| MoneyError::Overflow)
}

/// Render an amount for humans in the given ISO currency, falling back to EGP.
#[must_use]
pub fn display_amount(amount: SignedAmount, currency_code: &str) -> String {
    let currency = iso::find(currency_code).unwrap_or(iso::EGP);

    Money::from_minor(amount, currency).to_string()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(percent_of(&percent_points(5), 1_050)?, 53);
        assert_eq!(percent_of(&percent_points(15), 1_000)?, 150);
        assert_eq!(percent_of(&percent_points(0), 1_000)?, 0);

        Ok(())
    }

    #[test]
    fn percent_of_overflow_returns_error() {
        let result = percent_of(&Percentage::from(2.0), u64::MAX);

        assert_eq!(result, Err(MoneyError::PercentConversion));
    }

    #[test]
    fn signed_rejects_out_of_range_amounts() {
        assert_eq!(signed(u64::MAX), Err(MoneyError::Overflow));
        assert_eq!(signed(42), Ok(42));
    }

    #[test]
    fn display_amount_falls_back_to_default_currency() {
        let unknown = display_amount(12_345, "???");
        let egp = display_amount(12_345, "EGP");

        assert_eq!(unknown, egp);
        assert!(egp.contains("123"), "expected major units in {egp}");
    }
}
