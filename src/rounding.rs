//! Money rounding helpers
//!
//! Amounts are carried at full precision through every calculation and
//! rounded to agorot (2 dp, half away from zero) only when a component
//! emits its result.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept on money outputs
pub const MONEY_DP: u32 = 2;

/// Round an `f64` money amount to 2 dp
///
/// Goes through `Decimal` so that values such as `2.675` round the way a
/// reader of the printed number expects, not the way their binary
/// representation happens to fall.
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    to_money_decimal(value).to_f64().unwrap_or(0.0)
}

/// Convert an `f64` money amount into a 2 dp `Decimal`
pub fn to_money_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a `Decimal` money amount to 2 dp
pub fn round_decimal(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(2.675), 2.68);
        assert_eq!(round_money(-2.675), -2.68);
        assert_eq!(round_money(1234.5649), 1234.56);
    }

    #[test]
    fn test_non_finite_rounds_to_zero() {
        assert_eq!(round_money(f64::NAN), 0.0);
        assert_eq!(round_money(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_to_money_decimal() {
        assert_eq!(to_money_decimal(100.005), dec!(100.01));
        assert_eq!(to_money_decimal(0.0), Decimal::ZERO);
        assert_eq!(round_decimal(dec!(-0.125)), dec!(-0.13));
    }
}
