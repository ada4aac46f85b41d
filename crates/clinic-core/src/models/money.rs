//! Monetary amounts.
//!
//! Amounts are `Decimal` in the domain and integer minor units (two decimal
//! places) at rest.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ClinicError, ClinicResult};

/// Number of decimal places kept for every amount.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Convert an amount to minor units, rejecting negative amounts and amounts
/// with more precision than [`MINOR_UNIT_SCALE`].
pub fn to_minor_units(amount: Decimal) -> ClinicResult<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ClinicError::Validation {
            message: format!("amount must not be negative: {amount}"),
        });
    }
    if amount.round_dp(MINOR_UNIT_SCALE) != amount {
        return Err(ClinicError::Validation {
            message: format!("amount has more than {MINOR_UNIT_SCALE} decimal places: {amount}"),
        });
    }
    (amount * Decimal::from(100))
        .to_i64()
        .ok_or_else(|| ClinicError::Validation {
            message: format!("amount out of range: {amount}"),
        })
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_and_fractional_amounts_convert() {
        assert_eq!(to_minor_units(Decimal::new(1000, 2)).unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::new(15, 1)).unwrap(), 150);
        assert_eq!(to_minor_units(Decimal::from(3)).unwrap(), 300);
    }

    #[test]
    fn sub_cent_precision_is_rejected() {
        assert!(to_minor_units(Decimal::new(1001, 3)).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(to_minor_units(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn minor_units_restore_two_places() {
        assert_eq!(from_minor_units(3000), Decimal::new(3000, 2));
        assert_eq!(from_minor_units(3000).to_string(), "30.00");
    }
}
