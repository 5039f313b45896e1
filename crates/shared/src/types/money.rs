//! Money helpers with cent precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` and every comparison that decides
//! whether an invoice is settled goes through [`round_cents`] first, so
//! sub-cent residues coming from upstream fee or interest computations
//! never leave an invoice "almost paid".

use rust_decimal::{Decimal, RoundingStrategy};

/// One cent, the smallest amount the ledgers track.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to cents using Banker's Rounding.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Rounds to cents and clamps negative values to zero.
#[must_use]
pub fn non_negative_cents(amount: Decimal) -> Decimal {
    let rounded = round_cents(amount);
    if rounded.is_sign_negative() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// Returns true if the amount is at least one cent once rounded.
#[must_use]
pub fn is_positive_amount(amount: Decimal) -> bool {
    round_cents(amount) >= CENT
}

/// Formats an amount as a fixed 2-decimal string (`"30000.00"`).
#[must_use]
pub fn fixed2(amount: Decimal) -> String {
    let mut rounded = round_cents(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Returns the smaller of two amounts.
#[must_use]
pub fn min_amount(a: Decimal, b: Decimal) -> Decimal {
    if a <= b { a } else { b }
}

/// Returns true if `applied` covers `outstanding` at cent precision.
#[must_use]
pub fn covers(applied: Decimal, outstanding: Decimal) -> bool {
    round_cents(applied) >= round_cents(outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cent_constant() {
        assert_eq!(CENT, dec!(0.01));
    }

    #[rstest]
    #[case(dec!(100.005), dec!(100.00))]
    #[case(dec!(100.015), dec!(100.02))]
    #[case(dec!(0.004), dec!(0.00))]
    #[case(dec!(-5.126), dec!(-5.13))]
    fn test_round_cents(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_cents(input), expected);
    }

    #[test]
    fn test_non_negative_cents_clamps() {
        assert_eq!(non_negative_cents(dec!(-0.01)), Decimal::ZERO);
        assert_eq!(non_negative_cents(dec!(-100)), Decimal::ZERO);
        assert_eq!(non_negative_cents(dec!(12.344)), dec!(12.34));
    }

    #[test]
    fn test_is_positive_amount() {
        assert!(is_positive_amount(dec!(0.01)));
        assert!(!is_positive_amount(dec!(0.004)));
        assert!(!is_positive_amount(Decimal::ZERO));
        assert!(!is_positive_amount(dec!(-10)));
    }

    #[rstest]
    #[case(dec!(30000), "30000.00")]
    #[case(dec!(1234.5), "1234.50")]
    #[case(dec!(0.125), "0.12")]
    #[case(dec!(99.999), "100.00")]
    fn test_fixed2(#[case] input: Decimal, #[case] expected: &str) {
        assert_eq!(fixed2(input), expected);
    }

    #[test]
    fn test_covers_ignores_sub_cent_residue() {
        assert!(covers(dec!(30000.00), dec!(30000.004)));
        assert!(covers(dec!(50), dec!(20)));
        assert!(!covers(dec!(29999.99), dec!(30000)));
    }

    #[test]
    fn test_min_amount() {
        assert_eq!(min_amount(dec!(10), dec!(20)), dec!(10));
        assert_eq!(min_amount(dec!(20), dec!(10)), dec!(10));
    }
}
