//! Property-based tests for movement fingerprints.
//!
//! - Determinism: equal normalized fields give equal fingerprints
//! - Sensitivity: changing the amount, date, reference, description or
//!   either extracted name changes it

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::fingerprint::Fingerprint;
use crate::statement::Movement;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

/// Strategy to generate positive amounts with cents.
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate statement-like descriptions.
fn description() -> impl Strategy<Value = String> {
    "TRANSFERENCIA RECIBIDA - [A-Z]{3,10} [A-Z]{3,10}"
}

const SURNAMES: [&str; 5] = ["PEREZ", "GOMEZ", "LOPEZ", "FERNANDEZ", "ROMERO"];
const GIVEN_NAMES: [&str; 5] = ["JUAN", "MARIA", "ANA", "CARLOS", "LUCIA"];

fn named(date: NaiveDate, amount: Decimal, surname: &str, given: &str) -> Movement {
    Movement::new(
        date,
        format!("TRANSFERENCIA RECIBIDA - {surname} {given}"),
        amount,
        Some("R1".into()),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_same_fields_same_fingerprint(
        days in 0u64..1000,
        amount in amount(),
        description in description(),
        reference in "[A-Z0-9]{0,8}",
    ) {
        let date = base_date() + Days::new(days);
        let reference = Some(reference).filter(|r| !r.is_empty());
        let a = Movement::new(date, description.clone(), amount, reference.clone());
        let b = Movement::new(date, description.to_lowercase(), amount, reference);
        prop_assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn prop_changing_a_field_changes_fingerprint(
        days in 0u64..1000,
        amount in amount(),
        description in description(),
    ) {
        let date = base_date() + Days::new(days);
        let original = Movement::new(date, description.clone(), amount, Some("R1".into()));
        let fingerprint = Fingerprint::of(&original);

        let other_amount = Movement::new(date, description.clone(), amount + Decimal::new(1, 2), Some("R1".into()));
        let other_date = Movement::new(date + Days::new(1), description.clone(), amount, Some("R1".into()));
        let other_reference = Movement::new(date, description, amount, Some("R2".into()));

        prop_assert_ne!(&fingerprint, &Fingerprint::of(&other_amount));
        prop_assert_ne!(&fingerprint, &Fingerprint::of(&other_date));
        prop_assert_ne!(&fingerprint, &Fingerprint::of(&other_reference));
    }

    #[test]
    fn prop_changing_description_changes_fingerprint(
        days in 0u64..1000,
        amount in amount(),
        surname in 0usize..5,
        given in 0usize..5,
        suffix in 1000u32..10000,
    ) {
        let date = base_date() + Days::new(days);
        let original = named(date, amount, SURNAMES[surname], GIVEN_NAMES[given]);
        let edited = Movement::new(
            date,
            format!("TRANSFERENCIA RECIBIDA {suffix} - {} {}", SURNAMES[surname], GIVEN_NAMES[given]),
            amount,
            Some("R1".into()),
        );

        prop_assert_eq!(original.surname(), edited.surname());
        prop_assert_eq!(original.given_name(), edited.given_name());
        prop_assert_ne!(Fingerprint::of(&original), Fingerprint::of(&edited));
    }

    #[test]
    fn prop_changing_a_name_changes_fingerprint(
        days in 0u64..1000,
        amount in amount(),
        surname in 0usize..5,
        given in 0usize..5,
        shift in 1usize..5,
    ) {
        let date = base_date() + Days::new(days);
        let original = named(date, amount, SURNAMES[surname], GIVEN_NAMES[given]);
        let other_surname = named(date, amount, SURNAMES[(surname + shift) % 5], GIVEN_NAMES[given]);
        let other_given = named(date, amount, SURNAMES[surname], GIVEN_NAMES[(given + shift) % 5]);

        prop_assert_ne!(original.surname(), other_surname.surname());
        prop_assert_eq!(original.given_name(), other_surname.given_name());
        prop_assert_ne!(original.given_name(), other_given.given_name());
        prop_assert_ne!(&Fingerprint::of(&original), &Fingerprint::of(&other_surname));
        prop_assert_ne!(&Fingerprint::of(&original), &Fingerprint::of(&other_given));
    }
}
