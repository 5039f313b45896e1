//! Property-based tests for string similarity.
//!
//! - Identity: distance(s, s) == 0, similarity(s, s) == 100
//! - Symmetry and bounds of the edit distance
//! - Percentages stay in [0, 100]

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::similarity::{full_name_similarity, levenshtein, similarity_pct};

/// Strategy to generate name-like strings, accents included.
fn name() -> impl Strategy<Value = String> {
    "[A-Za-zÁÉÍÓÚÑáéíóúñ ]{1,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_identity(s in name()) {
        prop_assert_eq!(levenshtein(&s, &s), 0);
        prop_assert_eq!(similarity_pct(&s, &s), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn prop_distance_symmetric_and_bounded(a in name(), b in name()) {
        let distance = levenshtein(&a, &b);
        prop_assert_eq!(distance, levenshtein(&b, &a));
        prop_assert!(distance <= a.chars().count().max(b.chars().count()));
    }

    #[test]
    fn prop_similarity_in_range(a in name(), b in name()) {
        let pct = similarity_pct(&a, &b);
        prop_assert!(pct >= Decimal::ZERO && pct <= Decimal::ONE_HUNDRED);
    }

    #[test]
    fn prop_full_name_identity(surname in "[A-Z]{2,12}", given in "[A-Z]{2,12}") {
        prop_assert_eq!(
            full_name_similarity(&surname, &given, &surname, &given),
            Decimal::ONE_HUNDRED
        );
    }
}
