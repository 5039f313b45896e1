//! Edit-distance based string similarity.
//!
//! Percentages are `Decimal` rounded to 2 places, in `[0, 100]`.

use rust_decimal::Decimal;

use crate::text::normalize_text;

/// Weight of the surname in the weighted full-name score.
pub const SURNAME_WEIGHT: Decimal = Decimal::from_parts(6, 0, 0, false, 1);
/// Weight of the given names in the weighted full-name score.
pub const GIVEN_NAME_WEIGHT: Decimal = Decimal::from_parts(4, 0, 0, false, 1);

/// Classic dynamic-programming Levenshtein distance over chars.
///
/// ```
/// use amarra_core::similarity::levenshtein;
///
/// assert_eq!(levenshtein("kitten", "sitting"), 3);
/// assert_eq!(levenshtein("", "abc"), 3);
/// ```
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let rows = a.len() + 1;
    let cols = b.len() + 1;

    let mut matrix = vec![vec![0usize; cols]; rows];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..rows {
        for j in 1..cols {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let deletion = matrix[i - 1][j] + 1;
            let insertion = matrix[i][j - 1] + 1;
            let substitution = matrix[i - 1][j - 1] + cost;
            matrix[i][j] = deletion.min(insertion).min(substitution);
        }
    }

    matrix[rows - 1][cols - 1]
}

/// `(maxLen - distance) / maxLen * 100`, rounded to 2 decimals.
///
/// Two empty strings are 100% similar; one empty string against a
/// non-empty one is 0%.
#[must_use]
pub fn similarity_pct(a: &str, b: &str) -> Decimal {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return Decimal::ONE_HUNDRED;
    }
    let distance = levenshtein(a, b);
    let max_len = Decimal::from(max_len);
    let distance = Decimal::from(distance);
    ((max_len - distance) / max_len * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Similarity of two people's names, tolerant to typos and field swaps.
///
/// Takes the best of:
/// 1. `0.6 * surname similarity + 0.4 * given-name similarity`
/// 2. whole `"surname given"` against whole `"surname given"`
/// 3. whole `"surname given"` against the inverted `"given surname"`
///
/// Inputs are normalized with [`normalize_text`] first.
#[must_use]
pub fn full_name_similarity(
    surname_a: &str,
    given_a: &str,
    surname_b: &str,
    given_b: &str,
) -> Decimal {
    let surname_a = normalize_text(surname_a);
    let given_a = normalize_text(given_a);
    let surname_b = normalize_text(surname_b);
    let given_b = normalize_text(given_b);

    let weighted = similarity_pct(&surname_a, &surname_b) * SURNAME_WEIGHT
        + similarity_pct(&given_a, &given_b) * GIVEN_NAME_WEIGHT;

    let whole_a = join_name(&surname_a, &given_a);
    let whole = similarity_pct(&whole_a, &join_name(&surname_b, &given_b));
    let inverted = similarity_pct(&whole_a, &join_name(&given_b, &surname_b));

    weighted.max(whole).max(inverted).round_dp(2)
}

fn join_name(first: &str, second: &str) -> String {
    format!("{first} {second}").trim().to_string()
}
