//! Candidate identity tokens pulled out of free-text bank descriptions.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::{fold_accent, normalize_id};

/// Two-digit CUIT/CUIL type prefixes issued by AFIP.
const CUIT_PREFIXES: [&str; 9] = ["20", "23", "24", "25", "26", "27", "30", "33", "34"];

/// Words that show up in bank descriptions but are never part of a name.
const NOISE_WORDS: &[&str] = &[
    "A", "AHORRO", "ARS", "BANCO", "BANKING", "CA", "CAJA", "CBU", "CC", "CRED", "CREDITO", "CTA",
    "CUENTA", "CUENTAS", "CUIL", "CUIT", "CVU", "DEBIN", "DEPOSITO", "DNI", "EFECTIVO", "ENTRE",
    "HB", "HOME", "ID", "IMPORTE", "INMED", "INMEDIATA", "INTERBANCARIA", "MEP", "NRO", "ONLINE",
    "ORDEN", "ORIGEN", "PAGO", "PESOS", "PROPIAS", "REC", "RECIB", "RECIBIDA", "REF", "SUC",
    "SUCURSAL", "TERCEROS", "TR", "TRANS", "TRANSF", "TRANSFERENCIA", "TRF", "VAR", "VARIOS",
];

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

static HYPHENATED_CUIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}-\d{8}-\d").expect("valid regex"));

static DNI_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\.\d{3}\.\d{3}|\d+").expect("valid regex"));

/// Identity hints extracted from one statement description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionTokens {
    /// 11-digit CUIT/CUIL, digits only.
    pub cuit: Option<String>,
    /// 7-8 digit DNI, digits only.
    pub dni: Option<String>,
    /// Normalized surname.
    pub surname: Option<String>,
    /// Normalized given names.
    pub given_name: Option<String>,
}

/// Extracts every identity hint from a description.
#[must_use]
pub fn extract_tokens(description: &str) -> DescriptionTokens {
    let cuit = extract_cuit(description);
    let dni = extract_dni(description, cuit.as_deref());
    let (surname, given_name) = extract_names(description);
    DescriptionTokens {
        cuit,
        dni,
        surname,
        given_name,
    }
}

/// Returns true for an 11-digit string with a known CUIT/CUIL prefix.
#[must_use]
pub fn is_valid_cuit(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate.chars().all(|c| c.is_ascii_digit())
        && CUIT_PREFIXES.contains(&&candidate[..2])
}

/// The DNI embedded in a CUIT (digits 3-10), without leading zeros.
#[must_use]
pub fn embedded_dni(cuit: &str) -> Option<String> {
    let digits = normalize_id(cuit);
    if digits.len() != 11 {
        return None;
    }
    let segment = digits[2..10].trim_start_matches('0');
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Finds a CUIT/CUIL, preferring a bare 11-digit run over `NN-NNNNNNNN-N`.
#[must_use]
pub fn extract_cuit(description: &str) -> Option<String> {
    let bare = DIGIT_RUN
        .find_iter(description)
        .map(|m| m.as_str())
        .find(|run| is_valid_cuit(run));
    if let Some(run) = bare {
        return Some(run.to_string());
    }

    HYPHENATED_CUIT
        .find_iter(description)
        .filter(|m| digit_bounded(description, m.start(), m.end()))
        .map(|m| normalize_id(m.as_str()))
        .find(|digits| is_valid_cuit(digits))
}

/// Finds a 7-8 digit DNI not already accounted for by the CUIT.
#[must_use]
pub fn extract_dni(description: &str, cuit: Option<&str>) -> Option<String> {
    let covered = cuit.and_then(embedded_dni);
    DNI_CANDIDATE
        .find_iter(description)
        .filter(|m| digit_bounded(description, m.start(), m.end()))
        .map(|m| normalize_id(m.as_str()))
        .filter(|digits| (7..=8).contains(&digits.len()))
        .find(|digits| covered.as_deref() != Some(digits.trim_start_matches('0')))
}

/// Extracts `(surname, given names)` from a description.
///
/// Comma-delimited `SURNAME, GIVEN` wins, then hyphen-delimited segments,
/// then plain whitespace splitting. Tokens containing digits and banking
/// noise words are never part of a name.
#[must_use]
pub fn extract_names(description: &str) -> (Option<String>, Option<String>) {
    let prepared = prepare(description);

    if let Some((left, right)) = prepared.split_once(',') {
        let surname_tokens = name_tokens(left);
        if let Some(surname) = surname_tokens.last() {
            let given = leading_name_tokens(right);
            return (Some((*surname).to_string()), join_nonempty(&given));
        }
    }

    if prepared.contains('-') {
        let segments: Vec<Vec<&str>> = prepared.split('-').map(name_tokens).collect();
        let chosen = segments
            .iter()
            .find(|tokens| tokens.len() >= 2)
            .or_else(|| segments.iter().find(|tokens| !tokens.is_empty()));
        if let Some(tokens) = chosen {
            return split_tokens(tokens);
        }
    }

    split_tokens(&name_tokens(&prepared))
}

/// Uppercases and folds accents, keeping only alphanumerics, `,` and `-`.
fn prepare(description: &str) -> String {
    description
        .chars()
        .map(fold_accent)
        .map(|c| {
            if c.is_alphanumeric() || c == ',' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .flat_map(char::to_uppercase)
        .collect()
}

fn is_name_token(token: &str) -> bool {
    token.chars().count() >= 2
        && token.chars().all(char::is_alphabetic)
        && !NOISE_WORDS.contains(&token)
}

fn name_tokens(segment: &str) -> Vec<&str> {
    segment
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| is_name_token(token))
        .collect()
}

/// Name tokens up to the first token that is not part of a name.
fn leading_name_tokens(segment: &str) -> Vec<&str> {
    segment
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|token| !token.is_empty())
        .take_while(|token| is_name_token(token))
        .collect()
}

fn split_tokens(tokens: &[&str]) -> (Option<String>, Option<String>) {
    match tokens.split_first() {
        Some((surname, rest)) => (Some((*surname).to_string()), join_nonempty(rest)),
        None => (None, None),
    }
}

fn join_nonempty(tokens: &[&str]) -> Option<String> {
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// True if the match is not glued to other digits on either side.
fn digit_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
}
