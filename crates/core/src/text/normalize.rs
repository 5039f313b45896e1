//! Canonical forms for free text and identity numbers.

/// Folds a Spanish/Portuguese accented letter to its base letter.
///
/// Characters without a known fold are returned unchanged.
#[must_use]
pub fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Joins whitespace-separated tokens with single spaces.
#[must_use]
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase, accent-stripped, punctuation-stripped, single-spaced form.
///
/// ```
/// use amarra_core::text::normalize_text;
///
/// assert_eq!(normalize_text("  Pérez,  José-María "), "PEREZ JOSE MARIA");
/// ```
#[must_use]
pub fn normalize_text(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(fold_accent)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_uppercase)
        .collect();
    collapse_whitespace(&cleaned)
}

/// Keeps only the ASCII digits of a CUIT/CUIL or DNI string.
#[must_use]
pub fn normalize_id(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Splits a combined name into `(surname, given names)`.
///
/// The first token is the surname; the remaining tokens are the given
/// names joined by single spaces. Missing parts are empty strings.
#[must_use]
pub fn split_full_name(input: &str) -> (String, String) {
    let mut tokens = input.split_whitespace();
    let surname = tokens.next().unwrap_or_default().to_string();
    let given = tokens.collect::<Vec<_>>().join(" ");
    (surname, given)
}

/// Lowercase, trimmed, single-spaced form used inside fingerprints.
#[must_use]
pub fn normalize_for_hash(input: &str) -> String {
    collapse_whitespace(&input.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_strips_accents_and_punctuation() {
        assert_eq!(normalize_text("Muñoz, Iñaki"), "MUNOZ INAKI");
        assert_eq!(normalize_text("GÜEMES/ANDRÉS."), "GUEMES ANDRES");
        assert_eq!(normalize_text("o'brien"), "O BRIEN");
    }

    #[test]
    fn test_normalize_text_empty_and_symbols_only() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" -.,/ "), "");
    }

    #[test]
    fn test_normalize_id_keeps_digits() {
        assert_eq!(normalize_id("20-12345678-9"), "20123456789");
        assert_eq!(normalize_id("12.345.678"), "12345678");
        assert_eq!(normalize_id("sin numero"), "");
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(
            split_full_name("GOMEZ  MARIA LAURA"),
            ("GOMEZ".to_string(), "MARIA LAURA".to_string())
        );
        assert_eq!(
            split_full_name("PEREZ"),
            ("PEREZ".to_string(), String::new())
        );
        assert_eq!(split_full_name("   "), (String::new(), String::new()));
    }

    #[test]
    fn test_normalize_for_hash() {
        assert_eq!(
            normalize_for_hash("  TRANSF  Recibida\tPEREZ "),
            "transf recibida perez"
        );
    }
}
