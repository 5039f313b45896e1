//! Content fingerprints for duplicate detection.
//!
//! A fingerprint is the SHA-256 of a canonical JSON object with sorted
//! keys `{apellido?, concepto, fecha, monto, nombre?, referencia?}`.
//! Re-uploading the same statement yields the same fingerprints, so the
//! fingerprint alone decides whether a movement was already processed.

use std::collections::BTreeMap;
use std::fmt;

use amarra_shared::types::money::fixed2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::statement::Movement;
use crate::text::normalize_for_hash;

/// Hex-encoded SHA-256 content fingerprint of a movement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 64;

    /// Computes the fingerprint of a movement.
    #[must_use]
    pub fn of(movement: &Movement) -> Self {
        let payload = canonical_payload(movement);
        let digest = Sha256::digest(payload.as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Wraps a stored hex fingerprint, rejecting anything malformed.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == Self::HEX_LEN
            && hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(hex.to_string()))
    }

    /// The hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical JSON string that gets hashed.
///
/// Keys are emitted in alphabetical order regardless of how
/// `serde_json::Map` is configured, which keeps the payload stable across
/// platforms. Optional fields are omitted when absent or empty.
#[must_use]
pub fn canonical_payload(movement: &Movement) -> String {
    let mut sorted: BTreeMap<&'static str, String> = BTreeMap::new();
    sorted.insert("fecha", movement.date.format("%Y-%m-%d").to_string());
    sorted.insert("monto", fixed2(movement.amount));
    sorted.insert("concepto", normalize_for_hash(&movement.description));
    insert_optional(&mut sorted, "referencia", movement.reference.as_deref());
    insert_optional(&mut sorted, "apellido", movement.surname());
    insert_optional(&mut sorted, "nombre", movement.given_name());

    let fields: Map<String, Value> = sorted
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect();
    Value::Object(fields).to_string()
}

fn insert_optional(
    fields: &mut BTreeMap<&'static str, String>,
    key: &'static str,
    value: Option<&str>,
) {
    let normalized = value.map(normalize_for_hash).filter(|v| !v.is_empty());
    if let Some(normalized) = normalized {
        fields.insert(key, normalized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn movement(description: &str, reference: Option<&str>) -> Movement {
        Movement::new(
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            description,
            dec!(30000),
            reference.map(ToString::to_string),
        )
    }

    #[test]
    fn test_canonical_payload_sorted_and_normalized() {
        let m = movement("TRANSFERENCIA  RECIBIDA - PEREZ JUAN", Some(" A1 "));
        assert_eq!(
            canonical_payload(&m),
            r#"{"apellido":"perez","concepto":"transferencia recibida - perez juan","fecha":"2025-10-01","monto":"30000.00","nombre":"juan","referencia":"a1"}"#
        );
    }

    #[test]
    fn test_canonical_payload_omits_missing_fields() {
        let m = movement("12345", None);
        assert_eq!(
            canonical_payload(&m),
            r#"{"concepto":"12345","fecha":"2025-10-01","monto":"30000.00"}"#
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = Fingerprint::of(&movement("TRANSFERENCIA RECIBIDA PEREZ JUAN", None));
        assert_eq!(fp.as_str().len(), Fingerprint::HEX_LEN);
        assert_eq!(Fingerprint::from_hex(fp.as_str()), Some(fp.clone()));
        assert_eq!(fp.to_string(), fp.as_str());
    }

    #[test]
    fn test_whitespace_and_case_do_not_change_fingerprint() {
        let a = movement("Transferencia recibida PEREZ JUAN", Some("a1"));
        let b = movement("  TRANSFERENCIA   RECIBIDA perez juan ", Some("A1"));
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert_eq!(Fingerprint::from_hex("abc"), None);
        assert_eq!(Fingerprint::from_hex(&"G".repeat(64)), None);
        assert_eq!(Fingerprint::from_hex(&"A".repeat(64)), None);
    }
}
