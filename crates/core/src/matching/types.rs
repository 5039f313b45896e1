//! Identity matching types.

use std::fmt;
use std::str::FromStr;

use amarra_shared::types::MemberId;
use serde::{Deserialize, Serialize};

use crate::store::Member;

/// Confidence of a Tier A (exact CUIT) match.
pub const CUIT_CONFIDENCE: u8 = 100;
/// Confidence of a Tier B (exact DNI + name check) match.
pub const DNI_CONFIDENCE: u8 = 95;
/// Confidence of a Tier C (CUIT/DNI cross-check) match.
pub const CROSS_CHECK_CONFIDENCE: u8 = 98;
/// Confidence of a Tier E.5 (keyword alias) match.
pub const KEYWORD_CONFIDENCE: u8 = 75;
/// Minimum full-name similarity for Tier B to accept a DNI hit.
pub const DNI_NAME_MIN_SIMILARITY: u8 = 50;
/// Minimum full-name similarity for Tier D.
pub const FULL_NAME_MIN_SIMILARITY: u8 = 85;
/// Lower bound of the Tier E surname band (inclusive).
pub const SURNAME_MIN_SIMILARITY: u8 = 60;
/// Upper bound of the Tier E surname band (inclusive).
pub const SURNAME_MAX_SIMILARITY: u8 = 80;

/// One level of the identity-resolution cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// A: exact normalized CUIT/CUIL.
    Cuit,
    /// B: exact DNI, confirmed by name similarity.
    Dni,
    /// C: CUIT and its embedded DNI agree with a member.
    CrossCheck,
    /// D: fuzzy full-name similarity.
    FullName,
    /// E: fuzzy surname-only similarity in a narrow band.
    Surname,
    /// E.5: manually curated keyword alias, looked up by CUIT.
    Keyword,
    /// F: nothing resolved.
    Unmatched,
}

impl MatchTier {
    /// Tiers tried in order; the first one that resolves wins.
    pub const CASCADE: [Self; 6] = [
        Self::Cuit,
        Self::Dni,
        Self::CrossCheck,
        Self::FullName,
        Self::Surname,
        Self::Keyword,
    ];

    /// Short label used on review screens.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cuit => "A",
            Self::Dni => "B",
            Self::CrossCheck => "C",
            Self::FullName => "D",
            Self::Surname => "E",
            Self::Keyword => "E.5",
            Self::Unmatched => "F",
        }
    }

    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cuit => "cuit",
            Self::Dni => "dni",
            Self::CrossCheck => "cross_check",
            Self::FullName => "full_name",
            Self::Surname => "surname",
            Self::Keyword => "keyword",
            Self::Unmatched => "unmatched",
        }
    }

    /// Review bucket a match at this tier lands in.
    #[must_use]
    pub const fn bucket(self) -> ReviewBucket {
        match self {
            Self::Cuit | Self::Dni | Self::CrossCheck => ReviewBucket::Exact,
            Self::FullName | Self::Surname | Self::Keyword => ReviewBucket::Probable,
            Self::Unmatched => ReviewBucket::Unmatched,
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cuit" => Ok(Self::Cuit),
            "dni" => Ok(Self::Dni),
            "cross_check" => Ok(Self::CrossCheck),
            "full_name" => Ok(Self::FullName),
            "surname" => Ok(Self::Surname),
            "keyword" => Ok(Self::Keyword),
            "unmatched" => Ok(Self::Unmatched),
            _ => Err(format!("Unknown match tier: {s}")),
        }
    }
}

/// Review-screen grouping of analyzed movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewBucket {
    /// Resolved by an identity number.
    Exact,
    /// Resolved by fuzzy names or aliases; needs a glance.
    Probable,
    /// Needs manual assignment.
    Unmatched,
    /// Already stored; never confirmed again.
    Duplicate,
}

/// Outcome of matching one movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Resolved member, if any.
    pub member_id: Option<MemberId>,
    /// Tier that produced the result.
    pub tier: MatchTier,
    /// Confidence percentage, 0-100.
    pub confidence: u8,
    /// Human-readable explanation.
    pub reason: String,
    /// Display name of the matched member.
    pub member_name: Option<String>,
}

impl MatchResult {
    /// A resolved match against `member`.
    #[must_use]
    pub fn matched(
        member: &Member,
        tier: MatchTier,
        confidence: u8,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            member_id: Some(member.id),
            tier,
            confidence,
            reason: reason.into(),
            member_name: Some(member.display_name()),
        }
    }

    /// The Tier F result.
    #[must_use]
    pub fn unmatched(reason: impl Into<String>) -> Self {
        Self {
            member_id: None,
            tier: MatchTier::Unmatched,
            confidence: 0,
            reason: reason.into(),
            member_name: None,
        }
    }

    /// Returns true if a member was resolved.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.member_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_order() {
        let labels: Vec<&str> = MatchTier::CASCADE.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D", "E", "E.5"]);
    }

    #[test]
    fn test_tier_round_trip_through_storage_form() {
        for tier in MatchTier::CASCADE.into_iter().chain([MatchTier::Unmatched]) {
            assert_eq!(tier.as_str().parse::<MatchTier>().unwrap(), tier);
        }
        assert!("tier_z".parse::<MatchTier>().is_err());
    }

    #[test]
    fn test_buckets() {
        assert_eq!(MatchTier::Cuit.bucket(), ReviewBucket::Exact);
        assert_eq!(MatchTier::CrossCheck.bucket(), ReviewBucket::Exact);
        assert_eq!(MatchTier::FullName.bucket(), ReviewBucket::Probable);
        assert_eq!(MatchTier::Keyword.bucket(), ReviewBucket::Probable);
        assert_eq!(MatchTier::Unmatched.bucket(), ReviewBucket::Unmatched);
    }

    #[test]
    fn test_unmatched_result() {
        let result = MatchResult::unmatched("no tier resolved");
        assert!(!result.is_match());
        assert_eq!(result.confidence, 0);
        assert_eq!(result.tier, MatchTier::Unmatched);
    }
}
