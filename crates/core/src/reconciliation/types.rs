//! Reconciliation request and report types.

use amarra_shared::types::{BankMovementId, MemberId, PaymentId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReconciliationError;
use crate::allocation::AllocationOutcome;
use crate::fingerprint::Fingerprint;
use crate::matching::{MatchResult, MatchTier, ReviewBucket};
use crate::statement::{Movement, SkippedLine};
use crate::store::{Payment, PaymentMethod};

/// Why a movement was classified as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DuplicateOf {
    /// A movement with the same fingerprint is already stored.
    Stored {
        /// Stored movement.
        movement_id: BankMovementId,
        /// Payment it produced, if it was confirmed.
        payment_id: Option<PaymentId>,
    },
    /// An earlier line of the same upload has the same fingerprint.
    Upload {
        /// Line of the first occurrence.
        first_line: usize,
    },
}

/// One analyzed movement, ready for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedMovement {
    /// The parsed movement.
    pub movement: Movement,
    /// Its fingerprint.
    pub fingerprint: Fingerprint,
    /// Match result (Tier F for duplicates, which are never matched).
    pub result: MatchResult,
    /// Review bucket.
    pub bucket: ReviewBucket,
    /// Set for duplicates.
    pub duplicate_of: Option<DuplicateOf>,
}

/// A parsed and matched statement, split into review buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementAnalysis {
    /// Tiers A, B and C.
    pub exact: Vec<AnalyzedMovement>,
    /// Tiers D, E and E.5.
    pub probable: Vec<AnalyzedMovement>,
    /// Tier F.
    pub unmatched: Vec<AnalyzedMovement>,
    /// Already stored or repeated in the upload.
    pub duplicates: Vec<AnalyzedMovement>,
    /// Malformed data lines.
    pub malformed: Vec<SkippedLine>,
    /// Debit, fee and tax lines filtered out.
    pub discarded: usize,
    /// Header, footer, blank and timestamp lines.
    pub ignored: usize,
}

impl StatementAnalysis {
    /// Number of movements across every bucket.
    #[must_use]
    pub fn total_movements(&self) -> usize {
        self.exact.len() + self.probable.len() + self.unmatched.len() + self.duplicates.len()
    }

    /// Confirmation requests for the exact bucket, plus the probable one if asked.
    #[must_use]
    pub fn confirmable(&self, include_probable: bool) -> Vec<ConfirmRequest> {
        let probable: &[AnalyzedMovement] = if include_probable { &self.probable } else { &[] };
        self.exact
            .iter()
            .chain(probable)
            .filter_map(ConfirmRequest::from_analyzed)
            .collect()
    }

    pub(crate) fn push(&mut self, analyzed: AnalyzedMovement) {
        match analyzed.bucket {
            ReviewBucket::Exact => self.exact.push(analyzed),
            ReviewBucket::Probable => self.probable.push(analyzed),
            ReviewBucket::Unmatched => self.unmatched.push(analyzed),
            ReviewBucket::Duplicate => self.duplicates.push(analyzed),
        }
    }
}

/// Confirm one movement as a payment of `member_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    /// Movement to confirm.
    pub movement: Movement,
    /// Member chosen by the matcher or the operator.
    pub member_id: MemberId,
    /// Tier that proposed the member; `None` for manual assignment.
    pub match_tier: Option<MatchTier>,
    /// Confidence of the proposal.
    pub confidence: u8,
}

impl ConfirmRequest {
    /// Confirms the member the matcher proposed. `None` for unmatched and
    /// duplicate movements.
    #[must_use]
    pub fn from_analyzed(analyzed: &AnalyzedMovement) -> Option<Self> {
        if analyzed.bucket == ReviewBucket::Duplicate {
            return None;
        }
        let member_id = analyzed.result.member_id?;
        Some(Self {
            movement: analyzed.movement.clone(),
            member_id,
            match_tier: Some(analyzed.result.tier),
            confidence: analyzed.result.confidence,
        })
    }

    /// Operator-chosen member for a movement.
    #[must_use]
    pub fn manual(movement: Movement, member_id: MemberId) -> Self {
        Self {
            movement,
            member_id,
            match_tier: None,
            confidence: 0,
        }
    }
}

/// Result of one confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationReceipt {
    /// Stored movement.
    pub movement_id: BankMovementId,
    /// Created payment.
    pub payment_id: PaymentId,
    /// Member.
    pub member_id: MemberId,
    /// How the payment was allocated.
    pub allocation: AllocationOutcome,
}

/// One failed item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Position in the batch.
    pub index: usize,
    /// Movement description.
    pub description: String,
    /// What went wrong.
    pub error: ReconciliationError,
}

/// Result of a batch confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of requests received.
    pub total: usize,
    /// Successful confirmations.
    pub confirmed: Vec<ConfirmationReceipt>,
    /// Failed confirmations.
    pub failures: Vec<BatchFailure>,
    /// Whether the batch stopped early on cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    /// Successful confirmations.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.confirmed.len()
    }

    /// Failed confirmations.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Requests never attempted because of cancellation.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.total - self.succeeded() - self.failed()
    }
}

/// A manually registered payment (cash at the office, cheque, card).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualPayment {
    /// Paying member.
    pub member_id: MemberId,
    /// Amount.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Method; `credit_applied` is rejected.
    pub method: PaymentMethod,
    /// Notes.
    pub notes: Option<String>,
}

/// Result of a manual payment registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Recorded payment.
    pub payment: Payment,
    /// How it was allocated.
    pub allocation: AllocationOutcome,
}
