//! Injected event sink for reconciliation diagnostics.
//!
//! Services report noteworthy events through an [`EventSink`] instead of a
//! process-wide log buffer. [`TracingSink`] forwards them to `tracing`;
//! [`RecordingSink`] keeps them in memory for assertions.

use std::sync::{Mutex, PoisonError};

use amarra_shared::types::{InvoiceId, MemberId, PaymentId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::fingerprint::Fingerprint;
use crate::matching::MatchTier;

/// Something the operator or an auditor may want to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReconciliationEvent {
    /// A statement line was malformed and skipped.
    LineSkipped {
        /// 1-based line number.
        line: usize,
        /// Why it was skipped.
        reason: String,
    },
    /// A matching tier failed against the store and was treated as no match.
    TierFailed {
        /// Tier that failed.
        tier: MatchTier,
        /// Line of the movement being matched.
        line: usize,
        /// Store error text.
        error: String,
    },
    /// A movement was already stored or repeated within the upload.
    DuplicateDetected {
        /// Line of the duplicate.
        line: usize,
        /// Its fingerprint.
        fingerprint: Fingerprint,
    },
    /// Part of a payment was applied to an invoice.
    AllocationRecorded {
        /// Member.
        member_id: MemberId,
        /// Funding payment.
        payment_id: PaymentId,
        /// Receiving invoice.
        invoice_id: InvoiceId,
        /// Amount applied.
        amount: Decimal,
        /// Whether the invoice became fully paid.
        settled: bool,
    },
    /// A member's stored credit changed.
    CreditChanged {
        /// Member.
        member_id: MemberId,
        /// New balance (zero once the record is deleted).
        balance: Decimal,
    },
    /// One confirmation of a batch failed.
    ConfirmationFailed {
        /// Position in the batch.
        index: usize,
        /// Error text.
        error: String,
    },
}

/// Receives reconciliation events.
pub trait EventSink: Send + Sync {
    /// Records one event. Must not fail.
    fn emit(&self, event: &ReconciliationEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ReconciliationEvent) {
        match event {
            ReconciliationEvent::LineSkipped { line, reason } => {
                tracing::warn!(line, %reason, "statement line skipped");
            }
            ReconciliationEvent::TierFailed { tier, line, error } => {
                tracing::warn!(tier = tier.label(), line, %error, "matching tier failed");
            }
            ReconciliationEvent::DuplicateDetected { line, fingerprint } => {
                tracing::info!(line, %fingerprint, "duplicate movement");
            }
            ReconciliationEvent::AllocationRecorded {
                member_id,
                payment_id,
                invoice_id,
                amount,
                settled,
            } => {
                tracing::info!(
                    %member_id,
                    %payment_id,
                    %invoice_id,
                    %amount,
                    settled,
                    "allocation recorded"
                );
            }
            ReconciliationEvent::CreditChanged { member_id, balance } => {
                tracing::info!(%member_id, %balance, "member credit changed");
            }
            ReconciliationEvent::ConfirmationFailed { index, error } => {
                tracing::error!(index, %error, "confirmation failed");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ReconciliationEvent>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<ReconciliationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ReconciliationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
