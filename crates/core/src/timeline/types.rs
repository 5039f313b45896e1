//! Timeline types.

use amarra_shared::types::{InvoiceId, MemberId, PaymentId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::{InvoiceStatus, PaymentMethod};

/// Part of a payment applied to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationBreakdown {
    /// Invoice.
    pub invoice_id: InvoiceId,
    /// Invoice number, when the invoice belongs to this member.
    pub invoice_number: Option<String>,
    /// Invoice total, when known.
    pub invoice_total: Option<Decimal>,
    /// Amount applied.
    pub amount: Decimal,
}

/// What a timeline entry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    /// An invoice charged to the member.
    Invoice {
        /// Invoice.
        invoice_id: InvoiceId,
        /// Invoice number.
        number: String,
        /// "MM/YYYY" billing period.
        period: String,
        /// Current status.
        status: InvoiceStatus,
    },
    /// A payment received from the member.
    Payment {
        /// Payment.
        payment_id: PaymentId,
        /// Payment method.
        method: PaymentMethod,
        /// Per-invoice breakdown.
        allocations: Vec<AllocationBreakdown>,
        /// Part of the payment not applied to any invoice (became credit).
        leftover: Decimal,
    },
}

/// One line of the account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Entry date: period start for invoices, payment date for payments.
    pub date: NaiveDate,
    /// Full invoice total or full payment amount, always positive.
    pub amount: Decimal,
    /// Running balance right after this entry.
    pub balance: Decimal,
    /// Invoice or payment details.
    pub kind: EntryKind,
}

impl TimelineEntry {
    /// Returns true for invoice entries.
    #[must_use]
    pub const fn is_invoice(&self) -> bool {
        matches!(self.kind, EntryKind::Invoice { .. })
    }

    /// Effect of the entry on the running balance.
    ///
    /// Cancelled invoices and `credit_applied` payments are listed but do not
    /// move the balance: the credit was already counted when the original
    /// overpayment entered.
    #[must_use]
    pub fn balance_effect(&self) -> Decimal {
        match &self.kind {
            EntryKind::Invoice {
                status: InvoiceStatus::Cancelled,
                ..
            }
            | EntryKind::Payment {
                method: PaymentMethod::CreditApplied,
                ..
            } => Decimal::ZERO,
            EntryKind::Invoice { .. } => -self.amount,
            EntryKind::Payment { .. } => self.amount,
        }
    }
}

/// A member's full account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Member.
    pub member_id: MemberId,
    /// Entries in chronological order.
    pub entries: Vec<TimelineEntry>,
    /// Balance after the last entry; positive means the member is ahead.
    pub closing_balance: Decimal,
}

impl Timeline {
    /// Returns true if the member has no history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Running balances in order.
    #[must_use]
    pub fn balances(&self) -> Vec<Decimal> {
        self.entries.iter().map(|e| e.balance).collect()
    }
}
