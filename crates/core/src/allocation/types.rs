//! Allocation types.

use amarra_shared::types::{AllocationId, InvoiceId, MemberId, PaymentId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open invoice with its true outstanding balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenInvoice {
    /// Invoice.
    pub invoice_id: InvoiceId,
    /// Due date, the allocation priority key.
    pub due_date: NaiveDate,
    /// Invoice total.
    pub total: Decimal,
    /// Total minus every allocation already recorded, clamped at zero.
    pub outstanding: Decimal,
}

/// One step of an allocation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAllocation {
    /// Target invoice.
    pub invoice_id: InvoiceId,
    /// Amount to apply.
    pub amount: Decimal,
    /// Whether this amount settles the invoice.
    pub settles: bool,
}

/// What a payment of a given amount does to a member's open invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Allocations in application order.
    pub allocations: Vec<PlannedAllocation>,
    /// Amount left after every open invoice is covered.
    pub overflow: Decimal,
}

/// An allocation that was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAllocation {
    /// Allocation record.
    pub allocation_id: AllocationId,
    /// Invoice.
    pub invoice_id: InvoiceId,
    /// Amount applied.
    pub amount: Decimal,
    /// Whether the invoice became fully paid.
    pub settled: bool,
}

/// Result of allocating one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Funding payment.
    pub payment_id: PaymentId,
    /// Member.
    pub member_id: MemberId,
    /// Allocations written, oldest invoice first.
    pub applied: Vec<AppliedAllocation>,
    /// Amount handed to the credit ledger.
    pub overflow: Decimal,
    /// Member credit balance after the overflow was added.
    pub credit_balance: Option<Decimal>,
}

impl AllocationOutcome {
    /// Invoices that received part of the payment.
    #[must_use]
    pub fn applied_invoice_ids(&self) -> Vec<InvoiceId> {
        self.applied.iter().map(|a| a.invoice_id).collect()
    }

    /// Invoices that became fully paid.
    #[must_use]
    pub fn fully_paid_invoice_ids(&self) -> Vec<InvoiceId> {
        self.applied
            .iter()
            .filter(|a| a.settled)
            .map(|a| a.invoice_id)
            .collect()
    }

    /// Amount applied to `invoice_id`, zero if untouched.
    #[must_use]
    pub fn applied_to(&self, invoice_id: InvoiceId) -> Decimal {
        self.applied
            .iter()
            .filter(|a| a.invoice_id == invoice_id)
            .map(|a| a.amount)
            .sum()
    }

    /// Sum of every allocation.
    #[must_use]
    pub fn total_applied(&self) -> Decimal {
        self.applied.iter().map(|a| a.amount).sum()
    }
}
