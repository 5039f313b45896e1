//! Allocation and credit-ledger errors.
//!
//! Every variant carries enough context (member, invoice, amounts) for an
//! operator to reconcile by hand when a write fails halfway.

use amarra_shared::AppError;
use amarra_shared::types::{InvoiceId, MemberId, PaymentId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while applying payments or credit to invoices.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Amount to allocate is not positive.
    #[error("Amount {amount} for member {member_id} must be positive")]
    InvalidAmount {
        /// Member.
        member_id: MemberId,
        /// Rejected amount.
        amount: Decimal,
    },

    /// Invoice does not exist.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Invoice belongs to another member.
    #[error("Invoice {invoice_id} does not belong to member {member_id}")]
    InvoiceMemberMismatch {
        /// Invoice.
        invoice_id: InvoiceId,
        /// Member that tried to use it.
        member_id: MemberId,
    },

    /// Invoices, allocations or credit could not be read.
    #[error("Failed to load ledger state for member {member_id}: {source}")]
    LoadFailed {
        /// Member.
        member_id: MemberId,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// A payment record could not be written.
    #[error("Failed to record payment of {amount} for member {member_id}: {source}")]
    PaymentWriteFailed {
        /// Member.
        member_id: MemberId,
        /// Payment amount.
        amount: Decimal,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// An allocation record could not be written.
    #[error(
        "Failed to allocate {amount} of payment {payment_id} to invoice {invoice_id} \
         for member {member_id}: {source}"
    )]
    AllocationWriteFailed {
        /// Member.
        member_id: MemberId,
        /// Funding payment.
        payment_id: PaymentId,
        /// Target invoice.
        invoice_id: InvoiceId,
        /// Amount that was being applied.
        amount: Decimal,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// An invoice could not be marked paid.
    #[error("Failed to mark invoice {invoice_id} of member {member_id} paid: {source}")]
    InvoiceUpdateFailed {
        /// Member.
        member_id: MemberId,
        /// Invoice.
        invoice_id: InvoiceId,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The member credit record could not be written.
    #[error("Failed to store credit {amount} for member {member_id}: {source}")]
    CreditWriteFailed {
        /// Member.
        member_id: MemberId,
        /// Credit amount being written.
        amount: Decimal,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

impl AllocationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvoiceMemberMismatch { .. } => "INVOICE_MEMBER_MISMATCH",
            Self::LoadFailed { .. } => "LEDGER_LOAD_FAILED",
            Self::PaymentWriteFailed { .. } => "PAYMENT_WRITE_FAILED",
            Self::AllocationWriteFailed { .. } => "ALLOCATION_WRITE_FAILED",
            Self::InvoiceUpdateFailed { .. } => "INVOICE_UPDATE_FAILED",
            Self::CreditWriteFailed { .. } => "CREDIT_WRITE_FAILED",
        }
    }

    /// The store error underneath, if any.
    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::LoadFailed { source, .. }
            | Self::PaymentWriteFailed { source, .. }
            | Self::AllocationWriteFailed { source, .. }
            | Self::InvoiceUpdateFailed { source, .. }
            | Self::CreditWriteFailed { source, .. } => Some(source),
            Self::InvalidAmount { .. }
            | Self::InvoiceNotFound(_)
            | Self::InvoiceMemberMismatch { .. } => None,
        }
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match &err {
            AllocationError::InvalidAmount { .. } => Self::Validation(err.to_string()),
            AllocationError::InvoiceNotFound(_) => Self::NotFound(err.to_string()),
            AllocationError::InvoiceMemberMismatch { .. } => Self::BusinessRule(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}
