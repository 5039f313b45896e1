//! Reconciliation errors.

use amarra_shared::AppError;
use amarra_shared::types::{MemberId, PaymentId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::allocation::AllocationError;
use crate::fingerprint::Fingerprint;
use crate::store::{PaymentMethod, StoreError};

/// Errors raised while analyzing or confirming movements.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    /// The movement was already confirmed into a payment.
    #[error("Movement {fingerprint} was already processed as payment {payment_id}")]
    AlreadyProcessed {
        /// Fingerprint of the movement.
        fingerprint: Fingerprint,
        /// Payment created the first time.
        payment_id: PaymentId,
    },

    /// Another confirmation holds the movement and has not linked its payment yet.
    #[error("Movement {0} is being confirmed by another request")]
    ConfirmationInProgress(Fingerprint),

    /// The store could not be reached for any lookup.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Member does not exist.
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// Amount is not positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Method cannot be used for a manual payment.
    #[error("Payment method {0} cannot be registered manually")]
    UnsupportedMethod(PaymentMethod),

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Allocating the payment failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            Self::ConfirmationInProgress(_) => "CONFIRMATION_IN_PROGRESS",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::UnsupportedMethod(_) => "UNSUPPORTED_PAYMENT_METHOD",
            Self::Store(e) => e.error_code(),
            Self::Allocation(e) => e.error_code(),
        }
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        match &err {
            ReconciliationError::AlreadyProcessed { .. }
            | ReconciliationError::ConfirmationInProgress(_) => Self::Conflict(err.to_string()),
            ReconciliationError::MemberNotFound(_) => Self::NotFound(err.to_string()),
            ReconciliationError::InvalidAmount(_) | ReconciliationError::UnsupportedMethod(_) => {
                Self::Validation(err.to_string())
            }
            ReconciliationError::StoreUnavailable(_) | ReconciliationError::Store(_) => {
                Self::Database(err.to_string())
            }
            ReconciliationError::Allocation(inner) => inner.clone().into(),
        }
    }
}
