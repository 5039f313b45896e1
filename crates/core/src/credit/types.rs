//! Credit ledger types.

use amarra_shared::types::{InvoiceId, PaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of applying credit to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditApplication {
    /// Invoice the credit was applied to.
    pub invoice_id: InvoiceId,
    /// Amount taken from the credit.
    pub amount_applied: Decimal,
    /// Credit left afterwards.
    pub remaining_credit: Decimal,
    /// Whether the invoice is now fully paid.
    pub invoice_fully_paid: bool,
    /// Virtual payment created for the application.
    pub payment_id: Option<PaymentId>,
}

impl CreditApplication {
    /// Nothing was applied.
    #[must_use]
    pub fn nothing(invoice_id: InvoiceId, remaining_credit: Decimal) -> Self {
        Self {
            invoice_id,
            amount_applied: Decimal::ZERO,
            remaining_credit,
            invoice_fully_paid: false,
            payment_id: None,
        }
    }

    /// Returns true if any credit was consumed.
    #[must_use]
    pub fn applied(&self) -> bool {
        self.amount_applied > Decimal::ZERO
    }
}

/// Result of sweeping credit across every open invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSweep {
    /// Applications that consumed credit, oldest invoice first.
    pub applications: Vec<CreditApplication>,
    /// Credit left after the sweep.
    pub remaining_credit: Decimal,
}

impl CreditSweep {
    /// Total credit consumed.
    #[must_use]
    pub fn total_applied(&self) -> Decimal {
        self.applications.iter().map(|a| a.amount_applied).sum()
    }
}
