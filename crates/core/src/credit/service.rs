//! Credit ledger service.

use std::sync::Arc;

use amarra_shared::types::money::{covers, is_positive_amount, min_amount, non_negative_cents, round_cents};
use amarra_shared::types::{InvoiceId, MemberId};
use chrono::Utc;
use rust_decimal::Decimal;

use super::types::{CreditApplication, CreditSweep};
use crate::allocation::{AllocationError, outstanding_balance};
use crate::store::{
    CreditRepository, MemberCredit, NewAllocation, NewPayment, PaymentMethod,
    ReconciliationStore,
};
use crate::telemetry::{EventSink, ReconciliationEvent};

/// Reads, accumulates and consumes member credit.
pub struct CreditLedger<S> {
    store: Arc<S>,
    sink: Arc<dyn EventSink>,
}

impl<S: CreditRepository> CreditLedger<S> {
    /// Creates a new credit ledger.
    pub fn new(store: Arc<S>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Current credit of a member; zero when there is no record.
    ///
    /// Fails soft: a lookup error is logged and reported as zero.
    pub async fn get_credit(&self, member_id: MemberId) -> Decimal {
        match self.current_credit(member_id).await {
            Ok(amount) => amount,
            Err(error) => {
                tracing::warn!(%member_id, %error, "credit lookup failed, assuming none");
                Decimal::ZERO
            }
        }
    }

    async fn current_credit(&self, member_id: MemberId) -> Result<Decimal, AllocationError> {
        let record = self
            .store
            .find_credit(member_id)
            .await
            .map_err(|source| AllocationError::LoadFailed { member_id, source })?;
        Ok(record.map_or(Decimal::ZERO, |r| non_negative_cents(r.amount)))
    }

    /// Adds `amount` to the member's credit, creating the record if needed.
    ///
    /// Non-positive amounts are a no-op. Returns the resulting balance.
    pub async fn add_credit(
        &self,
        member_id: MemberId,
        amount: Decimal,
    ) -> Result<Decimal, AllocationError> {
        let amount = round_cents(amount);
        if !is_positive_amount(amount) {
            return Ok(self.get_credit(member_id).await);
        }

        let write_failed = |amount, source| AllocationError::CreditWriteFailed {
            member_id,
            amount,
            source,
        };
        let existing = self
            .store
            .find_credit(member_id)
            .await
            .map_err(|source| AllocationError::LoadFailed { member_id, source })?;
        let now = Utc::now();

        let balance = match existing {
            Some(record) => {
                let balance = round_cents(record.amount + amount);
                self.store
                    .update_credit(member_id, balance, now)
                    .await
                    .map_err(|source| write_failed(balance, source))?;
                balance
            }
            None => {
                self.store
                    .insert_credit(MemberCredit {
                        member_id,
                        amount,
                        updated_at: now,
                    })
                    .await
                    .map_err(|source| write_failed(amount, source))?;
                amount
            }
        };

        tracing::info!(%member_id, added = %amount, %balance, "credit added");
        self.sink
            .emit(&ReconciliationEvent::CreditChanged { member_id, balance });
        Ok(balance)
    }

    async fn store_remaining(
        &self,
        member_id: MemberId,
        remaining: Decimal,
    ) -> Result<(), AllocationError> {
        let result = if is_positive_amount(remaining) {
            self.store
                .update_credit(member_id, remaining, Utc::now())
                .await
        } else {
            self.store.delete_credit(member_id).await
        };
        result.map_err(|source| AllocationError::CreditWriteFailed {
            member_id,
            amount: remaining,
            source,
        })?;
        self.sink.emit(&ReconciliationEvent::CreditChanged {
            member_id,
            balance: remaining,
        });
        Ok(())
    }
}

impl<S: ReconciliationStore> CreditLedger<S> {
    /// Applies the member's credit to one invoice.
    ///
    /// Applies `min(credit, outstanding)` through a reconciled
    /// `credit_applied` payment dated today, marks the invoice paid when
    /// covered, and shrinks or deletes the credit record. Must be called
    /// whenever a new invoice is issued to a member who may hold credit.
    pub async fn apply_credit_to_invoice(
        &self,
        invoice_id: InvoiceId,
        member_id: MemberId,
    ) -> Result<CreditApplication, AllocationError> {
        let credit = self.current_credit(member_id).await?;
        if !is_positive_amount(credit) {
            return Ok(CreditApplication::nothing(invoice_id, Decimal::ZERO));
        }

        let load_failed = |source| AllocationError::LoadFailed { member_id, source };
        let invoice = self
            .store
            .get_invoice(invoice_id)
            .await
            .map_err(load_failed)?
            .ok_or(AllocationError::InvoiceNotFound(invoice_id))?;
        if invoice.member_id != member_id {
            return Err(AllocationError::InvoiceMemberMismatch {
                invoice_id,
                member_id,
            });
        }
        if !invoice.status.is_open() {
            return Ok(CreditApplication::nothing(invoice_id, credit));
        }

        let prior = self
            .store
            .list_allocations_for_invoices(&[invoice_id])
            .await
            .map_err(load_failed)?;
        let outstanding = outstanding_balance(invoice.total, prior.iter().map(|a| a.amount));
        if !is_positive_amount(outstanding) {
            return Ok(CreditApplication::nothing(invoice_id, credit));
        }

        let amount = min_amount(credit, outstanding);
        let today = Utc::now().date_naive();

        let payment = self
            .store
            .insert_payment(NewPayment {
                member_id,
                amount,
                date: today,
                method: PaymentMethod::CreditApplied,
                bank_movement_id: None,
                reconciled: true,
                notes: Some(format!("Credit applied to invoice {}", invoice.number)),
            })
            .await
            .map_err(|source| AllocationError::PaymentWriteFailed {
                member_id,
                amount,
                source,
            })?;

        self.store
            .insert_allocation(NewAllocation {
                payment_id: payment.id,
                invoice_id,
                amount,
            })
            .await
            .map_err(|source| AllocationError::AllocationWriteFailed {
                member_id,
                payment_id: payment.id,
                invoice_id,
                amount,
                source,
            })?;

        let fully_paid = covers(amount, outstanding);
        if fully_paid {
            self.store
                .mark_invoice_paid(invoice_id, today)
                .await
                .map_err(|source| AllocationError::InvoiceUpdateFailed {
                    member_id,
                    invoice_id,
                    source,
                })?;
        }
        self.sink.emit(&ReconciliationEvent::AllocationRecorded {
            member_id,
            payment_id: payment.id,
            invoice_id,
            amount,
            settled: fully_paid,
        });

        let remaining = non_negative_cents(credit - amount);
        self.store_remaining(member_id, remaining).await?;

        tracing::info!(
            %member_id,
            %invoice_id,
            applied = %amount,
            remaining = %remaining,
            fully_paid,
            "credit applied to invoice"
        );
        Ok(CreditApplication {
            invoice_id,
            amount_applied: amount,
            remaining_credit: remaining,
            invoice_fully_paid: fully_paid,
            payment_id: Some(payment.id),
        })
    }

    /// Applies credit across every open invoice, oldest due date first,
    /// until the credit runs out.
    pub async fn apply_credit_to_open_invoices(
        &self,
        member_id: MemberId,
    ) -> Result<CreditSweep, AllocationError> {
        let mut remaining = self.current_credit(member_id).await?;
        let mut sweep = CreditSweep {
            applications: Vec::new(),
            remaining_credit: remaining,
        };
        if !is_positive_amount(remaining) {
            return Ok(sweep);
        }

        let invoices = self
            .store
            .list_open_invoices(member_id)
            .await
            .map_err(|source| AllocationError::LoadFailed { member_id, source })?;

        for invoice in invoices {
            if !is_positive_amount(remaining) {
                break;
            }
            let application = self.apply_credit_to_invoice(invoice.id, member_id).await?;
            remaining = application.remaining_credit;
            if application.applied() {
                sweep.applications.push(application);
            }
        }

        sweep.remaining_credit = remaining;
        Ok(sweep)
    }
}
