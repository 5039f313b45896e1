//! Payment allocator service.

use std::sync::Arc;

use amarra_shared::types::money::{is_positive_amount, round_cents};
use amarra_shared::types::{MemberId, PaymentId};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::AllocationError;
use super::planner::{open_invoice_snapshots, plan_allocation};
use super::types::{AllocationOutcome, AllocationPlan, AppliedAllocation};
use crate::credit::CreditLedger;
use crate::store::{NewAllocation, ReconciliationStore};
use crate::telemetry::{EventSink, ReconciliationEvent};

/// Applies payments to a member's open invoices and credits the overflow.
///
/// Callers must serialize allocations per member: the plan is computed from
/// a snapshot of outstanding balances read before any allocation is written.
pub struct PaymentAllocator<S> {
    store: Arc<S>,
    credit: CreditLedger<S>,
    sink: Arc<dyn EventSink>,
}

impl<S: ReconciliationStore> PaymentAllocator<S> {
    /// Creates a new allocator.
    pub fn new(store: Arc<S>, sink: Arc<dyn EventSink>) -> Self {
        let credit = CreditLedger::new(Arc::clone(&store), Arc::clone(&sink));
        Self {
            store,
            credit,
            sink,
        }
    }

    /// The credit ledger overflow is handed to.
    pub fn credit_ledger(&self) -> &CreditLedger<S> {
        &self.credit
    }

    /// Computes the plan for `amount` without writing anything.
    pub async fn preview(
        &self,
        member_id: MemberId,
        amount: Decimal,
    ) -> Result<AllocationPlan, AllocationError> {
        let load_failed = |source| AllocationError::LoadFailed { member_id, source };

        let invoices = self
            .store
            .list_open_invoices(member_id)
            .await
            .map_err(load_failed)?;
        let ids: Vec<_> = invoices.iter().map(|i| i.id).collect();
        let allocations = if ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_allocations_for_invoices(&ids)
                .await
                .map_err(load_failed)?
        };

        let snapshots = open_invoice_snapshots(&invoices, &allocations);
        Ok(plan_allocation(&snapshots, amount))
    }

    /// Allocates a recorded payment oldest-due-date first.
    ///
    /// Settled invoices are marked paid with `payment_date`. Whatever is
    /// left after every open invoice is covered goes to the member's credit.
    /// Write failures are returned with the member, invoice and amount
    /// involved; allocations already written stay in place.
    pub async fn allocate(
        &self,
        payment_id: PaymentId,
        member_id: MemberId,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> Result<AllocationOutcome, AllocationError> {
        let amount = round_cents(amount);
        if !is_positive_amount(amount) {
            return Err(AllocationError::InvalidAmount { member_id, amount });
        }

        let plan = self.preview(member_id, amount).await?;
        tracing::debug!(
            %member_id,
            %payment_id,
            %amount,
            steps = plan.allocations.len(),
            overflow = %plan.overflow,
            "allocation planned"
        );

        let mut applied = Vec::with_capacity(plan.allocations.len());
        for step in &plan.allocations {
            let record = self
                .store
                .insert_allocation(NewAllocation {
                    payment_id,
                    invoice_id: step.invoice_id,
                    amount: step.amount,
                })
                .await
                .map_err(|source| AllocationError::AllocationWriteFailed {
                    member_id,
                    payment_id,
                    invoice_id: step.invoice_id,
                    amount: step.amount,
                    source,
                })?;

            if step.settles {
                self.store
                    .mark_invoice_paid(step.invoice_id, payment_date)
                    .await
                    .map_err(|source| AllocationError::InvoiceUpdateFailed {
                        member_id,
                        invoice_id: step.invoice_id,
                        source,
                    })?;
            }

            self.sink.emit(&ReconciliationEvent::AllocationRecorded {
                member_id,
                payment_id,
                invoice_id: step.invoice_id,
                amount: step.amount,
                settled: step.settles,
            });
            applied.push(AppliedAllocation {
                allocation_id: record.id,
                invoice_id: step.invoice_id,
                amount: step.amount,
                settled: step.settles,
            });
        }

        let credit_balance = if is_positive_amount(plan.overflow) {
            Some(self.credit.add_credit(member_id, plan.overflow).await?)
        } else {
            None
        };

        Ok(AllocationOutcome {
            payment_id,
            member_id,
            applied,
            overflow: plan.overflow,
            credit_balance,
        })
    }
}
