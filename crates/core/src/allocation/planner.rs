//! Pure oldest-first allocation planning.

use std::collections::HashMap;

use amarra_shared::types::InvoiceId;
use amarra_shared::types::money::{covers, is_positive_amount, min_amount, non_negative_cents, round_cents};
use rust_decimal::Decimal;

use super::types::{AllocationPlan, OpenInvoice, PlannedAllocation};
use crate::store::{Allocation, Invoice};

/// Invoice total minus every recorded allocation, at cent precision, never negative.
#[must_use]
pub fn outstanding_balance<I>(total: Decimal, allocated: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let allocated: Decimal = allocated.into_iter().sum();
    non_negative_cents(total - allocated)
}

/// Pairs each invoice with its outstanding balance from the recorded allocations.
///
/// The invoice total alone never reflects prior partial payments.
#[must_use]
pub fn open_invoice_snapshots(invoices: &[Invoice], allocations: &[Allocation]) -> Vec<OpenInvoice> {
    let mut allocated: HashMap<InvoiceId, Decimal> = HashMap::new();
    for allocation in allocations {
        *allocated.entry(allocation.invoice_id).or_default() += allocation.amount;
    }

    invoices
        .iter()
        .map(|invoice| OpenInvoice {
            invoice_id: invoice.id,
            due_date: invoice.due_date,
            total: invoice.total,
            outstanding: outstanding_balance(
                invoice.total,
                allocated.get(&invoice.id).copied(),
            ),
        })
        .collect()
}

/// Plans how `amount` is spread over `invoices`, oldest due date first.
///
/// Each invoice receives `min(outstanding, remaining)`; invoices with nothing
/// outstanding are skipped; planning stops once the amount is used up. An
/// invoice settles only when the applied amount covers its whole balance.
#[must_use]
pub fn plan_allocation(invoices: &[OpenInvoice], amount: Decimal) -> AllocationPlan {
    let mut ordered: Vec<&OpenInvoice> = invoices.iter().collect();
    ordered.sort_by_key(|invoice| invoice.due_date);

    let mut remaining = non_negative_cents(amount);
    let mut allocations = Vec::new();

    for invoice in ordered {
        if !is_positive_amount(remaining) {
            break;
        }
        let outstanding = round_cents(invoice.outstanding);
        if !is_positive_amount(outstanding) {
            continue;
        }
        let applied = min_amount(outstanding, remaining);
        remaining = round_cents(remaining - applied);
        allocations.push(PlannedAllocation {
            invoice_id: invoice.invoice_id,
            amount: applied,
            settles: covers(applied, outstanding),
        });
    }

    AllocationPlan {
        allocations,
        overflow: non_negative_cents(remaining),
    }
}
