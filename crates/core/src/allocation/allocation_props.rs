//! Property-based tests for allocation planning.
//!
//! - Conservation: applied + overflow == payment
//! - No invoice receives more than it owes
//! - Oldest-first: only the last step can leave an invoice open

use amarra_shared::types::InvoiceId;
use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::planner::{outstanding_balance, plan_allocation};
use super::types::OpenInvoice;

/// Strategy to generate positive decimal amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate an open invoice with some prior allocations.
fn open_invoice() -> impl Strategy<Value = OpenInvoice> {
    (0u64..365, positive_amount(), 0u32..=100).prop_map(|(offset, total, paid_pct)| {
        let paid = (total * Decimal::from(paid_pct) / Decimal::ONE_HUNDRED).round_dp(2);
        let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
        OpenInvoice {
            invoice_id: InvoiceId::new(),
            due_date: base + Days::new(offset),
            total,
            outstanding: outstanding_balance(total, [paid]),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_applied_plus_overflow_equals_payment(
        invoices in prop::collection::vec(open_invoice(), 0..8),
        amount in positive_amount(),
    ) {
        let plan = plan_allocation(&invoices, amount);
        let applied: Decimal = plan.allocations.iter().map(|a| a.amount).sum();
        prop_assert_eq!(applied + plan.overflow, amount);
        prop_assert!(plan.overflow >= Decimal::ZERO);
    }

    #[test]
    fn prop_never_exceeds_outstanding(
        invoices in prop::collection::vec(open_invoice(), 0..8),
        amount in positive_amount(),
    ) {
        let plan = plan_allocation(&invoices, amount);
        for step in &plan.allocations {
            let invoice = invoices.iter().find(|i| i.invoice_id == step.invoice_id).unwrap();
            prop_assert!(step.amount > Decimal::ZERO);
            prop_assert!(step.amount <= invoice.outstanding);
            prop_assert!(step.amount <= invoice.total);
            prop_assert_eq!(step.settles, step.amount == invoice.outstanding);
        }
    }

    #[test]
    fn prop_oldest_first(
        invoices in prop::collection::vec(open_invoice(), 0..8),
        amount in positive_amount(),
    ) {
        let plan = plan_allocation(&invoices, amount);
        let dates: Vec<NaiveDate> = plan
            .allocations
            .iter()
            .map(|s| invoices.iter().find(|i| i.invoice_id == s.invoice_id).unwrap().due_date)
            .collect();
        prop_assert!(dates.windows(2).all(|w| w[0] <= w[1]));

        // Only the final step may leave its invoice open.
        if let Some((_, head)) = plan.allocations.split_last() {
            prop_assert!(head.iter().all(|s| s.settles));
        }
        // Overflow only exists once every owing invoice was settled.
        if plan.overflow > Decimal::ZERO {
            let owing = invoices.iter().filter(|i| i.outstanding > Decimal::ZERO).count();
            prop_assert_eq!(plan.allocations.len(), owing);
            prop_assert!(plan.allocations.iter().all(|s| s.settles));
        }
    }
}
