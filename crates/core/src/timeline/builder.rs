//! Pure timeline construction.

use std::collections::HashMap;

use amarra_shared::types::money::non_negative_cents;
use amarra_shared::types::{InvoiceId, MemberId, PaymentId};
use rust_decimal::Decimal;

use super::types::{AllocationBreakdown, EntryKind, Timeline, TimelineEntry};
use crate::store::{Allocation, Invoice, Payment};

/// Builds the chronological statement from a member's records.
///
/// Entries are sorted by date, invoices before payments on the same day.
/// Nothing is written; empty inputs give an empty timeline.
#[must_use]
pub fn build_timeline(
    member_id: MemberId,
    invoices: &[Invoice],
    payments: &[Payment],
    allocations: &[Allocation],
) -> Timeline {
    let by_invoice: HashMap<InvoiceId, &Invoice> = invoices.iter().map(|i| (i.id, i)).collect();
    let mut by_payment: HashMap<PaymentId, Vec<&Allocation>> = HashMap::new();
    for allocation in allocations {
        by_payment.entry(allocation.payment_id).or_default().push(allocation);
    }

    let mut entries: Vec<TimelineEntry> = invoices
        .iter()
        .map(|invoice| TimelineEntry {
            date: invoice.period_start().unwrap_or(invoice.due_date),
            amount: invoice.total,
            balance: Decimal::ZERO,
            kind: EntryKind::Invoice {
                invoice_id: invoice.id,
                number: invoice.number.clone(),
                period: invoice.period_label(),
                status: invoice.status,
            },
        })
        .collect();

    entries.extend(payments.iter().map(|payment| {
        let funded = by_payment.get(&payment.id).map(Vec::as_slice).unwrap_or_default();
        let breakdown: Vec<AllocationBreakdown> = funded
            .iter()
            .map(|allocation| {
                let invoice = by_invoice.get(&allocation.invoice_id);
                AllocationBreakdown {
                    invoice_id: allocation.invoice_id,
                    invoice_number: invoice.map(|i| i.number.clone()),
                    invoice_total: invoice.map(|i| i.total),
                    amount: allocation.amount,
                }
            })
            .collect();
        let allocated: Decimal = breakdown.iter().map(|b| b.amount).sum();
        TimelineEntry {
            date: payment.date,
            amount: payment.amount,
            balance: Decimal::ZERO,
            kind: EntryKind::Payment {
                payment_id: payment.id,
                method: payment.method,
                allocations: breakdown,
                leftover: non_negative_cents(payment.amount - allocated),
            },
        }
    }));

    entries.sort_by_key(|entry| (entry.date, !entry.is_invoice()));

    let mut balance = Decimal::ZERO;
    for entry in &mut entries {
        balance += entry.balance_effect();
        entry.balance = balance;
    }

    Timeline {
        member_id,
        entries,
        closing_balance: balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InvoiceStatus, PaymentMethod};
    use amarra_shared::types::AllocationId;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(member_id: MemberId, month: u32, total: Decimal) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            member_id,
            number: format!("F-{month:02}"),
            period_year: 2025,
            period_month: month,
            total,
            due_date: date(2025, month, 15),
            status: InvoiceStatus::Pending,
            paid_date: None,
        }
    }

    fn payment(member_id: MemberId, day: NaiveDate, amount: Decimal, method: PaymentMethod) -> Payment {
        Payment {
            id: PaymentId::new(),
            member_id,
            amount,
            date: day,
            method,
            bank_movement_id: None,
            reconciled: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn allocation(payment: &Payment, invoice: &Invoice, amount: Decimal) -> Allocation {
        Allocation {
            id: AllocationId::new(),
            payment_id: payment.id,
            invoice_id: invoice.id,
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_then_full_payment() {
        let member_id = MemberId::new();
        let inv = invoice(member_id, 10, dec!(50000));
        let pay = payment(member_id, date(2025, 10, 10), dec!(50000), PaymentMethod::BankTransfer);
        let alloc = allocation(&pay, &inv, dec!(50000));

        let timeline = build_timeline(member_id, &[inv], &[pay], &[alloc]);

        assert_eq!(timeline.entries.len(), 2);
        assert_eq!(timeline.balances(), vec![dec!(-50000), dec!(0)]);
        assert_eq!(timeline.entries[1].amount, dec!(50000));
        match &timeline.entries[1].kind {
            EntryKind::Payment { allocations, leftover, .. } => {
                assert_eq!(allocations.len(), 1);
                assert_eq!(allocations[0].invoice_number.as_deref(), Some("F-10"));
                assert_eq!(*leftover, Decimal::ZERO);
            }
            EntryKind::Invoice { .. } => panic!("expected a payment entry"),
        }
        assert_eq!(timeline.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_empty_history() {
        let timeline = build_timeline(MemberId::new(), &[], &[], &[]);
        assert!(timeline.is_empty());
        assert_eq!(timeline.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_same_day_invoice_sorts_first() {
        let member_id = MemberId::new();
        let inv = invoice(member_id, 10, dec!(10000));
        let pay = payment(member_id, date(2025, 10, 1), dec!(10000), PaymentMethod::Cash);

        let timeline = build_timeline(member_id, &[inv], &[pay], &[]);
        assert!(timeline.entries[0].is_invoice());
        assert_eq!(timeline.balances(), vec![dec!(-10000), dec!(0)]);
    }

    #[test]
    fn test_overpayment_leftover_and_credit_applied_entry() {
        let member_id = MemberId::new();
        let oct = invoice(member_id, 10, dec!(30000));
        let nov = invoice(member_id, 11, dec!(30000));
        let pay = payment(member_id, date(2025, 10, 5), dec!(45000), PaymentMethod::BankTransfer);
        let credit = payment(member_id, date(2025, 11, 1), dec!(15000), PaymentMethod::CreditApplied);
        let allocations = vec![
            allocation(&pay, &oct, dec!(30000)),
            allocation(&credit, &nov, dec!(15000)),
        ];

        let timeline = build_timeline(member_id, &[oct, nov], &[pay, credit], &allocations);

        assert_eq!(timeline.entries.len(), 4);
        let leftover = match &timeline.entries[1].kind {
            EntryKind::Payment { leftover, .. } => *leftover,
            EntryKind::Invoice { .. } => panic!("expected a payment entry"),
        };
        assert_eq!(leftover, dec!(15000));
        // Oct -30000, payment +45000, Nov -30000, credit_applied does not move it.
        assert_eq!(
            timeline.balances(),
            vec![dec!(-30000), dec!(15000), dec!(-15000), dec!(-15000)]
        );
        assert_eq!(timeline.closing_balance, dec!(-15000));
    }
}
