//! Plain-text and JSON output.

use std::fmt::Write as _;

use amarra_core::credit::{CreditApplication, CreditSweep};
use amarra_core::reconciliation::{
    AnalyzedMovement, BatchReport, DuplicateOf, PaymentReceipt, StatementAnalysis,
};
use amarra_core::timeline::{EntryKind, Timeline};
use amarra_shared::types::MemberId;
use amarra_shared::types::money::fixed2;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn movement_line(out: &mut String, analyzed: &AnalyzedMovement) {
    let movement = &analyzed.movement;
    let _ = write!(
        out,
        "  line {:>4}  {}  {:>12}  {}",
        movement.line,
        movement.date,
        fixed2(movement.amount),
        movement.description
    );
    if let Some(name) = &analyzed.result.member_name {
        let _ = write!(
            out,
            "  -> {name} [{} {}%]",
            analyzed.result.tier.label(),
            analyzed.result.confidence
        );
    }
    match &analyzed.duplicate_of {
        Some(DuplicateOf::Stored {
            payment_id: Some(payment_id),
            ..
        }) => {
            let _ = write!(out, "  (already paid: {payment_id})");
        }
        Some(DuplicateOf::Stored {
            payment_id: None, ..
        }) => out.push_str("  (stored, not confirmed)"),
        Some(DuplicateOf::Upload { first_line }) => {
            let _ = write!(out, "  (repeats line {first_line})");
        }
        None => {}
    }
    out.push('\n');
}

fn section(out: &mut String, title: &str, movements: &[AnalyzedMovement]) {
    let _ = writeln!(out, "{title} ({})", movements.len());
    for analyzed in movements {
        movement_line(out, analyzed);
    }
}

pub fn analysis(analysis: &StatementAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} movements, {} discarded, {} ignored, {} malformed",
        analysis.total_movements(),
        analysis.discarded,
        analysis.ignored,
        analysis.malformed.len()
    );
    section(&mut out, "Exact", &analysis.exact);
    section(&mut out, "Probable", &analysis.probable);
    section(&mut out, "Unmatched", &analysis.unmatched);
    section(&mut out, "Duplicates", &analysis.duplicates);
    for skipped in &analysis.malformed {
        let _ = writeln!(out, "  skipped line {}: {}", skipped.line, skipped.reason);
    }
    out
}

pub fn batch(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Confirmed {} of {} ({} failed, {} skipped){}",
        report.succeeded(),
        report.total,
        report.failed(),
        report.skipped(),
        if report.cancelled { " - cancelled" } else { "" }
    );
    for receipt in &report.confirmed {
        let _ = writeln!(
            out,
            "  payment {} member {} applied {} credit {}",
            receipt.payment_id,
            receipt.member_id,
            fixed2(receipt.allocation.total_applied()),
            fixed2(receipt.allocation.overflow)
        );
    }
    for failure in &report.failures {
        let _ = writeln!(
            out,
            "  #{} {} [{}] {}",
            failure.index,
            failure.description,
            failure.error.error_code(),
            failure.error
        );
    }
    out
}

pub fn timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Member {}", timeline.member_id);
    for entry in &timeline.entries {
        let label = match &entry.kind {
            EntryKind::Invoice {
                number,
                period,
                status,
                ..
            } => format!("Invoice {number} {period} ({status})"),
            EntryKind::Payment {
                method, leftover, ..
            } if leftover.is_zero() => format!("Payment {method}"),
            EntryKind::Payment {
                method, leftover, ..
            } => format!("Payment {method} (to credit {})", fixed2(*leftover)),
        };
        let _ = writeln!(
            out,
            "  {}  {:<40} {:>12} {:>12}",
            entry.date,
            label,
            fixed2(entry.amount),
            fixed2(entry.balance)
        );
    }
    let _ = write!(out, "Closing balance: {}", fixed2(timeline.closing_balance));
    out
}

pub fn credit_balance(member_id: MemberId, balance: Decimal) -> String {
    format!("Member {member_id} credit: {}", fixed2(balance))
}

pub fn credit_application(application: &CreditApplication) -> String {
    if !application.applied() {
        return format!(
            "No credit applied to invoice {} (credit {})",
            application.invoice_id,
            fixed2(application.remaining_credit)
        );
    }
    format!(
        "Applied {} to invoice {}{}; remaining credit {}",
        fixed2(application.amount_applied),
        application.invoice_id,
        if application.invoice_fully_paid {
            " (paid)"
        } else {
            ""
        },
        fixed2(application.remaining_credit)
    )
}

pub fn credit_sweep(sweep: &CreditSweep) -> String {
    let mut out = String::new();
    for application in sweep.applications.iter().filter(|a| a.applied()) {
        let _ = writeln!(out, "{}", credit_application(application));
    }
    let _ = write!(
        out,
        "Applied {} in total; remaining credit {}",
        fixed2(sweep.total_applied()),
        fixed2(sweep.remaining_credit)
    );
    out
}

pub fn payment_receipt(receipt: &PaymentReceipt) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Payment {} ({}) of {} recorded",
        receipt.payment.id,
        receipt.payment.method,
        fixed2(receipt.payment.amount)
    );
    for applied in &receipt.allocation.applied {
        let _ = writeln!(
            out,
            "  {} -> invoice {}{}",
            fixed2(applied.amount),
            applied.invoice_id,
            if applied.settled { " (paid)" } else { "" }
        );
    }
    if let Some(balance) = receipt.allocation.credit_balance {
        let _ = write!(out, "  credit balance now {}", fixed2(balance));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use amarra_core::store::{InvoiceStatus, PaymentMethod};
    use amarra_core::timeline::TimelineEntry;
    use amarra_shared::types::{InvoiceId, PaymentId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_analysis_summary() {
        let text = analysis(&StatementAnalysis {
            discarded: 2,
            ignored: 5,
            ..StatementAnalysis::default()
        });
        assert!(text.starts_with("0 movements, 2 discarded, 5 ignored, 0 malformed"));
        assert!(text.contains("Exact (0)"));
        assert!(text.contains("Duplicates (0)"));
    }

    #[test]
    fn test_batch_summary_marks_cancellation() {
        let report = BatchReport {
            total: 3,
            cancelled: true,
            ..BatchReport::default()
        };
        assert_eq!(
            batch(&report).lines().next(),
            Some("Confirmed 0 of 3 (0 failed, 3 skipped) - cancelled")
        );
    }

    #[test]
    fn test_timeline_rows() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let timeline = Timeline {
            member_id: MemberId::new(),
            entries: vec![
                TimelineEntry {
                    date,
                    amount: dec!(30000),
                    balance: dec!(-30000),
                    kind: EntryKind::Invoice {
                        invoice_id: InvoiceId::new(),
                        number: "C-001".into(),
                        period: "10/2024".into(),
                        status: InvoiceStatus::Paid,
                    },
                },
                TimelineEntry {
                    date,
                    amount: dec!(35000),
                    balance: dec!(5000),
                    kind: EntryKind::Payment {
                        payment_id: PaymentId::new(),
                        method: PaymentMethod::Cash,
                        allocations: Vec::new(),
                        leftover: dec!(5000),
                    },
                },
            ],
            closing_balance: dec!(5000),
        };

        let text = super::timeline(&timeline);
        assert!(text.contains("Invoice C-001 10/2024 (paid)"));
        assert!(text.contains("Payment cash (to credit 5000.00)"));
        assert!(text.ends_with("Closing balance: 5000.00"));
    }

    #[test]
    fn test_credit_balance_line() {
        let member = MemberId::new();
        assert_eq!(
            credit_balance(member, dec!(5000)),
            format!("Member {member} credit: 5000.00")
        );
    }
}
