//! Payment allocation: oldest-due-date-first, full-or-nothing per invoice.
//!
//! A payment is walked across the member's pending and overdue invoices in
//! due-date order. Each invoice takes as much as it still owes; the first
//! invoice the payment cannot cover absorbs the remainder and stays open.
//! Anything left once every invoice is covered becomes member credit.

mod error;
mod planner;
mod service;
mod types;

#[cfg(test)]
mod allocation_props;

pub use error::AllocationError;
pub use planner::{open_invoice_snapshots, outstanding_balance, plan_allocation};
pub use service::PaymentAllocator;
pub use types::*;
