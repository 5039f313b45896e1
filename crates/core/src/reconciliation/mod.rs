//! Statement reconciliation: from a raw bank export to allocated payments.
//!
//! - [`ReconciliationService::analyze`]: parse, deduplicate by fingerprint,
//!   match, and sort into review buckets
//! - [`ReconciliationService::confirm`] / [`ReconciliationService::confirm_batch`]:
//!   persist movements as payments and allocate them
//! - [`ReconciliationService::record_payment`]: manual payments
//!
//! Every ledger mutation runs under a per-member lock.

mod error;
mod locks;
mod service;
mod types;

pub use error::ReconciliationError;
pub use locks::MemberLocks;
pub use service::ReconciliationService;
pub use types::*;
