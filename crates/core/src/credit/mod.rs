//! Member credit ("saldo a favor"): carried-forward overpayments.
//!
//! A member holds at most one credit record. Overflow from the allocator is
//! added to it; applying it to an invoice creates a virtual
//! `credit_applied` payment and allocation. A record reduced to zero is
//! deleted, never left at zero.

mod service;
mod types;

pub use service::CreditLedger;
pub use types::{CreditApplication, CreditSweep};
