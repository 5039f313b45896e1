//! Chronological account statement of a member.
//!
//! A read-only reconstruction: one entry per invoice, one per payment (never
//! split per allocation), a running balance after each entry.

mod builder;
mod service;
mod types;

pub use builder::build_timeline;
pub use service::{TimelineError, TimelineService};
pub use types::*;
