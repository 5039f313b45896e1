//! Bank statement parsing.
//!
//! Turns the raw tab-delimited export into credit-only [`Movement`]s:
//! - Header, footer and timestamp lines are ignored
//! - Debits, fees and taxes are discarded
//! - Malformed lines are reported and skipped, never fatal

mod parser;
mod types;

pub use parser::{is_debit_description, parse_amount, parse_statement, parse_statement_date};
pub use types::{Movement, MovementKind, ParsedStatement, SkippedLine};
