//! Core reconciliation logic for Amarra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the repository traits in [`store`], which
//! the db crate implements.
//!
//! # Modules
//!
//! - `text` - Normalization and identity-token extraction
//! - `similarity` - Levenshtein and name similarity
//! - `statement` - Bank statement parsing
//! - `fingerprint` - Duplicate-detection fingerprints
//! - `matching` - Six-tier identity cascade
//! - `allocation` - Oldest-first payment allocation
//! - `credit` - Member credit ledger
//! - `timeline` - Chronological account statement
//! - `reconciliation` - Analysis and confirmation orchestration

pub mod allocation;
pub mod credit;
pub mod fingerprint;
pub mod matching;
pub mod reconciliation;
pub mod similarity;
pub mod statement;
pub mod store;
pub mod telemetry;
pub mod text;
pub mod timeline;

#[cfg(test)]
mod fingerprint_props;
#[cfg(test)]
mod similarity_props;
