//! Shared types, errors, and configuration for Amarra.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for members, invoices, payments and bank movements
//! - Money helpers with cent precision
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
