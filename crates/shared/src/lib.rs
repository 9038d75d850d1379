//! Shared types, errors, and configuration for the gym ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for branch and record references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, FinanceConfig};
pub use error::AppError;
