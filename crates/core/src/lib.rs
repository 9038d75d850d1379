//! Core business logic for the gym ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the `finance::LedgerStore` trait.
//!
//! # Modules
//!
//! - `finance` - Branch ledger spread over the unified and legacy tables

pub mod finance;
