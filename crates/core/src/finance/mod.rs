//! Branch finance ledger.
//!
//! The ledger lives in three tables with different historical schemas:
//! - `transactions` - the unified table, any type
//! - `income_records` - legacy income rows
//! - `expense_records` - legacy expense rows
//!
//! This module normalizes all of them into `FinancialTransaction`, routes
//! writes by transaction type, and computes branch summaries and reports.

pub mod error;
pub mod mapping;
pub mod reports;
pub mod rows;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod merge_props;
#[cfg(test)]
mod tests;

pub use error::{FinanceError, StoreError};
pub use rows::{NewSourceRow, PatchChanges, SourcePatch, SourceQuery, SourceRow};
pub use service::TransactionAggregator;
pub use store::LedgerStore;
pub use types::{
    CategoryTotal, CreateTransactionInput, FinanceSummary, FinancialTransaction, LedgerSource,
    MonthlyTotals, TransactionFilter, TransactionPatch, TransactionRef, TransactionType,
};
