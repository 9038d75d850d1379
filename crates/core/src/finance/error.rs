//! Finance error types.

use gymledger_shared::AppError;
use thiserror::Error;

use super::types::LedgerSource;

/// Failure reported by a `LedgerStore`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The table could not be reached or queried.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// A stored row could not be read into its row shape.
    #[error("could not decode row: {0}")]
    Decode(String),
}

/// Errors returned by the transaction aggregator.
#[derive(Debug, Error)]
pub enum FinanceError {
    /// Every source failed, so the ledger could not be read at all.
    #[error("no finance source could be read (unified: {unified}; income: {income}; expense: {expense})")]
    AllSourcesUnavailable {
        /// Error from the unified table.
        unified: StoreError,
        /// Error from the income table.
        income: StoreError,
        /// Error from the expense table.
        expense: StoreError,
    },

    /// The routed insert failed.
    #[error("failed to create transaction in {table}: {error}")]
    CreateFailed {
        /// Destination table.
        table: LedgerSource,
        /// Underlying store error.
        error: StoreError,
    },

    /// Every update attempt failed.
    #[error("failed to update transaction: {0}")]
    UpdateFailed(StoreError),

    /// Every delete attempt failed.
    #[error("failed to delete transaction: {0}")]
    DeleteFailed(StoreError),

    /// A record reference could not be parsed.
    #[error("invalid transaction reference: {0}")]
    InvalidReference(String),
}

impl From<FinanceError> for AppError {
    fn from(err: FinanceError) -> Self {
        match err {
            FinanceError::AllSourcesUnavailable { .. } => Self::Unavailable(err.to_string()),
            FinanceError::CreateFailed { .. }
            | FinanceError::UpdateFailed(_)
            | FinanceError::DeleteFailed(_) => Self::Database(err.to_string()),
            FinanceError::InvalidReference(_) => Self::Validation(err.to_string()),
        }
    }
}
