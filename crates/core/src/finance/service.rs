//! Transaction aggregator.
//!
//! Presents the three finance tables as one ledger: reads merge all of
//! them, writes go to the single table a transaction's type routes to.

use chrono::Utc;
use gymledger_shared::FinanceConfig;
use gymledger_shared::types::BranchId;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::{FinanceError, StoreError};
use super::mapping;
use super::reports;
use super::rows::SourceQuery;
use super::store::LedgerStore;
use super::types::{
    CategoryTotal, CreateTransactionInput, FinanceSummary, FinancialTransaction, LedgerSource,
    MonthlyTotals, TransactionFilter, TransactionPatch, TransactionRef, TransactionType,
};

/// Reads and writes the branch ledger across its backing tables.
#[derive(Debug, Clone)]
pub struct TransactionAggregator<S> {
    store: S,
    config: FinanceConfig,
}

impl<S: LedgerStore> TransactionAggregator<S> {
    /// Creates an aggregator with default finance settings.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, FinanceConfig::default())
    }

    /// Creates an aggregator with explicit finance settings.
    #[must_use]
    pub const fn with_config(store: S, config: FinanceConfig) -> Self {
        Self { store, config }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns every transaction of the branch, newest first.
    ///
    /// A missing branch yields an empty list. Sources that fail are skipped
    /// as long as at least one source was read.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::AllSourcesUnavailable` if none of the three
    /// tables could be read.
    pub async fn fetch(
        &self,
        branch_id: Option<BranchId>,
    ) -> Result<Vec<FinancialTransaction>, FinanceError> {
        let Some(branch_id) = branch_id else {
            return Ok(Vec::new());
        };
        let query = SourceQuery::branch(branch_id);

        let (unified, income, expense) = if self.config.concurrent_reads {
            tokio::join!(
                self.read(LedgerSource::Unified, &query),
                self.read(LedgerSource::Income, &query),
                self.read(LedgerSource::Expense, &query),
            )
        } else {
            (
                self.read(LedgerSource::Unified, &query).await,
                self.read(LedgerSource::Income, &query).await,
                self.read(LedgerSource::Expense, &query).await,
            )
        };

        match (unified, income, expense) {
            (Err(unified), Err(income), Err(expense)) => {
                warn!(%branch_id, "every finance source failed");
                Err(FinanceError::AllSourcesUnavailable {
                    unified,
                    income,
                    expense,
                })
            }
            (unified, income, expense) => {
                let mut batches = Vec::with_capacity(3);
                for (source, outcome) in [
                    (LedgerSource::Unified, unified),
                    (LedgerSource::Income, income),
                    (LedgerSource::Expense, expense),
                ] {
                    match outcome {
                        Ok(rows) => batches.push(rows),
                        Err(error) => {
                            warn!(%branch_id, %source, %error, "skipping unreadable finance source");
                        }
                    }
                }
                let merged = mapping::merge_sorted(batches);
                debug!(%branch_id, count = merged.len(), "fetched ledger");
                Ok(merged)
            }
        }
    }

    /// Returns the branch transactions that pass `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn fetch_filtered(
        &self,
        branch_id: Option<BranchId>,
        filter: &TransactionFilter,
    ) -> Result<Vec<FinancialTransaction>, FinanceError> {
        let mut transactions = self.fetch(branch_id).await?;
        transactions.retain(|txn| filter.matches(txn));
        Ok(transactions)
    }

    /// Records a transaction in the table its type routes to.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::CreateFailed` if the insert fails. No other
    /// table is tried.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<FinancialTransaction, FinanceError> {
        let row = mapping::to_new_row(input, Utc::now());
        let table = row.source();

        let stored = self.store.insert(row).await.map_err(|error| {
            warn!(%table, %error, "failed to create transaction");
            FinanceError::CreateFailed { table, error }
        })?;

        let created = mapping::normalize(stored, &self.config);
        debug!(id = %created.id, "created transaction");
        Ok(created)
    }

    /// Applies a partial update.
    ///
    /// A reference with a known table is updated there directly. Otherwise
    /// the patch's type picks the table, and if that attempt fails or
    /// matches nothing the unified table is tried once.
    ///
    /// Returns `Ok(true)` if a row changed and `Ok(false)` if no tried
    /// table held the id.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::UpdateFailed` if every attempt errored.
    pub async fn update(
        &self,
        id: &TransactionRef,
        patch: TransactionPatch,
    ) -> Result<bool, FinanceError> {
        let now = Utc::now();

        if let Some(table) = id.source {
            let changed = self
                .store
                .update(id.id, mapping::to_patch(table, &patch, now))
                .await
                .map_err(FinanceError::UpdateFailed)?;
            return Ok(changed > 0);
        }

        let primary = LedgerSource::route(patch.transaction_type.as_ref());
        let first = self
            .store
            .update(id.id, mapping::to_patch(primary, &patch, now))
            .await;
        match &first {
            Ok(changed) if *changed > 0 => return Ok(true),
            Ok(_) => debug!(%id, table = %primary, "update matched no row"),
            Err(error) => warn!(%id, table = %primary, %error, "update failed"),
        }

        if primary == LedgerSource::Unified {
            return first.map(|_| false).map_err(FinanceError::UpdateFailed);
        }

        let fallback = self
            .store
            .update(id.id, mapping::to_patch(LedgerSource::Unified, &patch, now))
            .await;
        match (first, fallback) {
            (_, Ok(changed)) if changed > 0 => Ok(true),
            (Err(_), Err(error)) => Err(FinanceError::UpdateFailed(error)),
            (_, Err(error)) => {
                warn!(%id, %error, "fallback update failed");
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Deletes a transaction.
    ///
    /// A reference with a known table is deleted there directly. Otherwise
    /// tables are probed in `LedgerSource::PROBE_ORDER` until one removes
    /// the row.
    ///
    /// Returns `Ok(true)` if a row was removed and `Ok(false)` if no table
    /// held the id.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::DeleteFailed` if every attempt errored.
    pub async fn delete(&self, id: &TransactionRef) -> Result<bool, FinanceError> {
        if let Some(table) = id.source {
            let removed = self
                .store
                .delete(table, id.id)
                .await
                .map_err(FinanceError::DeleteFailed)?;
            return Ok(removed > 0);
        }

        let mut failures = Vec::new();
        for table in LedgerSource::PROBE_ORDER {
            match self.store.delete(table, id.id).await {
                Ok(removed) if removed > 0 => {
                    debug!(%id, %table, "deleted transaction");
                    return Ok(true);
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%id, %table, %error, "delete probe failed");
                    failures.push(error);
                }
            }
        }

        if failures.len() == LedgerSource::PROBE_ORDER.len() {
            return Err(FinanceError::DeleteFailed(
                failures.pop().unwrap_or_else(|| {
                    StoreError::Unavailable("no delete attempt was made".to_string())
                }),
            ));
        }
        Ok(false)
    }

    /// Computes branch income, expenses and balance.
    ///
    /// Income prefers unified rows typed income and falls back to the
    /// income table; expenses prefer the expense table and fall back to
    /// unified rows typed expense. A half that cannot be read counts as zero.
    pub async fn finance_summary(&self, branch_id: BranchId) -> FinanceSummary {
        let income = self.total_with_fallback(
            "income",
            (
                LedgerSource::Unified,
                SourceQuery::typed(branch_id, TransactionType::Income),
            ),
            (LedgerSource::Income, SourceQuery::branch(branch_id)),
        );
        let expenses = self.total_with_fallback(
            "expenses",
            (LedgerSource::Expense, SourceQuery::branch(branch_id)),
            (
                LedgerSource::Unified,
                SourceQuery::typed(branch_id, TransactionType::Expense),
            ),
        );

        let (income, expenses) = if self.config.concurrent_reads {
            tokio::join!(income, expenses)
        } else {
            (income.await, expenses.await)
        };
        FinanceSummary::new(income, expenses)
    }

    /// Totals per `(type, category)` over the merged ledger.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn category_breakdown(
        &self,
        branch_id: BranchId,
    ) -> Result<Vec<CategoryTotal>, FinanceError> {
        let transactions = self.fetch(Some(branch_id)).await?;
        Ok(reports::category_breakdown(&transactions))
    }

    /// Twelve monthly totals for `year` over the merged ledger.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn monthly_totals(
        &self,
        branch_id: BranchId,
        year: i32,
    ) -> Result<Vec<MonthlyTotals>, FinanceError> {
        let transactions = self.fetch(Some(branch_id)).await?;
        Ok(reports::monthly_totals(&transactions, year))
    }

    async fn read(
        &self,
        source: LedgerSource,
        query: &SourceQuery,
    ) -> Result<Vec<FinancialTransaction>, StoreError> {
        let rows = self.store.list(source, query).await?;
        Ok(rows
            .into_iter()
            .map(|row| mapping::normalize(row, &self.config))
            .collect())
    }

    async fn total_with_fallback(
        &self,
        half: &'static str,
        preferred: (LedgerSource, SourceQuery),
        fallback: (LedgerSource, SourceQuery),
    ) -> Decimal {
        match self.store.list(preferred.0, &preferred.1).await {
            Ok(rows) if !rows.is_empty() => return rows.iter().map(|row| row.amount()).sum(),
            Ok(_) => {}
            Err(error) => warn!(half, source = %preferred.0, %error, "summary source failed"),
        }

        match self.store.list(fallback.0, &fallback.1).await {
            Ok(rows) => rows.iter().map(|row| row.amount()).sum(),
            Err(error) => {
                warn!(half, source = %fallback.0, %error, "summary defaulted to zero");
                Decimal::ZERO
            }
        }
    }
}
