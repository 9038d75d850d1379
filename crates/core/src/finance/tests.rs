//! Aggregator tests against an in-memory store.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gymledger_shared::types::{BranchId, RecordId};
use gymledger_shared::{AppError, FinanceConfig};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::{FinanceError, StoreError};
use super::rows::{
    ExpenseRecordRow, IncomeRecordRow, NewSourceRow, PatchChanges, SourcePatch, SourceQuery,
    SourceRow, UnifiedRow,
};
use super::service::TransactionAggregator;
use super::store::LedgerStore;
use super::types::{
    CreateTransactionInput, FinanceSummary, LedgerSource, TransactionFilter, TransactionPatch,
    TransactionRef, TransactionType,
};

/// Store double with per-table failure injection and a call log.
#[derive(Default)]
struct InMemoryStore {
    tables: Mutex<HashMap<LedgerSource, Vec<SourceRow>>>,
    failing_reads: Mutex<HashSet<LedgerSource>>,
    failing_writes: Mutex<HashSet<LedgerSource>>,
    calls: Mutex<Vec<(&'static str, LedgerSource)>>,
}

impl InMemoryStore {
    fn seed(&self, row: SourceRow) -> RecordId {
        let id = row.id();
        self.tables
            .lock()
            .unwrap()
            .entry(row.source())
            .or_default()
            .push(row);
        id
    }

    fn fail_reads(&self, source: LedgerSource) {
        self.failing_reads.lock().unwrap().insert(source);
    }

    fn fail_writes(&self, source: LedgerSource) {
        self.failing_writes.lock().unwrap().insert(source);
    }

    fn rows_in(&self, source: LedgerSource) -> Vec<SourceRow> {
        self.tables
            .lock()
            .unwrap()
            .get(&source)
            .cloned()
            .unwrap_or_default()
    }

    fn calls(&self, op: &str) -> Vec<LedgerSource> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|(_, source)| *source)
            .collect()
    }

    fn record(&self, op: &'static str, source: LedgerSource) {
        self.calls.lock().unwrap().push((op, source));
    }

    fn check_write(&self, source: LedgerSource) -> Result<(), StoreError> {
        if self.failing_writes.lock().unwrap().contains(&source) {
            return Err(StoreError::Rejected(format!("{source} is read-only")));
        }
        Ok(())
    }
}

fn row_date(row: &SourceRow) -> Option<NaiveDate> {
    match row {
        SourceRow::Unified(r) => r.transaction_date,
        SourceRow::Income(r) => Some(r.date),
        SourceRow::Expense(r) => Some(r.date),
    }
}

fn apply(row: &mut SourceRow, patch: SourcePatch) {
    match (row, patch.changes) {
        (SourceRow::Unified(r), PatchChanges::Unified(p)) => {
            if let Some(v) = p.transaction_type {
                r.transaction_type = v;
            }
            if let Some(v) = p.amount {
                r.amount = v;
            }
            if let Some(v) = p.description {
                r.description = Some(v);
            }
            if let Some(v) = p.category {
                r.category = Some(v);
            }
            if let Some(v) = p.status {
                r.status = Some(v);
            }
            r.updated_at = patch.updated_at;
        }
        (SourceRow::Income(r), PatchChanges::Income(p)) => {
            if let Some(v) = p.amount {
                r.amount = v;
            }
            if let Some(v) = p.category {
                r.category = Some(v);
            }
            if let Some(v) = p.source {
                r.source = Some(v);
            }
            r.updated_at = patch.updated_at;
        }
        (SourceRow::Expense(r), PatchChanges::Expense(p)) => {
            if let Some(v) = p.amount {
                r.amount = v;
            }
            if let Some(v) = p.category {
                r.category = Some(v);
            }
            if let Some(v) = p.vendor {
                r.vendor = Some(v);
            }
            r.updated_at = patch.updated_at;
        }
        _ => panic!("patch addressed to the wrong table"),
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn list(
        &self,
        source: LedgerSource,
        query: &SourceQuery,
    ) -> Result<Vec<SourceRow>, StoreError> {
        self.record("list", source);
        if self.failing_reads.lock().unwrap().contains(&source) {
            return Err(StoreError::Unavailable(format!("{source} is offline")));
        }
        if !query.admits(source) {
            return Ok(Vec::new());
        }
        let mut rows: Vec<SourceRow> = self
            .rows_in(source)
            .into_iter()
            .filter(|row| row.branch_id() == query.branch_id)
            .filter(|row| match (row, &query.transaction_type) {
                (SourceRow::Unified(r), Some(t)) => TransactionType::parse(&r.transaction_type) == *t,
                _ => true,
            })
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row_date(row)));
        Ok(rows)
    }

    async fn insert(&self, row: NewSourceRow) -> Result<SourceRow, StoreError> {
        let source = row.source();
        self.record("insert", source);
        self.check_write(source)?;
        let id = RecordId::new();
        let stored = match row {
            NewSourceRow::Unified(r) => SourceRow::Unified(UnifiedRow {
                id,
                branch_id: r.branch_id,
                transaction_type: r.transaction_type,
                amount: r.amount,
                description: r.description,
                transaction_date: r.transaction_date,
                payment_method: r.payment_method,
                category: r.category,
                reference_id: r.reference_id,
                status: r.status,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
            NewSourceRow::Income(r) => SourceRow::Income(IncomeRecordRow {
                id,
                branch_id: r.branch_id,
                amount: r.amount,
                date: r.date,
                category: r.category,
                payment_method: r.payment_method,
                description: r.description,
                reference: r.reference,
                source: r.source,
                status: r.status,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
            NewSourceRow::Expense(r) => SourceRow::Expense(ExpenseRecordRow {
                id,
                branch_id: r.branch_id,
                amount: r.amount,
                date: r.date,
                category: r.category,
                payment_method: r.payment_method,
                description: r.description,
                reference: r.reference,
                vendor: r.vendor,
                status: r.status,
                created_at: r.created_at,
                updated_at: r.updated_at,
            }),
        };
        self.seed(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: RecordId, patch: SourcePatch) -> Result<u64, StoreError> {
        let source = patch.source();
        self.record("update", source);
        self.check_write(source)?;
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables
            .entry(source)
            .or_default()
            .iter_mut()
            .find(|row| row.id() == id)
        else {
            return Ok(0);
        };
        apply(row, patch);
        Ok(1)
    }

    async fn delete(&self, source: LedgerSource, id: RecordId) -> Result<u64, StoreError> {
        self.record("delete", source);
        self.check_write(source)?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(source).or_default();
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok((before - rows.len()) as u64)
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

fn unified(branch_id: BranchId, kind: &str, amount: Decimal, on: Option<NaiveDate>) -> SourceRow {
    SourceRow::Unified(UnifiedRow {
        id: RecordId::new(),
        branch_id,
        transaction_type: kind.to_string(),
        amount,
        description: None,
        transaction_date: on,
        payment_method: Some("upi".to_string()),
        category: Some("Membership".to_string()),
        reference_id: None,
        status: Some("completed".to_string()),
        created_at: stamp(),
        updated_at: stamp(),
    })
}

fn income(branch_id: BranchId, amount: Decimal, on: NaiveDate) -> SourceRow {
    SourceRow::Income(IncomeRecordRow {
        id: RecordId::new(),
        branch_id,
        amount,
        date: on,
        category: Some("Membership".to_string()),
        payment_method: Some("cash".to_string()),
        description: None,
        reference: None,
        source: Some("Manual Entry".to_string()),
        status: None,
        created_at: stamp(),
        updated_at: stamp(),
    })
}

fn expense(branch_id: BranchId, amount: Decimal, on: NaiveDate) -> SourceRow {
    SourceRow::Expense(ExpenseRecordRow {
        id: RecordId::new(),
        branch_id,
        amount,
        date: on,
        category: Some("Supplies".to_string()),
        payment_method: None,
        description: None,
        reference: None,
        vendor: Some("Acme Supplies".to_string()),
        status: None,
        created_at: stamp(),
        updated_at: stamp(),
    })
}

fn aggregator() -> (Arc<InMemoryStore>, TransactionAggregator<Arc<InMemoryStore>>) {
    let store = Arc::new(InMemoryStore::default());
    (Arc::clone(&store), TransactionAggregator::new(store))
}

// ----------------------------------------------------------------------------
// fetch
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_without_branch_is_empty_and_reads_nothing() {
    let (store, ledger) = aggregator();
    store.seed(income(BranchId::new(), dec!(10), date(2024, 1, 1)));

    let transactions = ledger.fetch(None).await.unwrap();

    assert!(transactions.is_empty());
    assert!(store.calls("list").is_empty());
}

#[tokio::test]
async fn test_fetch_returns_rows_from_every_source() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(unified(branch, "refund", dec!(5), Some(date(2024, 1, 3))));
    store.seed(unified(branch, "income", dec!(15), Some(date(2024, 1, 4))));
    store.seed(income(branch, dec!(100), date(2024, 1, 5)));
    store.seed(income(branch, dec!(200), date(2024, 1, 6)));
    store.seed(income(branch, dec!(300), date(2024, 1, 7)));
    store.seed(expense(branch, dec!(40), date(2024, 1, 8)));
    store.seed(expense(BranchId::new(), dec!(999), date(2024, 1, 8)));

    let transactions = ledger.fetch(Some(branch)).await.unwrap();

    assert_eq!(transactions.len(), 6);
    assert!(transactions.iter().all(|t| t.branch_id == branch));
    let mut seen: Vec<LedgerSource> = transactions.iter().filter_map(|t| t.id.source).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen, LedgerSource::ALL.to_vec());
}

#[rstest]
#[case(LedgerSource::Unified, 3)]
#[case(LedgerSource::Income, 2)]
#[case(LedgerSource::Expense, 3)]
#[tokio::test]
async fn test_fetch_tolerates_one_failing_source(
    #[case] failing: LedgerSource,
    #[case] expected: usize,
) {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(unified(branch, "refund", dec!(5), Some(date(2024, 1, 3))));
    store.seed(income(branch, dec!(100), date(2024, 1, 5)));
    store.seed(income(branch, dec!(200), date(2024, 1, 6)));
    store.seed(expense(branch, dec!(40), date(2024, 1, 8)));
    store.fail_reads(failing);

    let transactions = ledger.fetch(Some(branch)).await.unwrap();

    assert_eq!(transactions.len(), expected);
    assert!(transactions.iter().all(|t| t.id.source != Some(failing)));
}

#[tokio::test]
async fn test_fetch_reports_total_failure() {
    let (store, ledger) = aggregator();
    for source in LedgerSource::ALL {
        store.fail_reads(source);
    }

    let err = ledger.fetch(Some(BranchId::new())).await.unwrap_err();

    assert!(matches!(err, FinanceError::AllSourcesUnavailable { .. }));
    assert_eq!(AppError::from(err).status_code(), 503);
}

#[tokio::test]
async fn test_fetch_empty_branch_is_ok() {
    let (_store, ledger) = aggregator();

    let transactions = ledger.fetch(Some(BranchId::new())).await.unwrap();

    assert!(transactions.is_empty());
}

#[tokio::test]
async fn test_fetch_orders_by_date_across_sources() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1), date(2024, 1, 1)));
    store.seed(unified(branch, "refund", dec!(2), Some(date(2024, 3, 1))));
    store.seed(expense(branch, dec!(3), date(2024, 2, 1)));

    let dates: Vec<_> = ledger
        .fetch(Some(branch))
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.transaction_date)
        .collect();

    assert_eq!(
        dates,
        vec![
            Some(date(2024, 3, 1)),
            Some(date(2024, 2, 1)),
            Some(date(2024, 1, 1))
        ]
    );
}

#[tokio::test]
async fn test_fetch_undated_rows_sort_by_created_at() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    // created_at is 2024-01-01 09:00, which is after midnight of the same day.
    store.seed(unified(branch, "refund", dec!(2), None));
    store.seed(income(branch, dec!(1), date(2024, 1, 1)));
    store.seed(expense(branch, dec!(3), date(2023, 12, 31)));

    let amounts: Vec<_> = ledger
        .fetch(Some(branch))
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.amount)
        .collect();

    assert_eq!(amounts, vec![dec!(2), dec!(1), dec!(3)]);
}

#[tokio::test]
async fn test_sequential_reads_give_same_ledger() {
    let store = Arc::new(InMemoryStore::default());
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1), date(2024, 1, 1)));
    store.seed(expense(branch, dec!(3), date(2024, 2, 1)));
    let config = FinanceConfig {
        concurrent_reads: false,
        ..FinanceConfig::default()
    };
    let ledger = TransactionAggregator::with_config(Arc::clone(&store), config);

    let transactions = ledger.fetch(Some(branch)).await.unwrap();

    assert_eq!(transactions.len(), 2);
    assert_eq!(
        store.calls("list"),
        vec![LedgerSource::Unified, LedgerSource::Income, LedgerSource::Expense]
    );
}

#[tokio::test]
async fn test_sequential_summary_reads_one_half_at_a_time() {
    let store = Arc::new(InMemoryStore::default());
    let branch = BranchId::new();
    store.seed(income(branch, dec!(30), date(2024, 1, 1)));
    store.seed(unified(branch, "expense", dec!(12), Some(date(2024, 1, 2))));
    let config = FinanceConfig {
        concurrent_reads: false,
        ..FinanceConfig::default()
    };
    let ledger = TransactionAggregator::with_config(Arc::clone(&store), config);

    let summary = ledger.finance_summary(branch).await;

    assert_eq!(summary, FinanceSummary::new(dec!(30), dec!(12)));
    assert_eq!(
        store.calls("list"),
        vec![
            LedgerSource::Unified,
            LedgerSource::Income,
            LedgerSource::Expense,
            LedgerSource::Unified,
        ]
    );
}

#[tokio::test]
async fn test_fetch_filtered_by_type_and_range() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1), date(2024, 1, 10)));
    store.seed(income(branch, dec!(2), date(2024, 2, 10)));
    store.seed(unified(branch, "income", dec!(4), Some(date(2024, 2, 20))));
    store.seed(expense(branch, dec!(8), date(2024, 2, 15)));

    let filter = TransactionFilter {
        transaction_type: Some(TransactionType::Income),
        date_from: Some(date(2024, 2, 1)),
        date_to: Some(date(2024, 2, 29)),
        ..TransactionFilter::default()
    };
    let amounts: Vec<_> = ledger
        .fetch_filtered(Some(branch), &filter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.amount)
        .collect();

    assert_eq!(amounts, vec![dec!(4), dec!(2)]);

    let by_category = TransactionFilter {
        category: Some("supplies".to_string()),
        ..TransactionFilter::default()
    };
    let supplies = ledger.fetch_filtered(Some(branch), &by_category).await.unwrap();
    assert_eq!(supplies.len(), 1);
    assert_eq!(supplies[0].vendor.as_deref(), Some("Acme Supplies"));
}

// ----------------------------------------------------------------------------
// create
// ----------------------------------------------------------------------------

#[rstest]
#[case(Some(TransactionType::Expense), LedgerSource::Expense)]
#[case(Some(TransactionType::Income), LedgerSource::Income)]
#[case(Some(TransactionType::Refund), LedgerSource::Unified)]
#[case(Some(TransactionType::Other("adjustment".to_string())), LedgerSource::Unified)]
#[case(None, LedgerSource::Unified)]
#[tokio::test]
async fn test_create_routes_by_type(
    #[case] transaction_type: Option<TransactionType>,
    #[case] destination: LedgerSource,
) {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();

    let created = ledger
        .create(CreateTransactionInput {
            transaction_type,
            amount: dec!(50),
            branch_id: branch,
            transaction_date: Some(date(2024, 4, 1)),
            ..CreateTransactionInput::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id.source, Some(destination));
    for source in LedgerSource::ALL {
        let expected = usize::from(source == destination);
        assert_eq!(store.rows_in(source).len(), expected, "{source}");
    }

    let fetched = ledger.fetch(Some(branch)).await.unwrap();
    assert_eq!(fetched, vec![created]);
}

#[tokio::test]
async fn test_create_round_trips_fields_through_legacy_table() {
    let (_store, ledger) = aggregator();
    let branch = BranchId::new();

    let created = ledger
        .create(CreateTransactionInput {
            transaction_type: Some(TransactionType::Income),
            amount: dec!(1200.50),
            description: Some("Quarterly plan".to_string()),
            transaction_date: Some(date(2024, 6, 1)),
            payment_method: Some("card".to_string()),
            category: Some("Membership".to_string()),
            branch_id: branch,
            reference_id: Some("RZP-881".to_string()),
            status: None,
            source: Some("Razorpay Webhook".to_string()),
            vendor: Some("dropped".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(created.transaction_type, TransactionType::Income);
    assert_eq!(created.amount, dec!(1200.50));
    assert_eq!(created.transaction_date, Some(date(2024, 6, 1)));
    assert_eq!(created.reference_id.as_deref(), Some("RZP-881"));
    assert_eq!(created.status.as_deref(), Some("completed"));
    assert_eq!(created.source.as_deref(), Some("Razorpay Webhook"));
    assert_eq!(created.vendor, None);
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
async fn test_create_failure_does_not_try_other_tables() {
    let (store, ledger) = aggregator();
    store.fail_writes(LedgerSource::Expense);

    let err = ledger
        .create(CreateTransactionInput {
            transaction_type: Some(TransactionType::Expense),
            amount: dec!(50),
            branch_id: BranchId::new(),
            ..CreateTransactionInput::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FinanceError::CreateFailed {
            table: LedgerSource::Expense,
            error: StoreError::Rejected(_)
        }
    ));
    assert_eq!(store.calls("insert"), vec![LedgerSource::Expense]);
    assert!(store.rows_in(LedgerSource::Unified).is_empty());
}

// ----------------------------------------------------------------------------
// update
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_update_with_known_table_goes_straight_there() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    let id = store.seed(expense(branch, dec!(40), date(2024, 1, 8)));

    let changed = ledger
        .update(
            &TransactionRef::new(LedgerSource::Expense, id),
            TransactionPatch {
                amount: Some(dec!(45)),
                vendor: Some("Globex".to_string()),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(changed);
    assert_eq!(store.calls("update"), vec![LedgerSource::Expense]);
    let row = ledger.fetch(Some(branch)).await.unwrap().remove(0);
    assert_eq!(row.amount, dec!(45));
    assert_eq!(row.vendor.as_deref(), Some("Globex"));
}

#[tokio::test]
async fn test_update_unrouted_uses_patch_type() {
    let (store, ledger) = aggregator();
    let id = store.seed(income(BranchId::new(), dec!(100), date(2024, 1, 5)));

    let changed = ledger
        .update(
            &TransactionRef::unrouted(id),
            TransactionPatch {
                transaction_type: Some(TransactionType::Income),
                category: Some("Personal Training".to_string()),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(changed);
    assert_eq!(store.calls("update"), vec![LedgerSource::Income]);
}

#[tokio::test]
async fn test_update_with_stale_type_falls_back_to_unified() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    let id = store.seed(unified(branch, "refund", dec!(5), Some(date(2024, 1, 3))));

    let changed = ledger
        .update(
            &TransactionRef::unrouted(id),
            TransactionPatch {
                transaction_type: Some(TransactionType::Expense),
                amount: Some(dec!(7)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(changed);
    assert_eq!(
        store.calls("update"),
        vec![LedgerSource::Expense, LedgerSource::Unified]
    );
    let row = ledger.fetch(Some(branch)).await.unwrap().remove(0);
    assert_eq!(row.amount, dec!(7));
    // The stale type is not written, so the row stays a refund.
    assert_eq!(row.transaction_type, TransactionType::Refund);
}

#[tokio::test]
async fn test_update_unknown_id_reports_false() {
    let (store, ledger) = aggregator();

    let changed = ledger
        .update(
            &TransactionRef::unrouted(RecordId::new()),
            TransactionPatch {
                transaction_type: Some(TransactionType::Income),
                amount: Some(dec!(1)),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(!changed);
    assert_eq!(
        store.calls("update"),
        vec![LedgerSource::Income, LedgerSource::Unified]
    );
}

#[tokio::test]
async fn test_update_untyped_tries_unified_once() {
    let (store, ledger) = aggregator();

    let changed = ledger
        .update(
            &TransactionRef::unrouted(RecordId::new()),
            TransactionPatch::default(),
        )
        .await
        .unwrap();

    assert!(!changed);
    assert_eq!(store.calls("update"), vec![LedgerSource::Unified]);
}

#[tokio::test]
async fn test_update_fails_when_every_attempt_errors() {
    let (store, ledger) = aggregator();
    store.fail_writes(LedgerSource::Income);
    store.fail_writes(LedgerSource::Unified);

    let err = ledger
        .update(
            &TransactionRef::unrouted(RecordId::new()),
            TransactionPatch {
                transaction_type: Some(TransactionType::Income),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FinanceError::UpdateFailed(_)));
}

#[tokio::test]
async fn test_update_primary_error_recovers_on_fallback() {
    let (store, ledger) = aggregator();
    store.fail_writes(LedgerSource::Expense);
    let id = store.seed(unified(BranchId::new(), "expense", dec!(5), None));

    let changed = ledger
        .update(
            &TransactionRef::unrouted(id),
            TransactionPatch {
                transaction_type: Some(TransactionType::Expense),
                status: Some("cancelled".to_string()),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(changed);
}

// ----------------------------------------------------------------------------
// delete
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_probes_past_expense_table() {
    let (store, ledger) = aggregator();
    let id = store.seed(income(BranchId::new(), dec!(100), date(2024, 1, 5)));

    let deleted = ledger.delete(&TransactionRef::unrouted(id)).await.unwrap();

    assert!(deleted);
    assert_eq!(
        store.calls("delete"),
        vec![LedgerSource::Expense, LedgerSource::Income]
    );
    assert!(store.rows_in(LedgerSource::Income).is_empty());
}

#[tokio::test]
async fn test_delete_reaches_unified_last() {
    let (store, ledger) = aggregator();
    let id = store.seed(unified(BranchId::new(), "refund", dec!(5), None));

    let deleted = ledger.delete(&TransactionRef::unrouted(id)).await.unwrap();

    assert!(deleted);
    assert_eq!(store.calls("delete"), LedgerSource::PROBE_ORDER.to_vec());
}

#[tokio::test]
async fn test_delete_unknown_id_reports_false() {
    let (_store, ledger) = aggregator();

    let deleted = ledger
        .delete(&TransactionRef::unrouted(RecordId::new()))
        .await
        .unwrap();

    assert!(!deleted);
}

#[tokio::test]
async fn test_delete_tolerates_failing_probe() {
    let (store, ledger) = aggregator();
    store.fail_writes(LedgerSource::Expense);
    let id = store.seed(income(BranchId::new(), dec!(100), date(2024, 1, 5)));

    let deleted = ledger.delete(&TransactionRef::unrouted(id)).await.unwrap();

    assert!(deleted);
}

#[tokio::test]
async fn test_delete_fails_only_when_every_probe_errors() {
    let (store, ledger) = aggregator();
    for source in LedgerSource::ALL {
        store.fail_writes(source);
    }

    let err = ledger
        .delete(&TransactionRef::unrouted(RecordId::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, FinanceError::DeleteFailed(_)));
    assert_eq!(AppError::from(err).status_code(), 500);
}

#[tokio::test]
async fn test_delete_with_known_table_does_not_probe() {
    let (store, ledger) = aggregator();
    let id = store.seed(unified(BranchId::new(), "refund", dec!(5), None));

    let deleted = ledger
        .delete(&TransactionRef::new(LedgerSource::Unified, id))
        .await
        .unwrap();

    assert!(deleted);
    assert_eq!(store.calls("delete"), vec![LedgerSource::Unified]);
}

// ----------------------------------------------------------------------------
// summary and reports
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_summary_of_empty_branch_is_zero() {
    let (_store, ledger) = aggregator();

    let summary = ledger.finance_summary(BranchId::new()).await;

    assert_eq!(summary, FinanceSummary::new(Decimal::ZERO, Decimal::ZERO));
    assert_eq!(summary.balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_summary_prefers_unified_income_rows() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(unified(branch, "income", dec!(300), None));
    store.seed(unified(branch, "refund", dec!(20), None));
    store.seed(income(branch, dec!(1000), date(2024, 5, 1)));

    let summary = ledger.finance_summary(branch).await;

    assert_eq!(summary.income, dec!(300));
}

#[tokio::test]
async fn test_summary_expenses_fall_back_to_unified_rows() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(unified(branch, "expense", dec!(75), None));
    store.seed(unified(branch, "expense", dec!(25), None));

    let summary = ledger.finance_summary(branch).await;

    assert_eq!(summary.expenses, dec!(100));
    assert_eq!(summary.balance, dec!(-100));
}

#[tokio::test]
async fn test_summary_failed_half_counts_as_zero() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1000), date(2024, 5, 1)));
    store.seed(expense(branch, dec!(400), date(2024, 5, 2)));
    store.fail_reads(LedgerSource::Expense);

    let summary = ledger.finance_summary(branch).await;

    assert_eq!(summary.income, dec!(1000));
    assert_eq!(summary.expenses, Decimal::ZERO);
    assert_eq!(summary.balance, dec!(1000));
}

#[tokio::test]
async fn test_branch_scenario() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1000), date(2024, 5, 1)));
    store.seed(expense(branch, dec!(400), date(2024, 5, 2)));

    let transactions = ledger.fetch(Some(branch)).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].transaction_type, TransactionType::Expense);
    assert_eq!(transactions[0].amount, dec!(400));
    assert_eq!(transactions[0].vendor.as_deref(), Some("Acme Supplies"));
    assert_eq!(transactions[1].transaction_type, TransactionType::Income);
    assert_eq!(transactions[1].amount, dec!(1000));
    assert_eq!(transactions[1].source.as_deref(), Some("Manual Entry"));

    let summary = ledger.finance_summary(branch).await;
    assert_eq!(summary, FinanceSummary::new(dec!(1000), dec!(400)));
    assert_eq!(summary.balance, dec!(600));
}

#[tokio::test]
async fn test_category_breakdown_groups_by_type_and_category() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(100), date(2024, 1, 5)));
    store.seed(income(branch, dec!(200), date(2024, 1, 6)));
    store.seed(unified(branch, "income", dec!(50), None));
    store.seed(expense(branch, dec!(40), date(2024, 1, 8)));

    let breakdown = ledger.category_breakdown(branch).await.unwrap();

    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].transaction_type, TransactionType::Income);
    assert_eq!(breakdown[0].category, "Membership");
    assert_eq!(breakdown[0].total, dec!(350));
    assert_eq!(breakdown[0].count, 3);
    assert_eq!(breakdown[1].transaction_type, TransactionType::Expense);
    assert_eq!(breakdown[1].total, dec!(40));
}

#[tokio::test]
async fn test_monthly_totals_net_out_refunds() {
    let (store, ledger) = aggregator();
    let branch = BranchId::new();
    store.seed(income(branch, dec!(1000), date(2024, 5, 1)));
    store.seed(expense(branch, dec!(400), date(2024, 5, 2)));
    store.seed(unified(branch, "refund", dec!(100), Some(date(2024, 5, 20))));
    store.seed(income(branch, dec!(700), date(2023, 5, 1)));

    let months = ledger.monthly_totals(branch, 2024).await.unwrap();

    assert_eq!(months.len(), 12);
    let may = months[4];
    assert_eq!(may.month, 5);
    assert_eq!(may.income, dec!(1000));
    assert_eq!(may.expenses, dec!(400));
    assert_eq!(may.refunds, dec!(100));
    assert_eq!(may.net, dec!(500));
    assert!(months.iter().filter(|m| m.month != 5).all(|m| m.net.is_zero()));
}

// ----------------------------------------------------------------------------
// references
// ----------------------------------------------------------------------------

#[test]
fn test_reference_text_form() {
    let id = RecordId::new();
    let routed = TransactionRef::new(LedgerSource::Income, id);

    assert_eq!(routed.to_string(), format!("income:{id}"));
    assert_eq!(routed.to_string().parse::<TransactionRef>().unwrap(), routed);
    assert_eq!(
        id.to_string().parse::<TransactionRef>().unwrap(),
        TransactionRef::unrouted(id)
    );
}

#[rstest]
#[case("ledger:7f1c6a4e-0000-0000-0000-000000000000")]
#[case("income:not-a-uuid")]
#[case("")]
fn test_reference_rejects_garbage(#[case] text: &str) {
    let err = text.parse::<TransactionRef>().unwrap_err();
    assert!(matches!(err, FinanceError::InvalidReference(_)));
    assert_eq!(AppError::from(err).status_code(), 400);
}

#[test]
fn test_transaction_serializes_with_type_and_reference() {
    let branch = BranchId::new();
    let row = income(branch, dec!(10), date(2024, 1, 1));
    let txn = super::mapping::normalize(row, &FinanceConfig::default());

    let json = serde_json::to_value(&txn).unwrap();

    assert_eq!(json["type"], "income");
    assert!(json["id"].as_str().unwrap().starts_with("income:"));
    assert_eq!(json["payment_method"], "cash");
}
