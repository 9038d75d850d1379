//! Property-based tests for ledger merging.
//!
//! - Merge keeps every row of every batch
//! - Merged output is ordered by effective date, newest first

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use gymledger_shared::FinanceConfig;
use gymledger_shared::types::{BranchId, RecordId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::mapping::{merge_sorted, normalize};
use super::rows::{ExpenseRecordRow, IncomeRecordRow, SourceRow, UnifiedRow};
use super::types::FinancialTransaction;

/// Strategy to generate one row: (table 0..3, day offset, amount in cents, dated).
fn row_spec() -> impl Strategy<Value = (u8, i64, i64, bool)> {
    (0u8..3, 0i64..730, 1i64..10_000_000, any::<bool>())
}

fn build(spec: (u8, i64, i64, bool)) -> FinancialTransaction {
    let (table, offset, cents, dated) = spec;
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let day = base + Duration::days(offset);
    let created = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let amount = Decimal::new(cents, 2);
    let branch_id = BranchId::new();

    let row = match table {
        0 => SourceRow::Unified(UnifiedRow {
            id: RecordId::new(),
            branch_id,
            transaction_type: "refund".to_string(),
            amount,
            description: None,
            transaction_date: dated.then_some(day),
            payment_method: None,
            category: None,
            reference_id: None,
            status: None,
            created_at: created,
            updated_at: created,
        }),
        1 => SourceRow::Income(IncomeRecordRow {
            id: RecordId::new(),
            branch_id,
            amount,
            date: day,
            category: None,
            payment_method: None,
            description: None,
            reference: None,
            source: None,
            status: None,
            created_at: created,
            updated_at: created,
        }),
        _ => SourceRow::Expense(ExpenseRecordRow {
            id: RecordId::new(),
            branch_id,
            amount,
            date: day,
            category: None,
            payment_method: None,
            description: None,
            reference: None,
            vendor: None,
            status: None,
            created_at: created,
            updated_at: created,
        }),
    };
    normalize(row, &FinanceConfig::default())
}

fn batches_strategy() -> impl Strategy<Value = Vec<Vec<(u8, i64, i64, bool)>>> {
    prop::collection::vec(prop::collection::vec(row_spec(), 0..20), 0..4)
}

proptest! {
    /// Merged length equals the sum of the batch lengths.
    #[test]
    fn prop_merge_keeps_every_row(specs in batches_strategy()) {
        let batches: Vec<Vec<FinancialTransaction>> = specs
            .into_iter()
            .map(|batch| batch.into_iter().map(build).collect())
            .collect();
        let expected: usize = batches.iter().map(Vec::len).sum();
        let mut ids: Vec<_> = batches.iter().flatten().map(|t| t.id.to_string()).collect();

        let merged = merge_sorted(batches);

        prop_assert_eq!(merged.len(), expected);
        let mut merged_ids: Vec<_> = merged.iter().map(|t| t.id.to_string()).collect();
        ids.sort();
        merged_ids.sort();
        prop_assert_eq!(merged_ids, ids);
    }

    /// Effective dates never increase along the merged ledger.
    #[test]
    fn prop_merge_is_newest_first(specs in batches_strategy()) {
        let batches: Vec<Vec<FinancialTransaction>> = specs
            .into_iter()
            .map(|batch| batch.into_iter().map(build).collect())
            .collect();

        let merged = merge_sorted(batches);

        for pair in merged.windows(2) {
            prop_assert!(pair[0].effective_at() >= pair[1].effective_at());
        }
    }
}
