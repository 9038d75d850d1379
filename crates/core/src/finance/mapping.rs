//! Field mapping between the backing tables and the common shape.
//!
//! | common           | unified            | income / expense |
//! |------------------|--------------------|------------------|
//! | transaction_date | transaction_date   | date             |
//! | reference_id     | reference_id       | reference        |
//! | type             | type               | implied by table |
//! | source           | -                  | source (income)  |
//! | vendor           | -                  | vendor (expense) |
//!
//! Every other field has the same name everywhere. Defaults for missing
//! values come from `FinanceConfig`.

use chrono::{DateTime, Utc};
use gymledger_shared::FinanceConfig;

use super::rows::{
    ExpensePatch, ExpenseRecordRow, IncomePatch, IncomeRecordRow, NewExpenseRecord,
    NewIncomeRecord, NewSourceRow, NewUnifiedRow, PatchChanges, SourcePatch, SourceRow,
    UnifiedPatch, UnifiedRow,
};
use super::types::{
    CreateTransactionInput, FinancialTransaction, LedgerSource, TransactionPatch, TransactionRef,
    TransactionType,
};

/// Maps a stored row into the common shape, filling defaults.
#[must_use]
pub fn normalize(row: SourceRow, defaults: &FinanceConfig) -> FinancialTransaction {
    match row {
        SourceRow::Unified(row) => normalize_unified(row, defaults),
        SourceRow::Income(row) => normalize_income(row, defaults),
        SourceRow::Expense(row) => normalize_expense(row, defaults),
    }
}

fn normalize_unified(row: UnifiedRow, defaults: &FinanceConfig) -> FinancialTransaction {
    FinancialTransaction {
        id: TransactionRef::new(LedgerSource::Unified, row.id),
        transaction_type: TransactionType::parse(&row.transaction_type),
        amount: row.amount,
        description: row.description,
        transaction_date: row.transaction_date,
        payment_method: or_default(row.payment_method, &defaults.default_payment_method),
        category: or_default(row.category, &defaults.default_category),
        branch_id: row.branch_id,
        reference_id: row.reference_id,
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
        source: None,
        vendor: None,
    }
}

fn normalize_income(row: IncomeRecordRow, defaults: &FinanceConfig) -> FinancialTransaction {
    FinancialTransaction {
        id: TransactionRef::new(LedgerSource::Income, row.id),
        transaction_type: TransactionType::Income,
        amount: row.amount,
        description: row.description,
        transaction_date: Some(row.date),
        payment_method: or_default(row.payment_method, &defaults.default_payment_method),
        category: or_default(row.category, &defaults.default_category),
        branch_id: row.branch_id,
        reference_id: row.reference,
        status: Some(or_default(row.status, &defaults.default_income_status)),
        created_at: row.created_at,
        updated_at: row.updated_at,
        source: row.source,
        vendor: None,
    }
}

fn normalize_expense(row: ExpenseRecordRow, defaults: &FinanceConfig) -> FinancialTransaction {
    FinancialTransaction {
        id: TransactionRef::new(LedgerSource::Expense, row.id),
        transaction_type: TransactionType::Expense,
        amount: row.amount,
        description: row.description,
        transaction_date: Some(row.date),
        payment_method: or_default(row.payment_method, &defaults.default_payment_method),
        category: or_default(row.category, &defaults.default_category),
        branch_id: row.branch_id,
        reference_id: row.reference,
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
        source: None,
        vendor: row.vendor,
    }
}

/// Empty strings count as missing.
fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Translates a create request into an insert for the table its type routes to.
///
/// Legacy tables require a date; today's date is used when none was given.
#[must_use]
pub fn to_new_row(input: CreateTransactionInput, now: DateTime<Utc>) -> NewSourceRow {
    match LedgerSource::route(input.transaction_type.as_ref()) {
        LedgerSource::Expense => NewSourceRow::Expense(NewExpenseRecord {
            branch_id: input.branch_id,
            amount: input.amount,
            date: input.transaction_date.unwrap_or_else(|| now.date_naive()),
            category: input.category,
            payment_method: input.payment_method,
            description: input.description,
            reference: input.reference_id,
            vendor: input.vendor,
            status: input.status,
            created_at: now,
            updated_at: now,
        }),
        LedgerSource::Income => NewSourceRow::Income(NewIncomeRecord {
            branch_id: input.branch_id,
            amount: input.amount,
            date: input.transaction_date.unwrap_or_else(|| now.date_naive()),
            category: input.category,
            payment_method: input.payment_method,
            description: input.description,
            reference: input.reference_id,
            source: input.source,
            status: input.status,
            created_at: now,
            updated_at: now,
        }),
        LedgerSource::Unified => NewSourceRow::Unified(NewUnifiedRow {
            branch_id: input.branch_id,
            transaction_type: input
                .transaction_type
                .map(String::from)
                .unwrap_or_default(),
            amount: input.amount,
            description: input.description,
            transaction_date: input.transaction_date,
            payment_method: input.payment_method,
            category: input.category,
            reference_id: input.reference_id,
            status: input.status,
            created_at: now,
            updated_at: now,
        }),
    }
}

/// Translates a partial update into column changes for `target`.
///
/// The legacy tables have no type column, and a type that would move a
/// unified row into a legacy table is not written.
#[must_use]
pub fn to_patch(target: LedgerSource, patch: &TransactionPatch, now: DateTime<Utc>) -> SourcePatch {
    let changes = match target {
        LedgerSource::Unified => PatchChanges::Unified(UnifiedPatch {
            transaction_type: patch
                .transaction_type
                .as_ref()
                .filter(|t| LedgerSource::route(Some(*t)) == LedgerSource::Unified)
                .map(|t| t.as_str().to_string()),
            amount: patch.amount,
            description: patch.description.clone(),
            transaction_date: patch.transaction_date,
            payment_method: patch.payment_method.clone(),
            category: patch.category.clone(),
            reference_id: patch.reference_id.clone(),
            status: patch.status.clone(),
        }),
        LedgerSource::Income => PatchChanges::Income(IncomePatch {
            amount: patch.amount,
            date: patch.transaction_date,
            category: patch.category.clone(),
            payment_method: patch.payment_method.clone(),
            description: patch.description.clone(),
            reference: patch.reference_id.clone(),
            source: patch.source.clone(),
            status: patch.status.clone(),
        }),
        LedgerSource::Expense => PatchChanges::Expense(ExpensePatch {
            amount: patch.amount,
            date: patch.transaction_date,
            category: patch.category.clone(),
            payment_method: patch.payment_method.clone(),
            description: patch.description.clone(),
            reference: patch.reference_id.clone(),
            vendor: patch.vendor.clone(),
            status: patch.status.clone(),
        }),
    };

    SourcePatch {
        changes,
        updated_at: now,
    }
}

/// Concatenates normalized batches and orders them newest first.
///
/// The sort is stable, so rows with equal effective dates keep batch order.
#[must_use]
pub fn merge_sorted(batches: Vec<Vec<FinancialTransaction>>) -> Vec<FinancialTransaction> {
    let mut merged: Vec<FinancialTransaction> = batches.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.effective_at().cmp(&a.effective_at()));
    merged
}
