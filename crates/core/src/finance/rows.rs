//! Row shapes of the three backing tables.
//!
//! Each table keeps its own historical column names: the unified table has
//! `transaction_date` and `reference_id`, the legacy tables have `date` and
//! `reference`. These structs mirror the tables; `mapping` translates them
//! to and from the common shape.

use chrono::{DateTime, NaiveDate, Utc};
use gymledger_shared::types::{BranchId, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{LedgerSource, TransactionType};

/// Row of the unified `transactions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRow {
    /// Primary key.
    pub id: RecordId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Declared type as stored.
    pub transaction_type: String,
    /// Amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: Option<String>,
    /// Business date.
    pub transaction_date: Option<NaiveDate>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// External reference.
    pub reference_id: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Row of the legacy `income_records` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRecordRow {
    /// Primary key.
    pub id: RecordId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub date: NaiveDate,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Where the income came from.
    pub source: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Row of the legacy `expense_records` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecordRow {
    /// Primary key.
    pub id: RecordId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub date: NaiveDate,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Who was paid.
    pub vendor: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// A row tagged with the table it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRow {
    /// Unified `transactions` table.
    Unified(UnifiedRow),
    /// Legacy `income_records` table.
    Income(IncomeRecordRow),
    /// Legacy `expense_records` table.
    Expense(ExpenseRecordRow),
}

impl SourceRow {
    /// Table the row was read from.
    #[must_use]
    pub const fn source(&self) -> LedgerSource {
        match self {
            Self::Unified(_) => LedgerSource::Unified,
            Self::Income(_) => LedgerSource::Income,
            Self::Expense(_) => LedgerSource::Expense,
        }
    }

    /// Primary key of the row.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        match self {
            Self::Unified(row) => row.id,
            Self::Income(row) => row.id,
            Self::Expense(row) => row.id,
        }
    }

    /// Owning branch.
    #[must_use]
    pub const fn branch_id(&self) -> BranchId {
        match self {
            Self::Unified(row) => row.branch_id,
            Self::Income(row) => row.branch_id,
            Self::Expense(row) => row.branch_id,
        }
    }

    /// Amount as stored.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Unified(row) => row.amount,
            Self::Income(row) => row.amount,
            Self::Expense(row) => row.amount,
        }
    }
}

/// Insert shape of the unified table. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnifiedRow {
    /// Owning branch.
    pub branch_id: BranchId,
    /// Declared type as stored.
    pub transaction_type: String,
    /// Amount.
    pub amount: Decimal,
    /// Free-text description.
    pub description: Option<String>,
    /// Business date.
    pub transaction_date: Option<NaiveDate>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// External reference.
    pub reference_id: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Insert shape of the income table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncomeRecord {
    /// Owning branch.
    pub branch_id: BranchId,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub date: NaiveDate,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Where the income came from.
    pub source: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Insert shape of the expense table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpenseRecord {
    /// Owning branch.
    pub branch_id: BranchId,
    /// Amount.
    pub amount: Decimal,
    /// Business date.
    pub date: NaiveDate,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Who was paid.
    pub vendor: Option<String>,
    /// Status.
    pub status: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// An insert routed to exactly one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSourceRow {
    /// Unified `transactions` table.
    Unified(NewUnifiedRow),
    /// Legacy `income_records` table.
    Income(NewIncomeRecord),
    /// Legacy `expense_records` table.
    Expense(NewExpenseRecord),
}

impl NewSourceRow {
    /// Destination table.
    #[must_use]
    pub const fn source(&self) -> LedgerSource {
        match self {
            Self::Unified(_) => LedgerSource::Unified,
            Self::Income(_) => LedgerSource::Income,
            Self::Expense(_) => LedgerSource::Expense,
        }
    }
}

/// Column changes for the unified table. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedPatch {
    /// Declared type as stored.
    pub transaction_type: Option<String>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Free-text description.
    pub description: Option<String>,
    /// Business date.
    pub transaction_date: Option<NaiveDate>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// External reference.
    pub reference_id: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// Column changes for the income table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomePatch {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Business date.
    pub date: Option<NaiveDate>,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Where the income came from.
    pub source: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// Column changes for the expense table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePatch {
    /// Amount.
    pub amount: Option<Decimal>,
    /// Business date.
    pub date: Option<NaiveDate>,
    /// Category.
    pub category: Option<String>,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Who was paid.
    pub vendor: Option<String>,
    /// Status.
    pub status: Option<String>,
}

/// An update addressed to one table, stamped with the new `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePatch {
    /// Column changes.
    pub changes: PatchChanges,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Per-table column changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchChanges {
    /// Unified `transactions` table.
    Unified(UnifiedPatch),
    /// Legacy `income_records` table.
    Income(IncomePatch),
    /// Legacy `expense_records` table.
    Expense(ExpensePatch),
}

impl SourcePatch {
    /// Table the patch applies to.
    #[must_use]
    pub const fn source(&self) -> LedgerSource {
        match self.changes {
            PatchChanges::Unified(_) => LedgerSource::Unified,
            PatchChanges::Income(_) => LedgerSource::Income,
            PatchChanges::Expense(_) => LedgerSource::Expense,
        }
    }
}

/// Branch-scoped read of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    /// Branch to read.
    pub branch_id: BranchId,
    /// Only rows of this type.
    pub transaction_type: Option<TransactionType>,
}

impl SourceQuery {
    /// Every row of the branch.
    #[must_use]
    pub const fn branch(branch_id: BranchId) -> Self {
        Self {
            branch_id,
            transaction_type: None,
        }
    }

    /// Rows of the branch with the given type.
    #[must_use]
    pub const fn typed(branch_id: BranchId, transaction_type: TransactionType) -> Self {
        Self {
            branch_id,
            transaction_type: Some(transaction_type),
        }
    }

    /// Whether `source` can hold rows matching the type filter at all.
    ///
    /// Legacy tables have no type column; their rows are implicitly income
    /// or expense.
    #[must_use]
    pub fn admits(&self, source: LedgerSource) -> bool {
        match (&self.transaction_type, source) {
            (None, _) | (Some(_), LedgerSource::Unified) => true,
            (Some(t), LedgerSource::Income) => *t == TransactionType::Income,
            (Some(t), LedgerSource::Expense) => *t == TransactionType::Expense,
        }
    }
}
