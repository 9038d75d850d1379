//! Finance domain types.
//!
//! `FinancialTransaction` is the common shape every backing table is
//! normalized into. `TransactionRef` identifies a row together with the
//! table that owns it, when that is known.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gymledger_shared::types::{BranchId, RecordId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::FinanceError;

/// Declared transaction type.
///
/// Types are accepted as opaque strings: anything other than the three
/// known values is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Money received (membership fees, personal training, retail).
    Income,
    /// Money spent (rent, salaries, equipment, vendors).
    Expense,
    /// Money returned to a member.
    Refund,
    /// Any other declared type, including an empty one.
    Other(String),
}

impl TransactionType {
    /// Parses a declared type. Matching is case-insensitive and never fails.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Self::Income,
            "expense" => Self::Expense,
            "refund" => Self::Refund,
            _ => Self::Other(value.to_string()),
        }
    }

    /// Returns the stored text for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Refund => "refund",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.as_str().to_string()
    }
}

/// One of the three tables that together hold the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSource {
    /// The general-purpose `transactions` table.
    Unified,
    /// The legacy `income_records` table.
    Income,
    /// The legacy `expense_records` table.
    Expense,
}

impl LedgerSource {
    /// Every source, in read order.
    pub const ALL: [Self; 3] = [Self::Unified, Self::Income, Self::Expense];

    /// Order in which tables are probed when deleting a row whose owner is unknown.
    pub const PROBE_ORDER: [Self; 3] = [Self::Expense, Self::Income, Self::Unified];

    /// Returns the table a transaction of the given type is written to.
    #[must_use]
    pub fn route(transaction_type: Option<&TransactionType>) -> Self {
        match transaction_type {
            Some(TransactionType::Expense) => Self::Expense,
            Some(TransactionType::Income) => Self::Income,
            _ => Self::Unified,
        }
    }

    /// Returns the physical table name.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Unified => "transactions",
            Self::Income => "income_records",
            Self::Expense => "expense_records",
        }
    }

    /// Returns the prefix used in textual record references.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for LedgerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerSource {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unified" => Ok(Self::Unified),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(FinanceError::InvalidReference(other.to_string())),
        }
    }
}

/// Reference to a ledger row.
///
/// The text form is `<source>:<uuid>` when the owning table is known and a
/// bare `<uuid>` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionRef {
    /// Table that owns the row, if known.
    pub source: Option<LedgerSource>,
    /// Row identifier within its table.
    pub id: RecordId,
}

impl TransactionRef {
    /// Creates a reference to a row in a known table.
    #[must_use]
    pub const fn new(source: LedgerSource, id: RecordId) -> Self {
        Self {
            source: Some(source),
            id,
        }
    }

    /// Creates a reference whose owning table is unknown.
    #[must_use]
    pub const fn unrouted(id: RecordId) -> Self {
        Self { source: None, id }
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(source) => write!(f, "{source}:{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for TransactionRef {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FinanceError::InvalidReference(s.to_string());
        match s.split_once(':') {
            Some((source, id)) => Ok(Self::new(
                source.parse().map_err(|_| invalid())?,
                id.parse().map_err(|_| invalid())?,
            )),
            None => Ok(Self::unrouted(s.parse().map_err(|_| invalid())?)),
        }
    }
}

impl TryFrom<String> for TransactionRef {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionRef> for String {
    fn from(value: TransactionRef) -> Self {
        value.to_string()
    }
}

/// A ledger row in the common shape, whichever table it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    /// Reference to the owning row.
    pub id: TransactionRef,
    /// Declared type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount, non-negative by convention.
    pub amount: Decimal,
    /// Free-text description.
    pub description: Option<String>,
    /// Business date of the transaction.
    pub transaction_date: Option<NaiveDate>,
    /// Payment method tag (cash, card, upi, ...).
    pub payment_method: String,
    /// Classification tag.
    pub category: String,
    /// Branch the row belongs to.
    pub branch_id: BranchId,
    /// External reference or receipt number.
    pub reference_id: Option<String>,
    /// Lifecycle tag (completed, pending, cancelled).
    pub status: Option<String>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
    /// Provenance of income rows (manual entry, webhook, ...).
    pub source: Option<String>,
    /// Payee of expense rows.
    pub vendor: Option<String>,
}

impl FinancialTransaction {
    /// Instant used to order the ledger: the business date if present, else
    /// the insertion time.
    #[must_use]
    pub fn effective_at(&self) -> NaiveDateTime {
        self.transaction_date.map_or_else(
            || self.created_at.naive_utc(),
            |date| date.and_time(NaiveTime::MIN),
        )
    }

    /// Calendar date used for period reports.
    #[must_use]
    pub fn effective_date(&self) -> NaiveDate {
        self.effective_at().date()
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    /// Declared type; decides the destination table.
    #[serde(rename = "type", default)]
    pub transaction_type: Option<TransactionType>,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Business date. Legacy tables require one and use today when absent.
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    /// Payment method.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// Owning branch.
    pub branch_id: BranchId,
    /// External reference.
    #[serde(default)]
    pub reference_id: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Option<String>,
    /// Income provenance; kept only for income rows.
    #[serde(default)]
    pub source: Option<String>,
    /// Expense payee; kept only for expense rows.
    #[serde(default)]
    pub vendor: Option<String>,
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    /// Declared type; used to pick the table when the reference has none.
    #[serde(rename = "type", default)]
    pub transaction_type: Option<TransactionType>,
    /// New amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New business date.
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    /// New payment method.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
    /// New external reference.
    #[serde(default)]
    pub reference_id: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<String>,
    /// New income provenance.
    #[serde(default)]
    pub source: Option<String>,
    /// New expense payee.
    #[serde(default)]
    pub vendor: Option<String>,
}

/// Filter applied over the merged ledger.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only rows of this type.
    pub transaction_type: Option<TransactionType>,
    /// Effective date on or after.
    pub date_from: Option<NaiveDate>,
    /// Effective date on or before.
    pub date_to: Option<NaiveDate>,
    /// Category, compared case-insensitively.
    pub category: Option<String>,
    /// Payment method, compared case-insensitively.
    pub payment_method: Option<String>,
}

impl TransactionFilter {
    /// Returns true if the transaction passes every set criterion.
    #[must_use]
    pub fn matches(&self, txn: &FinancialTransaction) -> bool {
        let date = txn.effective_date();
        self.transaction_type
            .as_ref()
            .is_none_or(|t| *t == txn.transaction_type)
            && self.date_from.is_none_or(|from| date >= from)
            && self.date_to.is_none_or(|to| date <= to)
            && self
                .category
                .as_deref()
                .is_none_or(|c| c.eq_ignore_ascii_case(&txn.category))
            && self
                .payment_method
                .as_deref()
                .is_none_or(|m| m.eq_ignore_ascii_case(&txn.payment_method))
    }
}

/// Branch totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSummary {
    /// Total income.
    pub income: Decimal,
    /// Total expenses.
    pub expenses: Decimal,
    /// `income - expenses`.
    pub balance: Decimal,
}

impl FinanceSummary {
    /// Builds a summary from its two halves.
    #[must_use]
    pub fn new(income: Decimal, expenses: Decimal) -> Self {
        Self {
            income,
            expenses,
            balance: income - expenses,
        }
    }
}

/// Total for one `(type, category)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Category tag.
    pub category: String,
    /// Sum of amounts.
    pub total: Decimal,
    /// Number of rows.
    pub count: usize,
}

/// Totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// Month number, 1 to 12.
    pub month: u32,
    /// Income received.
    pub income: Decimal,
    /// Expenses paid.
    pub expenses: Decimal,
    /// Refunds issued.
    pub refunds: Decimal,
    /// `income - expenses - refunds`.
    pub net: Decimal,
}
