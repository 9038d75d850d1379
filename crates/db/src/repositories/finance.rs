//! Finance repository backing the ledger tables.
//!
//! Implements `LedgerStore` over the unified `transactions` table and the
//! legacy `income_records` / `expense_records` tables.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use gymledger_core::finance::rows::{
    ExpensePatch, IncomePatch, NewExpenseRecord, NewIncomeRecord, NewUnifiedRow, UnifiedPatch,
};
use gymledger_core::finance::{
    LedgerSource, LedgerStore, NewSourceRow, PatchChanges, SourcePatch, SourceQuery, SourceRow,
    StoreError, TransactionType,
};
use gymledger_shared::types::RecordId;
use sea_orm::sea_query::{Alias, Expr, Func, IntoIden, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, UpdateMany, Value,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{expense_records, income_records, transactions};

/// Repository over the three finance tables.
#[derive(Debug, Clone)]
pub struct FinanceRepository {
    db: DatabaseConnection,
}

impl FinanceRepository {
    /// Creates a new finance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_unified(&self, query: &SourceQuery) -> Result<Vec<SourceRow>, DbErr> {
        let mut select = transactions::Entity::find()
            .filter(transactions::Column::BranchId.eq(query.branch_id.into_inner()));
        if let Some(kind) = &query.transaction_type {
            select = select.filter(type_matches(kind));
        }
        let rows = select
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|model| SourceRow::Unified(model.into()))
            .collect())
    }

    async fn list_income(&self, query: &SourceQuery) -> Result<Vec<SourceRow>, DbErr> {
        let rows = income_records::Entity::find()
            .filter(income_records::Column::BranchId.eq(query.branch_id.into_inner()))
            .order_by_desc(income_records::Column::Date)
            .order_by_desc(income_records::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|model| SourceRow::Income(model.into()))
            .collect())
    }

    async fn list_expense(&self, query: &SourceQuery) -> Result<Vec<SourceRow>, DbErr> {
        let rows = expense_records::Entity::find()
            .filter(expense_records::Column::BranchId.eq(query.branch_id.into_inner()))
            .order_by_desc(expense_records::Column::Date)
            .order_by_desc(expense_records::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|model| SourceRow::Expense(model.into()))
            .collect())
    }

    async fn insert_unified(&self, row: NewUnifiedRow) -> Result<SourceRow, DbErr> {
        let model = transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            branch_id: Set(row.branch_id.into_inner()),
            transaction_type: Set(row.transaction_type),
            amount: Set(row.amount),
            description: Set(row.description),
            transaction_date: Set(row.transaction_date),
            payment_method: Set(row.payment_method),
            category: Set(row.category),
            reference_id: Set(row.reference_id),
            status: Set(row.status),
            created_at: Set(timestamp(row.created_at)),
            updated_at: Set(timestamp(row.updated_at)),
        }
        .insert(&self.db)
        .await?;
        Ok(SourceRow::Unified(model.into()))
    }

    async fn insert_income(&self, row: NewIncomeRecord) -> Result<SourceRow, DbErr> {
        let model = income_records::ActiveModel {
            id: Set(Uuid::now_v7()),
            branch_id: Set(row.branch_id.into_inner()),
            amount: Set(row.amount),
            date: Set(row.date),
            category: Set(row.category),
            payment_method: Set(row.payment_method),
            description: Set(row.description),
            reference: Set(row.reference),
            source: Set(row.source),
            status: Set(row.status),
            created_at: Set(timestamp(row.created_at)),
            updated_at: Set(timestamp(row.updated_at)),
        }
        .insert(&self.db)
        .await?;
        Ok(SourceRow::Income(model.into()))
    }

    async fn insert_expense(&self, row: NewExpenseRecord) -> Result<SourceRow, DbErr> {
        let model = expense_records::ActiveModel {
            id: Set(Uuid::now_v7()),
            branch_id: Set(row.branch_id.into_inner()),
            amount: Set(row.amount),
            date: Set(row.date),
            category: Set(row.category),
            payment_method: Set(row.payment_method),
            description: Set(row.description),
            reference: Set(row.reference),
            vendor: Set(row.vendor),
            status: Set(row.status),
            created_at: Set(timestamp(row.created_at)),
            updated_at: Set(timestamp(row.updated_at)),
        }
        .insert(&self.db)
        .await?;
        Ok(SourceRow::Expense(model.into()))
    }

    async fn update_unified(
        &self,
        id: Uuid,
        patch: UnifiedPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        use transactions::Column;

        let mut update = transactions::Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(timestamp(updated_at)))
            .filter(Column::Id.eq(id));
        update = assign(update, Column::TransactionType, patch.transaction_type);
        update = assign(update, Column::Amount, patch.amount);
        update = assign(update, Column::Description, patch.description);
        update = assign(update, Column::TransactionDate, patch.transaction_date);
        update = assign(update, Column::PaymentMethod, patch.payment_method);
        update = assign(update, Column::Category, patch.category);
        update = assign(update, Column::ReferenceId, patch.reference_id);
        update = assign(update, Column::Status, patch.status);

        Ok(update.exec(&self.db).await?.rows_affected)
    }

    async fn update_income(
        &self,
        id: Uuid,
        patch: IncomePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        use income_records::Column;

        let mut update = income_records::Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(timestamp(updated_at)))
            .filter(Column::Id.eq(id));
        update = assign(update, Column::Amount, patch.amount);
        update = assign(update, Column::Date, patch.date);
        update = assign(update, Column::Category, patch.category);
        update = assign(update, Column::PaymentMethod, patch.payment_method);
        update = assign(update, Column::Description, patch.description);
        update = assign(update, Column::Reference, patch.reference);
        update = assign(update, Column::Source, patch.source);
        update = assign(update, Column::Status, patch.status);

        Ok(update.exec(&self.db).await?.rows_affected)
    }

    async fn update_expense(
        &self,
        id: Uuid,
        patch: ExpensePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, DbErr> {
        use expense_records::Column;

        let mut update = expense_records::Entity::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(timestamp(updated_at)))
            .filter(Column::Id.eq(id));
        update = assign(update, Column::Amount, patch.amount);
        update = assign(update, Column::Date, patch.date);
        update = assign(update, Column::Category, patch.category);
        update = assign(update, Column::PaymentMethod, patch.payment_method);
        update = assign(update, Column::Description, patch.description);
        update = assign(update, Column::Reference, patch.reference);
        update = assign(update, Column::Vendor, patch.vendor);
        update = assign(update, Column::Status, patch.status);

        Ok(update.exec(&self.db).await?.rows_affected)
    }
}

#[async_trait]
impl LedgerStore for FinanceRepository {
    async fn list(
        &self,
        source: LedgerSource,
        query: &SourceQuery,
    ) -> Result<Vec<SourceRow>, StoreError> {
        if !query.admits(source) {
            return Ok(Vec::new());
        }
        let rows = match source {
            LedgerSource::Unified => self.list_unified(query).await,
            LedgerSource::Income => self.list_income(query).await,
            LedgerSource::Expense => self.list_expense(query).await,
        }
        .map_err(read_error)?;
        debug!(table = source.table_name(), count = rows.len(), "listed finance rows");
        Ok(rows)
    }

    async fn insert(&self, row: NewSourceRow) -> Result<SourceRow, StoreError> {
        match row {
            NewSourceRow::Unified(row) => self.insert_unified(row).await,
            NewSourceRow::Income(row) => self.insert_income(row).await,
            NewSourceRow::Expense(row) => self.insert_expense(row).await,
        }
        .map_err(write_error)
    }

    async fn update(&self, id: RecordId, patch: SourcePatch) -> Result<u64, StoreError> {
        let id = id.into_inner();
        match patch.changes {
            PatchChanges::Unified(changes) => {
                self.update_unified(id, changes, patch.updated_at).await
            }
            PatchChanges::Income(changes) => self.update_income(id, changes, patch.updated_at).await,
            PatchChanges::Expense(changes) => {
                self.update_expense(id, changes, patch.updated_at).await
            }
        }
        .map_err(write_error)
    }

    async fn delete(&self, source: LedgerSource, id: RecordId) -> Result<u64, StoreError> {
        let id = id.into_inner();
        let result = match source {
            LedgerSource::Unified => transactions::Entity::delete_by_id(id).exec(&self.db).await,
            LedgerSource::Income => income_records::Entity::delete_by_id(id).exec(&self.db).await,
            LedgerSource::Expense => {
                expense_records::Entity::delete_by_id(id)
                    .exec(&self.db)
                    .await
            }
        }
        .map_err(write_error)?;
        Ok(result.rows_affected)
    }
}

/// Matches the stored type the way `TransactionType::parse` reads it: known
/// types ignore case and surrounding whitespace, other types match exactly.
fn type_matches(kind: &TransactionType) -> SimpleExpr {
    let column = transactions::Column::TransactionType;
    match kind {
        TransactionType::Other(value) => column.eq(value.as_str()),
        known => Expr::expr(Func::lower(
            Func::cust(Alias::new("TRIM")).arg(Expr::col(column)),
        ))
        .eq(known.as_str()),
    }
}

/// Adds `column = value` to an update when a value is given.
fn assign<E, C, V>(update: UpdateMany<E>, column: C, value: Option<V>) -> UpdateMany<E>
where
    E: EntityTrait,
    C: IntoIden,
    V: Into<Value>,
{
    match value {
        Some(value) => update.col_expr(column, Expr::value(value)),
        None => update,
    }
}

fn timestamp(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.into()
}

fn read_error(err: DbErr) -> StoreError {
    match err {
        DbErr::Type(_) | DbErr::Json(_) | DbErr::TryIntoErr { .. } => {
            StoreError::Decode(err.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn write_error(err: DbErr) -> StoreError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Rejected(err.to_string()),
    }
}
