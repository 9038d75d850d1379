//! Finance ledger migration.
//!
//! Creates the unified `transactions` table and the legacy `income_records`
//! and `expense_records` tables. Built with the schema builder so the same
//! migration runs on Postgres and SQLite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Unified table
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Transactions::BranchId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::Type)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).text())
                    .col(ColumnDef::new(Transactions::TransactionDate).date())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string())
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::ReferenceId).string())
                    .col(ColumnDef::new(Transactions::Status).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_branch_date")
                    .table(Transactions::Table)
                    .col(Transactions::BranchId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        // Legacy income table
        manager
            .create_table(
                Table::create()
                    .table(IncomeRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(IncomeRecords::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(IncomeRecords::BranchId).uuid().not_null())
                    .col(
                        ColumnDef::new(IncomeRecords::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncomeRecords::Date).date().not_null())
                    .col(ColumnDef::new(IncomeRecords::Category).string())
                    .col(ColumnDef::new(IncomeRecords::PaymentMethod).string())
                    .col(ColumnDef::new(IncomeRecords::Description).text())
                    .col(ColumnDef::new(IncomeRecords::Reference).string())
                    .col(ColumnDef::new(IncomeRecords::Source).string())
                    .col(ColumnDef::new(IncomeRecords::Status).string())
                    .col(
                        ColumnDef::new(IncomeRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(IncomeRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_income_records_branch_date")
                    .table(IncomeRecords::Table)
                    .col(IncomeRecords::BranchId)
                    .col(IncomeRecords::Date)
                    .to_owned(),
            )
            .await?;

        // Legacy expense table
        manager
            .create_table(
                Table::create()
                    .table(ExpenseRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExpenseRecords::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ExpenseRecords::BranchId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExpenseRecords::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseRecords::Date).date().not_null())
                    .col(ColumnDef::new(ExpenseRecords::Category).string())
                    .col(ColumnDef::new(ExpenseRecords::PaymentMethod).string())
                    .col(ColumnDef::new(ExpenseRecords::Description).text())
                    .col(ColumnDef::new(ExpenseRecords::Reference).string())
                    .col(ColumnDef::new(ExpenseRecords::Vendor).string())
                    .col(ColumnDef::new(ExpenseRecords::Status).string())
                    .col(
                        ColumnDef::new(ExpenseRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ExpenseRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_records_branch_date")
                    .table(ExpenseRecords::Table)
                    .col(ExpenseRecords::BranchId)
                    .col(ExpenseRecords::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpenseRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IncomeRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    BranchId,
    Type,
    Amount,
    Description,
    TransactionDate,
    PaymentMethod,
    Category,
    ReferenceId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum IncomeRecords {
    Table,
    Id,
    BranchId,
    Amount,
    Date,
    Category,
    PaymentMethod,
    Description,
    Reference,
    Source,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpenseRecords {
    Table,
    Id,
    BranchId,
    Amount,
    Date,
    Category,
    PaymentMethod,
    Description,
    Reference,
    Vendor,
    Status,
    CreatedAt,
    UpdatedAt,
}
