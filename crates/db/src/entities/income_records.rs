//! `SeaORM` Entity for the legacy income_records table.

use chrono::Utc;
use gymledger_core::finance::rows::IncomeRecordRow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "income_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub date: Date,
    pub category: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for IncomeRecordRow {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            branch_id: model.branch_id.into(),
            amount: model.amount,
            date: model.date,
            category: model.category,
            payment_method: model.payment_method,
            description: model.description,
            reference: model.reference,
            source: model.source,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
