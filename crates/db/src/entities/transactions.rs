//! `SeaORM` Entity for the unified transactions table.

use chrono::Utc;
use gymledger_core::finance::rows::UnifiedRow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: Uuid,
    #[sea_orm(column_name = "type")]
    pub transaction_type: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: Option<Date>,
    pub payment_method: Option<String>,
    pub category: Option<String>,
    pub reference_id: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UnifiedRow {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            branch_id: model.branch_id.into(),
            transaction_type: model.transaction_type,
            amount: model.amount,
            description: model.description,
            transaction_date: model.transaction_date,
            payment_method: model.payment_method,
            category: model.category,
            reference_id: model.reference_id,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
