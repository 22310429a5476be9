use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Tri-state mirror of the goods-receipt aggregate outcome. Gates release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DeliveryVerified {
    #[sea_orm(string_value = "Yes")]
    Yes,
    #[sea_orm(string_value = "No")]
    No,
    #[sea_orm(string_value = "Partial")]
    Partial,
}

/// Stored payment state. `Overdue` is never stored; it is derived at read
/// time from `due_date` for pending payments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Released")]
    Released,
}

/// The accounts team's ledger entry for releasing funds against an invoice.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub purchase_order_id: Uuid,
    pub vendor_id: Uuid,
    pub invoice_amount: Decimal,
    pub delivery_verified: DeliveryVerified,
    pub status: PaymentStatus,
    pub due_date: DateTime<Utc>,
    pub release_date: Option<DateTime<Utc>>,
    pub reference_id: Option<String>,
    pub adjustment_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
