use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Aggregate verification outcome of a goods receipt note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum GoodsReceiptStatus {
    #[sea_orm(string_value = "PendingVerification")]
    PendingVerification,
    #[sea_orm(string_value = "VerifiedOk")]
    VerifiedOk,
    #[sea_orm(string_value = "VerifiedMismatch")]
    VerifiedMismatch,
    #[sea_orm(string_value = "PartiallyVerified")]
    PartiallyVerified,
}

/// Operations' record of physical verification of one dispatch. One-shot and
/// append-only: a correction requires a new dispatch + receipt cycle.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub status: GoodsReceiptStatus,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dispatch::Entity",
        from = "Column::DispatchId",
        to = "super::dispatch::Column::Id"
    )]
    Dispatch,
    #[sea_orm(has_many = "super::goods_receipt_line::Entity")]
    Lines,
}

impl Related<super::dispatch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispatch.def()
    }
}

impl Related<super::goods_receipt_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
