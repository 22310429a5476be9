use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-item verification outcome. Quantity problems carry their direction:
/// shortage or excess, with damage outranking both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum GoodsReceiptLineStatus {
    #[sea_orm(string_value = "Ok")]
    Ok,
    #[sea_orm(string_value = "ShortageReported")]
    ShortageReported,
    #[sea_orm(string_value = "DamageReported")]
    DamageReported,
    #[sea_orm(string_value = "ExcessReceived")]
    ExcessReceived,
}

/// One verified line of a goods receipt. `discrepancy_qty` is signed:
/// negative means shortage, positive means excess.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods_receipt_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub goods_receipt_id: Uuid,
    pub dispatch_line_id: Uuid,
    pub dispatched_qty: i32,
    pub received_qty: i32,
    pub discrepancy_qty: i32,
    pub damage_reported: bool,
    pub status: GoodsReceiptLineStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_receipt::Entity",
        from = "Column::GoodsReceiptId",
        to = "super::goods_receipt::Column::Id"
    )]
    GoodsReceipt,
    #[sea_orm(
        belongs_to = "super::dispatch_line::Entity",
        from = "Column::DispatchLineId",
        to = "super::dispatch_line::Column::Id"
    )]
    DispatchLine,
}

impl Related<super::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceipt.def()
    }
}

impl Related<super::dispatch_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
