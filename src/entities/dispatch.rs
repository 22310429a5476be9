use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel AWB number used for local/manual handoffs without a carrier.
pub const LOCAL_AWB_NUMBER: &str = "LOCAL-PORTER";
/// Sentinel logistics partner matching [`LOCAL_AWB_NUMBER`].
pub const LOCAL_LOGISTICS_PARTNER: &str = "Local Porter";

/// A vendor's physical shipment against purchase-order lines. Append-only:
/// a re-dispatch is a new record, never a mutation of this one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub awb_number: String,
    pub logistics_partner: String,
    pub dispatch_date: DateTime<Utc>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    #[sea_orm(has_many = "super::dispatch_line::Entity")]
    Lines,
    #[sea_orm(has_many = "super::goods_receipt::Entity")]
    GoodsReceipts,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::dispatch_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::goods_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsReceipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
