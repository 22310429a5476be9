use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Outcome dimension of a vendor's claim on one order item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Confirmed")]
    Confirmed,
    #[sea_orm(string_value = "PartiallyConfirmed")]
    PartiallyConfirmed,
    #[sea_orm(string_value = "Declined")]
    Declined,
    #[sea_orm(string_value = "NotAvailable")]
    NotAvailable,
}

/// Controlled vocabulary for vendor declines. `StockUnavailable` resolves the
/// assignment to `NotAvailable`; every other reason resolves it to `Declined`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::EnumString,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum DeclineReason {
    #[sea_orm(string_value = "StockUnavailable")]
    StockUnavailable,
    #[sea_orm(string_value = "QualityIssue")]
    QualityIssue,
    #[sea_orm(string_value = "PriceMismatch")]
    PriceMismatch,
    #[sea_orm(string_value = "LateDelivery")]
    LateDelivery,
}

/// A vendor's claim on one order item. Decided exactly once; a new assignment
/// cycle supersedes a decided one, the decided record is never mutated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub requested_qty: i32,
    pub confirmed_qty: i32,
    pub backorder_qty: i32,
    pub status: AssignmentStatus,
    pub decline_reason: Option<DeclineReason>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True while the vendor has not yet responded.
    pub fn is_undecided(&self) -> bool {
        self.status == AssignmentStatus::Pending
    }

    /// True once the assignment can contribute lines to a purchase order.
    pub fn is_po_eligible(&self) -> bool {
        matches!(
            self.status,
            AssignmentStatus::Confirmed | AssignmentStatus::PartiallyConfirmed
        )
    }
}
