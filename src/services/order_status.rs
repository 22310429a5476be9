use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        assignment, dispatch, goods_receipt, invoice, purchase_order, AssignmentStatus,
        GoodsReceiptStatus, InvoiceStatus, PurchaseOrderStatus,
    },
    errors::ServiceError,
};

/// Read-model over the lifecycle entities of one order. Never persisted;
/// recomputed from the authoritative sub-entity states on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderLifecycleStatus {
    /// No vendor has confirmed anything yet.
    PendingAssignment,
    /// At least one assignment is confirmed but others are still undecided.
    Confirmed,
    /// Every contributing assignment is decided; PO generation has not been
    /// triggered.
    AwaitingPO,
    #[serde(rename = "POGenerated")]
    POGenerated,
    Delivered,
    Closed,
}

/// The facts the derivation needs, collected from the entity tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub any_confirmed_assignment: bool,
    pub any_pending_assignment: bool,
    pub po_generated: bool,
    /// True once any goods receipt under the order verified Ok or partially.
    pub delivered: bool,
    pub invoice_paid: bool,
}

/// Precedence for simultaneous truths:
/// Closed > Delivered > POGenerated > AwaitingPO > Confirmed.
pub fn derive_order_status(snapshot: &OrderSnapshot) -> OrderLifecycleStatus {
    if snapshot.invoice_paid {
        OrderLifecycleStatus::Closed
    } else if snapshot.delivered {
        OrderLifecycleStatus::Delivered
    } else if snapshot.po_generated {
        OrderLifecycleStatus::POGenerated
    } else if snapshot.any_confirmed_assignment && !snapshot.any_pending_assignment {
        OrderLifecycleStatus::AwaitingPO
    } else if snapshot.any_confirmed_assignment {
        OrderLifecycleStatus::Confirmed
    } else {
        OrderLifecycleStatus::PendingAssignment
    }
}

#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DatabaseConnection>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Collects the order's snapshot and derives its lifecycle status.
    #[instrument(skip(self))]
    pub async fn derive(&self, order_id: Uuid) -> Result<OrderLifecycleStatus, ServiceError> {
        let db = &*self.db;

        let assignments = assignment::Entity::find()
            .filter(assignment::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        if assignments.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No assignments recorded for order {}",
                order_id
            )));
        }
        let any_confirmed_assignment = assignments.iter().any(|a| a.is_po_eligible());
        let any_pending_assignment = assignments
            .iter()
            .any(|a| a.status == AssignmentStatus::Pending);

        let pos = purchase_order::Entity::find()
            .filter(purchase_order::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        let po_generated = pos
            .iter()
            .any(|po| po.status == PurchaseOrderStatus::Generated);
        let po_ids: Vec<Uuid> = pos.iter().map(|po| po.id).collect();

        let mut delivered = false;
        let mut invoice_paid = false;
        if !po_ids.is_empty() {
            let dispatch_ids: Vec<Uuid> = dispatch::Entity::find()
                .filter(dispatch::Column::PurchaseOrderId.is_in(po_ids.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|d| d.id)
                .collect();
            if !dispatch_ids.is_empty() {
                delivered = goods_receipt::Entity::find()
                    .filter(goods_receipt::Column::DispatchId.is_in(dispatch_ids))
                    .all(db)
                    .await?
                    .iter()
                    .any(|grn| {
                        matches!(
                            grn.status,
                            GoodsReceiptStatus::VerifiedOk | GoodsReceiptStatus::PartiallyVerified
                        )
                    });
            }
            invoice_paid = invoice::Entity::find()
                .filter(invoice::Column::PurchaseOrderId.is_in(po_ids))
                .filter(invoice::Column::Status.eq(InvoiceStatus::Paid))
                .one(db)
                .await?
                .is_some();
        }

        Ok(derive_order_status(&OrderSnapshot {
            any_confirmed_assignment,
            any_pending_assignment,
            po_generated,
            delivered,
            invoice_paid,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn snapshot(
        confirmed: bool,
        pending: bool,
        po: bool,
        delivered: bool,
        paid: bool,
    ) -> OrderSnapshot {
        OrderSnapshot {
            any_confirmed_assignment: confirmed,
            any_pending_assignment: pending,
            po_generated: po,
            delivered,
            invoice_paid: paid,
        }
    }

    #[test_case(snapshot(false, false, false, false, false), OrderLifecycleStatus::PendingAssignment)]
    #[test_case(snapshot(true, true, false, false, false), OrderLifecycleStatus::Confirmed)]
    #[test_case(snapshot(true, false, false, false, false), OrderLifecycleStatus::AwaitingPO)]
    #[test_case(snapshot(true, false, true, false, false), OrderLifecycleStatus::POGenerated)]
    #[test_case(snapshot(true, false, true, true, false), OrderLifecycleStatus::Delivered)]
    #[test_case(snapshot(true, false, true, true, true), OrderLifecycleStatus::Closed)]
    fn derivation_follows_precedence(s: OrderSnapshot, expected: OrderLifecycleStatus) {
        assert_eq!(derive_order_status(&s), expected);
    }

    #[test]
    fn closed_outranks_everything() {
        // All truths simultaneously: Closed wins.
        let s = snapshot(true, true, true, true, true);
        assert_eq!(derive_order_status(&s), OrderLifecycleStatus::Closed);
    }

    #[test]
    fn delivered_outranks_po_generated() {
        let s = snapshot(true, true, true, true, false);
        assert_eq!(derive_order_status(&s), OrderLifecycleStatus::Delivered);
    }
}
