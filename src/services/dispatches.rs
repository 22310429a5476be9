use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        dispatch::{self, LOCAL_AWB_NUMBER, LOCAL_LOGISTICS_PARTNER},
        dispatch_line, purchase_order, purchase_order_line, PurchaseOrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Input for one dispatched PO line.
#[derive(Debug, Clone, Copy)]
pub struct DispatchLineInput {
    pub purchase_order_line_id: Uuid,
    pub dispatched_qty: i32,
}

/// Input for a new dispatch. Carrier fields left unset mean a local/manual
/// handoff and default to the sentinel values.
#[derive(Debug, Clone)]
pub struct CreateDispatch {
    pub purchase_order_id: Uuid,
    pub lines: Vec<DispatchLineInput>,
    pub awb_number: Option<String>,
    pub logistics_partner: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct DispatchService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl DispatchService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a vendor shipment against PO lines. Cumulative dispatched
    /// quantity per line never exceeds the confirmed quantity; a correction
    /// after receipt is a new dispatch, never an edit.
    #[instrument(skip(self, input), fields(purchase_order_id = %input.purchase_order_id))]
    pub async fn create_dispatch(
        &self,
        input: CreateDispatch,
    ) -> Result<(dispatch::Model, Vec<dispatch_line::Model>), ServiceError> {
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "A dispatch must carry at least one purchase-order line".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let po = purchase_order::Entity::find_by_id(input.purchase_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    input.purchase_order_id
                ))
            })?;
        if po.status != PurchaseOrderStatus::Generated {
            return Err(ServiceError::InvalidState(format!(
                "Purchase order {} has not been generated yet",
                po.id
            )));
        }

        for line in &input.lines {
            if line.dispatched_qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "Dispatched quantity must be positive".to_string(),
                ));
            }
            let po_line = purchase_order_line::Entity::find_by_id(line.purchase_order_line_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Purchase order line {} not found",
                        line.purchase_order_line_id
                    ))
                })?;
            if po_line.purchase_order_id != po.id {
                return Err(ServiceError::ValidationError(format!(
                    "Line {} does not belong to purchase order {}",
                    po_line.id, po.id
                )));
            }
            let already_dispatched: i32 = dispatch_line::Entity::find()
                .filter(dispatch_line::Column::PurchaseOrderLineId.eq(po_line.id))
                .all(&txn)
                .await?
                .iter()
                .map(|d| d.dispatched_qty)
                .sum();
            if already_dispatched + line.dispatched_qty > po_line.quantity {
                return Err(ServiceError::ValidationError(format!(
                    "Dispatching {} of line {} exceeds the confirmed quantity {} ({} already dispatched)",
                    line.dispatched_qty, po_line.id, po_line.quantity, already_dispatched
                )));
            }
        }

        let now = Utc::now();
        let dispatch_id = Uuid::new_v4();
        let created = dispatch::ActiveModel {
            id: Set(dispatch_id),
            purchase_order_id: Set(po.id),
            awb_number: Set(input
                .awb_number
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| LOCAL_AWB_NUMBER.to_string())),
            logistics_partner: Set(input
                .logistics_partner
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| LOCAL_LOGISTICS_PARTNER.to_string())),
            dispatch_date: Set(input.dispatch_date.unwrap_or(now)),
            estimated_delivery_date: Set(input.estimated_delivery_date),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut created_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            created_lines.push(
                dispatch_line::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    dispatch_id: Set(dispatch_id),
                    purchase_order_line_id: Set(line.purchase_order_line_id),
                    dispatched_qty: Set(line.dispatched_qty),
                }
                .insert(&txn)
                .await?,
            );
        }

        txn.commit().await?;

        info!(dispatch_id = %dispatch_id, awb = %created.awb_number, "dispatch created");
        if let Err(e) = self
            .event_sender
            .send(Event::DispatchCreated {
                dispatch_id,
                purchase_order_id: po.id,
            })
            .await
        {
            warn!(dispatch_id = %dispatch_id, "failed to publish event: {}", e);
        }

        Ok((created, created_lines))
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        dispatch_id: Uuid,
    ) -> Result<(dispatch::Model, Vec<dispatch_line::Model>), ServiceError> {
        let dispatch = dispatch::Entity::find_by_id(dispatch_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Dispatch {} not found", dispatch_id)))?;
        let lines = dispatch_line::Entity::find()
            .filter(dispatch_line::Column::DispatchId.eq(dispatch_id))
            .all(&*self.db)
            .await?;
        Ok((dispatch, lines))
    }
}
