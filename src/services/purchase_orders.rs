use std::sync::Arc;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        assignment, invoice, order_item, purchase_order, purchase_order_line, AssignmentStatus,
        InvoiceStatus, PurchaseOrderStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Result of one PO generation attempt. `newly_created` is false when an
/// already-generated PO was returned unchanged (duplicate bulk clicks).
#[derive(Debug, Clone)]
pub struct GeneratedPo {
    pub po: purchase_order::Model,
    pub newly_created: bool,
}

/// Per-(order, vendor) outcome of a bulk generation run. Failures are
/// reported, never dropped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkGenerateEntry {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub purchase_order_id: Option<Uuid>,
    pub newly_created: bool,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Generates the purchase order committing every confirmed assignment of
    /// one (order, vendor) pair, and opens the matching invoice record.
    ///
    /// Any still-pending assignment blocks generation. Declined and
    /// not-available assignments are excluded, not blocking. Re-generating an
    /// already-generated PO returns it unchanged.
    #[instrument(skip(self))]
    pub async fn generate_po(
        &self,
        order_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<GeneratedPo, ServiceError> {
        let txn = self.db.begin().await?;

        if let Some(existing) = purchase_order::Entity::find()
            .filter(purchase_order::Column::OrderId.eq(order_id))
            .filter(purchase_order::Column::VendorId.eq(vendor_id))
            .filter(purchase_order::Column::Status.eq(PurchaseOrderStatus::Generated))
            .one(&txn)
            .await?
        {
            return Ok(GeneratedPo {
                po: existing,
                newly_created: false,
            });
        }

        let assignments = assignment::Entity::find()
            .filter(assignment::Column::OrderId.eq(order_id))
            .filter(assignment::Column::VendorId.eq(vendor_id))
            .all(&txn)
            .await?;
        if assignments.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No assignments for order {} and vendor {}",
                order_id, vendor_id
            )));
        }

        let pending: Vec<Uuid> = assignments
            .iter()
            .filter(|a| a.status == AssignmentStatus::Pending)
            .map(|a| a.id)
            .collect();
        if !pending.is_empty() {
            return Err(ServiceError::IneligibleAssignment(format!(
                "Assignments awaiting vendor decision block PO generation: {:?}",
                pending
            )));
        }

        let eligible: Vec<&assignment::Model> =
            assignments.iter().filter(|a| a.is_po_eligible()).collect();
        if eligible.is_empty() {
            return Err(ServiceError::IneligibleAssignment(format!(
                "Order {} has no confirmed assignments for vendor {}",
                order_id, vendor_id
            )));
        }

        let now = Utc::now();
        let po_id = Uuid::new_v4();
        let sequence = purchase_order::Entity::find().count(&txn).await? + 1;
        let po_number = format!("PO-{}-{:06}", now.year(), sequence);

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(eligible.len());
        for a in &eligible {
            let item = order_item::Entity::find_by_id(a.order_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Order item {} not found", a.order_item_id))
                })?;
            total += item.unit_price * Decimal::from(a.confirmed_qty);
            lines.push(purchase_order_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(po_id),
                assignment_id: Set(a.id),
                order_item_id: Set(item.id),
                product_sku: Set(item.product_sku),
                quantity: Set(a.confirmed_qty),
                unit_price: Set(item.unit_price),
            });
        }

        let po = purchase_order::ActiveModel {
            id: Set(po_id),
            po_number: Set(po_number.clone()),
            order_id: Set(order_id),
            vendor_id: Set(vendor_id),
            status: Set(PurchaseOrderStatus::Generated),
            total_amount: Set(total),
            generated_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(0),
        }
        .insert(&txn)
        .await?;

        for line in lines {
            line.insert(&txn).await?;
        }

        // The billing record opens with the PO so accounts can track the
        // vendor's invoice from day one.
        invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(po_id),
            vendor_id: Set(vendor_id),
            status: Set(InvoiceStatus::PendingVerification),
            amount: Set(total),
            vendor_file_name: Set(None),
            vendor_file_url: Set(None),
            accounts_file_name: Set(None),
            accounts_file_url: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(0),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(po_number = %po_number, order_id = %order_id, vendor_id = %vendor_id, "purchase order generated");
        if let Err(e) = self
            .event_sender
            .send(Event::PurchaseOrderGenerated {
                purchase_order_id: po.id,
                order_id,
                vendor_id,
                po_number,
            })
            .await
        {
            warn!(purchase_order_id = %po.id, "failed to publish event: {}", e);
        }

        Ok(GeneratedPo {
            po,
            newly_created: true,
        })
    }

    /// Generates POs for every vendor with assignments on the selected
    /// orders. Ineligible pairs are reported per entry; the batch never
    /// fails as a whole and is safe to retry.
    #[instrument(skip(self, order_ids), fields(count = order_ids.len()))]
    pub async fn bulk_generate_po(
        &self,
        order_ids: Vec<Uuid>,
    ) -> Result<Vec<BulkGenerateEntry>, ServiceError> {
        let mut entries = Vec::new();
        for order_id in order_ids {
            let vendors: Vec<Uuid> = assignment::Entity::find()
                .filter(assignment::Column::OrderId.eq(order_id))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|a| a.vendor_id)
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            for vendor_id in vendors {
                match self.generate_po(order_id, vendor_id).await {
                    Ok(generated) => entries.push(BulkGenerateEntry {
                        order_id,
                        vendor_id,
                        purchase_order_id: Some(generated.po.id),
                        newly_created: generated.newly_created,
                        error: None,
                    }),
                    Err(e) => entries.push(BulkGenerateEntry {
                        order_id,
                        vendor_id,
                        purchase_order_id: None,
                        newly_created: false,
                        error: Some(e.response_message()),
                    }),
                }
            }
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    pub async fn get_po(&self, po_id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        purchase_order::Entity::find_by_id(po_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", po_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_po_lines(
        &self,
        po_id: Uuid,
    ) -> Result<Vec<purchase_order_line::Model>, ServiceError> {
        Ok(purchase_order_line::Entity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(po_id))
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_by_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find()
            .filter(purchase_order::Column::VendorId.eq(vendor_id))
            .order_by_asc(purchase_order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
