use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        dispatch, dispatch_line, goods_receipt, goods_receipt_line, payment, DeliveryVerified,
        GoodsReceiptLineStatus, GoodsReceiptStatus, PaymentStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Operations' count for one dispatched line.
#[derive(Debug, Clone, Copy)]
pub struct GrnItemInput {
    pub dispatch_line_id: Uuid,
    pub received_qty: i32,
    pub damage_reported: bool,
}

/// Classifies one received line. Discrepancy is `received - dispatched`
/// (negative = shortage, positive = excess). Damage takes precedence over
/// the quantity classification.
pub fn classify_receipt_line(
    dispatched_qty: i32,
    received_qty: i32,
    damage_reported: bool,
) -> (i32, GoodsReceiptLineStatus) {
    let discrepancy = received_qty - dispatched_qty;
    let status = if damage_reported {
        GoodsReceiptLineStatus::DamageReported
    } else if discrepancy < 0 {
        GoodsReceiptLineStatus::ShortageReported
    } else if discrepancy > 0 {
        GoodsReceiptLineStatus::ExcessReceived
    } else {
        GoodsReceiptLineStatus::Ok
    };
    (discrepancy, status)
}

/// Aggregates line outcomes into the receipt status: `VerifiedOk` iff all
/// lines Ok, `VerifiedMismatch` iff every line has a qualifying discrepancy,
/// `PartiallyVerified` for a mix.
pub fn aggregate_receipt_status(lines: &[GoodsReceiptLineStatus]) -> GoodsReceiptStatus {
    if lines.is_empty() {
        return GoodsReceiptStatus::PendingVerification;
    }
    let ok = lines
        .iter()
        .filter(|s| **s == GoodsReceiptLineStatus::Ok)
        .count();
    if ok == lines.len() {
        GoodsReceiptStatus::VerifiedOk
    } else if ok == 0 {
        GoodsReceiptStatus::VerifiedMismatch
    } else {
        GoodsReceiptStatus::PartiallyVerified
    }
}

/// Tri-state mirror of a receipt aggregate, as carried on payment records.
pub fn delivery_verification(status: GoodsReceiptStatus) -> DeliveryVerified {
    match status {
        GoodsReceiptStatus::VerifiedOk => DeliveryVerified::Yes,
        GoodsReceiptStatus::PartiallyVerified => DeliveryVerified::Partial,
        GoodsReceiptStatus::VerifiedMismatch | GoodsReceiptStatus::PendingVerification => {
            DeliveryVerified::No
        }
    }
}

#[derive(Clone)]
pub struct GoodsReceiptService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl GoodsReceiptService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records the one-shot verification of a dispatch. Every dispatched line
    /// must be counted exactly once. The receipt is append-only: a correction
    /// requires a new dispatch + receipt cycle.
    #[instrument(skip(self, items))]
    pub async fn record_grn(
        &self,
        dispatch_id: Uuid,
        items: Vec<GrnItemInput>,
    ) -> Result<(goods_receipt::Model, Vec<goods_receipt_line::Model>), ServiceError> {
        let txn = self.db.begin().await?;

        let dispatch = dispatch::Entity::find_by_id(dispatch_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Dispatch {} not found", dispatch_id)))?;

        if goods_receipt::Entity::find()
            .filter(goods_receipt::Column::DispatchId.eq(dispatch_id))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ServiceError::InvalidState(format!(
                "Dispatch {} already has a goods receipt; record a new dispatch for the correction",
                dispatch_id
            )));
        }

        let dispatch_lines: HashMap<Uuid, dispatch_line::Model> = dispatch_line::Entity::find()
            .filter(dispatch_line::Column::DispatchId.eq(dispatch_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        if items.len() != dispatch_lines.len() {
            return Err(ServiceError::ValidationError(format!(
                "Receipt must cover every dispatched line exactly once: got {} results for {} lines",
                items.len(),
                dispatch_lines.len()
            )));
        }

        let now = Utc::now();
        let grn_id = Uuid::new_v4();
        let mut line_models = Vec::with_capacity(items.len());
        let mut statuses = Vec::with_capacity(items.len());
        let mut seen = std::collections::HashSet::new();

        for item in &items {
            if item.received_qty < 0 {
                return Err(ServiceError::ValidationError(
                    "Received quantity cannot be negative".to_string(),
                ));
            }
            if !seen.insert(item.dispatch_line_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Dispatch line {} counted twice",
                    item.dispatch_line_id
                )));
            }
            let line = dispatch_lines.get(&item.dispatch_line_id).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Dispatch line {} does not belong to dispatch {}",
                    item.dispatch_line_id, dispatch_id
                ))
            })?;
            let (discrepancy, status) =
                classify_receipt_line(line.dispatched_qty, item.received_qty, item.damage_reported);
            statuses.push(status);
            line_models.push(goods_receipt_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                goods_receipt_id: Set(grn_id),
                dispatch_line_id: Set(line.id),
                dispatched_qty: Set(line.dispatched_qty),
                received_qty: Set(item.received_qty),
                discrepancy_qty: Set(discrepancy),
                damage_reported: Set(item.damage_reported),
                status: Set(status),
            });
        }

        let aggregate = aggregate_receipt_status(&statuses);
        let grn = goods_receipt::ActiveModel {
            id: Set(grn_id),
            dispatch_id: Set(dispatch_id),
            status: Set(aggregate),
            received_at: Set(now),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut created_lines = Vec::with_capacity(line_models.len());
        for model in line_models {
            created_lines.push(model.insert(&txn).await?);
        }

        self.refresh_payment_mirror(&txn, dispatch.purchase_order_id)
            .await?;

        txn.commit().await?;

        info!(grn_id = %grn_id, dispatch_id = %dispatch_id, status = ?aggregate, "goods receipt recorded");
        if let Err(e) = self
            .event_sender
            .send(Event::GoodsReceiptRecorded {
                goods_receipt_id: grn_id,
                dispatch_id,
                status: aggregate,
            })
            .await
        {
            warn!(grn_id = %grn_id, "failed to publish event: {}", e);
        }

        Ok((grn, created_lines))
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        grn_id: Uuid,
    ) -> Result<(goods_receipt::Model, Vec<goods_receipt_line::Model>), ServiceError> {
        let grn = goods_receipt::Entity::find_by_id(grn_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt {} not found", grn_id)))?;
        let lines = goods_receipt_line::Entity::find()
            .filter(goods_receipt_line::Column::GoodsReceiptId.eq(grn_id))
            .all(&*self.db)
            .await?;
        Ok((grn, lines))
    }

    /// Folds every receipt line under a purchase order into the tri-state
    /// delivery-verification mirror. `No` when nothing has been verified yet.
    #[instrument(skip(self))]
    pub async fn po_delivery_verified(&self, po_id: Uuid) -> Result<DeliveryVerified, ServiceError> {
        po_delivery_verified_on(&*self.db, po_id).await
    }

    /// Pending payments mirror the receipt aggregate; re-derive the mirror
    /// whenever new receipt evidence lands.
    async fn refresh_payment_mirror(
        &self,
        txn: &DatabaseTransaction,
        po_id: Uuid,
    ) -> Result<(), ServiceError> {
        let verified = po_delivery_verified_on(txn, po_id).await?;
        let pending = payment::Entity::find()
            .filter(payment::Column::PurchaseOrderId.eq(po_id))
            .filter(payment::Column::Status.eq(PaymentStatus::Pending))
            .all(txn)
            .await?;
        for p in pending {
            let id = p.id;
            let version = p.version;
            let mut active: payment::ActiveModel = p.into();
            active.delivery_verified = Set(verified);
            active.updated_at = Set(Some(Utc::now()));
            active.version = Set(version + 1);
            // Write only if the payment still carries the version read above.
            // A payment released in the meantime keeps the mirror it was
            // released with.
            payment::Entity::update_many()
                .set(active)
                .filter(payment::Column::Id.eq(id))
                .filter(payment::Column::Version.eq(version))
                .filter(payment::Column::Status.eq(PaymentStatus::Pending))
                .exec(txn)
                .await?;
        }
        Ok(())
    }
}

pub(crate) async fn po_delivery_verified_on<C: sea_orm::ConnectionTrait>(
    conn: &C,
    po_id: Uuid,
) -> Result<DeliveryVerified, ServiceError> {
    let dispatch_ids: Vec<Uuid> = dispatch::Entity::find()
        .filter(dispatch::Column::PurchaseOrderId.eq(po_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    if dispatch_ids.is_empty() {
        return Ok(DeliveryVerified::No);
    }
    let grn_ids: Vec<Uuid> = goods_receipt::Entity::find()
        .filter(goods_receipt::Column::DispatchId.is_in(dispatch_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|g| g.id)
        .collect();
    if grn_ids.is_empty() {
        return Ok(DeliveryVerified::No);
    }
    let statuses: Vec<GoodsReceiptLineStatus> = goods_receipt_line::Entity::find()
        .filter(goods_receipt_line::Column::GoodsReceiptId.is_in(grn_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| l.status)
        .collect();
    Ok(delivery_verification(aggregate_receipt_status(&statuses)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(60, 55, false, -5, GoodsReceiptLineStatus::ShortageReported; "shortage of five")]
    #[test_case(60, 60, false, 0, GoodsReceiptLineStatus::Ok; "exact match")]
    #[test_case(60, 63, false, 3, GoodsReceiptLineStatus::ExcessReceived; "excess of three")]
    #[test_case(60, 60, true, 0, GoodsReceiptLineStatus::DamageReported; "damage with matching quantities")]
    #[test_case(60, 50, true, -10, GoodsReceiptLineStatus::DamageReported; "damage outranks shortage")]
    fn classification(
        dispatched: i32,
        received: i32,
        damage: bool,
        expected_discrepancy: i32,
        expected_status: GoodsReceiptLineStatus,
    ) {
        let (discrepancy, status) = classify_receipt_line(dispatched, received, damage);
        assert_eq!(discrepancy, expected_discrepancy);
        assert_eq!(status, expected_status);
    }

    #[test]
    fn aggregate_all_ok() {
        let statuses = [GoodsReceiptLineStatus::Ok, GoodsReceiptLineStatus::Ok];
        assert_eq!(
            aggregate_receipt_status(&statuses),
            GoodsReceiptStatus::VerifiedOk
        );
    }

    #[test]
    fn aggregate_all_discrepant() {
        let statuses = [
            GoodsReceiptLineStatus::ShortageReported,
            GoodsReceiptLineStatus::DamageReported,
        ];
        assert_eq!(
            aggregate_receipt_status(&statuses),
            GoodsReceiptStatus::VerifiedMismatch
        );
    }

    #[test]
    fn aggregate_mixed() {
        let statuses = [
            GoodsReceiptLineStatus::Ok,
            GoodsReceiptLineStatus::ExcessReceived,
        ];
        assert_eq!(
            aggregate_receipt_status(&statuses),
            GoodsReceiptStatus::PartiallyVerified
        );
    }

    #[test]
    fn empty_receipt_is_pending() {
        assert_eq!(
            aggregate_receipt_status(&[]),
            GoodsReceiptStatus::PendingVerification
        );
    }

    #[test_case(GoodsReceiptStatus::VerifiedOk, DeliveryVerified::Yes)]
    #[test_case(GoodsReceiptStatus::VerifiedMismatch, DeliveryVerified::No)]
    #[test_case(GoodsReceiptStatus::PartiallyVerified, DeliveryVerified::Partial)]
    #[test_case(GoodsReceiptStatus::PendingVerification, DeliveryVerified::No)]
    fn mirror(status: GoodsReceiptStatus, expected: DeliveryVerified) {
        assert_eq!(delivery_verification(status), expected);
    }
}
