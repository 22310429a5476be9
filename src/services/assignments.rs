use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        assignment::{self, AssignmentStatus, DeclineReason},
        order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// A vendor's single response to a pending assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorDecision {
    Full,
    Partial { available_qty: i32 },
    Decline { reason: DeclineReason },
}

/// Result of applying a decision to the requested quantity. Status is a pure
/// function of the confirmed quantity and whether a decline occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub confirmed_qty: i32,
    pub backorder_qty: i32,
    pub status: AssignmentStatus,
    pub decline_reason: Option<DeclineReason>,
}

/// Applies a vendor decision to an undecided assignment's quantities.
///
/// Holds the core invariant `confirmed_qty + backorder_qty == requested_qty`.
/// A partial confirmation equal to the full requested quantity is rejected;
/// callers must use the full confirmation instead.
pub fn apply_decision(
    requested_qty: i32,
    decision: VendorDecision,
) -> Result<DecisionOutcome, ServiceError> {
    match decision {
        VendorDecision::Full => Ok(DecisionOutcome {
            confirmed_qty: requested_qty,
            backorder_qty: 0,
            status: AssignmentStatus::Confirmed,
            decline_reason: None,
        }),
        VendorDecision::Partial { available_qty } => {
            if available_qty <= 0 {
                return Err(ServiceError::ValidationError(
                    "Available quantity must be positive".to_string(),
                ));
            }
            if available_qty >= requested_qty {
                return Err(ServiceError::ValidationError(format!(
                    "Partial confirmation of {} covers the full requested quantity {}; use full confirmation",
                    available_qty, requested_qty
                )));
            }
            Ok(DecisionOutcome {
                confirmed_qty: available_qty,
                backorder_qty: requested_qty - available_qty,
                status: AssignmentStatus::PartiallyConfirmed,
                decline_reason: None,
            })
        }
        VendorDecision::Decline { reason } => {
            // Stock unavailability resolves to NotAvailable; the status itself
            // carries the reason, so decline_reason stays unset for it.
            let (status, decline_reason) = match reason {
                DeclineReason::StockUnavailable => (AssignmentStatus::NotAvailable, None),
                other => (AssignmentStatus::Declined, Some(other)),
            };
            Ok(DecisionOutcome {
                confirmed_qty: 0,
                backorder_qty: requested_qty,
                status,
                decline_reason,
            })
        }
    }
}

/// Quantity a new assignment cycle would cover for a decided assignment.
pub fn reassignable_qty(assignment: &assignment::Model) -> i32 {
    match assignment.status {
        AssignmentStatus::Declined | AssignmentStatus::NotAvailable => assignment.requested_qty,
        AssignmentStatus::PartiallyConfirmed => assignment.backorder_qty,
        AssignmentStatus::Pending | AssignmentStatus::Confirmed => 0,
    }
}

#[derive(Clone)]
pub struct AssignmentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AssignmentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a pending assignment claiming the full requested quantity of
    /// an order item for one vendor.
    #[instrument(skip(self))]
    pub async fn create_assignment(
        &self,
        order_item_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<assignment::Model, ServiceError> {
        let db = &*self.db;
        let item = order_item::Entity::find_by_id(order_item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order item {} not found", order_item_id))
            })?;

        let open = assignment::Entity::find()
            .filter(assignment::Column::OrderItemId.eq(order_item_id))
            .filter(assignment::Column::Status.eq(AssignmentStatus::Pending))
            .one(db)
            .await?;
        if let Some(open) = open {
            return Err(ServiceError::InvalidState(format!(
                "Order item {} already has an undecided assignment {}",
                order_item_id, open.id
            )));
        }

        self.insert_cycle(db, &item, vendor_id, item.requested_qty)
            .await
    }

    /// Vendor confirms the full requested quantity.
    #[instrument(skip(self))]
    pub async fn confirm_full(&self, assignment_id: Uuid) -> Result<assignment::Model, ServiceError> {
        self.decide(assignment_id, VendorDecision::Full).await
    }

    /// Vendor confirms part of the requested quantity; the remainder becomes
    /// backorder.
    #[instrument(skip(self))]
    pub async fn confirm_partial(
        &self,
        assignment_id: Uuid,
        available_qty: i32,
    ) -> Result<assignment::Model, ServiceError> {
        self.decide(assignment_id, VendorDecision::Partial { available_qty })
            .await
    }

    /// Vendor declines the assignment with a reason from the controlled
    /// vocabulary.
    #[instrument(skip(self))]
    pub async fn decline(
        &self,
        assignment_id: Uuid,
        reason: DeclineReason,
    ) -> Result<assignment::Model, ServiceError> {
        self.decide(assignment_id, VendorDecision::Decline { reason })
            .await
    }

    /// Starts a new assignment cycle for the undelivered remainder of a
    /// decided assignment. The decided record is left untouched.
    #[instrument(skip(self))]
    pub async fn reassign(
        &self,
        assignment_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<assignment::Model, ServiceError> {
        let db = &*self.db;
        let previous = self.get(assignment_id).await?;
        if previous.is_undecided() {
            return Err(ServiceError::InvalidState(format!(
                "Assignment {} is still awaiting the vendor's decision",
                assignment_id
            )));
        }
        let qty = reassignable_qty(&previous);
        if qty == 0 {
            return Err(ServiceError::InvalidState(format!(
                "Assignment {} has no unconfirmed quantity left to reassign",
                assignment_id
            )));
        }
        let item = order_item::Entity::find_by_id(previous.order_item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order item {} not found", previous.order_item_id))
            })?;
        self.insert_cycle(db, &item, vendor_id, qty).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, assignment_id: Uuid) -> Result<assignment::Model, ServiceError> {
        assignment::Entity::find_by_id(assignment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assignment {} not found", assignment_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<assignment::Model>, ServiceError> {
        Ok(assignment::Entity::find()
            .filter(assignment::Column::VendorId.eq(vendor_id))
            .order_by_asc(assignment::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn insert_cycle(
        &self,
        db: &DatabaseConnection,
        item: &order_item::Model,
        vendor_id: Uuid,
        requested_qty: i32,
    ) -> Result<assignment::Model, ServiceError> {
        let now = Utc::now();
        let model = assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_item_id: Set(item.id),
            order_id: Set(item.order_id),
            vendor_id: Set(vendor_id),
            requested_qty: Set(requested_qty),
            confirmed_qty: Set(0),
            backorder_qty: Set(requested_qty),
            status: Set(AssignmentStatus::Pending),
            decline_reason: Set(None),
            decided_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(0),
        };
        let created = model.insert(db).await?;

        info!(assignment_id = %created.id, vendor_id = %vendor_id, "assignment created");
        if let Err(e) = self
            .event_sender
            .send(Event::AssignmentCreated {
                assignment_id: created.id,
                order_item_id: item.id,
                vendor_id,
            })
            .await
        {
            warn!(assignment_id = %created.id, "failed to publish event: {}", e);
        }
        Ok(created)
    }

    /// Applies the decision inside a transaction. The status guard runs on
    /// the row read within the transaction, so of two simultaneous decisions
    /// the loser observes the already-decided status and fails.
    async fn decide(
        &self,
        assignment_id: Uuid,
        decision: VendorDecision,
    ) -> Result<assignment::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let current = assignment::Entity::find_by_id(assignment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assignment {} not found", assignment_id))
            })?;

        if current.status != AssignmentStatus::Pending {
            return Err(ServiceError::AlreadyDecided(assignment_id));
        }

        let outcome = apply_decision(current.requested_qty, decision)?;
        let vendor_id = current.vendor_id;
        let version = current.version;
        let now = Utc::now();

        let mut active: assignment::ActiveModel = current.into();
        active.confirmed_qty = Set(outcome.confirmed_qty);
        active.backorder_qty = Set(outcome.backorder_qty);
        active.status = Set(outcome.status);
        active.decline_reason = Set(outcome.decline_reason);
        active.decided_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        persist_decision(&txn, assignment_id, version, active).await?;
        let updated = assignment::Entity::find_by_id(assignment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Assignment {} not found", assignment_id))
            })?;
        txn.commit().await?;

        info!(
            assignment_id = %assignment_id,
            status = ?updated.status,
            confirmed_qty = updated.confirmed_qty,
            "assignment decided"
        );

        let event = match decision {
            VendorDecision::Decline { reason } => Event::AssignmentDeclined {
                assignment_id,
                vendor_id,
                reason: reason.to_string(),
            },
            _ => Event::AssignmentConfirmed {
                assignment_id,
                vendor_id,
                confirmed_qty: updated.confirmed_qty,
                backorder_qty: updated.backorder_qty,
            },
        };
        if let Err(e) = self.event_sender.send(event).await {
            warn!(assignment_id = %assignment_id, "failed to publish event: {}", e);
        }

        Ok(updated)
    }
}

/// Writes a decision only if the row still carries the version it was read
/// at. A write that matches nothing means another decision landed first.
async fn persist_decision<C: sea_orm::ConnectionTrait>(
    conn: &C,
    assignment_id: Uuid,
    read_version: i32,
    active: assignment::ActiveModel,
) -> Result<(), ServiceError> {
    let result = assignment::Entity::update_many()
        .set(active)
        .filter(assignment::Column::Id.eq(assignment_id))
        .filter(assignment::Column::Version.eq(read_version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(assignment_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test]
    fn full_confirmation_consumes_everything() {
        let outcome = apply_decision(100, VendorDecision::Full).unwrap();
        assert_eq!(outcome.confirmed_qty, 100);
        assert_eq!(outcome.backorder_qty, 0);
        assert_eq!(outcome.status, AssignmentStatus::Confirmed);
    }

    #[test]
    fn partial_confirmation_splits_into_backorder() {
        let outcome = apply_decision(100, VendorDecision::Partial { available_qty: 60 }).unwrap();
        assert_eq!(outcome.confirmed_qty, 60);
        assert_eq!(outcome.backorder_qty, 40);
        assert_eq!(outcome.status, AssignmentStatus::PartiallyConfirmed);
    }

    #[test_case(0)]
    #[test_case(-5)]
    fn non_positive_partial_quantity_is_rejected(qty: i32) {
        assert_matches!(
            apply_decision(100, VendorDecision::Partial { available_qty: qty }),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test_case(100)]
    #[test_case(150)]
    fn partial_covering_full_quantity_is_rejected(qty: i32) {
        assert_matches!(
            apply_decision(100, VendorDecision::Partial { available_qty: qty }),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn stock_unavailable_resolves_to_not_available_without_reason() {
        let outcome = apply_decision(
            10,
            VendorDecision::Decline {
                reason: DeclineReason::StockUnavailable,
            },
        )
        .unwrap();
        assert_eq!(outcome.status, AssignmentStatus::NotAvailable);
        assert_eq!(outcome.decline_reason, None);
        assert_eq!(outcome.backorder_qty, 10);
    }

    #[test_case(DeclineReason::QualityIssue)]
    #[test_case(DeclineReason::PriceMismatch)]
    #[test_case(DeclineReason::LateDelivery)]
    fn other_declines_keep_their_reason(reason: DeclineReason) {
        let outcome = apply_decision(10, VendorDecision::Decline { reason }).unwrap();
        assert_eq!(outcome.status, AssignmentStatus::Declined);
        assert_eq!(outcome.decline_reason, Some(reason));
    }

    #[tokio::test]
    async fn stale_decision_write_is_rejected() {
        use sea_orm::Database;
        use sea_orm_migration::MigratorTrait;

        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::migrator::Migrator::up(&db, None).await.unwrap();
        let now = Utc::now();
        let row = assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_item_id: Set(Uuid::new_v4()),
            order_id: Set(Uuid::new_v4()),
            vendor_id: Set(Uuid::new_v4()),
            requested_qty: Set(10),
            confirmed_qty: Set(0),
            backorder_qty: Set(10),
            status: Set(AssignmentStatus::Pending),
            decline_reason: Set(None),
            decided_at: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(&db)
        .await
        .unwrap();

        // Written against a version that is no longer current.
        let mut stale: assignment::ActiveModel = row.clone().into();
        stale.status = Set(AssignmentStatus::Confirmed);
        stale.confirmed_qty = Set(10);
        stale.backorder_qty = Set(0);
        stale.version = Set(1);
        assert_matches!(
            persist_decision(&db, row.id, 0, stale).await,
            Err(ServiceError::ConcurrentModification(_))
        );
        let stored = assignment::Entity::find_by_id(row.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AssignmentStatus::Pending);

        let mut fresh: assignment::ActiveModel = row.clone().into();
        fresh.status = Set(AssignmentStatus::Confirmed);
        fresh.confirmed_qty = Set(10);
        fresh.backorder_qty = Set(0);
        fresh.version = Set(2);
        persist_decision(&db, row.id, 1, fresh).await.unwrap();
        let stored = assignment::Entity::find_by_id(row.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AssignmentStatus::Confirmed);
        assert_eq!(stored.version, 2);
    }
}
