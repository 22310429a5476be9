use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{invoice, payment, DeliveryVerified, InvoiceStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// What the accounts screens show for a payment. `Overdue` is derived, never
/// stored: a pending payment past its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum PaymentDisplayStatus {
    Pending,
    Released,
    Overdue,
}

pub fn display_status(p: &payment::Model, now: DateTime<Utc>) -> PaymentDisplayStatus {
    match p.status {
        PaymentStatus::Released => PaymentDisplayStatus::Released,
        PaymentStatus::Pending if now > p.due_date => PaymentDisplayStatus::Overdue,
        PaymentStatus::Pending => PaymentDisplayStatus::Pending,
    }
}

/// Release gate: funds leave only for pending payments whose delivery is
/// fully verified.
pub fn release_eligible(p: &payment::Model) -> Result<(), ServiceError> {
    if p.status == PaymentStatus::Released {
        return Err(ServiceError::InvalidState(format!(
            "Payment {} has already been released",
            p.id
        )));
    }
    if p.delivery_verified != DeliveryVerified::Yes {
        return Err(ServiceError::DeliveryNotVerified(p.id));
    }
    Ok(())
}

/// Amount edit request. `delivery_verified` updates the mirror in the same
/// write when operations resolve a discrepancy while adjusting the amount.
#[derive(Debug, Clone)]
pub struct EditPaymentAmount {
    pub amount: Decimal,
    pub adjustment_reason: String,
    pub delivery_verified: Option<DeliveryVerified>,
    pub expected_version: Option<i32>,
}

/// Per-payment outcome of a bulk release run. Ineligible payments are
/// skipped with the reason, never silently dropped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkReleaseEntry {
    pub payment_id: Uuid,
    pub released: bool,
    pub skip_reason: Option<String>,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PaymentService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adjusts the payable amount before release. Allowed only while the
    /// delivery mirror is not fully verified (a short or damaged delivery is
    /// exactly when the payable differs from the invoiced amount) and always
    /// requires a reason.
    #[instrument(skip(self, input))]
    pub async fn edit_amount(
        &self,
        payment_id: Uuid,
        input: EditPaymentAmount,
    ) -> Result<payment::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Payment amount must be positive".to_string(),
            ));
        }
        let reason = input.adjustment_reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "An adjustment reason is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let pay = find_payment(&txn, payment_id).await?;
        if pay.status == PaymentStatus::Released {
            return Err(ServiceError::InvalidState(format!(
                "Payment {} has already been released",
                payment_id
            )));
        }
        if pay.delivery_verified == DeliveryVerified::Yes {
            return Err(ServiceError::InvalidState(format!(
                "Payment {} is fully verified; the invoiced amount stands",
                payment_id
            )));
        }
        if let Some(expected) = input.expected_version {
            if expected != pay.version {
                return Err(ServiceError::ConcurrentModification(payment_id));
            }
        }

        let version = pay.version;
        let verified = input.delivery_verified.unwrap_or(pay.delivery_verified);
        let mut active: payment::ActiveModel = pay.into();
        active.invoice_amount = Set(input.amount);
        active.adjustment_reason = Set(Some(reason.to_string()));
        active.delivery_verified = Set(verified);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = persist_payment(&txn, payment_id, version, active).await?;
        txn.commit().await?;

        info!(payment_id = %payment_id, amount = %input.amount, "payment amount adjusted");
        if let Err(e) = self
            .event_sender
            .send(Event::PaymentAmountAdjusted {
                payment_id,
                new_amount: input.amount,
                delivery_verified: verified,
            })
            .await
        {
            warn!(payment_id = %payment_id, "failed to publish event: {}", e);
        }
        Ok(updated)
    }

    /// Releases funds for one payment and marks its invoice paid in the same
    /// transaction. The bank/UTR reference is mandatory.
    #[instrument(skip(self))]
    pub async fn release(
        &self,
        payment_id: Uuid,
        reference_id: &str,
        expected_version: Option<i32>,
    ) -> Result<payment::Model, ServiceError> {
        let reference_id = reference_id.trim();
        if reference_id.is_empty() {
            return Err(ServiceError::ValidationError(
                "A payment reference is required to release funds".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let pay = find_payment(&txn, payment_id).await?;
        release_eligible(&pay)?;
        if let Some(expected) = expected_version {
            if expected != pay.version {
                return Err(ServiceError::ConcurrentModification(payment_id));
            }
        }

        let now = Utc::now();
        let vendor_id = pay.vendor_id;
        let amount = pay.invoice_amount;
        let invoice_id = pay.invoice_id;
        let version = pay.version;
        let mut active: payment::ActiveModel = pay.into();
        active.status = Set(PaymentStatus::Released);
        active.release_date = Set(Some(now));
        active.reference_id = Set(Some(reference_id.to_string()));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let released = persist_payment(&txn, payment_id, version, active).await?;

        let inv = invoice::Entity::find_by_id(invoice_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;
        let inv_version = inv.version;
        let mut inv_active: invoice::ActiveModel = inv.into();
        inv_active.status = Set(InvoiceStatus::Paid);
        inv_active.updated_at = Set(Some(now));
        inv_active.version = Set(inv_version + 1);
        let marked = invoice::Entity::update_many()
            .set(inv_active)
            .filter(invoice::Column::Id.eq(invoice_id))
            .filter(invoice::Column::Version.eq(inv_version))
            .exec(&txn)
            .await?;
        if marked.rows_affected == 0 {
            return Err(ServiceError::ConcurrentModification(invoice_id));
        }

        txn.commit().await?;

        info!(payment_id = %payment_id, reference_id = %reference_id, amount = %amount, "payment released");
        if let Err(e) = self
            .event_sender
            .send(Event::PaymentReleased {
                payment_id,
                vendor_id,
                reference_id: reference_id.to_string(),
                amount,
            })
            .await
        {
            warn!(payment_id = %payment_id, "failed to publish event: {}", e);
        }
        Ok(released)
    }

    /// Releases a batch under one reference. Each payment is attempted
    /// independently; ineligible ones are reported as skipped and the rest
    /// still go through.
    #[instrument(skip(self, payment_ids), fields(count = payment_ids.len()))]
    pub async fn bulk_release(
        &self,
        payment_ids: Vec<Uuid>,
        reference_id: &str,
    ) -> Result<Vec<BulkReleaseEntry>, ServiceError> {
        let mut entries = Vec::with_capacity(payment_ids.len());
        for payment_id in payment_ids {
            match self.release(payment_id, reference_id, None).await {
                Ok(_) => entries.push(BulkReleaseEntry {
                    payment_id,
                    released: true,
                    skip_reason: None,
                }),
                Err(e) => entries.push(BulkReleaseEntry {
                    payment_id,
                    released: false,
                    skip_reason: Some(e.response_message()),
                }),
            }
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, payment_id: Uuid) -> Result<payment::Model, ServiceError> {
        find_payment(&*self.db, payment_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Vec<payment::Model>, ServiceError> {
        Ok(payment::Entity::find()
            .filter(payment::Column::VendorId.eq(vendor_id))
            .order_by_asc(payment::Column::DueDate)
            .all(&*self.db)
            .await?)
    }
}

async fn find_payment<C: sea_orm::ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
) -> Result<payment::Model, ServiceError> {
    payment::Entity::find_by_id(payment_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))
}

/// Writes a payment transition only if the row still carries the version it
/// was read at, then returns the stored row.
async fn persist_payment<C: sea_orm::ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
    read_version: i32,
    active: payment::ActiveModel,
) -> Result<payment::Model, ServiceError> {
    let result = payment::Entity::update_many()
        .set(active)
        .filter(payment::Column::Id.eq(payment_id))
        .filter(payment::Column::Version.eq(read_version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(payment_id));
    }
    find_payment(conn, payment_id).await
}
