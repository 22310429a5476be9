use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    attachments::{AttachmentKind, AttachmentStore, InvoiceAttachmentView},
    entities::{invoice, payment, InvoiceStatus, PaymentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::goods_receipts::po_delivery_verified_on,
};

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    store: Arc<dyn AttachmentStore>,
    payment_due_days: i64,
}

impl InvoiceService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        store: Arc<dyn AttachmentStore>,
        payment_due_days: i64,
    ) -> Self {
        Self {
            db,
            event_sender,
            store,
            payment_due_days,
        }
    }

    /// Stores the vendor's invoice document and records the reference on the
    /// invoice. Re-uploading against a rejected invoice reopens verification
    /// and clears the rejection reason.
    #[instrument(skip(self, content), fields(file_name = %file_name))]
    pub async fn upload_vendor_attachment(
        &self,
        invoice_id: Uuid,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<invoice::Model, ServiceError> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Attachment file name cannot be empty".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let inv = find_invoice(&txn, invoice_id).await?;
        match inv.status {
            InvoiceStatus::PendingVerification | InvoiceStatus::Rejected => {}
            other => {
                return Err(ServiceError::InvalidState(format!(
                    "Invoice {} is {:?}; the vendor document can no longer change",
                    invoice_id, other
                )));
            }
        }

        let stored = self
            .store
            .store(invoice_id, AttachmentKind::Vendor, file_name, content)
            .await
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let reopened = inv.status == InvoiceStatus::Rejected;
        let version = inv.version;
        let mut active: invoice::ActiveModel = inv.into();
        active.vendor_file_name = Set(Some(stored.file_name));
        active.vendor_file_url = Set(Some(stored.url));
        if reopened {
            active.status = Set(InvoiceStatus::PendingVerification);
            active.rejection_reason = Set(None);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = persist_invoice(&txn, invoice_id, version, active).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, reopened, "vendor invoice document uploaded");
        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceAttachmentUploaded {
                invoice_id,
                vendor_owned: true,
            })
            .await
        {
            warn!(invoice_id = %invoice_id, "failed to publish event: {}", e);
        }
        Ok(updated)
    }

    /// Stores the accounts copy of the invoice document. Accounts may attach
    /// at any point before payment.
    #[instrument(skip(self, content), fields(file_name = %file_name))]
    pub async fn upload_accounts_attachment(
        &self,
        invoice_id: Uuid,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<invoice::Model, ServiceError> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Attachment file name cannot be empty".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let inv = find_invoice(&txn, invoice_id).await?;
        if inv.status == InvoiceStatus::Paid {
            return Err(ServiceError::InvalidState(format!(
                "Invoice {} is already paid",
                invoice_id
            )));
        }

        let stored = self
            .store
            .store(invoice_id, AttachmentKind::Accounts, file_name, content)
            .await
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let version = inv.version;
        let mut active: invoice::ActiveModel = inv.into();
        active.accounts_file_name = Set(Some(stored.file_name));
        active.accounts_file_url = Set(Some(stored.url));
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = persist_invoice(&txn, invoice_id, version, active).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, "accounts invoice document uploaded");
        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceAttachmentUploaded {
                invoice_id,
                vendor_owned: false,
            })
            .await
        {
            warn!(invoice_id = %invoice_id, "failed to publish event: {}", e);
        }
        Ok(updated)
    }

    /// Approves the invoice and opens the payment record. Approval requires
    /// the vendor's document; the payment mirrors the current goods-receipt
    /// verification for the PO and falls due after the configured net terms.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        invoice_id: Uuid,
    ) -> Result<(invoice::Model, payment::Model), ServiceError> {
        let txn = self.db.begin().await?;
        let inv = find_invoice(&txn, invoice_id).await?;
        if inv.status != InvoiceStatus::PendingVerification {
            return Err(ServiceError::InvalidState(format!(
                "Invoice {} is {:?}, not pending verification",
                invoice_id, inv.status
            )));
        }
        if !InvoiceAttachmentView::of(&inv).vendor_present() {
            return Err(ServiceError::ValidationError(format!(
                "Invoice {} cannot be approved without the vendor's document",
                invoice_id
            )));
        }

        let verified = po_delivery_verified_on(&txn, inv.purchase_order_id).await?;
        let now = Utc::now();
        let pay = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(inv.id),
            purchase_order_id: Set(inv.purchase_order_id),
            vendor_id: Set(inv.vendor_id),
            invoice_amount: Set(inv.amount),
            delivery_verified: Set(verified),
            status: Set(PaymentStatus::Pending),
            due_date: Set(now + Duration::days(self.payment_due_days)),
            release_date: Set(None),
            reference_id: Set(None),
            adjustment_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(0),
        }
        .insert(&txn)
        .await?;

        let version = inv.version;
        let mut active: invoice::ActiveModel = inv.into();
        active.status = Set(InvoiceStatus::Approved);
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        let updated = persist_invoice(&txn, invoice_id, version, active).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, payment_id = %pay.id, delivery_verified = ?verified, "invoice approved");
        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceApproved {
                invoice_id,
                payment_id: pay.id,
            })
            .await
        {
            warn!(invoice_id = %invoice_id, "failed to publish event: {}", e);
        }
        Ok((updated, pay))
    }

    /// Rejects the invoice back to the vendor with a reason. The vendor can
    /// re-upload their document to reopen verification.
    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        invoice_id: Uuid,
        reason: &str,
    ) -> Result<invoice::Model, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection reason is required".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let inv = find_invoice(&txn, invoice_id).await?;
        if inv.status != InvoiceStatus::PendingVerification {
            return Err(ServiceError::InvalidState(format!(
                "Invoice {} is {:?}, not pending verification",
                invoice_id, inv.status
            )));
        }

        let vendor_id = inv.vendor_id;
        let version = inv.version;
        let mut active: invoice::ActiveModel = inv.into();
        active.status = Set(InvoiceStatus::Rejected);
        active.rejection_reason = Set(Some(reason.to_string()));
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = persist_invoice(&txn, invoice_id, version, active).await?;
        txn.commit().await?;

        info!(invoice_id = %invoice_id, reason = %reason, "invoice rejected");
        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceRejected {
                invoice_id,
                vendor_id,
                reason: reason.to_string(),
            })
            .await
        {
            warn!(invoice_id = %invoice_id, "failed to publish event: {}", e);
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, invoice_id: Uuid) -> Result<invoice::Model, ServiceError> {
        find_invoice(&*self.db, invoice_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_po(&self, po_id: Uuid) -> Result<invoice::Model, ServiceError> {
        invoice::Entity::find()
            .filter(invoice::Column::PurchaseOrderId.eq(po_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No invoice for purchase order {}", po_id))
            })
    }

    /// Attachment view for one invoice, including the vendor-visibility rule.
    #[instrument(skip(self))]
    pub async fn attachment_view(
        &self,
        invoice_id: Uuid,
    ) -> Result<InvoiceAttachmentView, ServiceError> {
        let inv = find_invoice(&*self.db, invoice_id).await?;
        Ok(InvoiceAttachmentView::of(&inv))
    }
}

async fn find_invoice<C: sea_orm::ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(invoice_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))
}

/// Writes an invoice transition only if the row still carries the version it
/// was read at, then returns the stored row.
async fn persist_invoice<C: sea_orm::ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
    read_version: i32,
    active: invoice::ActiveModel,
) -> Result<invoice::Model, ServiceError> {
    let result = invoice::Entity::update_many()
        .set(active)
        .filter(invoice::Column::Id.eq(invoice_id))
        .filter(invoice::Column::Version.eq(read_version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(invoice_id));
    }
    find_invoice(conn, invoice_id).await
}
