use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{DeliveryVerified, GoodsReceiptStatus};
use crate::notifications::{VendorNotification, VendorNotifier};

/// Domain events emitted after every successful lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AssignmentCreated {
        assignment_id: Uuid,
        order_item_id: Uuid,
        vendor_id: Uuid,
    },
    AssignmentConfirmed {
        assignment_id: Uuid,
        vendor_id: Uuid,
        confirmed_qty: i32,
        backorder_qty: i32,
    },
    AssignmentDeclined {
        assignment_id: Uuid,
        vendor_id: Uuid,
        reason: String,
    },
    PurchaseOrderGenerated {
        purchase_order_id: Uuid,
        order_id: Uuid,
        vendor_id: Uuid,
        po_number: String,
    },
    DispatchCreated {
        dispatch_id: Uuid,
        purchase_order_id: Uuid,
    },
    GoodsReceiptRecorded {
        goods_receipt_id: Uuid,
        dispatch_id: Uuid,
        status: GoodsReceiptStatus,
    },
    InvoiceAttachmentUploaded {
        invoice_id: Uuid,
        vendor_owned: bool,
    },
    InvoiceApproved {
        invoice_id: Uuid,
        payment_id: Uuid,
    },
    InvoiceRejected {
        invoice_id: Uuid,
        vendor_id: Uuid,
        reason: String,
    },
    PaymentAmountAdjusted {
        payment_id: Uuid,
        new_amount: Decimal,
        delivery_verified: DeliveryVerified,
    },
    PaymentReleased {
        payment_id: Uuid,
        vendor_id: Uuid,
        reference_id: String,
        amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background loop: logs every event and decides which ones warrant a vendor
/// notification. Transport is the notifier's problem, never ours.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>, notifier: Arc<dyn VendorNotifier>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "domain event");
        let notification = match &event {
            Event::PaymentReleased {
                payment_id,
                vendor_id,
                reference_id,
                amount,
            } => Some(VendorNotification {
                vendor_id: *vendor_id,
                subject: format!("Payment released: {}", reference_id),
                body: format!(
                    "Payment {} of {} has been released with reference {}",
                    payment_id, amount, reference_id
                ),
            }),
            Event::InvoiceRejected {
                invoice_id,
                vendor_id,
                reason,
            } => Some(VendorNotification {
                vendor_id: *vendor_id,
                subject: format!("Invoice {} rejected", invoice_id),
                body: format!("Please re-upload a corrected invoice. Reason: {}", reason),
            }),
            _ => None,
        };
        if let Some(notification) = notification {
            if let Err(e) = notifier.notify(notification).await {
                warn!("vendor notification failed: {}", e);
            }
        }
    }
    info!("event channel closed, processor exiting");
}
