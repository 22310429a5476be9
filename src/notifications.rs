use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct VendorNotification {
    pub vendor_id: Uuid,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outbound boundary for vendor-facing messages. The lifecycle core only
/// decides that a notification is warranted; delivery (email/SMS) lives
/// behind this trait.
#[async_trait]
pub trait VendorNotifier: Send + Sync {
    async fn notify(&self, notification: VendorNotification) -> Result<(), NotificationError>;
}

/// Default notifier: writes the notification to the log stream.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl VendorNotifier for LogNotifier {
    async fn notify(&self, notification: VendorNotification) -> Result<(), NotificationError> {
        info!(
            vendor_id = %notification.vendor_id,
            subject = %notification.subject,
            "vendor notification"
        );
        Ok(())
    }
}
