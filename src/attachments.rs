use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::invoice;

/// Which party owns an uploaded invoice document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AttachmentKind {
    Vendor,
    Accounts,
}

/// Opaque reference returned by the blob store. The core never inspects file
/// content; both fields are treated as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredAttachment {
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Attachment store failed: {0}")]
    Store(String),
}

/// Blob-store boundary: accepts a file and an owning invoice/kind tag and
/// returns the stored reference.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn store(
        &self,
        invoice_id: Uuid,
        kind: AttachmentKind,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<StoredAttachment, AttachmentError>;
}

/// In-process store keeping blobs in a concurrent map. Used by tests and as
/// the default when no external store is configured.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    blobs: DashMap<(Uuid, AttachmentKind), Vec<u8>>,
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn store(
        &self,
        invoice_id: Uuid,
        kind: AttachmentKind,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<StoredAttachment, AttachmentError> {
        self.blobs.insert((invoice_id, kind), content);
        let side = match kind {
            AttachmentKind::Vendor => "vendor",
            AttachmentKind::Accounts => "accounts",
        };
        Ok(StoredAttachment {
            file_name: file_name.to_string(),
            url: format!("memory://invoices/{}/{}/{}", invoice_id, side, file_name),
        })
    }
}

/// Tagged view over an invoice's two attachment slots. Replaces ad-hoc
/// comparison of nullable column pairs: a slot counts as present only when
/// both its file name and URL are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub enum InvoiceAttachmentView {
    Neither,
    Vendor(StoredAttachment),
    Accounts(StoredAttachment),
    Both {
        vendor: StoredAttachment,
        accounts: StoredAttachment,
    },
}

impl InvoiceAttachmentView {
    pub fn of(invoice: &invoice::Model) -> Self {
        let vendor = slot(&invoice.vendor_file_name, &invoice.vendor_file_url);
        let accounts = slot(&invoice.accounts_file_name, &invoice.accounts_file_url);
        match (vendor, accounts) {
            (None, None) => Self::Neither,
            (Some(v), None) => Self::Vendor(v),
            (None, Some(a)) => Self::Accounts(a),
            (Some(vendor), Some(accounts)) => Self::Both { vendor, accounts },
        }
    }

    /// The vendor attachment, when present.
    pub fn vendor(&self) -> Option<&StoredAttachment> {
        match self {
            Self::Vendor(v) | Self::Both { vendor: v, .. } => Some(v),
            _ => None,
        }
    }

    /// Display contract for the vendor-facing "your invoice" view: shown only
    /// when the vendor attachment is present and its URL differs from the
    /// accounts copy. Prevents presenting the accounts-generated document as
    /// if the vendor had uploaded it.
    pub fn vendor_visible(&self) -> Option<&StoredAttachment> {
        match self {
            Self::Vendor(v) => Some(v),
            Self::Both { vendor, accounts } if vendor.url != accounts.url => Some(vendor),
            _ => None,
        }
    }

    /// Whether the vendor attachment satisfies the presence rule required
    /// for approval.
    pub fn vendor_present(&self) -> bool {
        self.vendor().is_some()
    }
}

fn slot(file_name: &Option<String>, url: &Option<String>) -> Option<StoredAttachment> {
    match (file_name, url) {
        (Some(file_name), Some(url)) => Some(StoredAttachment {
            file_name: file_name.clone(),
            url: url.clone(),
        }),
        // Partial upload states are treated as absent.
        _ => None,
    }
}
