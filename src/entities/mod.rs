pub mod assignment;
pub mod dispatch;
pub mod dispatch_line;
pub mod goods_receipt;
pub mod goods_receipt_line;
pub mod invoice;
pub mod order_item;
pub mod payment;
pub mod purchase_order;
pub mod purchase_order_line;

pub use assignment::{AssignmentStatus, DeclineReason};
pub use goods_receipt::GoodsReceiptStatus;
pub use goods_receipt_line::GoodsReceiptLineStatus;
pub use invoice::InvoiceStatus;
pub use payment::{DeliveryVerified, PaymentStatus};
pub use purchase_order::PurchaseOrderStatus;
