pub mod assignments;
pub mod dispatches;
pub mod goods_receipts;
pub mod invoices;
pub mod order_status;
pub mod payments;
pub mod purchase_orders;

pub use assignments::AssignmentService;
pub use dispatches::DispatchService;
pub use goods_receipts::GoodsReceiptService;
pub use invoices::InvoiceService;
pub use order_status::OrderStatusService;
pub use payments::PaymentService;
pub use purchase_orders::PurchaseOrderService;
