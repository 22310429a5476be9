use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VendorDesk API",
        version = "0.1.0",
        description = r#"
Order fulfillment and vendor payment API.

Covers the lifecycle from assigning order items to vendors, through
purchase-order generation, dispatch and goods-receipt verification, to
invoice reconciliation and payment release.

## Error handling

Errors use a consistent JSON body:

```json
{
  "error": "Conflict",
  "message": "Assignment already decided",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
"#
    ),
    paths(
        handlers::health::health_check,
        handlers::assignments::create_assignment,
        handlers::assignments::get_assignment,
        handlers::assignments::confirm_assignment,
        handlers::assignments::decline_assignment,
        handlers::assignments::reassign,
        handlers::assignments::list_vendor_assignments,
        handlers::orders::get_order_status,
        handlers::purchase_orders::generate_po,
        handlers::purchase_orders::bulk_generate_po,
        handlers::purchase_orders::get_po,
        handlers::purchase_orders::get_po_lines,
        handlers::purchase_orders::list_vendor_pos,
        handlers::dispatches::create_dispatch,
        handlers::dispatches::get_dispatch,
        handlers::goods_receipts::record_grn,
        handlers::goods_receipts::get_grn,
        handlers::invoices::get_invoice,
        handlers::invoices::get_attachments,
        handlers::invoices::upload_vendor_attachment,
        handlers::invoices::upload_accounts_attachment,
        handlers::invoices::approve_invoice,
        handlers::invoices::reject_invoice,
        handlers::payments::get_payment,
        handlers::payments::edit_payment_amount,
        handlers::payments::release_payment,
        handlers::payments::bulk_release,
        handlers::payments::list_vendor_payments,
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "assignments", description = "Vendor assignment lifecycle"),
        (name = "orders", description = "Derived order lifecycle status"),
        (name = "purchase-orders", description = "Purchase order generation"),
        (name = "dispatches", description = "Vendor shipments"),
        (name = "goods-receipts", description = "Delivery verification"),
        (name = "invoices", description = "Invoice reconciliation"),
        (name = "payments", description = "Payment release"),
    )
)]
pub struct ApiDoc;
