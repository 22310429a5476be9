mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{seed_order_item, setup, TestCtx};
use vendordesk_api::{
    entities::{assignment::DeclineReason, InvoiceStatus, PurchaseOrderStatus},
    errors::ServiceError,
    services::order_status::OrderLifecycleStatus,
};

async fn confirmed_assignment(ctx: &TestCtx, order_id: Uuid, vendor_id: Uuid, qty: i32) -> Uuid {
    let item = seed_order_item(ctx, order_id, "SKU-PO", qty, dec!(10.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();
    ctx.services.assignments.confirm_full(a.id).await.unwrap();
    a.id
}

#[tokio::test]
async fn generates_po_with_lines_and_opens_the_invoice() {
    let ctx = setup().await;
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    confirmed_assignment(&ctx, order_id, vendor_id, 50).await;

    let generated = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await
        .unwrap();
    assert!(generated.newly_created);
    assert_eq!(generated.po.status, PurchaseOrderStatus::Generated);
    assert_eq!(generated.po.total_amount, dec!(500.00));
    assert!(generated.po.po_number.starts_with("PO-"));

    let lines = ctx
        .services
        .purchase_orders
        .get_po_lines(generated.po.id)
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 50);

    let invoice = ctx
        .services
        .invoices
        .get_by_po(generated.po.id)
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::PendingVerification);
    assert_eq!(invoice.amount, dec!(500.00));
}

#[tokio::test]
async fn regeneration_returns_the_existing_po() {
    let ctx = setup().await;
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    confirmed_assignment(&ctx, order_id, vendor_id, 10).await;

    let first = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await
        .unwrap();
    let second = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await
        .unwrap();
    assert!(!second.newly_created);
    assert_eq!(second.po.id, first.po.id);
}

#[tokio::test]
async fn pending_assignment_blocks_generation() {
    let ctx = setup().await;
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    confirmed_assignment(&ctx, order_id, vendor_id, 10).await;

    // A second item still awaiting the vendor's decision.
    let item = seed_order_item(&ctx, order_id, "SKU-PENDING", 5, dec!(2.00)).await;
    ctx.services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();

    let result = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await;
    assert_matches!(result, Err(ServiceError::IneligibleAssignment(_)));
}

#[tokio::test]
async fn all_declined_yields_no_po() {
    let ctx = setup().await;
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    let item = seed_order_item(&ctx, order_id, "SKU-D", 10, dec!(2.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();
    ctx.services
        .assignments
        .decline(a.id, DeclineReason::LateDelivery)
        .await
        .unwrap();

    let result = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await;
    assert_matches!(result, Err(ServiceError::IneligibleAssignment(_)));
}

#[tokio::test]
async fn bulk_generation_reports_failures_without_aborting() {
    let ctx = setup().await;
    let good_order = Uuid::new_v4();
    let bad_order = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    confirmed_assignment(&ctx, good_order, vendor_id, 10).await;
    let item = seed_order_item(&ctx, bad_order, "SKU-P", 5, dec!(1.00)).await;
    ctx.services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();

    let entries = ctx
        .services
        .purchase_orders
        .bulk_generate_po(vec![good_order, bad_order])
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    let good = entries.iter().find(|e| e.order_id == good_order).unwrap();
    assert!(good.purchase_order_id.is_some());
    assert!(good.error.is_none());
    let bad = entries.iter().find(|e| e.order_id == bad_order).unwrap();
    assert!(bad.purchase_order_id.is_none());
    assert!(bad.error.is_some());
}

#[tokio::test]
async fn order_status_follows_the_lifecycle() {
    let ctx = setup().await;
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    let item = seed_order_item(&ctx, order_id, "SKU-S", 10, dec!(1.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();
    assert_eq!(
        ctx.services.order_status.derive(order_id).await.unwrap(),
        OrderLifecycleStatus::PendingAssignment
    );

    ctx.services.assignments.confirm_full(a.id).await.unwrap();
    assert_eq!(
        ctx.services.order_status.derive(order_id).await.unwrap(),
        OrderLifecycleStatus::AwaitingPO
    );

    ctx.services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await
        .unwrap();
    assert_eq!(
        ctx.services.order_status.derive(order_id).await.unwrap(),
        OrderLifecycleStatus::POGenerated
    );
}
