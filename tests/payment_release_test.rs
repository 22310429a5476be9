mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{close_events, seed_order_item, setup, TestCtx};
use vendordesk_api::{
    entities::{DeliveryVerified, InvoiceStatus, PaymentStatus},
    errors::ServiceError,
    services::{
        dispatches::{CreateDispatch, DispatchLineInput},
        goods_receipts::GrnItemInput,
        order_status::OrderLifecycleStatus,
        payments::EditPaymentAmount,
    },
};

struct Pipeline {
    order_id: Uuid,
    dispatch_id: Uuid,
    dispatch_line_id: Uuid,
    invoice_id: Uuid,
}

/// Confirmed assignment, generated PO, full dispatch. Receipt and invoice
/// steps are left to each test.
async fn pipeline(ctx: &TestCtx, qty: i32) -> Pipeline {
    let order_id = Uuid::new_v4();
    let vendor_id = Uuid::new_v4();
    let item = seed_order_item(ctx, order_id, "SKU-PAY", qty, dec!(20.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, vendor_id)
        .await
        .unwrap();
    ctx.services.assignments.confirm_full(a.id).await.unwrap();
    let po = ctx
        .services
        .purchase_orders
        .generate_po(order_id, vendor_id)
        .await
        .unwrap()
        .po;
    let po_line = ctx
        .services
        .purchase_orders
        .get_po_lines(po.id)
        .await
        .unwrap()[0]
        .id;
    let (dispatch, lines) = ctx
        .services
        .dispatches
        .create_dispatch(CreateDispatch {
            purchase_order_id: po.id,
            lines: vec![DispatchLineInput {
                purchase_order_line_id: po_line,
                dispatched_qty: qty,
            }],
            awb_number: Some("AWB-123".to_string()),
            logistics_partner: Some("BlueDart".to_string()),
            dispatch_date: None,
            estimated_delivery_date: None,
        })
        .await
        .unwrap();
    let invoice_id = ctx.services.invoices.get_by_po(po.id).await.unwrap().id;
    Pipeline {
        order_id,
        dispatch_id: dispatch.id,
        dispatch_line_id: lines[0].id,
        invoice_id,
    }
}

async fn receive(ctx: &TestCtx, p: &Pipeline, received_qty: i32) {
    ctx.services
        .goods_receipts
        .record_grn(
            p.dispatch_id,
            vec![GrnItemInput {
                dispatch_line_id: p.dispatch_line_id,
                received_qty,
                damage_reported: false,
            }],
        )
        .await
        .unwrap();
}

async fn approved_payment(ctx: &TestCtx, p: &Pipeline) -> Uuid {
    ctx.services
        .invoices
        .upload_vendor_attachment(p.invoice_id, "invoice.pdf", b"pdf".to_vec())
        .await
        .unwrap();
    ctx.services.invoices.approve(p.invoice_id).await.unwrap().1.id
}

#[tokio::test]
async fn release_closes_the_loop_when_delivery_verified() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 25).await;
    receive(&ctx, &p, 25).await;
    let payment_id = approved_payment(&ctx, &p).await;

    let payment = ctx.services.payments.get(payment_id).await.unwrap();
    assert_eq!(payment.delivery_verified, DeliveryVerified::Yes);

    let released = ctx
        .services
        .payments
        .release(payment_id, "UTR-2026-0001", None)
        .await
        .unwrap();
    assert_eq!(released.status, PaymentStatus::Released);
    assert_eq!(released.reference_id.as_deref(), Some("UTR-2026-0001"));
    assert!(released.release_date.is_some());

    let invoice = ctx.services.invoices.get(p.invoice_id).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(
        ctx.services.order_status.derive(p.order_id).await.unwrap(),
        OrderLifecycleStatus::Closed
    );
}

#[tokio::test]
async fn unverified_delivery_blocks_release() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 60).await;
    // Shortage: 55 of 60.
    receive(&ctx, &p, 55).await;
    let payment_id = approved_payment(&ctx, &p).await;

    let result = ctx
        .services
        .payments
        .release(payment_id, "UTR-2026-0002", None)
        .await;
    assert_matches!(result, Err(ServiceError::DeliveryNotVerified(id)) if id == payment_id);
}

#[tokio::test]
async fn goods_receipt_after_approval_updates_the_pending_payment() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 10).await;
    // Approve before anything has been received.
    let payment_id = approved_payment(&ctx, &p).await;
    let payment = ctx.services.payments.get(payment_id).await.unwrap();
    assert_eq!(payment.delivery_verified, DeliveryVerified::No);

    receive(&ctx, &p, 10).await;
    let payment = ctx.services.payments.get(payment_id).await.unwrap();
    assert_eq!(payment.delivery_verified, DeliveryVerified::Yes);

    ctx.services
        .payments
        .release(payment_id, "UTR-2026-0003", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn release_requires_a_reference_and_is_terminal() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 5).await;
    receive(&ctx, &p, 5).await;
    let payment_id = approved_payment(&ctx, &p).await;

    let result = ctx.services.payments.release(payment_id, "   ", None).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    ctx.services
        .payments
        .release(payment_id, "UTR-1", None)
        .await
        .unwrap();
    let again = ctx.services.payments.release(payment_id, "UTR-2", None).await;
    assert_matches!(again, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn amount_edit_is_gated_on_an_unverified_delivery() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 60).await;
    receive(&ctx, &p, 55).await;
    let payment_id = approved_payment(&ctx, &p).await;

    // A reason is mandatory.
    let result = ctx
        .services
        .payments
        .edit_amount(
            payment_id,
            EditPaymentAmount {
                amount: dec!(1100.00),
                adjustment_reason: " ".to_string(),
                delivery_verified: None,
                expected_version: None,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // Pay for the 55 actually received and accept the shortage.
    let payment = ctx
        .services
        .payments
        .edit_amount(
            payment_id,
            EditPaymentAmount {
                amount: dec!(1100.00),
                adjustment_reason: "Shortage of 5 units accepted".to_string(),
                delivery_verified: Some(DeliveryVerified::Yes),
                expected_version: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(payment.invoice_amount, dec!(1100.00));
    assert_eq!(payment.delivery_verified, DeliveryVerified::Yes);

    // Now fully verified, so further edits are refused and release works.
    let result = ctx
        .services
        .payments
        .edit_amount(
            payment_id,
            EditPaymentAmount {
                amount: dec!(1000.00),
                adjustment_reason: "second thoughts".to_string(),
                delivery_verified: None,
                expected_version: None,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::InvalidState(_)));
    let released = ctx
        .services
        .payments
        .release(payment_id, "UTR-2026-0004", None)
        .await
        .unwrap();
    assert_eq!(released.invoice_amount, dec!(1100.00));
}

#[tokio::test]
async fn stale_version_is_rejected() {
    let ctx = setup().await;
    let p = pipeline(&ctx, 60).await;
    receive(&ctx, &p, 55).await;
    let payment_id = approved_payment(&ctx, &p).await;
    let current = ctx.services.payments.get(payment_id).await.unwrap();

    let result = ctx
        .services
        .payments
        .edit_amount(
            payment_id,
            EditPaymentAmount {
                amount: dec!(900.00),
                adjustment_reason: "stale edit".to_string(),
                delivery_verified: None,
                expected_version: Some(current.version + 1),
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::ConcurrentModification(id)) if id == payment_id);
}

#[tokio::test]
async fn release_commits_even_when_the_event_channel_is_closed() {
    let mut ctx = setup().await;
    let p = pipeline(&ctx, 5).await;
    receive(&ctx, &p, 5).await;
    let payment_id = approved_payment(&ctx, &p).await;

    close_events(&mut ctx);
    let released = ctx
        .services
        .payments
        .release(payment_id, "UTR-2026-0005", None)
        .await
        .unwrap();
    assert_eq!(released.status, PaymentStatus::Released);
    let invoice = ctx.services.invoices.get(p.invoice_id).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn bulk_release_skips_ineligible_payments() {
    let ctx = setup().await;
    let verified = pipeline(&ctx, 10).await;
    receive(&ctx, &verified, 10).await;
    let ok_payment = approved_payment(&ctx, &verified).await;

    let short = pipeline(&ctx, 10).await;
    receive(&ctx, &short, 8).await;
    let blocked_payment = approved_payment(&ctx, &short).await;

    let entries = ctx
        .services
        .payments
        .bulk_release(vec![ok_payment, blocked_payment], "UTR-BULK-1")
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    let ok = entries.iter().find(|e| e.payment_id == ok_payment).unwrap();
    assert!(ok.released);
    let blocked = entries
        .iter()
        .find(|e| e.payment_id == blocked_payment)
        .unwrap();
    assert!(!blocked.released);
    assert!(blocked.skip_reason.is_some());

    // The eligible one actually went through.
    let released = ctx.services.payments.get(ok_payment).await.unwrap();
    assert_eq!(released.status, PaymentStatus::Released);
}
