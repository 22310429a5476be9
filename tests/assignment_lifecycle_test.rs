mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{drain_events, seed_order_item, setup};
use vendordesk_api::{
    entities::assignment::{AssignmentStatus, DeclineReason},
    errors::ServiceError,
    events::Event,
};

#[tokio::test]
async fn partial_confirmation_splits_and_reassigns_the_backorder() {
    let mut ctx = setup().await;
    let order_id = Uuid::new_v4();
    let item = seed_order_item(&ctx, order_id, "SKU-100", 100, dec!(25.00)).await;
    let vendor_a = Uuid::new_v4();
    let vendor_b = Uuid::new_v4();

    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, vendor_a)
        .await
        .unwrap();
    assert_eq!(a.status, AssignmentStatus::Pending);
    assert_eq!(a.requested_qty, 100);

    let a = ctx
        .services
        .assignments
        .confirm_partial(a.id, 60)
        .await
        .unwrap();
    assert_eq!(a.status, AssignmentStatus::PartiallyConfirmed);
    assert_eq!(a.confirmed_qty, 60);
    assert_eq!(a.backorder_qty, 40);
    assert_eq!(a.confirmed_qty + a.backorder_qty, a.requested_qty);

    // The backorder goes to another vendor as a fresh pending cycle.
    let b = ctx
        .services
        .assignments
        .reassign(a.id, vendor_b)
        .await
        .unwrap();
    assert_eq!(b.status, AssignmentStatus::Pending);
    assert_eq!(b.requested_qty, 40);
    assert_eq!(b.vendor_id, vendor_b);

    // The decided record is untouched.
    let a_again = ctx.services.assignments.get(a.id).await.unwrap();
    assert_eq!(a_again.status, AssignmentStatus::PartiallyConfirmed);
    assert_eq!(a_again.confirmed_qty, 60);

    let events = drain_events(&mut ctx);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AssignmentConfirmed { confirmed_qty: 60, .. })));
}

#[tokio::test]
async fn decisions_are_terminal() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-1", 10, dec!(5.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();

    ctx.services.assignments.confirm_full(a.id).await.unwrap();

    let second = ctx
        .services
        .assignments
        .decline(a.id, DeclineReason::QualityIssue)
        .await;
    assert_matches!(second, Err(ServiceError::AlreadyDecided(id)) if id == a.id);
    let third = ctx.services.assignments.confirm_full(a.id).await;
    assert_matches!(third, Err(ServiceError::AlreadyDecided(_)));
}

#[tokio::test]
async fn stock_unavailable_decline_resolves_to_not_available() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-2", 20, dec!(3.50)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();

    let a = ctx
        .services
        .assignments
        .decline(a.id, DeclineReason::StockUnavailable)
        .await
        .unwrap();
    assert_eq!(a.status, AssignmentStatus::NotAvailable);
    assert_eq!(a.decline_reason, None);
    assert_eq!(a.confirmed_qty, 0);
    assert_eq!(a.backorder_qty, 20);
}

#[tokio::test]
async fn other_declines_record_their_reason() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-3", 20, dec!(3.50)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();

    let a = ctx
        .services
        .assignments
        .decline(a.id, DeclineReason::PriceMismatch)
        .await
        .unwrap();
    assert_eq!(a.status, AssignmentStatus::Declined);
    assert_eq!(a.decline_reason, Some(DeclineReason::PriceMismatch));
}

#[tokio::test]
async fn only_one_undecided_assignment_per_item() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-4", 10, dec!(1.00)).await;
    ctx.services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();

    let second = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await;
    assert_matches!(second, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn fully_confirmed_assignment_has_nothing_to_reassign() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-5", 10, dec!(1.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();
    ctx.services.assignments.confirm_full(a.id).await.unwrap();

    let result = ctx.services.assignments.reassign(a.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn pending_assignment_cannot_be_reassigned() {
    let ctx = setup().await;
    let item = seed_order_item(&ctx, Uuid::new_v4(), "SKU-6", 10, dec!(1.00)).await;
    let a = ctx
        .services
        .assignments
        .create_assignment(item.id, Uuid::new_v4())
        .await
        .unwrap();

    let result = ctx.services.assignments.reassign(a.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::InvalidState(_)));
}
