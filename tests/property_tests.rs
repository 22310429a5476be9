//! Property-based tests for the lifecycle's pure decision logic.
//!
//! These exercise the quantity arithmetic, receipt classification, and
//! release gating across a wide range of inputs.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use vendordesk_api::entities::{
    assignment::{AssignmentStatus, DeclineReason},
    payment, DeliveryVerified, GoodsReceiptLineStatus, GoodsReceiptStatus, PaymentStatus,
};
use vendordesk_api::services::{
    assignments::{apply_decision, VendorDecision},
    goods_receipts::{aggregate_receipt_status, classify_receipt_line, delivery_verification},
    payments::{display_status, release_eligible, PaymentDisplayStatus},
};

fn decline_reason_strategy() -> impl Strategy<Value = DeclineReason> {
    prop_oneof![
        Just(DeclineReason::StockUnavailable),
        Just(DeclineReason::QualityIssue),
        Just(DeclineReason::PriceMismatch),
        Just(DeclineReason::LateDelivery),
    ]
}

fn decision_strategy() -> impl Strategy<Value = VendorDecision> {
    prop_oneof![
        Just(VendorDecision::Full),
        (1i32..10_000).prop_map(|available_qty| VendorDecision::Partial { available_qty }),
        decline_reason_strategy().prop_map(|reason| VendorDecision::Decline { reason }),
    ]
}

fn delivery_strategy() -> impl Strategy<Value = DeliveryVerified> {
    prop_oneof![
        Just(DeliveryVerified::Yes),
        Just(DeliveryVerified::No),
        Just(DeliveryVerified::Partial),
    ]
}

fn payment_strategy() -> impl Strategy<Value = payment::Model> {
    (
        delivery_strategy(),
        prop_oneof![Just(PaymentStatus::Pending), Just(PaymentStatus::Released)],
        -365i64..365,
    )
        .prop_map(|(delivery_verified, status, due_offset_days)| {
            let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
            payment::Model {
                id: Uuid::new_v4(),
                invoice_id: Uuid::new_v4(),
                purchase_order_id: Uuid::new_v4(),
                vendor_id: Uuid::new_v4(),
                invoice_amount: Decimal::new(10_000, 2),
                delivery_verified,
                status,
                due_date: created_at + Duration::days(due_offset_days),
                release_date: None,
                reference_id: None,
                adjustment_reason: None,
                created_at,
                updated_at: None,
                version: 0,
            }
        })
}

// Property: every accepted decision conserves the requested quantity.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn accepted_decisions_conserve_quantity(
        requested in 1i32..10_000,
        decision in decision_strategy(),
    ) {
        if let Ok(outcome) = apply_decision(requested, decision) {
            prop_assert_eq!(outcome.confirmed_qty + outcome.backorder_qty, requested);
            prop_assert!(outcome.confirmed_qty >= 0);
            prop_assert!(outcome.backorder_qty >= 0);
        }
    }

    #[test]
    fn decision_status_matches_the_quantities(
        requested in 1i32..10_000,
        decision in decision_strategy(),
    ) {
        if let Ok(outcome) = apply_decision(requested, decision) {
            match outcome.status {
                AssignmentStatus::Confirmed => prop_assert_eq!(outcome.confirmed_qty, requested),
                AssignmentStatus::PartiallyConfirmed => {
                    prop_assert!(outcome.confirmed_qty > 0 && outcome.confirmed_qty < requested)
                }
                AssignmentStatus::Declined | AssignmentStatus::NotAvailable => {
                    prop_assert_eq!(outcome.confirmed_qty, 0)
                }
                AssignmentStatus::Pending => prop_assert!(false, "a decision never yields Pending"),
            }
        }
    }

    #[test]
    fn decline_reason_is_recorded_iff_declined(
        requested in 1i32..10_000,
        reason in decline_reason_strategy(),
    ) {
        let outcome = apply_decision(requested, VendorDecision::Decline { reason }).unwrap();
        match outcome.status {
            AssignmentStatus::Declined => prop_assert!(outcome.decline_reason.is_some()),
            AssignmentStatus::NotAvailable => prop_assert!(outcome.decline_reason.is_none()),
            _ => prop_assert!(false, "declines only yield Declined or NotAvailable"),
        }
    }
}

// Property: receipt classification is total and the discrepancy sign drives
// the status.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn classification_follows_the_discrepancy_sign(
        dispatched in 1i32..10_000,
        received in 0i32..12_000,
        damage in any::<bool>(),
    ) {
        let (discrepancy, status) = classify_receipt_line(dispatched, received, damage);
        prop_assert_eq!(discrepancy, received - dispatched);
        if damage {
            prop_assert_eq!(status, GoodsReceiptLineStatus::DamageReported);
        } else if discrepancy < 0 {
            prop_assert_eq!(status, GoodsReceiptLineStatus::ShortageReported);
        } else if discrepancy > 0 {
            prop_assert_eq!(status, GoodsReceiptLineStatus::ExcessReceived);
        } else {
            prop_assert_eq!(status, GoodsReceiptLineStatus::Ok);
        }
    }

    #[test]
    fn aggregate_is_ok_iff_every_line_is_ok(
        lines in prop::collection::vec(
            prop_oneof![
                Just(GoodsReceiptLineStatus::Ok),
                Just(GoodsReceiptLineStatus::ShortageReported),
                Just(GoodsReceiptLineStatus::DamageReported),
                Just(GoodsReceiptLineStatus::ExcessReceived),
            ],
            1..20,
        ),
    ) {
        let aggregate = aggregate_receipt_status(&lines);
        let all_ok = lines.iter().all(|s| *s == GoodsReceiptLineStatus::Ok);
        let none_ok = lines.iter().all(|s| *s != GoodsReceiptLineStatus::Ok);
        match aggregate {
            GoodsReceiptStatus::VerifiedOk => prop_assert!(all_ok),
            GoodsReceiptStatus::VerifiedMismatch => prop_assert!(none_ok),
            GoodsReceiptStatus::PartiallyVerified => prop_assert!(!all_ok && !none_ok),
            GoodsReceiptStatus::PendingVerification => prop_assert!(false, "non-empty receipts resolve"),
        }

        // Funds may only move when every line verified clean.
        let verified = delivery_verification(aggregate);
        prop_assert_eq!(verified == DeliveryVerified::Yes, all_ok);
    }
}

// Property: release gating and the derived display status.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn funds_never_move_without_full_verification(p in payment_strategy()) {
        let eligible = release_eligible(&p).is_ok();
        prop_assert_eq!(
            eligible,
            p.status == PaymentStatus::Pending && p.delivery_verified == DeliveryVerified::Yes
        );
    }

    #[test]
    fn overdue_is_derived_only_for_pending_past_due(
        p in payment_strategy(),
        now_offset_days in -365i64..365,
    ) {
        let now = p.created_at + Duration::days(now_offset_days);
        let display = display_status(&p, now);
        match display {
            PaymentDisplayStatus::Released => prop_assert_eq!(p.status, PaymentStatus::Released),
            PaymentDisplayStatus::Overdue => {
                prop_assert_eq!(p.status, PaymentStatus::Pending);
                prop_assert!(now > p.due_date);
            }
            PaymentDisplayStatus::Pending => {
                prop_assert_eq!(p.status, PaymentStatus::Pending);
                prop_assert!(now <= p.due_date);
            }
        }
    }
}
