use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{
    entities::{payment, DeliveryVerified},
    errors::ApiError,
    handlers::AppState,
    services::payments::{
        display_status, BulkReleaseEntry, EditPaymentAmount, PaymentDisplayStatus,
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EditPaymentAmountRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Adjustment reason is required"))]
    pub adjustment_reason: String,
    pub delivery_verified: Option<DeliveryVerified>,
    pub expected_version: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReleasePaymentRequest {
    #[validate(length(min = 1, message = "Payment reference is required"))]
    pub reference_id: String,
    pub expected_version: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkReleaseRequest {
    #[validate(length(min = 1))]
    pub payment_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "Payment reference is required"))]
    pub reference_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkReleaseResponse {
    pub entries: Vec<BulkReleaseEntry>,
}

/// Payment as shown to accounts: the stored record plus the derived
/// display status (overdue pending payments surface as Overdue).
#[derive(Debug, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub display_status: PaymentDisplayStatus,
}

impl PaymentView {
    fn of(payment: payment::Model) -> Self {
        let display_status = display_status(&payment, Utc::now());
        Self {
            payment,
            display_status,
        }
    }
}

/// Get a payment by ID
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment fetched"),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let payment = state
        .services
        .payments
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaymentView::of(payment)))
}

/// Adjust the payable amount before release
#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}/amount",
    request_body = EditPaymentAmountRequest,
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Amount adjusted"),
        (status = 409, description = "Payment released, fully verified, or concurrently modified", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn edit_payment_amount(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditPaymentAmountRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let payment = state
        .services
        .payments
        .edit_amount(
            id,
            EditPaymentAmount {
                amount: payload.amount,
                adjustment_reason: payload.adjustment_reason,
                delivery_verified: payload.delivery_verified,
                expected_version: payload.expected_version,
            },
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaymentView::of(payment)))
}

/// Release funds for one payment
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/release",
    request_body = ReleasePaymentRequest,
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment released"),
        (status = 422, description = "Delivery not fully verified", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already released or concurrently modified", body = crate::errors::ErrorResponse)
    ),
    tag = "payments"
)]
pub async fn release_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReleasePaymentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let payment = state
        .services
        .payments
        .release(id, &payload.reference_id, payload.expected_version)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaymentView::of(payment)))
}

/// Release a batch of payments under one reference
#[utoipa::path(
    post,
    path = "/api/v1/payments/bulk-release",
    request_body = BulkReleaseRequest,
    responses((status = 200, description = "Per-payment outcomes", body = BulkReleaseResponse)),
    tag = "payments"
)]
pub async fn bulk_release(
    State(state): State<AppState>,
    Json(payload): Json<BulkReleaseRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let entries = state
        .services
        .payments
        .bulk_release(payload.payment_ids, &payload.reference_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(BulkReleaseResponse { entries }))
}

/// List a vendor's payments with derived display statuses
#[utoipa::path(
    get,
    path = "/api/v1/payments/vendor/{vendor_id}",
    params(
        ("vendor_id" = Uuid, Path, description = "Vendor ID"),
        PaginationParams
    ),
    responses((status = 200, description = "Payments fetched")),
    tag = "payments"
)]
pub async fn list_vendor_payments(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let payments = state
        .services
        .payments
        .list_by_vendor(vendor_id)
        .await
        .map_err(map_service_error)?;
    let views: Vec<PaymentView> = pagination
        .slice(payments)
        .into_iter()
        .map(PaymentView::of)
        .collect();
    Ok(success_response(views))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/bulk-release", post(bulk_release))
        .route("/:id", get(get_payment))
        .route("/:id/amount", put(edit_payment_amount))
        .route("/:id/release", post(release_payment))
        .route("/vendor/:vendor_id", get(list_vendor_payments))
}
