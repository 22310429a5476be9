use std::str::FromStr;

use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{entities::assignment::DeclineReason, errors::ApiError, handlers::AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentRequest {
    pub order_item_id: Uuid,
    pub vendor_id: Uuid,
}

/// Confirmation request. Omitting `available_qty` confirms the full
/// requested quantity; supplying it confirms partially.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmAssignmentRequest {
    #[validate(range(min = 1))]
    pub available_qty: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeclineAssignmentRequest {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReassignRequest {
    pub vendor_id: Uuid,
}

/// Assign an order item to a vendor
#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created"),
        (status = 404, description = "Order item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item already has an undecided assignment", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let assignment = state
        .services
        .assignments
        .create_assignment(payload.order_item_id, payload.vendor_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(assignment))
}

/// Get an assignment by ID
#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment fetched"),
        (status = 404, description = "Assignment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let assignment = state
        .services
        .assignments
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(assignment))
}

/// Vendor confirms an assignment, fully or partially
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/confirm",
    request_body = ConfirmAssignmentRequest,
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment confirmed"),
        (status = 409, description = "Assignment already decided", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn confirm_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmAssignmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let assignment = match payload.available_qty {
        Some(qty) => state.services.assignments.confirm_partial(id, qty).await,
        None => state.services.assignments.confirm_full(id).await,
    }
    .map_err(map_service_error)?;
    Ok(success_response(assignment))
}

/// Vendor declines an assignment with a reason
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/decline",
    request_body = DeclineAssignmentRequest,
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment declined"),
        (status = 400, description = "Unknown decline reason", body = crate::errors::ErrorResponse),
        (status = 409, description = "Assignment already decided", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn decline_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeclineAssignmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let reason = DeclineReason::from_str(&payload.reason).map_err(|_| {
        ApiError::ValidationError(format!("Unknown decline reason: {}", payload.reason))
    })?;
    let assignment = state
        .services
        .assignments
        .decline(id, reason)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(assignment))
}

/// Reassign the unconfirmed remainder to another vendor
#[utoipa::path(
    post,
    path = "/api/v1/assignments/{id}/reassign",
    request_body = ReassignRequest,
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 201, description = "New assignment cycle created"),
        (status = 409, description = "Nothing left to reassign", body = crate::errors::ErrorResponse)
    ),
    tag = "assignments"
)]
pub async fn reassign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReassignRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let assignment = state
        .services
        .assignments
        .reassign(id, payload.vendor_id)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(assignment))
}

/// List a vendor's assignments
#[utoipa::path(
    get,
    path = "/api/v1/assignments/vendor/{vendor_id}",
    params(
        ("vendor_id" = Uuid, Path, description = "Vendor ID"),
        PaginationParams
    ),
    responses((status = 200, description = "Assignments fetched")),
    tag = "assignments"
)]
pub async fn list_vendor_assignments(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let assignments = state
        .services
        .assignments
        .list_for_vendor(vendor_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(pagination.slice(assignments)))
}

pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_assignment))
        .route("/:id", get(get_assignment))
        .route("/:id/confirm", post(confirm_assignment))
        .route("/:id/decline", post(decline_assignment))
        .route("/:id/reassign", post(reassign))
        .route("/vendor/:vendor_id", get(list_vendor_assignments))
}
