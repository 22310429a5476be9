use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{
    errors::ApiError, handlers::AppState, services::purchase_orders::BulkGenerateEntry,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GeneratePoRequest {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkGeneratePoRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkGeneratePoResponse {
    pub entries: Vec<BulkGenerateEntry>,
}

/// Generate the purchase order for one (order, vendor) pair
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/generate",
    request_body = GeneratePoRequest,
    responses(
        (status = 201, description = "Purchase order generated"),
        (status = 200, description = "Purchase order already existed"),
        (status = 422, description = "Assignments not eligible", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn generate_po(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePoRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let generated = state
        .services
        .purchase_orders
        .generate_po(payload.order_id, payload.vendor_id)
        .await
        .map_err(map_service_error)?;
    if generated.newly_created {
        Ok(created_response(generated.po))
    } else {
        Ok(success_response(generated.po))
    }
}

/// Generate purchase orders for every vendor on a batch of orders
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/bulk-generate",
    request_body = BulkGeneratePoRequest,
    responses((status = 200, description = "Per-pair outcomes", body = BulkGeneratePoResponse)),
    tag = "purchase-orders"
)]
pub async fn bulk_generate_po(
    State(state): State<AppState>,
    Json(payload): Json<BulkGeneratePoRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let entries = state
        .services
        .purchase_orders
        .bulk_generate_po(payload.order_ids)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(BulkGeneratePoResponse { entries }))
}

/// Get a purchase order by ID
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order fetched"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_po(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let po = state
        .services
        .purchase_orders
        .get_po(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(po))
}

/// Get a purchase order's lines
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}/lines",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses((status = 200, description = "Lines fetched")),
    tag = "purchase-orders"
)]
pub async fn get_po_lines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let lines = state
        .services
        .purchase_orders
        .get_po_lines(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

/// List a vendor's purchase orders
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/vendor/{vendor_id}",
    params(
        ("vendor_id" = Uuid, Path, description = "Vendor ID"),
        PaginationParams
    ),
    responses((status = 200, description = "Purchase orders fetched")),
    tag = "purchase-orders"
)]
pub async fn list_vendor_pos(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let pos = state
        .services
        .purchase_orders
        .list_by_vendor(vendor_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(pagination.slice(pos)))
}

pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_po))
        .route("/bulk-generate", post(bulk_generate_po))
        .route("/:id", get(get_po))
        .route("/:id/lines", get(get_po_lines))
        .route("/vendor/:vendor_id", get(list_vendor_pos))
}
