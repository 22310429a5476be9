use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    entities::{goods_receipt, goods_receipt_line},
    errors::ApiError,
    handlers::AppState,
    services::goods_receipts::GrnItemInput,
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GrnItemRequest {
    pub dispatch_line_id: Uuid,
    #[validate(range(min = 0))]
    pub received_qty: i32,
    #[serde(default)]
    pub damage_reported: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordGrnRequest {
    pub dispatch_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<GrnItemRequest>,
}

#[derive(Debug, Serialize)]
pub struct GrnResponse {
    pub goods_receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
}

/// Record the verified receipt of a dispatch
#[utoipa::path(
    post,
    path = "/api/v1/goods-receipts",
    request_body = RecordGrnRequest,
    responses(
        (status = 201, description = "Goods receipt recorded"),
        (status = 400, description = "Receipt does not cover every dispatched line", body = crate::errors::ErrorResponse),
        (status = 409, description = "Dispatch already verified", body = crate::errors::ErrorResponse)
    ),
    tag = "goods-receipts"
)]
pub async fn record_grn(
    State(state): State<AppState>,
    Json(payload): Json<RecordGrnRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (goods_receipt, lines) = state
        .services
        .goods_receipts
        .record_grn(
            payload.dispatch_id,
            payload
                .items
                .iter()
                .map(|i| GrnItemInput {
                    dispatch_line_id: i.dispatch_line_id,
                    received_qty: i.received_qty,
                    damage_reported: i.damage_reported,
                })
                .collect(),
        )
        .await
        .map_err(map_service_error)?;
    Ok(created_response(GrnResponse {
        goods_receipt,
        lines,
    }))
}

/// Get a goods receipt with its lines
#[utoipa::path(
    get,
    path = "/api/v1/goods-receipts/{id}",
    params(("id" = Uuid, Path, description = "Goods receipt ID")),
    responses(
        (status = 200, description = "Goods receipt fetched"),
        (status = 404, description = "Goods receipt not found", body = crate::errors::ErrorResponse)
    ),
    tag = "goods-receipts"
)]
pub async fn get_grn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (goods_receipt, lines) = state
        .services
        .goods_receipts
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(GrnResponse {
        goods_receipt,
        lines,
    }))
}

pub fn goods_receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(record_grn))
        .route("/:id", get(get_grn))
}
