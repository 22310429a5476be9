use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    entities::{dispatch, dispatch_line},
    errors::ApiError,
    handlers::AppState,
    services::dispatches::{CreateDispatch, DispatchLineInput},
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct DispatchLineRequest {
    pub purchase_order_line_id: Uuid,
    #[validate(range(min = 1))]
    pub dispatched_qty: i32,
}

/// Dispatch creation request. Leave the carrier fields out for a local
/// hand-delivery; the record then carries the local-porter markers.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchRequest {
    pub purchase_order_id: Uuid,
    #[validate(length(min = 1))]
    pub lines: Vec<DispatchLineRequest>,
    pub awb_number: Option<String>,
    pub logistics_partner: Option<String>,
    pub dispatch_date: Option<DateTime<Utc>>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub dispatch: dispatch::Model,
    pub lines: Vec<dispatch_line::Model>,
}

/// Record a vendor shipment against a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/dispatches",
    request_body = CreateDispatchRequest,
    responses(
        (status = 201, description = "Dispatch recorded"),
        (status = 400, description = "Quantity exceeds the confirmed quantity", body = crate::errors::ErrorResponse),
        (status = 409, description = "Purchase order not generated", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatches"
)]
pub async fn create_dispatch(
    State(state): State<AppState>,
    Json(payload): Json<CreateDispatchRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let (dispatch, lines) = state
        .services
        .dispatches
        .create_dispatch(CreateDispatch {
            purchase_order_id: payload.purchase_order_id,
            lines: payload
                .lines
                .iter()
                .map(|l| DispatchLineInput {
                    purchase_order_line_id: l.purchase_order_line_id,
                    dispatched_qty: l.dispatched_qty,
                })
                .collect(),
            awb_number: payload.awb_number,
            logistics_partner: payload.logistics_partner,
            dispatch_date: payload.dispatch_date,
            estimated_delivery_date: payload.estimated_delivery_date,
        })
        .await
        .map_err(map_service_error)?;
    Ok(created_response(DispatchResponse { dispatch, lines }))
}

/// Get a dispatch with its lines
#[utoipa::path(
    get,
    path = "/api/v1/dispatches/{id}",
    params(("id" = Uuid, Path, description = "Dispatch ID")),
    responses(
        (status = 200, description = "Dispatch fetched"),
        (status = 404, description = "Dispatch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "dispatches"
)]
pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (dispatch, lines) = state
        .services
        .dispatches
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(DispatchResponse { dispatch, lines }))
}

pub fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_dispatch))
        .route("/:id", get(get_dispatch))
}
