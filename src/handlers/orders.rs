use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState, services::order_status::OrderLifecycleStatus};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusResponse {
    pub order_id: Uuid,
    pub status: OrderLifecycleStatus,
}

/// Derive an order's lifecycle status from its sub-entities
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Derived status", body = OrderStatusResponse),
        (status = 404, description = "No assignments recorded for the order", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let status = state
        .services
        .order_status
        .derive(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(OrderStatusResponse {
        order_id: id,
        status,
    }))
}

pub fn order_routes() -> Router<AppState> {
    Router::new().route("/:id/status", get(get_order_status))
}
