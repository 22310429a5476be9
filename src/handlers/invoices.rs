use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{map_service_error, success_response, validate_input};
use crate::{errors::ApiError, handlers::AppState};

/// Attachment upload request. The document travels as an opaque byte string;
/// the blob store hands back the reference recorded on the invoice.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UploadAttachmentRequest {
    #[validate(length(min = 1))]
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectInvoiceRequest {
    #[validate(length(min = 1, message = "Rejection reason is required"))]
    pub reason: String,
}

/// Get an invoice by ID
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice fetched"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let invoice = state
        .services
        .invoices
        .get(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

/// Get the invoice's attachment slots, including vendor visibility
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/attachments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses((status = 200, description = "Attachment view fetched")),
    tag = "invoices"
)]
pub async fn get_attachments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let view = state
        .services
        .invoices
        .attachment_view(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(view))
}

/// Vendor uploads their invoice document
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/attachments/vendor",
    request_body = UploadAttachmentRequest,
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Document stored"),
        (status = 409, description = "Invoice can no longer change", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn upload_vendor_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadAttachmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let invoice = state
        .services
        .invoices
        .upload_vendor_attachment(id, &payload.file_name, payload.content.into_bytes())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

/// Accounts uploads their copy of the invoice document
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/attachments/accounts",
    request_body = UploadAttachmentRequest,
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses((status = 200, description = "Document stored")),
    tag = "invoices"
)]
pub async fn upload_accounts_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadAttachmentRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let invoice = state
        .services
        .invoices
        .upload_accounts_attachment(id, &payload.file_name, payload.content.into_bytes())
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

/// Approve the invoice and open its payment
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/approve",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice approved, payment opened"),
        (status = 400, description = "Vendor document missing", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice not pending verification", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn approve_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (invoice, payment) = state
        .services
        .invoices
        .approve(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(serde_json::json!({
        "invoice": invoice,
        "payment": payment,
    })))
}

/// Reject the invoice back to the vendor
#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/reject",
    request_body = RejectInvoiceRequest,
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice rejected"),
        (status = 409, description = "Invoice not pending verification", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn reject_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectInvoiceRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let invoice = state
        .services
        .invoices
        .reject(id, &payload.reason)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(invoice))
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_invoice))
        .route("/:id/attachments", get(get_attachments))
        .route("/:id/attachments/vendor", post(upload_vendor_attachment))
        .route("/:id/attachments/accounts", post(upload_accounts_attachment))
        .route("/:id/approve", post(approve_invoice))
        .route("/:id/reject", post(reject_invoice))
}
