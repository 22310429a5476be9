use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Failures surfaced by the lifecycle services.
///
/// Every variant is a local, synchronous failure carrying enough detail for a
/// specific user-facing message. Nothing here is retried internally; callers
/// re-fetch and re-attempt if they want to.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Assignment {0} has already been decided")]
    AlreadyDecided(Uuid),

    #[error("Ineligible assignment: {0}")]
    IneligibleAssignment(String),

    #[error("Delivery not verified for payment {0}")]
    DeliveryNotVerified(Uuid),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidState(_) | Self::AlreadyDecided(_) | Self::ConcurrentModification(_) => {
                StatusCode::CONFLICT
            }
            Self::IneligibleAssignment(_) | Self::DeliveryNotVerified(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors are replaced with
    /// generic text so implementation details do not leak.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(err)).into_response()
    }
}

/// API error type for HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(err) => err.into_response(),
            ApiError::ValidationError(msg) => {
                let err = ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                (StatusCode::BAD_REQUEST, Json(err)).into_response()
            }
            ApiError::NotFound(msg) => {
                let err = ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                (StatusCode::NOT_FOUND, Json(err)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_errors_map_to_conflict() {
        let id = Uuid::new_v4();
        assert_eq!(
            ServiceError::AlreadyDecided(id).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::ConcurrentModification(id).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InvalidState("released".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn gating_errors_map_to_unprocessable() {
        let id = Uuid::new_v4();
        assert_eq!(
            ServiceError::DeliveryNotVerified(id).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::IneligibleAssignment("pending".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn database_errors_do_not_leak_details() {
        let err = ServiceError::DatabaseError(DbErr::Custom("secret dsn".into()));
        assert_eq!(err.response_message(), "Database error");
    }
}
