//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::{FulfillmentError, ValidationError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Malformed request from the client.
    BadRequest(String),
    /// Well-formed request that cannot be processed.
    Unprocessable(String),
    /// Order creation or lookup error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    let status = match &err {
        FulfillmentError::Validation(ValidationError::BasketNotFound(_)) => StatusCode::NOT_FOUND,
        FulfillmentError::Validation(
            ValidationError::EmptyBasket(_)
            | ValidationError::InvalidQuantity { .. }
            | ValidationError::TotalOverflow(_),
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        // Basket and catalog disagree; nothing the caller can fix.
        FulfillmentError::Validation(ValidationError::CatalogItemMissing { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        FulfillmentError::Lookup(_) | FulfillmentError::Persistence(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        FulfillmentError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, err.to_string())
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
