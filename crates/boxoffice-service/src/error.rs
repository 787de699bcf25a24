//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use boxoffice_core::CoreError;
use boxoffice_store::StoreError;

use crate::chapa::ChapaError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - invalid state for the requested operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Opening a checkout session failed.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] ChapaError),

    /// Internal server error. `public` is sent to the caller, `detail` is logged.
    #[error("internal error: {detail}")]
    Internal {
        /// Message returned in the response body.
        public: String,
        /// Logged, never returned.
        detail: String,
    },
}

impl ApiError {
    /// Internal error with the generic public message.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            public: "An internal error occurred".into(),
            detail: detail.into(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Gateway(err) => {
                tracing::error!(error = %err, "Payment gateway call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to initiate payment".to_string(),
                )
            }
            Self::Internal { public, detail } => {
                tracing::error!(error = %detail, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, public)
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) | StoreError::Corrupt(msg) => Self::internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::BadRequest(msg),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err: ApiError = CoreError::Validation("Quantity/Amount must be greater than zero".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_status() {
        let not_found: ApiError = StoreError::NotFound {
            entity: "reservation",
            id: "9".into(),
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let db: ApiError = StoreError::Database("connection reset".into()).into();
        assert_eq!(db.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn gateway_errors_are_server_errors() {
        let err: ApiError = ChapaError::GatewayRejected {
            status: 401,
            message: "Invalid API Key".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
