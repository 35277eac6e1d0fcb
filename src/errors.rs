//! Service error types.
//!
//! Every variant maps to a fixed HTTP status and body.  The enum
//! implements [`axum::response::IntoResponse`] so handlers can simply
//! return `Err(ApiError::WrongPassword)`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::storage::store::StoreError;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Errors produced by request dispatch and the handlers behind it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Wrong or missing shared secret on a protected route.
    #[error("Wrong password")]
    WrongPassword,

    /// Unmatched route or missing static asset.
    #[error("Not found")]
    NotFound,

    /// Malformed or missing required field in a submitted record.
    #[error("{message}")]
    Validation { message: String },

    /// Failure from the object store.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Catch-all for unexpected internal errors.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Return the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::WrongPassword => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage and internal failures are logged with their cause and
        // surfaced as a generic message, never silently swallowed.
        let body = match &self {
            ApiError::Storage(e) => {
                error!("Store failure: {e:#}");
                "Internal server error".to_string()
            }
            ApiError::Internal(e) => {
                error!("Unhandled failure: {e:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, body).into_response()
    }
}

// -- Tests ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::WrongPassword.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation {
                message: "lat: missing".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Storage(StoreError::Backend(anyhow::anyhow!("throttled")))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Storage(StoreError::NotFound {
                key: "Red/Ann/location.json".into()
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_fixed_bodies() {
        assert_eq!(ApiError::WrongPassword.to_string(), "Wrong password");
        assert_eq!(ApiError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_uppercase());
    }
}
