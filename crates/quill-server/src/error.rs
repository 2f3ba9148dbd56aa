//! Handler-boundary errors and their HTTP mapping.

use crate::render::found;
use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use quill_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
///
/// Validation failures never reach this type: handlers re-render the form
/// themselves.
#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated principal; redirect to the login page
    #[error("Authentication required")]
    Unauthenticated {
        /// Login URL including the `next` parameter
        location: String,
    },

    /// Credentials were presented but rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Principal does not own the target article
    #[error("Forbidden")]
    Forbidden,

    /// Target article does not exist
    #[error("Not found")]
    NotFound,

    /// Anything else; details are logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated { location } => return found(location),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(ErrorResponse {
            error: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        if e.is_not_found() {
            AppError::NotFound
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::JwtEncode(err) => AppError::Internal(err.to_string()),
            _ => AppError::InvalidCredentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use quill_domain::ArticleId;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthenticated_redirects() {
        let response = AppError::Unauthenticated {
            location: "/login?next=%2Farticles".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?next=%2Farticles"
        );
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: AppError = StoreError::ArticleNotFound(ArticleId::from_value(1)).into();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn test_store_failures_map_to_500() {
        let err: AppError = StoreError::InvalidData("empty author".to_string()).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
