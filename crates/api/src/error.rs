//! Unified error handling for the API.
//!
//! Every route handler returns `Result<T, ApiError>`. The taxonomy maps
//! onto HTTP as:
//!
//! - `Validation` -> 400 (malformed JSON, bad path id, invalid field)
//! - `Unauthorized` / `InvalidCredentials` -> 401
//! - `NotFound` -> 404, keeping the descriptive message
//! - `Conflict` -> 409 (duplicate username)
//! - `Internal` -> 500, logged; the client sees a generic message
//!
//! All error responses share one envelope: `{"error": "<message>"}`.
//! The 401 message for token/auth-middleware failures is always exactly
//! `Unauthorized` so callers cannot tell which check failed.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::db::StorageError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;

/// Wire-format error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Application-level error type for the API server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request: bad JSON, bad path id, invalid field value.
    #[error("{0}")]
    Validation(String),

    /// Auth middleware failure. The message never says which check failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login failure. Does not distinguish unknown account from wrong
    /// password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Resource not found; the message names it (`Account 42 not found`).
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness conflict.
    #[error("{0}")]
    Conflict(String),

    /// Internal failure. Logged; never detailed to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request error");
        }

        // Don't expose internal error details to clients
        let message = match self {
            Self::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AccountNotFound(_)
            | StorageError::ItemNotFound(_)
            | StorageError::OrderNotFound(_) => Self::NotFound(e.to_string()),
            StorageError::DuplicateUsername(_) => Self::Conflict(e.to_string()),
            StorageError::EmptyCart => Self::Validation(e.to_string()),
            StorageError::Database(_) | StorageError::DataCorruption(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::UsernameTaken => Self::Conflict(e.to_string()),
            AuthError::InvalidUsername(_) | AuthError::EmptyPassword => {
                Self::Validation(e.to_string())
            }
            AuthError::PasswordHash | AuthError::Token(_) | AuthError::Storage(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound(_) | CartError::AccountNotFound(_) => {
                Self::NotFound(e.to_string())
            }
            CartError::EmptyCart => Self::Validation(e.to_string()),
            CartError::Storage(inner) => inner.into(),
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Parse a numeric id from a raw path segment.
///
/// # Errors
///
/// Returns `ApiError::Validation` with the offending segment quoted,
/// e.g. `Invalid id: "abc"`.
pub fn parse_path_id(raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::Validation(format!("Invalid id: \"{raw}\"")))
}

/// JSON body extractor whose rejection uses the API error envelope.
///
/// Request bodies deny unknown fields, so a decoding failure here covers
/// both malformed JSON and unexpected keys.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Item 3 not found".to_string());
        assert_eq!(err.to_string(), "Item 3 not found");

        let err = ApiError::Unauthorized;
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            status_of(ApiError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ApiError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_not_found_keeps_message() {
        let err: ApiError = StorageError::AccountNotFound(42).into();
        assert!(matches!(&err, ApiError::NotFound(msg) if msg == "Account 42 not found"));
    }

    #[test]
    fn test_parse_path_id() {
        assert_eq!(parse_path_id("42").unwrap(), 42);

        let err = parse_path_id("abc").unwrap_err();
        assert!(matches!(&err, ApiError::Validation(msg) if msg == "Invalid id: \"abc\""));
    }
}
