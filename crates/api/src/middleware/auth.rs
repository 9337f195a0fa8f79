//! Bearer-token authentication extractors.
//!
//! A protected request passes through a fixed sequence of checks:
//!
//! 1. Extract the token from the `Authorization: Bearer <token>` header.
//! 2. Verify its signature and expiry (HS256 only).
//! 3. Parse the numeric `{id}` path segment; it must equal the token's
//!    subject claim - a token is scoped to exactly one account.
//! 4. Load the account of the expected kind. An absent account is
//!    `Unauthorized`, not `NotFound`, so existence is not leaked.
//! 5. Corroborate the live account's username against the token's
//!    username claim; a rename since issuance forces a re-login.
//!
//! Every failed check answers `401 {"error":"Unauthorized"}`, except a
//! malformed path id which is a plain `400`. Admin and user routes run
//! the identical sequence; only the account lookup differs.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequestParts, Path},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use minimart_core::{AdminId, UserId};

use crate::error::ErrorBody;
use crate::models::{AdminAccount, UserAccount};
use crate::services::auth::Claims;
use crate::state::AppState;

/// Extractor that requires a user token scoped to the `{id}` in the path.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(UserAuth(user): UserAuth) -> Json<UserAccount> {
///     Json(user)
/// }
/// ```
pub struct UserAuth(pub UserAccount);

/// Extractor that requires an admin token scoped to the `{id}` in the path.
pub struct AdminAuth(pub AdminAccount);

/// Rejection for failed authentication.
#[derive(Debug)]
pub enum AuthRejection {
    /// Any failed auth check. Deliberately message-free beyond the
    /// generic word, whatever the cause.
    Unauthorized,
    /// Malformed path id (not a numeric segment).
    BadRequest(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "Unauthorized".to_owned(),
                }),
            )
                .into_response(),
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for UserAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify_bearer(parts, state)?;
        let subject = path_subject(parts, state).await?;

        if claims.sub != subject {
            return Err(AuthRejection::Unauthorized);
        }

        let account = state
            .storage()
            .get_user(UserId::new(subject))
            .await
            .map_err(|_| AuthRejection::Unauthorized)?
            .ok_or(AuthRejection::Unauthorized)?;

        if account.username.as_str() != claims.username {
            return Err(AuthRejection::Unauthorized);
        }

        Ok(Self(account))
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify_bearer(parts, state)?;
        let subject = path_subject(parts, state).await?;

        if claims.sub != subject {
            return Err(AuthRejection::Unauthorized);
        }

        let account = state
            .storage()
            .get_admin(AdminId::new(subject))
            .await
            .map_err(|_| AuthRejection::Unauthorized)?
            .ok_or(AuthRejection::Unauthorized)?;

        if account.username.as_str() != claims.username {
            return Err(AuthRejection::Unauthorized);
        }

        Ok(Self(account))
    }
}

/// Extract and verify the bearer token from the `Authorization` header.
fn verify_bearer(parts: &Parts, state: &AppState) -> Result<Claims, AuthRejection> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthRejection::Unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthRejection::Unauthorized)?;

    state
        .tokens()
        .verify(token)
        .map_err(|_| AuthRejection::Unauthorized)
}

/// Parse the numeric `{id}` path segment the token must be scoped to.
async fn path_subject(parts: &mut Parts, state: &AppState) -> Result<i32, AuthRejection> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| AuthRejection::Unauthorized)?;

    let raw = params.get("id").ok_or(AuthRejection::Unauthorized)?;

    raw.parse::<i32>()
        .map_err(|_| AuthRejection::BadRequest(format!("Invalid id: \"{raw}\"")))
}
