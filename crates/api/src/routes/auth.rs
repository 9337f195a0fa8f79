//! Signup and login handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::{ApiJson, Result};
use crate::models::UserAccount;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Request body for signup and login.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    #[serde(rename = "user")]
    pub username: String,
    pub password: String,
}

/// Response carrying a freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

/// `POST /user/signup` - register a new user account.
///
/// The response is the created account; the password hash never leaves
/// the credential store.
///
/// # Errors
///
/// `400` for a malformed username or empty password, `409` if the
/// username is taken.
pub async fn user_signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<UserAccount>> {
    let auth = AuthService::new(state.storage(), state.tokens());
    let account = auth.signup_user(&body.username, &body.password).await?;
    Ok(Json(account))
}

/// `POST /user/login` - exchange credentials for a bearer token.
///
/// # Errors
///
/// `401 Invalid credentials` for a wrong username or password.
pub async fn user_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.storage(), state.tokens());
    let auth_token = auth.login_user(&body.username, &body.password).await?;
    Ok(Json(LoginResponse { auth_token }))
}

/// `POST /admin/login` - exchange admin credentials for a bearer token.
///
/// # Errors
///
/// `401 Invalid credentials` for a wrong username or password.
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.storage(), state.tokens());
    let auth_token = auth.login_admin(&body.username, &body.password).await?;
    Ok(Json(LoginResponse { auth_token }))
}
