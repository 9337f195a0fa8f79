//! HTTP route handlers for the API server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (storage reachable)
//!
//! # Public catalog
//! GET  /items                   - List the catalog
//! GET  /items/{id}              - Fetch one item
//!
//! # User accounts
//! POST /user/signup             - Register {user, password}
//! POST /user/login              - Login -> {auth_token}
//! GET  /user/{id}               - Account view          (auth)
//! PUT  /user/{id}               - Change username       (auth)
//! GET  /user/{id}/items         - Cart view with total  (auth)
//! POST /user/{id}/items         - Add {item_id} to cart (auth)
//! DELETE /user/{id}/items       - Remove {item_id}      (auth)
//! POST /user/{id}/checkout      - Cart -> pending order (auth)
//! GET  /user/{id}/orders        - Order history         (auth)
//!
//! # Admin
//! POST /admin/login             - Login -> {auth_token}
//! GET/PUT /admin/{id}           - Account view / rename      (admin auth)
//! GET  /admin/{id}/dash         - Dashboard aggregate        (admin auth)
//! GET/POST/DELETE /admin/{id}/admins  - Manage admins        (admin auth)
//! GET/POST/DELETE /admin/{id}/users   - Manage users         (admin auth)
//! GET/POST/DELETE /admin/{id}/items   - Manage catalog       (admin auth)
//! GET/PUT /admin/{id}/items/{item_id} - Fetch/replace item   (admin auth)
//! GET/POST/DELETE /admin/{id}/orders  - Manage orders        (admin auth)
//! GET/PUT /admin/{id}/orders/{order_id} - Fetch/update order (admin auth)
//! ```
//!
//! A bearer token only opens the routes whose `{id}` equals its subject
//! claim; see [`crate::middleware::auth`].

pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::user_signup))
        .route("/login", post(auth::user_login))
        .route("/{id}", get(account::profile).put(account::update))
        .route(
            "/{id}/items",
            get(account::cart)
                .post(account::add_item)
                .delete(account::remove_item),
        )
        .route("/{id}/checkout", post(account::checkout))
        .route("/{id}/orders", get(account::orders))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::admin_login))
        .route("/{id}", get(admin::profile).put(admin::update))
        .route("/{id}/dash", get(admin::dashboard))
        .route(
            "/{id}/admins",
            get(admin::list_admins)
                .post(admin::create_admin)
                .delete(admin::delete_admin),
        )
        .route(
            "/{id}/users",
            get(admin::list_users)
                .post(admin::create_user)
                .delete(admin::delete_user),
        )
        .route(
            "/{id}/items",
            get(admin::list_items)
                .post(admin::create_item)
                .delete(admin::delete_item),
        )
        .route(
            "/{id}/items/{item_id}",
            get(admin::get_item).put(admin::update_item),
        )
        .route(
            "/{id}/orders",
            get(admin::list_orders)
                .post(admin::create_order)
                .delete(admin::delete_order),
        )
        .route(
            "/{id}/orders/{order_id}",
            get(admin::get_order).put(admin::update_order),
        )
}

/// Create all routes for the API server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        // Public catalog
        .route("/items", get(catalog::list_items))
        .route("/items/{id}", get(catalog::get_item))
        // User routes
        .nest("/user", user_routes())
        // Admin routes
        .nest("/admin", admin_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies storage connectivity before returning OK.
/// Returns 503 Service Unavailable if the backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.storage().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
