//! Minimart API library.
//!
//! This crate provides the API server as a library, allowing it to be
//! tested in-process and reused. The binary in `main.rs` wires the
//! `PostgreSQL` backend; tests build the same router over the in-memory
//! backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the complete application router over the given state.
///
/// Every request gets a `tower-http` trace span (method, path, status,
/// latency).
#[must_use]
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
