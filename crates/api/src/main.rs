//! Minimart API - e-commerce backend.
//!
//! Serves accounts (admin/user), the product catalog, per-user carts,
//! and order checkout behind bearer-token authentication.
//!
//! # Architecture
//!
//! - Axum web framework, JSON request/response bodies
//! - `PostgreSQL` via sqlx for accounts, catalog, and orders
//! - Argon2id password hashes, HS256 bearer tokens (24h TTL)
//!
//! Startup initializes the schema and seeds the bootstrap admin account
//! from configuration, then serves until ctrl-c/SIGTERM.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use minimart_api::config::ApiConfig;
use minimart_api::db::{self, PostgresStorage, Storage};
use minimart_api::services::auth::{self, TokenIssuer};
use minimart_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "minimart_api=info,tower_http=debug".into());

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // Initialize schema and seed the bootstrap admin
    let storage = Arc::new(PostgresStorage::new(pool));
    let root_password_hash = {
        use secrecy::ExposeSecret;
        auth::hash_password(config.root_admin.password.expose_secret())
            .expect("Failed to hash bootstrap admin password")
    };
    storage
        .init(&config.root_admin.username, &root_password_hash)
        .await
        .expect("Failed to initialize storage");
    tracing::info!("Storage initialized");

    // Build application state
    let tokens = TokenIssuer::new(&config.jwt_secret).expect("Failed to create token issuer");
    let state = AppState::new(storage, tokens);

    let app = minimart_api::app(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("minimart-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
