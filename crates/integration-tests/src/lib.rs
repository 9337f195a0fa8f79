//! End-to-end tests for Minimart.
//!
//! Drives the full axum router in-process over the in-memory storage
//! backend: real routing, real middleware, real JSON bodies - no
//! network and no `PostgreSQL`.
//!
//! # Test Categories
//!
//! - `auth_flow` - signup/login, token verification, middleware checks
//! - `cart_checkout` - cart mutation, checkout, catalog deletion purge
//! - `admin_api` - admin management surface and the dashboard

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use minimart_api::db::{MemoryStorage, Storage};
use minimart_api::models::Item;
use minimart_api::services::auth::{TokenIssuer, hash_password};
use minimart_api::state::AppState;
use minimart_core::Username;

/// Signing secret shared by the app under test and token helpers.
pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";

/// Username of the seeded bootstrap admin (id 1).
pub const ROOT_USER: &str = "root";

/// Password of the seeded bootstrap admin.
pub const ROOT_PASS: &str = "root-password";

/// An in-process instance of the API over in-memory storage.
pub struct TestContext {
    pub app: Router,
    pub storage: Arc<MemoryStorage>,
}

impl TestContext {
    /// Build a fresh app with the bootstrap admin seeded.
    pub async fn new() -> Self {
        let storage = Arc::new(MemoryStorage::new());

        let root_hash = hash_password(ROOT_PASS).unwrap();
        storage
            .init(&Username::parse(ROOT_USER).unwrap(), &root_hash)
            .await
            .unwrap();

        let tokens = TokenIssuer::new(&SecretString::from(TEST_SECRET)).unwrap();
        let state = AppState::new(storage.clone(), tokens);

        Self {
            app: minimart_api::app(state),
            storage,
        }
    }

    /// Send one request; returns status and the decoded body.
    ///
    /// Non-JSON bodies come back as a JSON string value.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, Some(body)).await
    }

    // =========================================================================
    // Flow helpers
    // =========================================================================

    /// Sign up a user and return (id, account json).
    pub async fn signup(&self, username: &str, password: &str) -> (i32, Value) {
        let (status, body) = self
            .post(
                "/user/signup",
                None,
                serde_json::json!({"user": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");

        let id = i32::try_from(body["id"].as_i64().unwrap()).unwrap();
        (id, body)
    }

    /// Login a user and return the bearer token.
    pub async fn login_user(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/user/login",
                None,
                serde_json::json!({"user": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        body["auth_token"].as_str().unwrap().to_owned()
    }

    /// Login an admin and return the bearer token.
    pub async fn login_admin(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/admin/login",
                None,
                serde_json::json!({"user": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");

        body["auth_token"].as_str().unwrap().to_owned()
    }

    /// Login the seeded bootstrap admin.
    pub async fn login_root(&self) -> String {
        self.login_admin(ROOT_USER, ROOT_PASS).await
    }

    /// Seed a catalog item directly in storage.
    pub async fn seed_item(&self, name: &str, price_cents: i64) -> Item {
        self.storage
            .create_item(&minimart_api::models::NewItem {
                name: name.to_owned(),
                description: format!("{name} description"),
                price: Decimal::new(price_cents, 2),
            })
            .await
            .unwrap()
    }
}
