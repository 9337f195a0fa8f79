//! Signup, login, and auth middleware behavior end-to-end.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::Duration;
use secrecy::SecretString;
use serde_json::json;

use minimart_api::services::auth::TokenIssuer;
use minimart_core::Username;
use minimart_integration_tests::TestContext;

#[tokio::test]
async fn test_signup_login_profile_flow() {
    let ctx = TestContext::new().await;

    let (alice_id, account) = ctx.signup("alice", "pw1").await;
    assert_eq!(account["username"], "alice");
    assert_eq!(account["items"], json!([]));
    assert_eq!(account["orders"], json!([]));
    // The credential never appears in any response.
    assert!(account.get("password").is_none());
    assert!(account.get("hashed_password").is_none());

    let token = ctx.login_user("alice", "pw1").await;

    let (status, profile) = ctx.get(&format!("/user/{alice_id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], alice_id);
    assert_eq!(profile["username"], "alice");
    assert!(profile.get("hashed_password").is_none());

    // Same call with no Authorization header.
    let (status, body) = ctx.get(&format!("/user/{alice_id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_token_scoped_to_one_account() {
    let ctx = TestContext::new().await;

    let (_, _) = ctx.signup("alice", "pw1").await;
    let (bob_id, _) = ctx.signup("bob", "pw2").await;

    // Alice's valid, unexpired token presented for Bob's path id.
    let alice_token = ctx.login_user("alice", "pw1").await;
    let (status, body) = ctx.get(&format!("/user/{bob_id}"), Some(&alice_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let ctx = TestContext::new().await;
    let (alice_id, _) = ctx.signup("alice", "pw1").await;

    // No header at all.
    let (status, body) = ctx.get(&format!("/user/{alice_id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // Headers that are not `Bearer <token>`.
    for bad in ["Basic abc", "Bearer", "token-without-scheme"] {
        let request = axum::http::Request::builder()
            .method(axum::http::Method::GET)
            .uri(format!("/user/{alice_id}"))
            .header(axum::http::header::AUTHORIZATION, bad)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header: {bad}");
    }
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let ctx = TestContext::new().await;
    ctx.signup("alice", "pw1").await;
    let token = ctx.login_user("alice", "pw1").await;

    let (status, body) = ctx.get("/user/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid id: \"abc\"");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let ctx = TestContext::new().await;
    let (alice_id, _) = ctx.signup("alice", "pw1").await;

    // Same secret, already-elapsed TTL.
    let stale_issuer = TokenIssuer::with_ttl(
        &SecretString::from(minimart_integration_tests::TEST_SECRET),
        Duration::hours(-1),
    )
    .unwrap();
    let expired = stale_issuer
        .issue(alice_id, &Username::parse("alice").unwrap())
        .unwrap();

    let (status, body) = ctx.get(&format!("/user/{alice_id}"), Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_foreign_secret_token_rejected() {
    let ctx = TestContext::new().await;
    let (alice_id, _) = ctx.signup("alice", "pw1").await;

    let foreign_issuer =
        TokenIssuer::new(&SecretString::from("another-service-entirely-0123456789")).unwrap();
    let forged = foreign_issuer
        .issue(alice_id, &Username::parse("alice").unwrap())
        .unwrap();

    let (status, _) = ctx.get(&format!("/user/{alice_id}"), Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_username_change_forces_relogin() {
    let ctx = TestContext::new().await;
    let (alice_id, _) = ctx.signup("alice", "pw1").await;
    let token = ctx.login_user("alice", "pw1").await;

    let (status, body) = ctx
        .put(
            &format!("/user/{alice_id}"),
            Some(&token),
            json!({"user": "alice-renamed"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_account"], alice_id);

    // The old token's username claim no longer corroborates.
    let (status, _) = ctx.get(&format!("/user/{alice_id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A fresh login under the new username works again.
    let token = ctx.login_user("alice-renamed", "pw1").await;
    let (status, profile) = ctx.get(&format!("/user/{alice_id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice-renamed");
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let ctx = TestContext::new().await;
    ctx.signup("alice", "pw1").await;

    // Wrong password and unknown user read identically.
    let (status, body) = ctx
        .post("/user/login", None, json!({"user": "alice", "password": "nope"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = ctx
        .post("/user/login", None, json!({"user": "ghost", "password": "pw1"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_signup_validation() {
    let ctx = TestContext::new().await;

    // Empty password fails closed.
    let (status, _) = ctx
        .post("/user/signup", None, json!({"user": "alice", "password": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty username.
    let (status, _) = ctx
        .post("/user/signup", None, json!({"user": "", "password": "pw1"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown fields are rejected.
    let (status, _) = ctx
        .post(
            "/user/signup",
            None,
            json!({"user": "alice", "password": "pw1", "admin": true}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Duplicate username conflicts.
    ctx.signup("alice", "pw1").await;
    let (status, _) = ctx
        .post("/user/signup", None, json!({"user": "alice", "password": "pw2"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::Value::String("ok".to_owned()));

    let (status, _) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}
