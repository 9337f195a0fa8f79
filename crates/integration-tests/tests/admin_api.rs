//! Admin management surface end-to-end.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use minimart_integration_tests::TestContext;

#[tokio::test]
async fn test_root_admin_login_and_profile() {
    let ctx = TestContext::new().await;
    let token = ctx.login_root().await;

    let (status, profile) = ctx.get("/admin/1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], 1);
    assert_eq!(profile["username"], "root");
    assert!(profile.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_dashboard_aggregates_counts() {
    let ctx = TestContext::new().await;
    ctx.signup("alice", "pw1").await;
    ctx.signup("bob", "pw2").await;
    ctx.seed_item("mug", 1000).await;

    let token = ctx.login_root().await;
    let (status, dash) = ctx.get("/admin/1/dash", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["total_admins"], 1);
    assert_eq!(dash["total_users"], 2);
    assert_eq!(dash["total_items"], 1);
    assert_eq!(dash["total_orders"], 0);
    assert_eq!(dash["users"].as_array().unwrap().len(), 2);
    // Listed accounts carry no credentials either.
    assert!(dash["admins"][0].get("hashed_password").is_none());
}

#[tokio::test]
async fn test_user_token_cannot_open_admin_routes() {
    let ctx = TestContext::new().await;
    // User id 1 exists alongside admin id 1; the kinds stay separate.
    let (alice_id, _) = ctx.signup("alice", "pw1").await;
    assert_eq!(alice_id, 1);
    let token = ctx.login_user("alice", "pw1").await;

    let (status, body) = ctx.get("/admin/1/dash", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_admin_token_cannot_open_user_routes() {
    let ctx = TestContext::new().await;
    ctx.signup("alice", "pw1").await;
    let root_token = ctx.login_root().await;

    let (status, _) = ctx.get("/user/1", Some(&root_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_catalog_lifecycle() {
    let ctx = TestContext::new().await;
    let token = ctx.login_root().await;

    // Create
    let (status, item) = ctx
        .post(
            "/admin/1/items",
            Some(&token),
            json!({"name": "mug", "desc": "ceramic mug", "price": 10.5}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let item_id = item["id"].as_i64().unwrap();
    assert_eq!(item["desc"], "ceramic mug");

    // Publicly visible without auth
    let (status, listed) = ctx.get("/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, fetched) = ctx.get(&format!("/items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "mug");

    // Update via the admin route
    let (status, body) = ctx
        .put(
            &format!("/admin/1/items/{item_id}"),
            Some(&token),
            json!({"name": "mug", "desc": "bigger mug", "price": 12}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_item"], item_id);

    let (_, fetched) = ctx.get(&format!("/items/{item_id}"), None).await;
    assert_eq!(fetched["desc"], "bigger mug");
    assert_eq!(fetched["price"], "12");

    // Delete
    let (status, body) = ctx
        .delete("/admin/1/items", Some(&token), json!({"id": item_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_item"], item_id);

    let (status, body) = ctx.get(&format!("/items/{item_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Item {item_id} not found"));
}

#[tokio::test]
async fn test_item_validation() {
    let ctx = TestContext::new().await;
    let token = ctx.login_root().await;

    let (status, _) = ctx
        .post(
            "/admin/1/items",
            Some(&token),
            json!({"name": "mug", "desc": "", "price": -1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            "/admin/1/items",
            Some(&token),
            json!({"name": "", "desc": "", "price": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_manages_accounts() {
    let ctx = TestContext::new().await;
    let token = ctx.login_root().await;

    // Create a second admin; their login works.
    let (status, admin) = ctx
        .post(
            "/admin/1/admins",
            Some(&token),
            json!({"user": "ops", "password": "ops-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(admin["username"], "ops");
    let ops_id = admin["id"].as_i64().unwrap();
    ctx.login_admin("ops", "ops-pass").await;

    // Create and delete a user on their behalf.
    let (status, user) = ctx
        .post(
            "/admin/1/users",
            Some(&token),
            json!({"user": "managed", "password": "pw"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = user["id"].as_i64().unwrap();

    let (status, body) = ctx
        .delete("/admin/1/users", Some(&token), json!({"id": user_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_account"], user_id);

    // Deleting a missing account is a descriptive 404.
    let (status, body) = ctx
        .delete("/admin/1/users", Some(&token), json!({"id": user_id}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Account {user_id} not found"));

    // Remove the second admin again.
    let (status, _) = ctx
        .delete("/admin/1/admins", Some(&token), json!({"id": ops_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_order_lifecycle() {
    let ctx = TestContext::new().await;
    let (alice_id, _) = ctx.signup("alice", "pw1").await;
    let mug = ctx.seed_item("mug", 1000).await;
    let token = ctx.login_root().await;

    // Manual order creation on the user's behalf.
    let (status, order) = ctx
        .post(
            "/admin/1/orders",
            Some(&token),
            json!({"account_id": alice_id, "items": [mug.id.as_i32()], "total": 10}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_i64().unwrap();

    // It appears in the user's history.
    let user_token = ctx.login_user("alice", "pw1").await;
    let (_, orders) = ctx
        .get(&format!("/user/{alice_id}/orders"), Some(&user_token))
        .await;
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // Status writes are free text.
    let (status, body) = ctx
        .put(
            &format!("/admin/1/orders/{order_id}"),
            Some(&token),
            json!({"status": "shipped"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_order"], order_id);

    let (_, fetched) = ctx
        .get(&format!("/admin/1/orders/{order_id}"), Some(&token))
        .await;
    assert_eq!(fetched["status"], "shipped");

    // Creating an order for a missing user is a descriptive 404.
    let (status, body) = ctx
        .post(
            "/admin/1/orders",
            Some(&token),
            json!({"account_id": 404, "items": [], "total": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Account 404 not found");

    // Delete the order.
    let (status, _) = ctx
        .delete("/admin/1/orders", Some(&token), json!({"id": order_id}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .get(&format!("/admin/1/orders/{order_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
