//! Admin-scoped management handlers.
//!
//! Everything here sits behind [`AdminAuth`]: the bearer token has been
//! verified and bound to the `{id}` in the path. Admins manage admin
//! accounts, user accounts, the catalog, and orders, and get an
//! aggregate dashboard.
//!
//! Deletes take the target id in the JSON body rather than the path;
//! existing clients send it that way.

use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use minimart_core::{AdminId, ItemId, OrderId, OrderStatus, UserId, Username};

use crate::db::StorageError;
use crate::error::{ApiError, ApiJson, Result, parse_path_id};
use crate::middleware::AdminAuth;
use crate::models::{AdminAccount, Item, NewItem, NewOrder, Order, UserAccount};
use crate::routes::auth::CredentialsRequest;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Request body for a username change.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    #[serde(rename = "user")]
    pub username: String,
}

/// Request body for deleting an account.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteAccountRequest {
    pub id: i32,
}

/// Request body for creating or replacing a catalog item.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemRequest {
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub price: Decimal,
}

/// Request body for deleting a catalog item.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteItemRequest {
    pub id: i32,
}

/// Request body for manually creating an order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub account_id: i32,
    pub items: Vec<i32>,
    pub total: Decimal,
}

/// Request body for an order status write.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    pub status: String,
}

/// Request body for deleting an order.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteOrderRequest {
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdatedAccountResponse {
    pub updated_account: i32,
}

#[derive(Debug, Serialize)]
pub struct DeletedAccountResponse {
    pub deleted_account: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdatedItemResponse {
    pub updated_item: i32,
}

#[derive(Debug, Serialize)]
pub struct DeletedItemResponse {
    pub deleted_item: i32,
}

#[derive(Debug, Serialize)]
pub struct UpdatedOrderResponse {
    pub updated_order: i32,
}

#[derive(Debug, Serialize)]
pub struct DeletedOrderResponse {
    pub deleted_order: i32,
}

/// Aggregate view of the whole store.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub admins: Vec<AdminAccount>,
    pub total_admins: usize,
    pub users: Vec<UserAccount>,
    pub total_users: usize,
    pub items: Vec<Item>,
    pub total_items: usize,
    pub orders: Vec<Order>,
    pub total_orders: usize,
}

// =============================================================================
// Admin Account
// =============================================================================

/// `GET /admin/{id}` - the authenticated admin's account view.
pub async fn profile(AdminAuth(admin): AdminAuth) -> Json<AdminAccount> {
    Json(admin)
}

/// `PUT /admin/{id}` - change the admin's username.
///
/// The current token's username claim no longer matches afterwards, so
/// the caller must log in again.
///
/// # Errors
///
/// `400` for a malformed username, `409` if it is taken.
pub async fn update(
    AdminAuth(admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateAccountRequest>,
) -> Result<Json<UpdatedAccountResponse>> {
    let username =
        Username::parse(&body.username).map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .storage()
        .update_admin_username(admin.id, &username)
        .await?;

    Ok(Json(UpdatedAccountResponse {
        updated_account: admin.id.as_i32(),
    }))
}

/// `GET /admin/{id}/dash` - aggregate dashboard with counts.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn dashboard(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>> {
    let admins = state.storage().list_admins().await?;
    let users = state.storage().list_users().await?;
    let items = state.storage().list_items().await?;
    let orders = state.storage().list_orders().await?;

    Ok(Json(DashboardResponse {
        total_admins: admins.len(),
        admins,
        total_users: users.len(),
        users,
        total_items: items.len(),
        items,
        total_orders: orders.len(),
        orders,
    }))
}

// =============================================================================
// Admin Management
// =============================================================================

/// `GET /admin/{id}/admins` - list all admin accounts.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn list_admins(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminAccount>>> {
    let admins = state.storage().list_admins().await?;
    Ok(Json(admins))
}

/// `POST /admin/{id}/admins` - create a new admin account.
///
/// # Errors
///
/// `400` for bad credentials in the body, `409` for a taken username.
pub async fn create_admin(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<AdminAccount>> {
    let auth = AuthService::new(state.storage(), state.tokens());
    let account = auth.create_admin(&body.username, &body.password).await?;
    Ok(Json(account))
}

/// `DELETE /admin/{id}/admins` - delete an admin account by body id.
///
/// # Errors
///
/// `404` if no such admin exists.
pub async fn delete_admin(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteAccountRequest>,
) -> Result<Json<DeletedAccountResponse>> {
    state.storage().delete_admin(AdminId::new(body.id)).await?;

    Ok(Json(DeletedAccountResponse {
        deleted_account: body.id,
    }))
}

// =============================================================================
// User Management
// =============================================================================

/// `GET /admin/{id}/users` - list all user accounts.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn list_users(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserAccount>>> {
    let users = state.storage().list_users().await?;
    Ok(Json(users))
}

/// `POST /admin/{id}/users` - create a user account on a user's behalf.
///
/// # Errors
///
/// `400` for bad credentials in the body, `409` for a taken username.
pub async fn create_user(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<UserAccount>> {
    let auth = AuthService::new(state.storage(), state.tokens());
    let account = auth.signup_user(&body.username, &body.password).await?;
    Ok(Json(account))
}

/// `DELETE /admin/{id}/users` - delete a user account by body id.
///
/// # Errors
///
/// `404` if no such user exists.
pub async fn delete_user(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteAccountRequest>,
) -> Result<Json<DeletedAccountResponse>> {
    state.storage().delete_user(UserId::new(body.id)).await?;

    Ok(Json(DeletedAccountResponse {
        deleted_account: body.id,
    }))
}

// =============================================================================
// Catalog Management
// =============================================================================

/// `GET /admin/{id}/items` - list the catalog (admin view).
///
/// # Errors
///
/// `500` if storage fails.
pub async fn list_items(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>> {
    let items = state.storage().list_items().await?;
    Ok(Json(items))
}

/// `POST /admin/{id}/items` - add an item to the catalog.
///
/// # Errors
///
/// `400` for a negative price.
pub async fn create_item(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ItemRequest>,
) -> Result<Json<Item>> {
    let new_item = validate_item(body)?;
    let item = state.storage().create_item(&new_item).await?;
    Ok(Json(item))
}

/// `DELETE /admin/{id}/items` - delete an item by body id.
///
/// The item is purged from every user's cart in the same transaction.
///
/// # Errors
///
/// `404` if no such item exists.
pub async fn delete_item(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteItemRequest>,
) -> Result<Json<DeletedItemResponse>> {
    state.storage().delete_item(ItemId::new(body.id)).await?;

    Ok(Json(DeletedItemResponse {
        deleted_item: body.id,
    }))
}

/// `GET /admin/{id}/items/{item_id}` - fetch one item.
///
/// # Errors
///
/// `400` for a non-numeric item id, `404` if the item does not exist.
pub async fn get_item(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    Path((_, raw_item_id)): Path<(String, String)>,
) -> Result<Json<Item>> {
    let item_id = parse_path_id(&raw_item_id)?;

    let item = state
        .storage()
        .get_item(ItemId::new(item_id))
        .await?
        .ok_or(StorageError::ItemNotFound(item_id))?;

    Ok(Json(item))
}

/// `PUT /admin/{id}/items/{item_id}` - replace an item's fields.
///
/// # Errors
///
/// `400` for a non-numeric item id or negative price, `404` if the item
/// does not exist.
pub async fn update_item(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    Path((_, raw_item_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<ItemRequest>,
) -> Result<Json<UpdatedItemResponse>> {
    let item_id = parse_path_id(&raw_item_id)?;
    let new_item = validate_item(body)?;

    state
        .storage()
        .update_item(ItemId::new(item_id), &new_item)
        .await?;

    Ok(Json(UpdatedItemResponse {
        updated_item: item_id,
    }))
}

// =============================================================================
// Order Management
// =============================================================================

/// `GET /admin/{id}/orders` - list all orders.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn list_orders(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = state.storage().list_orders().await?;
    Ok(Json(orders))
}

/// `POST /admin/{id}/orders` - create an order on a user's behalf.
///
/// The order starts as `pending` and is appended to the owning user's
/// history, like a checkout.
///
/// # Errors
///
/// `404` if the owning user does not exist.
pub async fn create_order(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<Json<Order>> {
    let new_order = NewOrder {
        user_id: UserId::new(body.account_id),
        items: body.items.into_iter().map(ItemId::new).collect(),
        total: body.total,
    };

    let order = state.storage().create_order(&new_order).await?;
    Ok(Json(order))
}

/// `DELETE /admin/{id}/orders` - delete an order by body id.
///
/// # Errors
///
/// `404` if no such order exists.
pub async fn delete_order(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DeleteOrderRequest>,
) -> Result<Json<DeletedOrderResponse>> {
    state.storage().delete_order(OrderId::new(body.id)).await?;

    Ok(Json(DeletedOrderResponse {
        deleted_order: body.id,
    }))
}

/// `GET /admin/{id}/orders/{order_id}` - fetch one order.
///
/// # Errors
///
/// `400` for a non-numeric order id, `404` if the order does not exist.
pub async fn get_order(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    Path((_, raw_order_id)): Path<(String, String)>,
) -> Result<Json<Order>> {
    let order_id = parse_path_id(&raw_order_id)?;

    let order = state
        .storage()
        .get_order(OrderId::new(order_id))
        .await?
        .ok_or(StorageError::OrderNotFound(order_id))?;

    Ok(Json(order))
}

/// `PUT /admin/{id}/orders/{order_id}` - write the order's status.
///
/// Status values are free text; no transition table is enforced.
///
/// # Errors
///
/// `400` for a non-numeric order id, `404` if the order does not exist.
pub async fn update_order(
    AdminAuth(_admin): AdminAuth,
    State(state): State<AppState>,
    Path((_, raw_order_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> Result<Json<UpdatedOrderResponse>> {
    let order_id = parse_path_id(&raw_order_id)?;

    state
        .storage()
        .update_order_status(OrderId::new(order_id), &OrderStatus::new(body.status))
        .await?;

    Ok(Json(UpdatedOrderResponse {
        updated_order: order_id,
    }))
}

/// Reject item fields the catalog must never hold.
fn validate_item(body: ItemRequest) -> Result<NewItem> {
    if body.price.is_sign_negative() {
        return Err(ApiError::Validation("price cannot be negative".to_owned()));
    }
    if body.name.is_empty() {
        return Err(ApiError::Validation("name cannot be empty".to_owned()));
    }

    Ok(NewItem {
        name: body.name,
        description: body.description,
        price: body.price,
    })
}
