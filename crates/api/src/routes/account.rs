//! User-scoped account, cart, and checkout handlers.
//!
//! Every handler here sits behind [`UserAuth`]: the request's bearer
//! token has already been verified and bound to the `{id}` in the path,
//! and the extractor hands over the loaded account.

use axum::Json;
use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use minimart_core::{ItemId, OrderStatus, Username};

use crate::error::{ApiError, ApiJson, Result};
use crate::middleware::UserAuth;
use crate::models::{Item, Order, UserAccount};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Request body for a username change.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    #[serde(rename = "user")]
    pub username: String,
}

/// Request body for cart mutation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartItemRequest {
    pub item_id: i32,
}

/// Response confirming a username change.
#[derive(Debug, Serialize)]
pub struct UpdatedAccountResponse {
    pub updated_account: i32,
}

/// Response for the cart view: resolved items plus the running total at
/// current catalog prices.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<Item>,
    pub total: Decimal,
}

/// Response confirming a cart addition.
#[derive(Debug, Serialize)]
pub struct AddedItemResponse {
    pub added_item: i32,
    pub account: i32,
}

/// Response confirming a cart removal.
#[derive(Debug, Serialize)]
pub struct RemovedItemResponse {
    pub removed_item: i32,
    pub account: i32,
}

/// Response for a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub status: OrderStatus,
}

/// `GET /user/{id}` - the authenticated user's account view.
pub async fn profile(UserAuth(user): UserAuth) -> Json<UserAccount> {
    Json(user)
}

/// `PUT /user/{id}` - change the account's username.
///
/// The current token's username claim no longer matches afterwards, so
/// the caller must log in again.
///
/// # Errors
///
/// `400` for a malformed username, `409` if it is taken.
pub async fn update(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateAccountRequest>,
) -> Result<Json<UpdatedAccountResponse>> {
    let username =
        Username::parse(&body.username).map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .storage()
        .update_user_username(user.id, &username)
        .await?;

    Ok(Json(UpdatedAccountResponse {
        updated_account: user.id.as_i32(),
    }))
}

/// `GET /user/{id}/items` - the cart resolved to items and a total.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn cart(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::new(state.storage());
    let (items, total) = cart.cart_view(&user).await?;
    Ok(Json(CartResponse { items, total }))
}

/// `POST /user/{id}/items` - add an item to the cart (idempotent).
///
/// # Errors
///
/// `404` if the catalog has no such item.
pub async fn add_item(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<AddedItemResponse>> {
    let cart = CartService::new(state.storage());
    cart.add_item(&user, ItemId::new(body.item_id)).await?;

    Ok(Json(AddedItemResponse {
        added_item: body.item_id,
        account: user.id.as_i32(),
    }))
}

/// `DELETE /user/{id}/items` - remove an item from the cart.
///
/// # Errors
///
/// `404` if the catalog has no such item.
pub async fn remove_item(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<RemovedItemResponse>> {
    let cart = CartService::new(state.storage());
    cart.remove_item(&user, ItemId::new(body.item_id)).await?;

    Ok(Json(RemovedItemResponse {
        removed_item: body.item_id,
        account: user.id.as_i32(),
    }))
}

/// `POST /user/{id}/checkout` - convert the cart into a `pending` order.
///
/// # Errors
///
/// `400` if the cart is empty.
pub async fn checkout(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
) -> Result<Json<CheckoutResponse>> {
    let cart = CartService::new(state.storage());
    let order = cart.checkout(&user).await?;
    let status = order.status.clone();

    Ok(Json(CheckoutResponse { order, status }))
}

/// `GET /user/{id}/orders` - the account's order history.
///
/// # Errors
///
/// `500` if storage fails.
pub async fn orders(
    UserAuth(user): UserAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let cart = CartService::new(state.storage());
    let orders = cart.order_history(&user).await?;
    Ok(Json(orders))
}
