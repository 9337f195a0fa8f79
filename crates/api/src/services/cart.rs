//! Cart and checkout engine.
//!
//! The service front-end over the storage cart operations: add/remove
//! stay idempotent, checkout converts the cart into an immutable order
//! snapshot in one atomic unit, and the cart view resolves item ids to
//! live items with a running total.

use rust_decimal::Decimal;
use thiserror::Error;

use minimart_core::ItemId;

use crate::db::{Storage, StorageError};
use crate::models::{Item, Order, UserAccount};

/// Errors that can occur during cart and checkout operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The catalog has no item with this id.
    #[error("Item {0} not found")]
    ItemNotFound(i32),

    /// No user account with this id.
    #[error("Account {0} not found")]
    AccountNotFound(i32),

    /// Checkout attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Storage error.
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CartError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ItemNotFound(id) => Self::ItemNotFound(id),
            StorageError::AccountNotFound(id) => Self::AccountNotFound(id),
            StorageError::EmptyCart => Self::EmptyCart,
            other => Self::Storage(other),
        }
    }
}

/// Cart and checkout service.
pub struct CartService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Add an item to the user's cart (idempotent).
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the catalog has no such item,
    /// `CartError::AccountNotFound` for a bad user id.
    pub async fn add_item(&self, user: &UserAccount, item_id: ItemId) -> Result<(), CartError> {
        self.storage.add_cart_item(user.id, item_id).await?;
        Ok(())
    }

    /// Remove an item from the user's cart.
    ///
    /// Removing an item that is in the catalog but not in the cart is a
    /// no-op; an item absent from the catalog is `ItemNotFound` (one
    /// not-found class covers both).
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` or `CartError::AccountNotFound`.
    pub async fn remove_item(&self, user: &UserAccount, item_id: ItemId) -> Result<(), CartError> {
        self.storage.remove_cart_item(user.id, item_id).await?;
        Ok(())
    }

    /// Resolve the user's cart to live items and their current total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the lookup fails.
    pub async fn cart_view(&self, user: &UserAccount) -> Result<(Vec<Item>, Decimal), CartError> {
        let items = self.storage.get_items_by_ids(&user.items).await?;
        let total: Decimal = items.iter().map(|item| item.price).sum();
        Ok((items, total))
    }

    /// Check out the user's cart into a new `pending` order.
    ///
    /// The whole sequence (snapshot cart, price it, create the order,
    /// append it to the history, clear the cart) commits or rolls back
    /// together.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EmptyCart` when there is nothing to check
    /// out, `CartError::AccountNotFound` for a bad user id.
    pub async fn checkout(&self, user: &UserAccount) -> Result<Order, CartError> {
        let order = self.storage.checkout(user.id).await?;
        Ok(order)
    }

    /// The user's order history.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the lookup fails.
    pub async fn order_history(&self, user: &UserAccount) -> Result<Vec<Order>, CartError> {
        let orders = self.storage.get_orders_by_ids(&user.orders).await?;
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::NewItem;
    use minimart_core::Username;

    async fn seeded(storage: &MemoryStorage) -> (UserAccount, Item, Item) {
        let user = storage
            .create_user(&Username::parse("alice").unwrap(), "hash")
            .await
            .unwrap();
        let mug = storage
            .create_item(&NewItem {
                name: "mug".to_owned(),
                description: String::new(),
                price: Decimal::new(1000, 2),
            })
            .await
            .unwrap();
        let cap = storage
            .create_item(&NewItem {
                name: "cap".to_owned(),
                description: String::new(),
                price: Decimal::new(1500, 2),
            })
            .await
            .unwrap();
        (user, mug, cap)
    }

    #[tokio::test]
    async fn test_cart_view_totals_current_prices() {
        let storage = MemoryStorage::new();
        let (user, mug, cap) = seeded(&storage).await;
        let cart = CartService::new(&storage);

        cart.add_item(&user, mug.id).await.unwrap();
        cart.add_item(&user, cap.id).await.unwrap();

        let user = storage.get_user(user.id).await.unwrap().unwrap();
        let (items, total) = cart.cart_view(&user).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(total, Decimal::new(2500, 2));
    }

    #[tokio::test]
    async fn test_checkout_produces_pending_order_and_clears_cart() {
        let storage = MemoryStorage::new();
        let (user, mug, cap) = seeded(&storage).await;
        let cart = CartService::new(&storage);

        cart.add_item(&user, mug.id).await.unwrap();
        cart.add_item(&user, cap.id).await.unwrap();

        let order = cart.checkout(&user).await.unwrap();
        assert_eq!(order.total, Decimal::new(2500, 2));
        assert!(order.status.is_pending());

        let user = storage.get_user(user.id).await.unwrap().unwrap();
        assert!(user.items.is_empty());
        assert_eq!(cart.order_history(&user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let storage = MemoryStorage::new();
        let (user, _, _) = seeded(&storage).await;
        let cart = CartService::new(&storage);

        assert!(matches!(
            cart.checkout(&user).await,
            Err(CartError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_unknown_item_maps_to_not_found() {
        let storage = MemoryStorage::new();
        let (user, _, _) = seeded(&storage).await;
        let cart = CartService::new(&storage);

        let result = cart.add_item(&user, ItemId::new(99)).await;
        assert!(matches!(result, Err(CartError::ItemNotFound(99))));

        let result = cart.remove_item(&user, ItemId::new(99)).await;
        assert!(matches!(result, Err(CartError::ItemNotFound(99))));
    }
}
