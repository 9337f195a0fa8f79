//! Storage for accounts, items, and orders.
//!
//! The [`Storage`] trait is the single consistency boundary of the
//! system: every multi-step write that must hold together (checkout,
//! item deletion with cart purge) is one trait operation, so each
//! backend can make it atomic its own way.
//!
//! Two backends exist:
//!
//! - [`postgres::PostgresStorage`] - production backend over `sqlx`
//! - [`memory::MemoryStorage`] - in-process backend for tests
//!
//! ## Tables (`PostgreSQL`)
//!
//! - `admins` - admin accounts (username, password hash, cached token)
//! - `users` - user accounts plus `items INT4[]` (cart) and
//!   `orders INT4[]` (history)
//! - `items` - the catalog
//! - `orders` - immutable order snapshots with a mutable status

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use minimart_core::{AdminId, ItemId, OrderId, OrderStatus, UserId, Username};

use crate::models::{AdminAccount, Item, NewItem, NewOrder, Order, UserAccount};

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

/// Errors that can occur during storage operations.
///
/// The not-found variants carry the id so callers can surface the
/// descriptive message (`Account 42 not found`) unchanged.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// No account (of the expected kind) with this id.
    #[error("Account {0} not found")]
    AccountNotFound(i32),

    /// No catalog item with this id.
    #[error("Item {0} not found")]
    ItemNotFound(i32),

    /// No order with this id.
    #[error("Order {0} not found")]
    OrderNotFound(i32),

    /// Username uniqueness violation.
    #[error("username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// Checkout attempted on an empty cart.
    #[error("cart is empty")]
    EmptyCart,
}

/// Storage capability for the API server.
///
/// All operations are keyed by the typed ids from `minimart-core`.
/// Credentials flow through dedicated operations only: account reads
/// never return the password hash, and `find_*_credentials` is consumed
/// exclusively by the auth service.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the backend and seed the bootstrap admin account.
    ///
    /// Idempotent: an existing admin with this username is left alone.
    async fn init(&self, root_username: &Username, root_password_hash: &str)
    -> Result<(), StorageError>;

    /// Cheap connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), StorageError>;

    // =========================================================================
    // Admin accounts
    // =========================================================================

    async fn create_admin(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<AdminAccount, StorageError>;

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminAccount>, StorageError>;

    async fn list_admins(&self) -> Result<Vec<AdminAccount>, StorageError>;

    async fn update_admin_username(
        &self,
        id: AdminId,
        username: &Username,
    ) -> Result<(), StorageError>;

    async fn delete_admin(&self, id: AdminId) -> Result<(), StorageError>;

    /// Look up an admin by username together with their password hash.
    async fn find_admin_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(AdminAccount, String)>, StorageError>;

    /// Cache the most recently issued token on the account row.
    ///
    /// Nothing reads the cached token back; it exists for a future
    /// revocation path.
    async fn store_admin_token(&self, id: AdminId, token: &str) -> Result<(), StorageError>;

    // =========================================================================
    // User accounts
    // =========================================================================

    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<UserAccount, StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StorageError>;

    async fn list_users(&self) -> Result<Vec<UserAccount>, StorageError>;

    async fn update_user_username(
        &self,
        id: UserId,
        username: &Username,
    ) -> Result<(), StorageError>;

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError>;

    /// Look up a user by username together with their password hash.
    async fn find_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(UserAccount, String)>, StorageError>;

    /// Cache the most recently issued token on the account row.
    async fn store_user_token(&self, id: UserId, token: &str) -> Result<(), StorageError>;

    // =========================================================================
    // Cart & checkout
    // =========================================================================

    /// Add an item to a user's cart.
    ///
    /// Idempotent: an item already in the cart is not added again.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if the catalog has no such item, `AccountNotFound`
    /// if the user id is invalid.
    async fn add_cart_item(&self, user_id: UserId, item_id: ItemId) -> Result<(), StorageError>;

    /// Remove an item from a user's cart (no-op if not in the cart).
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if the catalog has no such item, `AccountNotFound`
    /// if the user id is invalid.
    async fn remove_cart_item(&self, user_id: UserId, item_id: ItemId)
    -> Result<(), StorageError>;

    /// Convert a user's cart into an order snapshot.
    ///
    /// One atomic unit, serialized per user: read the cart, resolve live
    /// prices, create the order as `pending`, append it to the user's
    /// history, and clear the cart - or none of it.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` for a bad user id, `EmptyCart` when there is
    /// nothing to check out.
    async fn checkout(&self, user_id: UserId) -> Result<Order, StorageError>;

    // =========================================================================
    // Items
    // =========================================================================

    async fn create_item(&self, item: &NewItem) -> Result<Item, StorageError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StorageError>;

    async fn list_items(&self) -> Result<Vec<Item>, StorageError>;

    async fn update_item(&self, id: ItemId, item: &NewItem) -> Result<(), StorageError>;

    /// Delete an item and purge it from every user's cart, atomically.
    async fn delete_item(&self, id: ItemId) -> Result<(), StorageError>;

    /// Resolve item ids to items, preserving the order of `ids`.
    ///
    /// Ids that no longer exist in the catalog are skipped.
    async fn get_items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Create an order as `pending` and append it to the owner's history.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, StorageError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError>;

    /// Resolve order ids to orders, preserving the order of `ids`.
    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, StorageError>;

    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), StorageError>;

    async fn delete_order(&self, id: OrderId) -> Result<(), StorageError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
