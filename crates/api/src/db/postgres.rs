//! `PostgreSQL` storage backend.
//!
//! Queries are bound at runtime (no compile-time database connection is
//! required to build the crate). Carts and order histories live as
//! `INT4[]` columns on the `users` table; money columns are `NUMERIC`.
//!
//! Multi-step writes share one transaction:
//! - checkout locks the user row (`FOR UPDATE`) so concurrent checkouts
//!   by the same user serialize,
//! - item deletion deletes the catalog row and purges every cart in the
//!   same transaction,
//! - cart adds take a shared lock on the item row so a concurrent
//!   deletion cannot leave a dangling id behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use minimart_core::{AdminId, ItemId, OrderId, OrderStatus, UserId, Username};

use super::{Storage, StorageError};
use crate::models::{AdminAccount, Item, NewItem, NewOrder, Order, UserAccount};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for admin account queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    username: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminAccount {
    type Error = StorageError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            StorageError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            username,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for admin credential lookups.
#[derive(Debug, sqlx::FromRow)]
struct AdminCredentialRow {
    id: i32,
    username: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
}

/// Internal row type for user account queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    items: Vec<i32>,
    orders: Vec<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            StorageError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            items: row.items.into_iter().map(ItemId::new).collect(),
            orders: row.orders.into_iter().map(OrderId::new).collect(),
            created_at: row.created_at,
        })
    }
}

/// Internal row type for user credential lookups.
#[derive(Debug, sqlx::FromRow)]
struct UserCredentialRow {
    id: i32,
    username: String,
    hashed_password: String,
    items: Vec<i32>,
    orders: Vec<i32>,
    created_at: DateTime<Utc>,
}

/// Internal row type for catalog item queries.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    items: Vec<i32>,
    total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: row.items.into_iter().map(ItemId::new).collect(),
            total: row.total,
            status: OrderStatus::new(row.status),
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Storage Backend
// =============================================================================

/// `PostgreSQL` storage backend.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new backend over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Map a unique-constraint violation to `DuplicateUsername`.
    fn map_username_conflict(e: sqlx::Error, username: &Username) -> StorageError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return StorageError::DuplicateUsername(username.to_string());
        }
        StorageError::Database(e)
    }
}

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS admins (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        auth_token TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        auth_token TEXT,
        items INT4[] NOT NULL DEFAULT '{}',
        orders INT4[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS items (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price NUMERIC NOT NULL CHECK (price >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS orders (
        id SERIAL PRIMARY KEY,
        user_id INT4 NOT NULL,
        items INT4[] NOT NULL,
        total NUMERIC NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
];

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(
        &self,
        root_username: &Username,
        root_password_hash: &str,
    ) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        // Seed the bootstrap admin; an existing row wins.
        sqlx::query(
            r"
            INSERT INTO admins (username, hashed_password)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            ",
        )
        .bind(root_username)
        .bind(root_password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Admin accounts
    // =========================================================================

    async fn create_admin(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<AdminAccount, StorageError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            INSERT INTO admins (username, hashed_password)
            VALUES ($1, $2)
            RETURNING id, username, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_username_conflict(e, username))?;

        row.try_into()
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminAccount>, StorageError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, username, created_at FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_admins(&self) -> Result<Vec<AdminAccount>, StorageError> {
        let rows = sqlx::query_as::<_, AdminRow>(
            "SELECT id, username, created_at FROM admins ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_admin_username(
        &self,
        id: AdminId,
        username: &Username,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE admins SET username = $1 WHERE id = $2")
            .bind(username)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_username_conflict(e, username))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn delete_admin(&self, id: AdminId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn find_admin_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(AdminAccount, String)>, StorageError> {
        let row = sqlx::query_as::<_, AdminCredentialRow>(
            r"
            SELECT id, username, hashed_password, created_at
            FROM admins
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let hash = r.hashed_password;
                let account = AdminRow {
                    id: r.id,
                    username: r.username,
                    created_at: r.created_at,
                }
                .try_into()?;
                Ok(Some((account, hash)))
            }
            None => Ok(None),
        }
    }

    async fn store_admin_token(&self, id: AdminId, token: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE admins SET auth_token = $1 WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    // =========================================================================
    // User accounts
    // =========================================================================

    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<UserAccount, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, hashed_password)
            VALUES ($1, $2)
            RETURNING id, username, items, orders, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_username_conflict(e, username))?;

        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, items, orders, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, StorageError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, items, orders, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_user_username(
        &self,
        id: UserId,
        username: &Username,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(username)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_username_conflict(e, username))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn find_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(UserAccount, String)>, StorageError> {
        let row = sqlx::query_as::<_, UserCredentialRow>(
            r"
            SELECT id, username, hashed_password, items, orders, created_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let hash = r.hashed_password;
                let account = UserRow {
                    id: r.id,
                    username: r.username,
                    items: r.items,
                    orders: r.orders,
                    created_at: r.created_at,
                }
                .try_into()?;
                Ok(Some((account, hash)))
            }
            None => Ok(None),
        }
    }

    async fn store_user_token(&self, id: UserId, token: &str) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE users SET auth_token = $1 WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id.as_i32()));
        }
        Ok(())
    }

    // =========================================================================
    // Cart & checkout
    // =========================================================================

    async fn add_cart_item(&self, user_id: UserId, item_id: ItemId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        // Shared lock: a concurrent catalog deletion must wait until this
        // transaction commits, then its purge sweeps the new cart entry.
        let item: Option<(i32,)> = sqlx::query_as("SELECT id FROM items WHERE id = $1 FOR SHARE")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;

        if item.is_none() {
            return Err(StorageError::ItemNotFound(item_id.as_i32()));
        }

        // Idempotent append: an item already in the cart stays single.
        let result = sqlx::query(
            r"
            UPDATE users
            SET items = CASE
                WHEN $1 = ANY(items) THEN items
                ELSE array_append(items, $1)
            END
            WHERE id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(user_id.as_i32()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_cart_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<(), StorageError> {
        let item: Option<(i32,)> = sqlx::query_as("SELECT id FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        if item.is_none() {
            return Err(StorageError::ItemNotFound(item_id.as_i32()));
        }

        let result = sqlx::query(
            r"
            UPDATE users
            SET items = array_remove(items, $1)
            WHERE id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(user_id.as_i32()));
        }
        Ok(())
    }

    async fn checkout(&self, user_id: UserId) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent checkouts by the same user.
        let cart: Option<(Vec<i32>,)> =
            sqlx::query_as("SELECT items FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((cart,)) = cart else {
            return Err(StorageError::AccountNotFound(user_id.as_i32()));
        };

        if cart.is_empty() {
            return Err(StorageError::EmptyCart);
        }

        let prices: Vec<(Decimal,)> = sqlx::query_as("SELECT price FROM items WHERE id = ANY($1)")
            .bind(&cart)
            .fetch_all(&mut *tx)
            .await?;

        let total: Decimal = prices.iter().map(|(price,)| *price).sum();

        let (order_id, status, created_at): (i32, String, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO orders (user_id, items, total, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, status, created_at
            ",
        )
        .bind(user_id)
        .bind(&cart)
        .bind(total)
        .bind(OrderStatus::PENDING)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE users
            SET orders = array_append(orders, $1), items = '{}'
            WHERE id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(order_id),
            user_id,
            items: cart.into_iter().map(ItemId::new).collect(),
            total,
            status: OrderStatus::new(status),
            created_at,
        })
    }

    // =========================================================================
    // Items
    // =========================================================================

    async fn create_item(&self, item: &NewItem) -> Result<Item, StorageError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO items (name, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price, created_at
            ",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StorageError> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, price, created_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, price, created_at FROM items ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_item(&self, id: ItemId, item: &NewItem) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            UPDATE items
            SET name = $1, description = $2, price = $3
            WHERE id = $4
            ",
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ItemNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::ItemNotFound(id.as_i32()));
        }

        // Purge from every cart. The unfiltered update also takes every
        // user row lock, so in-flight checkouts finish first.
        sqlx::query("UPDATE users SET items = array_remove(items, $1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError> {
        let raw_ids: Vec<i32> = ids.iter().map(ItemId::as_i32).collect();

        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, description, price, created_at FROM items WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: std::collections::HashMap<i32, Item> =
            rows.into_iter().map(|row| (row.id, row.into())).collect();

        // Preserve the caller's (cart) ordering.
        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(&id.as_i32()))
            .collect())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    async fn create_order(&self, order: &NewOrder) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;

        let user: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(order.user_id)
            .fetch_optional(&mut *tx)
            .await?;

        if user.is_none() {
            return Err(StorageError::AccountNotFound(order.user_id.as_i32()));
        }

        let raw_items: Vec<i32> = order.items.iter().map(ItemId::as_i32).collect();

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (user_id, items, total, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, items, total, status, created_at
            ",
        )
        .bind(order.user_id)
        .bind(&raw_items)
        .bind(order.total)
        .bind(OrderStatus::PENDING)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET orders = array_append(orders, $1) WHERE id = $2")
            .bind(row.id)
            .bind(order.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, items, total, status, created_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, items, total, status, created_at FROM orders ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, StorageError> {
        let raw_ids: Vec<i32> = ids.iter().map(OrderId::as_i32).collect();

        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, items, total, status, created_at FROM orders WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: std::collections::HashMap<i32, Order> =
            rows.into_iter().map(|row| (row.id, row.into())).collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(&id.as_i32()))
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::OrderNotFound(id.as_i32()));
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::OrderNotFound(id.as_i32()));
        }
        Ok(())
    }
}
