//! In-memory storage backend.
//!
//! Backs the test suites so they can exercise the full request path
//! without a running `PostgreSQL`. A single async mutex guards all
//! state, which also gives every multi-step operation (checkout, item
//! deletion) the same atomicity the production backend gets from
//! transactions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use minimart_core::{AdminId, ItemId, OrderId, OrderStatus, UserId, Username};

use super::{Storage, StorageError};
use crate::models::{AdminAccount, Item, NewItem, NewOrder, Order, UserAccount};

/// An admin account plus its write-only credential state.
#[derive(Debug, Clone)]
struct AdminRecord {
    account: AdminAccount,
    password_hash: String,
    auth_token: Option<String>,
}

/// A user account plus its write-only credential state.
#[derive(Debug, Clone)]
struct UserRecord {
    account: UserAccount,
    password_hash: String,
    auth_token: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    admins: BTreeMap<i32, AdminRecord>,
    users: BTreeMap<i32, UserRecord>,
    items: BTreeMap<i32, Item>,
    orders: BTreeMap<i32, Order>,
    next_admin_id: i32,
    next_user_id: i32,
    next_item_id: i32,
    next_order_id: i32,
}

impl Inner {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }
}

/// In-memory storage backend for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(
        &self,
        root_username: &Username,
        root_password_hash: &str,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        let exists = inner
            .admins
            .values()
            .any(|record| record.account.username == *root_username);
        if exists {
            return Ok(());
        }

        let id = Inner::next_id(&mut inner.next_admin_id);
        inner.admins.insert(
            id,
            AdminRecord {
                account: AdminAccount {
                    id: AdminId::new(id),
                    username: root_username.clone(),
                    created_at: Utc::now(),
                },
                password_hash: root_password_hash.to_owned(),
                auth_token: None,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
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
        let mut inner = self.inner.lock().await;

        let taken = inner
            .admins
            .values()
            .any(|record| record.account.username == *username);
        if taken {
            return Err(StorageError::DuplicateUsername(username.to_string()));
        }

        let id = Inner::next_id(&mut inner.next_admin_id);
        let account = AdminAccount {
            id: AdminId::new(id),
            username: username.clone(),
            created_at: Utc::now(),
        };
        inner.admins.insert(
            id,
            AdminRecord {
                account: account.clone(),
                password_hash: password_hash.to_owned(),
                auth_token: None,
            },
        );
        Ok(account)
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<AdminAccount>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .admins
            .get(&id.as_i32())
            .map(|record| record.account.clone()))
    }

    async fn list_admins(&self) -> Result<Vec<AdminAccount>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .admins
            .values()
            .map(|record| record.account.clone())
            .collect())
    }

    async fn update_admin_username(
        &self,
        id: AdminId,
        username: &Username,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        let taken = inner
            .admins
            .values()
            .any(|record| record.account.id != id && record.account.username == *username);
        if taken {
            return Err(StorageError::DuplicateUsername(username.to_string()));
        }

        let record = inner
            .admins
            .get_mut(&id.as_i32())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))?;
        record.account.username = username.clone();
        Ok(())
    }

    async fn delete_admin(&self, id: AdminId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner
            .admins
            .remove(&id.as_i32())
            .map(|_| ())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))
    }

    async fn find_admin_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(AdminAccount, String)>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .admins
            .values()
            .find(|record| record.account.username == *username)
            .map(|record| (record.account.clone(), record.password_hash.clone())))
    }

    async fn store_admin_token(&self, id: AdminId, token: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .admins
            .get_mut(&id.as_i32())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))?;
        record.auth_token = Some(token.to_owned());
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
        let mut inner = self.inner.lock().await;

        let taken = inner
            .users
            .values()
            .any(|record| record.account.username == *username);
        if taken {
            return Err(StorageError::DuplicateUsername(username.to_string()));
        }

        let id = Inner::next_id(&mut inner.next_user_id);
        let account = UserAccount {
            id: UserId::new(id),
            username: username.clone(),
            items: Vec::new(),
            orders: Vec::new(),
            created_at: Utc::now(),
        };
        inner.users.insert(
            id,
            UserRecord {
                account: account.clone(),
                password_hash: password_hash.to_owned(),
                auth_token: None,
            },
        );
        Ok(account)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserAccount>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .get(&id.as_i32())
            .map(|record| record.account.clone()))
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .map(|record| record.account.clone())
            .collect())
    }

    async fn update_user_username(
        &self,
        id: UserId,
        username: &Username,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        let taken = inner
            .users
            .values()
            .any(|record| record.account.id != id && record.account.username == *username);
        if taken {
            return Err(StorageError::DuplicateUsername(username.to_string()));
        }

        let record = inner
            .users
            .get_mut(&id.as_i32())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))?;
        record.account.username = username.clone();
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner
            .users
            .remove(&id.as_i32())
            .map(|_| ())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))
    }

    async fn find_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(UserAccount, String)>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|record| record.account.username == *username)
            .map(|record| (record.account.clone(), record.password_hash.clone())))
    }

    async fn store_user_token(&self, id: UserId, token: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .users
            .get_mut(&id.as_i32())
            .ok_or(StorageError::AccountNotFound(id.as_i32()))?;
        record.auth_token = Some(token.to_owned());
        Ok(())
    }

    // =========================================================================
    // Cart & checkout
    // =========================================================================

    async fn add_cart_item(&self, user_id: UserId, item_id: ItemId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        if !inner.items.contains_key(&item_id.as_i32()) {
            return Err(StorageError::ItemNotFound(item_id.as_i32()));
        }

        let record = inner
            .users
            .get_mut(&user_id.as_i32())
            .ok_or(StorageError::AccountNotFound(user_id.as_i32()))?;

        if !record.account.items.contains(&item_id) {
            record.account.items.push(item_id);
        }
        Ok(())
    }

    async fn remove_cart_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        if !inner.items.contains_key(&item_id.as_i32()) {
            return Err(StorageError::ItemNotFound(item_id.as_i32()));
        }

        let record = inner
            .users
            .get_mut(&user_id.as_i32())
            .ok_or(StorageError::AccountNotFound(user_id.as_i32()))?;

        record.account.items.retain(|id| *id != item_id);
        Ok(())
    }

    async fn checkout(&self, user_id: UserId) -> Result<Order, StorageError> {
        let mut inner = self.inner.lock().await;

        let cart = inner
            .users
            .get(&user_id.as_i32())
            .ok_or(StorageError::AccountNotFound(user_id.as_i32()))?
            .account
            .items
            .clone();

        if cart.is_empty() {
            return Err(StorageError::EmptyCart);
        }

        let total: Decimal = cart
            .iter()
            .filter_map(|id| inner.items.get(&id.as_i32()))
            .map(|item| item.price)
            .sum();

        let order_id = Inner::next_id(&mut inner.next_order_id);
        let order = Order {
            id: OrderId::new(order_id),
            user_id,
            items: cart,
            total,
            status: OrderStatus::pending(),
            created_at: Utc::now(),
        };
        inner.orders.insert(order_id, order.clone());

        // Same atomic unit as the insert above: history gains the order,
        // the cart empties.
        if let Some(record) = inner.users.get_mut(&user_id.as_i32()) {
            record.account.orders.push(order.id);
            record.account.items.clear();
        }

        Ok(order)
    }

    // =========================================================================
    // Items
    // =========================================================================

    async fn create_item(&self, item: &NewItem) -> Result<Item, StorageError> {
        let mut inner = self.inner.lock().await;

        let id = Inner::next_id(&mut inner.next_item_id);
        let item = Item {
            id: ItemId::new(id),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            created_at: Utc::now(),
        };
        inner.items.insert(id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.items.get(&id.as_i32()).cloned())
    }

    async fn list_items(&self) -> Result<Vec<Item>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.items.values().cloned().collect())
    }

    async fn update_item(&self, id: ItemId, item: &NewItem) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        let existing = inner
            .items
            .get_mut(&id.as_i32())
            .ok_or(StorageError::ItemNotFound(id.as_i32()))?;
        existing.name = item.name.clone();
        existing.description = item.description.clone();
        existing.price = item.price;
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;

        if inner.items.remove(&id.as_i32()).is_none() {
            return Err(StorageError::ItemNotFound(id.as_i32()));
        }

        // Purge from every cart in the same critical section.
        for record in inner.users.values_mut() {
            record.account.items.retain(|item_id| *item_id != id);
        }
        Ok(())
    }

    async fn get_items_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.items.get(&id.as_i32()).cloned())
            .collect())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    async fn create_order(&self, order: &NewOrder) -> Result<Order, StorageError> {
        let mut inner = self.inner.lock().await;

        if !inner.users.contains_key(&order.user_id.as_i32()) {
            return Err(StorageError::AccountNotFound(order.user_id.as_i32()));
        }

        let id = Inner::next_id(&mut inner.next_order_id);
        let order_record = Order {
            id: OrderId::new(id),
            user_id: order.user_id,
            items: order.items.clone(),
            total: order.total,
            status: OrderStatus::pending(),
            created_at: Utc::now(),
        };
        inner.orders.insert(id, order_record.clone());

        if let Some(record) = inner.users.get_mut(&order.user_id.as_i32()) {
            record.account.orders.push(order_record.id);
        }
        Ok(order_record)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.get(&id.as_i32()).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner.orders.values().cloned().collect())
    }

    async fn get_orders_by_ids(&self, ids: &[OrderId]) -> Result<Vec<Order>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.orders.get(&id.as_i32()).cloned())
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        let order = inner
            .orders
            .get_mut(&id.as_i32())
            .ok_or(StorageError::OrderNotFound(id.as_i32()))?;
        order.status = status.clone();
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        inner
            .orders
            .remove(&id.as_i32())
            .map(|_| ())
            .ok_or(StorageError::OrderNotFound(id.as_i32()))
    }
}
