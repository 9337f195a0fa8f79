//! Account models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use minimart_core::{AdminId, ItemId, OrderId, UserId, Username};

/// An administrator account.
///
/// The password hash and any cached auth token live only in storage;
/// they are never part of the serialized account.
#[derive(Debug, Clone, Serialize)]
pub struct AdminAccount {
    pub id: AdminId,
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

/// A customer account.
///
/// `items` is the cart: an insertion-ordered list of item ids awaiting
/// checkout. `orders` is the account's order history. Both are mutated
/// only through the cart service.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: Username,
    pub items: Vec<ItemId>,
    pub orders: Vec<OrderId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_account_serialization_has_no_credential() {
        let account = UserAccount {
            id: UserId::new(1),
            username: Username::parse("alice").unwrap(),
            items: vec![ItemId::new(2)],
            orders: vec![],
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["items"][0], 2);
        assert!(json.get("password").is_none());
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("auth_token").is_none());
    }
}
