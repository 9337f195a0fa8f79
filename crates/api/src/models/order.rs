//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use minimart_core::{ItemId, OrderId, OrderStatus, UserId};

/// An order snapshot.
///
/// The item list and total are fixed at creation and never recomputed,
/// even if catalog prices change later. Only `status` is mutable.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<ItemId>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an order.
///
/// Checkout computes these from the user's cart; admins can also supply
/// them directly. The new order always starts as `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<ItemId>,
    pub total: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_wire_format() {
        let order = Order {
            id: OrderId::new(9),
            user_id: UserId::new(1),
            items: vec![ItemId::new(2), ItemId::new(3)],
            total: Decimal::new(2500, 2),
            status: OrderStatus::pending(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["user_id"], 1);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["total"], "25.00");
    }
}
