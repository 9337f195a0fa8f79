//! Catalog item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use minimart_core::ItemId;

/// A catalog item.
///
/// Carts and order snapshots reference items by id only; deleting an item
/// purges it from every cart in the same transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating or replacing a catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_wire_format() {
        let item = Item {
            id: ItemId::new(3),
            name: "mug".to_owned(),
            description: "ceramic mug".to_owned(),
            price: Decimal::new(1050, 2),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["desc"], "ceramic mug");
        assert_eq!(json["price"], "10.50");
    }
}
