//! Order history of a signed-in customer.

use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checkout::{OrderItemRecord, OrderRecord};
use crate::error::CommerceError;
use crate::ids::UserId;
use crate::remote::RemoteStore;

/// An order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}

impl OrderSummary {
    /// Total quantity across lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of the stored line prices.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(OrderItemRecord::line_total).sum()
    }
}

/// Reads past orders.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    remote: RemoteStore,
}

impl OrderHistory {
    pub fn new(remote: RemoteStore) -> Self {
        Self { remote }
    }

    /// A user's orders, newest first, each with its lines.
    pub async fn fetch(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, CommerceError> {
        let orders = self.remote.orders_for_user(user_id).await?;
        tracing::debug!(user_id = %user_id, count = orders.len(), "orders fetched");

        let items = try_join_all(orders.iter().map(|order| self.remote.order_items(&order.id))).await?;

        Ok(orders
            .into_iter()
            .zip(items)
            .map(|(order, items)| OrderSummary { order, items })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tables;
    use craft_data::TimeoutConfig;
    use craft_db::{Db, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_newest_first_with_items() {
        let memory = MemoryStore::new()
            .with_rows(
                tables::ORDERS,
                [
                    json!({"id": "o1", "user_id": "u1", "subtotal": 10, "total_price": 70, "created_at": "2024-05-01T10:00:00Z"}),
                    json!({"id": "o2", "user_id": "u1", "subtotal": 20, "total_price": 80, "created_at": "2024-06-01T10:00:00Z"}),
                    json!({"id": "o3", "user_id": "u2", "subtotal": 5, "total_price": 65, "created_at": "2024-07-01T10:00:00Z"}),
                ],
            )
            .with_rows(
                tables::ORDER_ITEMS,
                [
                    json!({"id": "i1", "order_id": "o2", "product_id": "p1", "quantity": 2, "price": "10", "size": "Medium"}),
                    json!({"id": "i2", "order_id": "o1", "product_id": "p2", "quantity": 1, "price": "10", "size": "Small"}),
                ],
            );
        let remote = RemoteStore::new(Db::new(Arc::new(memory)), TimeoutConfig::default());

        let history = OrderHistory::new(remote).fetch(&UserId::new("u1")).await.unwrap();

        let ids: Vec<_> = history.iter().map(|o| o.order.id.as_str()).collect();
        assert_eq!(ids, vec!["o2", "o1"]);
        assert_eq!(history[0].item_count(), 2);
        assert_eq!(history[0].items_total(), Decimal::new(20, 0));
    }
}
