/// Orders
///
/// An order may be seated at a table (`table_id`). The reference is checked
/// against the `tables` collection by the handlers on create and update;
/// nothing here enforces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::now;
use crate::store::{Collection, Filter, RequestScope, StoreResult, Update, Upserted};

/// Order document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Public id
    pub order_id: String,

    /// When the order was placed
    pub order_date: DateTime<Utc>,

    /// Public id of the table, if any
    #[serde(default)]
    pub table_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial order update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub order_date: Option<DateTime<Utc>>,
    pub table_id: Option<String>,
}

impl Order {
    pub const COLLECTION: &'static str = "orders";

    pub async fn find_by_order_id(
        orders: &Collection<Order>,
        scope: &RequestScope,
        order_id: &str,
    ) -> StoreResult<Option<Order>> {
        orders.find_one(scope, Filter::eq("order_id", order_id)).await
    }

    /// Applies `changes` to the order with public id `order_id`, creating it if absent
    ///
    /// A created order gets a fresh internal id, `created_at`, and an
    /// `order_date` of now unless `changes` supplies one.
    pub async fn upsert(
        orders: &Collection<Order>,
        scope: &RequestScope,
        order_id: &str,
        changes: OrderChanges,
    ) -> StoreResult<Upserted<Order>> {
        let stamp = json!(now());
        let mut update = Update::new()
            .set("updated_at", stamp.clone())
            .set_on_insert("_id", json!(Uuid::new_v4()))
            .set_on_insert("created_at", stamp.clone())
            .set_on_insert("order_date", stamp);

        if let Some(order_date) = changes.order_date {
            update = update.set("order_date", json!(order_date));
        }
        if let Some(table_id) = changes.table_id {
            update = update.set("table_id", table_id);
        }

        orders
            .upsert_one(scope, Filter::eq("order_id", order_id), update)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_identity;
    use crate::store::memory::MemoryDocumentStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn orders() -> Collection<Order> {
        Collection::new(Arc::new(MemoryDocumentStore::new()), Order::COLLECTION)
    }

    #[tokio::test]
    async fn test_upsert_existing_keeps_identity() {
        let orders = orders();
        let scope = RequestScope::default();
        let (id, order_id) = new_identity();
        let placed = Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap();
        let order = Order {
            id,
            order_id: order_id.clone(),
            order_date: placed,
            table_id: None,
            created_at: placed,
            updated_at: placed,
        };
        orders.insert_one(&scope, &order).await.unwrap();

        let result = Order::upsert(
            &orders,
            &scope,
            &order_id,
            OrderChanges {
                order_date: None,
                table_id: Some("t-9".into()),
            },
        )
        .await
        .unwrap();

        assert!(!result.upserted);
        assert_eq!(result.entity.id, id);
        assert_eq!(result.entity.order_date, placed);
        assert_eq!(result.entity.created_at, placed);
        assert_eq!(result.entity.table_id.as_deref(), Some("t-9"));
        assert!(result.entity.updated_at > placed);
    }

    #[tokio::test]
    async fn test_upsert_missing_creates_with_given_id() {
        let orders = orders();
        let scope = RequestScope::default();
        let placed = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();

        let result = Order::upsert(
            &orders,
            &scope,
            "does-not-exist",
            OrderChanges {
                order_date: Some(placed),
                table_id: None,
            },
        )
        .await
        .unwrap();

        assert!(result.upserted);
        assert_eq!(result.entity.order_id, "does-not-exist");
        assert_eq!(result.entity.order_date, placed);
        assert!(result.entity.table_id.is_none());

        let found = Order::find_by_order_id(&orders, &scope, "does-not-exist")
            .await
            .unwrap();
        assert_eq!(found, Some(result.entity));
    }
}
