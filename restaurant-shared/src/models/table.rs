/// Dining tables
///
/// Tables are standalone; orders point at them by `table_id` without owning
/// them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::now;
use crate::store::{Collection, Filter, RequestScope, StoreResult, Update, Upserted};

/// Table document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Public id
    pub table_id: String,

    /// Seats at the table
    #[serde(default)]
    pub number_of_guests: Option<i32>,

    /// Number shown to staff on the floor plan
    #[serde(default)]
    pub table_number: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial table update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableChanges {
    pub number_of_guests: Option<i32>,
    pub table_number: Option<i32>,
}

impl Table {
    pub const COLLECTION: &'static str = "tables";

    pub async fn find_by_table_id(
        tables: &Collection<Table>,
        scope: &RequestScope,
        table_id: &str,
    ) -> StoreResult<Option<Table>> {
        tables.find_one(scope, Filter::eq("table_id", table_id)).await
    }

    /// Whether a table with this public id exists
    pub async fn exists(
        tables: &Collection<Table>,
        scope: &RequestScope,
        table_id: &str,
    ) -> StoreResult<bool> {
        tables.exists(scope, Filter::eq("table_id", table_id)).await
    }

    /// Applies `changes` to the table with public id `table_id`, creating it if absent
    pub async fn upsert(
        tables: &Collection<Table>,
        scope: &RequestScope,
        table_id: &str,
        changes: TableChanges,
    ) -> StoreResult<Upserted<Table>> {
        let stamp = json!(now());
        let mut update = Update::new()
            .set("updated_at", stamp.clone())
            .set_on_insert("_id", json!(Uuid::new_v4()))
            .set_on_insert("created_at", stamp);

        if let Some(guests) = changes.number_of_guests {
            update = update.set("number_of_guests", guests);
        }
        if let Some(number) = changes.table_number {
            update = update.set("table_number", number);
        }

        tables
            .upsert_one(scope, Filter::eq("table_id", table_id), update)
            .await
    }
}
