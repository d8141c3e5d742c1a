/// API route handlers
///
/// Handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login, user lookup
/// - `orders`: Order CRUD
/// - `tables`: Table CRUD
/// - `pagination`: List query parsing and response envelope

pub mod health;
pub mod orders;
pub mod pagination;
pub mod tables;
pub mod users;

use restaurant_shared::store::Upserted;
use serde::{Deserialize, Serialize};

/// Body of a `PUT` response
///
/// The entity's fields are inlined next to `upserted`, which is `true` when
/// the id did not exist and the update created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResponse<T> {
    pub upserted: bool,

    #[serde(flatten)]
    pub entity: T,
}

impl<T> From<Upserted<T>> for UpsertResponse<T> {
    fn from(result: Upserted<T>) -> Self {
        Self {
            upserted: result.upserted,
            entity: result.entity,
        }
    }
}
