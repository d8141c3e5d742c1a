/// Staff user accounts
///
/// # Document
///
/// ```json
/// {
///   "_id": "6f2c4a9e-...",
///   "user_id": "6f2c4a9e...",
///   "first_name": "Ana",
///   "last_name": "Lopez",
///   "email": "ana@bistro.io",
///   "phone": "+1-555-0100",
///   "password": "$argon2id$v=19$...",
///   "avatar": null,
///   "token": "eyJ...",
///   "refresh_token": "eyJ...",
///   "created_at": "2024-03-13T18:02:11Z",
///   "updated_at": "2024-03-13T18:02:11Z"
/// }
/// ```
///
/// `email` and `phone` are unique across users. Uniqueness is checked by the
/// signup handler before inserting; the check and the insert are separate
/// operations, so two concurrent signups with the same email can both pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Collection, Filter, RequestScope, StoreResult};

/// User document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Internal id
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Public id (hex of `id`)
    pub user_id: String,

    pub first_name: String,
    pub last_name: String,

    /// Unique across users
    pub email: String,

    /// Unique across users
    pub phone: String,

    /// Argon2id PHC digest. Never plaintext, never returned to clients.
    pub password: String,

    #[serde(default)]
    pub avatar: Option<String>,

    /// Current access token (overwritten on every login)
    #[serde(default)]
    pub token: Option<String>,

    /// Current refresh token (overwritten on every login)
    #[serde(default)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const COLLECTION: &'static str = "users";

    /// Finds a user by public id
    pub async fn find_by_user_id(
        users: &Collection<User>,
        scope: &RequestScope,
        user_id: &str,
    ) -> StoreResult<Option<User>> {
        users.find_one(scope, Filter::eq("user_id", user_id)).await
    }

    /// Finds a user by email (exact match)
    pub async fn find_by_email(
        users: &Collection<User>,
        scope: &RequestScope,
        email: &str,
    ) -> StoreResult<Option<User>> {
        users.find_one(scope, Filter::eq("email", email)).await
    }

    pub async fn email_taken(
        users: &Collection<User>,
        scope: &RequestScope,
        email: &str,
    ) -> StoreResult<bool> {
        users.exists(scope, Filter::eq("email", email)).await
    }

    pub async fn phone_taken(
        users: &Collection<User>,
        scope: &RequestScope,
        phone: &str,
    ) -> StoreResult<bool> {
        users.exists(scope, Filter::eq("phone", phone)).await
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(email: &str, phone: &str) -> User {
        let (id, user_id) = super::new_identity();
        let stamp = super::now();
        User {
            id,
            user_id,
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            phone: phone.into(),
            password: "$argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHQ$aGFzaA".into(),
            avatar: None,
            token: None,
            refresh_token: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }
}
