//! Common test utilities for integration tests
//!
//! Every `TestContext` gets its own in-memory document store, a router built
//! exactly as the server builds it, and one seeded staff user with a valid
//! access token.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use restaurant_api::app::{build_router, AppState};
use restaurant_api::config::{ApiConfig, Config, JwtConfig, StorageBackend, StorageConfig};
use restaurant_shared::auth::jwt::TokenService;
use restaurant_shared::models::{new_identity, now, table::Table, user::User};
use restaurant_shared::store::memory::MemoryDocumentStore;
use restaurant_shared::store::RequestScope;
use serde_json::Value;
use std::sync::Arc;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Argon2id digest of nothing in particular; seeded users never log in
const PLACEHOLDER_DIGEST: &str = "$argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHQ$aGFzaA";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    pub state: AppState,
    pub app: axum::Router,
    pub user: User,
    pub token: String,
}

/// Status and raw body of one response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response body is not JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 1,
            operation_timeout_secs: 5,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_ttl_hours: 24,
            refresh_ttl_hours: 168,
        },
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let state = AppState::from_config(store.clone(), test_config()).unwrap();
        let app = build_router(state.clone());

        let user = seed_user(&state, "host@bistro.io", "+1-555-0000").await;
        let token = state
            .tokens
            .issue_token_pair(&user.email, &user.first_name, &user.last_name, &user.user_id)
            .unwrap()
            .token;

        TestContext {
            store,
            state,
            app,
            user,
            token,
        }
    }

    /// Sends a request through the full router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Body>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse { status, body }
    }

    /// Authenticated GET
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, Some(&self.token), None).await
    }

    /// Authenticated POST with a JSON body
    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send("POST", uri, Some(&self.token), Some(Body::from(body.to_string())))
            .await
    }

    /// Authenticated PUT with a JSON body
    pub async fn put_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send("PUT", uri, Some(&self.token), Some(Body::from(body.to_string())))
            .await
    }

    /// Unauthenticated POST with a JSON body
    pub async fn post_public(&self, uri: &str, body: Value) -> TestResponse {
        self.send("POST", uri, None, Some(Body::from(body.to_string())))
            .await
    }

    /// Inserts `n` users straight into the store (no password hashing)
    pub async fn seed_users(&self, n: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(n);
        for i in 0..n {
            users.push(
                seed_user(
                    &self.state,
                    &format!("staff{}@bistro.io", i),
                    &format!("+1-555-{:04}", i + 1),
                )
                .await,
            );
        }
        users
    }

    pub async fn seed_table(&self) -> Table {
        let (id, table_id) = new_identity();
        let stamp = now();
        let table = Table {
            id,
            table_id,
            number_of_guests: Some(4),
            table_number: Some(7),
            created_at: stamp,
            updated_at: stamp,
        };
        self.state
            .tables
            .insert_one(&RequestScope::default(), &table)
            .await
            .unwrap();
        table
    }

    /// Token service with other lifetimes but the same secret
    pub fn token_service(&self, access_ttl: chrono::Duration) -> TokenService {
        TokenService::new(TEST_SECRET, access_ttl, chrono::Duration::hours(1)).unwrap()
    }
}

async fn seed_user(state: &AppState, email: &str, phone: &str) -> User {
    let (id, user_id) = new_identity();
    let stamp = now();
    let user = User {
        id,
        user_id,
        first_name: "Sam".to_string(),
        last_name: "Host".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        password: PLACEHOLDER_DIGEST.to_string(),
        avatar: None,
        token: None,
        refresh_token: None,
        created_at: stamp,
        updated_at: stamp,
    };
    state
        .users
        .insert_one(&RequestScope::default(), &user)
        .await
        .unwrap();
    user
}
