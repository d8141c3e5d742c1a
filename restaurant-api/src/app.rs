/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use restaurant_api::{app::{build_router, AppState}, config::Config};
/// use restaurant_shared::store::memory::MemoryDocumentStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(Arc::new(MemoryDocumentStore::new()), config)?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use restaurant_shared::{
    auth::{
        jwt::{JwtError, TokenService},
        middleware::{token_auth, TOKEN_HEADER},
    },
    models::{order::Order, table::Table, user::User},
    store::{Collection, DocumentStore, RequestScope},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Injected document store, shared by every collection handle
    pub store: Arc<dyn DocumentStore>,

    pub users: Collection<User>,
    pub orders: Collection<Order>,
    pub tables: Collection<Table>,

    /// Token signing and validation
    pub tokens: Arc<TokenService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService, config: Config) -> Self {
        Self {
            users: Collection::new(Arc::clone(&store), User::COLLECTION),
            orders: Collection::new(Arc::clone(&store), Order::COLLECTION),
            tables: Collection::new(Arc::clone(&store), Table::COLLECTION),
            store,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }

    /// Creates state with a token service built from `config.jwt`
    ///
    /// # Errors
    ///
    /// Returns `JwtError::MissingSecret` if the configured secret is blank.
    pub fn from_config(store: Arc<dyn DocumentStore>, config: Config) -> Result<Self, JwtError> {
        let tokens = TokenService::new(
            &config.jwt.secret,
            config.jwt.access_ttl(),
            config.jwt.refresh_ttl(),
        )?;
        Ok(Self::new(store, tokens, config))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health               # Health check (public)
/// ├── /users
/// │   ├── POST /signup           # public
/// │   ├── POST /login            # public
/// │   ├── GET  /                 # token
/// │   └── GET  /:user_id         # token
/// ├── /orders                    # token
/// │   ├── GET  /
/// │   ├── POST /
/// │   ├── GET  /:order_id
/// │   └── PUT  /:order_id
/// └── /tables                    # token
///     ├── GET  /
///     ├── POST /
///     ├── GET  /:table_id
///     └── PUT  /:table_id
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Request scope (one `RequestScope` per request)
/// 4. `token` header authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{health, orders, tables, users};

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/users/signup", post(users::signup))
        .route("/users/login", post(users::login));

    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:user_id", get(users::get_user))
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/:order_id",
            get(orders::get_order).put(orders::update_order),
        )
        .route("/tables", get(tables::list_tables).post(tables::create_table))
        .route(
            "/tables/:table_id",
            get(tables::get_table).put(tables::update_table),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.tokens),
            token_auth,
        ));

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), request_scope))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Opens a `RequestScope` for the request and releases it when the request ends
///
/// Handlers pick the scope up with `Extension<RequestScope>`.
async fn request_scope(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let scope = RequestScope::new(state.config.storage.operation_timeout());
    let _release = scope.release_on_drop();

    req.extensions_mut().insert(scope);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, JwtConfig, StorageBackend, StorageConfig};
    use restaurant_shared::store::memory::MemoryDocumentStore;

    fn config(secret: &str) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors_origins: vec!["*".into()],
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                max_connections: 1,
                operation_timeout_secs: 5,
            },
            jwt: JwtConfig {
                secret: secret.into(),
                access_ttl_hours: 24,
                refresh_ttl_hours: 168,
            },
        }
    }

    #[test]
    fn test_app_state_wires_collections() {
        let state = AppState::from_config(
            Arc::new(MemoryDocumentStore::new()),
            config("test-secret-key-at-least-32-bytes-long"),
        )
        .unwrap();

        assert_eq!(state.users.name(), "users");
        assert_eq!(state.orders.name(), "orders");
        assert_eq!(state.tables.name(), "tables");
        assert_eq!(state.store.backend(), "memory");
    }

    #[test]
    fn test_blank_secret_fails_closed() {
        let result = AppState::from_config(Arc::new(MemoryDocumentStore::new()), config(""));
        assert!(matches!(result, Err(JwtError::MissingSecret)));
    }
}
