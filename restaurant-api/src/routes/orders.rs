/// Order endpoints
///
/// All routes require the `token` header.
///
/// # Endpoints
///
/// - `GET /orders` - List orders
/// - `GET /orders/:order_id` - Fetch one order
/// - `POST /orders` - Create an order
/// - `PUT /orders/:order_id` - Update an order, creating it if the id is unknown
///
/// A `table_id` in a create or update body must name an existing table. The
/// check and the write are separate store operations.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        pagination::{ListParams, ListResponse, Pagination},
        UpsertResponse,
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, SubsecRound, Utc};
use restaurant_shared::{
    auth::middleware::AuthContext,
    models::{
        new_identity, now,
        order::{Order, OrderChanges},
        table::Table,
    },
    store::RequestScope,
};
use serde::Deserialize;
use validator::Validate;

/// Create order request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub order_date: DateTime<Utc>,

    #[validate(length(min = 1, max = 64, message = "table_id must be 1 to 64 characters"))]
    pub table_id: Option<String>,
}

/// Update order request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    pub order_date: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 64, message = "table_id must be 1 to 64 characters"))]
    pub table_id: Option<String>,
}

/// Fails with 404 unless `table_id` names an existing table
async fn require_table(state: &AppState, scope: &RequestScope, table_id: &str) -> ApiResult<()> {
    if Table::exists(&state.tables, scope, table_id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound("Table was not found".to_string()))
    }
}

/// List orders
///
/// ```text
/// GET /orders?page=2&recordsPerPage=5
/// ```
///
/// Response:
/// ```json
/// { "total_count": 12, "page": 2, "records_per_page": 5, "items": [ ... ] }
/// ```
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListResponse<Order>>> {
    let Query(params) = query?;
    let pagination = Pagination::from(&params);

    let page = state
        .orders
        .find_page(&scope, pagination.skip, pagination.records_per_page)
        .await?;

    Ok(Json(ListResponse::new(pagination, page.total_count, page.items)))
}

/// Fetch one order by public id
///
/// # Errors
///
/// - `404 Not Found`: No order with that id
pub async fn get_order(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Order>> {
    let order = Order::find_by_order_id(&state.orders, &scope, &order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    Ok(Json(order))
}

/// Create an order
///
/// # Endpoint
///
/// ```text
/// POST /orders
/// Content-Type: application/json
/// token: eyJ...
///
/// { "order_date": "2024-03-13T19:30:00Z", "table_id": "9b1c..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or validation failed
/// - `404 Not Found`: `table_id` does not name a table; nothing is stored
pub async fn create_order(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let Json(req) = payload?;
    req.validate()?;

    if let Some(table_id) = &req.table_id {
        require_table(&state, &scope, table_id).await?;
    }

    let (id, order_id) = new_identity();
    let stamp = now();
    let order = Order {
        id,
        order_id,
        order_date: req.order_date.trunc_subsecs(0),
        table_id: req.table_id,
        created_at: stamp,
        updated_at: stamp,
    };

    state.orders.insert_one(&scope, &order).await?;

    tracing::info!(order_id = %order.order_id, created_by = %auth.uid, "Order created");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Update an order
///
/// Keyed by public id. If no order has that id, one is created with it
/// (`"upserted": true` in the response).
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or validation failed
/// - `404 Not Found`: `table_id` does not name a table; nothing is written
pub async fn update_order(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> ApiResult<Json<UpsertResponse<Order>>> {
    let Json(req) = payload?;
    req.validate()?;

    if let Some(table_id) = &req.table_id {
        require_table(&state, &scope, table_id).await?;
    }

    let changes = OrderChanges {
        order_date: req.order_date.map(|d| d.trunc_subsecs(0)),
        table_id: req.table_id,
    };

    let result = Order::upsert(&state.orders, &scope, &order_id, changes).await?;

    if result.upserted {
        tracing::info!(%order_id, updated_by = %auth.uid, "Order update created a new order");
    } else {
        tracing::info!(%order_id, updated_by = %auth.uid, "Order updated");
    }

    Ok(Json(result.into()))
}
