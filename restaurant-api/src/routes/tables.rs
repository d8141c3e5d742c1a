/// Table endpoints
///
/// All routes require the `token` header.
///
/// - `GET /tables` - List tables
/// - `GET /tables/:table_id` - Fetch one table
/// - `POST /tables` - Create a table
/// - `PUT /tables/:table_id` - Update a table, creating it if the id is unknown

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
use restaurant_shared::{
    models::{
        new_identity, now,
        table::{Table, TableChanges},
    },
    store::RequestScope,
};
use serde::Deserialize;
use validator::Validate;

/// Create table request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTableRequest {
    #[validate(range(min = 1, max = 100, message = "number_of_guests must be between 1 and 100"))]
    pub number_of_guests: i32,

    #[validate(range(min = 1, message = "table_number must be positive"))]
    pub table_number: i32,
}

/// Update table request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTableRequest {
    #[validate(range(min = 1, max = 100, message = "number_of_guests must be between 1 and 100"))]
    pub number_of_guests: Option<i32>,

    #[validate(range(min = 1, message = "table_number must be positive"))]
    pub table_number: Option<i32>,
}

pub async fn list_tables(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ListResponse<Table>>> {
    let Query(params) = query?;
    let pagination = Pagination::from(&params);

    let page = state
        .tables
        .find_page(&scope, pagination.skip, pagination.records_per_page)
        .await?;

    Ok(Json(ListResponse::new(pagination, page.total_count, page.items)))
}

pub async fn get_table(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(table_id): Path<String>,
) -> ApiResult<Json<Table>> {
    let table = Table::find_by_table_id(&state.tables, &scope, &table_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Table not found".to_string()))?;

    Ok(Json(table))
}

pub async fn create_table(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    payload: Result<Json<CreateTableRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    let Json(req) = payload?;
    req.validate()?;

    let (id, table_id) = new_identity();
    let stamp = now();
    let table = Table {
        id,
        table_id,
        number_of_guests: Some(req.number_of_guests),
        table_number: Some(req.table_number),
        created_at: stamp,
        updated_at: stamp,
    };

    state.tables.insert_one(&scope, &table).await?;

    tracing::info!(table_id = %table.table_id, "Table created");

    Ok((StatusCode::CREATED, Json(table)))
}

/// Update a table
///
/// Same upsert policy as orders: an unknown id creates a table with that id.
pub async fn update_table(
    State(state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(table_id): Path<String>,
    payload: Result<Json<UpdateTableRequest>, JsonRejection>,
) -> ApiResult<Json<UpsertResponse<Table>>> {
    let Json(req) = payload?;
    req.validate()?;

    let changes = TableChanges {
        number_of_guests: req.number_of_guests,
        table_number: req.table_number,
    };

    let result = Table::upsert(&state.tables, &scope, &table_id, changes).await?;

    tracing::info!(%table_id, upserted = result.upserted, "Table updated");

    Ok(Json(result.into()))
}
