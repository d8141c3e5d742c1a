/// PostgreSQL document store
///
/// All collections share one table; each row is a JSONB document tagged with
/// its collection name. Equality filters are evaluated with JSONB containment
/// (`body @> filter`), which the GIN index on `body` serves.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE documents (
///     seq BIGSERIAL PRIMARY KEY,
///     collection TEXT NOT NULL,
///     body JSONB NOT NULL,
///     inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `seq` gives collections a stable insertion order for paging.
///
/// Upserts take a transaction-scoped advisory lock keyed on the collection and
/// filter, so concurrent upserts of a missing key produce one document.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tracing::debug;

use super::{Document, DocumentStore, Filter, StoreResult, Update, UpsertOutcome};
use crate::db::pool::health_check;

/// Document store backed by a sqlx PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Wraps an existing pool (migrations must already have run)
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND body @> $2
            ORDER BY seq
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(Json(filter.as_document()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn find_page(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)> {
        let rows = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1
            ORDER BY seq
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(collection)
        .bind(to_i64(skip))
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(|Json(doc)| doc).collect(),
            total.max(0) as u64,
        ))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND body @> $2",
        )
        .bind(collection)
        .bind(Json(filter.as_document()))
        .fetch_one(&self.pool)
        .await?;

        Ok(total.max(0) as u64)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        sqlx::query("INSERT INTO documents (collection, body) VALUES ($1, $2)")
            .bind(collection)
            .bind(Json(document))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes upserts on the same (collection, filter) so two callers
        // missing the same key cannot both insert
        let lock_key = format!("{}:{}", collection, Value::Object(filter.as_document().clone()));
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_scalar::<_, Json<Document>>(
            r#"
            UPDATE documents
            SET body = body || $3
            WHERE seq = (
                SELECT seq
                FROM documents
                WHERE collection = $1 AND body @> $2
                ORDER BY seq
                LIMIT 1
                FOR UPDATE
            )
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(Json(filter.as_document()))
        .bind(Json(&update.set))
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match updated {
            Some(Json(document)) => UpsertOutcome {
                document,
                upserted: false,
            },
            None => {
                let Json(document) = sqlx::query_scalar::<_, Json<Document>>(
                    "INSERT INTO documents (collection, body) VALUES ($1, $2) RETURNING body",
                )
                .bind(collection)
                .bind(Json(update.document_for_insert(filter)))
                .fetch_one(&mut *tx)
                .await?;

                debug!(collection, "Upsert created a new document");
                UpsertOutcome {
                    document,
                    upserted: true,
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }
}
