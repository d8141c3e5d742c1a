/// Document store abstraction
///
/// Entities are persisted as JSON documents grouped into named collections.
/// The storage client is constructed once at startup and injected into the
/// application state; nothing in this crate holds a process-wide handle.
///
/// # Modules
///
/// - [`memory`]: in-process backend (tests, local development)
/// - [`postgres`]: JSONB-backed backend on top of the sqlx pool
/// - [`collection`]: typed view over one collection
/// - [`scope`]: per-request cancellation and per-operation timeout
///
/// # Example
///
/// ```
/// use restaurant_shared::store::{memory::MemoryDocumentStore, Filter, DocumentStore};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), restaurant_shared::store::StoreError> {
/// let store = MemoryDocumentStore::new();
/// let doc = json!({ "table_id": "t1", "table_number": 4 });
/// store.insert_one("tables", doc.as_object().cloned().unwrap_or_default()).await?;
///
/// let found = store.find_one("tables", &Filter::eq("table_id", "t1")).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

pub mod collection;
pub mod memory;
pub mod postgres;
pub mod scope;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

pub use collection::{Collection, Page, Upserted};
pub use scope::RequestScope;

/// A stored document: a JSON object
pub type Document = Map<String, Value>;

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A stored document could not be decoded into the entity type
    #[error("Failed to decode document from {collection}: {message}")]
    Decode { collection: String, message: String },

    /// An entity could not be encoded into a document
    #[error("Failed to encode document: {0}")]
    Encode(String),

    /// The operation exceeded the per-operation timeout
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The request scope was released before the operation finished
    #[error("Storage operation cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Equality filter over top-level document fields
///
/// An empty filter matches every document in the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Document,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching documents whose `field` equals `value`
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Adds another equality clause
    pub fn and(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    /// Whether `doc` satisfies every clause
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// Clauses as a JSON object (used for containment queries)
    pub fn as_document(&self) -> &Document {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field assignments applied by an upsert
///
/// `set` is applied on both branches; `set_on_insert` only when no document
/// matched and a new one is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Document,
    pub set_on_insert: Document,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set.insert(field.to_string(), value.into());
        self
    }

    pub fn set_on_insert(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set_on_insert.insert(field.to_string(), value.into());
        self
    }

    /// Builds the document inserted when nothing matched `filter`
    ///
    /// Filter fields come first, then insert-only fields, then `set`, so an
    /// explicit `set` always wins.
    pub fn document_for_insert(&self, filter: &Filter) -> Document {
        let mut doc = filter.as_document().clone();
        doc.extend(self.set_on_insert.clone());
        doc.extend(self.set.clone());
        doc
    }

    /// Applies `set` onto an existing document
    pub fn apply_to(&self, doc: &mut Document) {
        doc.extend(self.set.clone());
    }
}

/// Outcome of an upsert
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    /// The document as stored after the operation
    pub document: Document,

    /// True if no document matched and one was created
    pub upserted: bool,
}

/// Storage client contract
///
/// Single-document writes are atomic; there are no multi-document
/// transactions, so check-then-insert sequences built on top of this trait
/// are not atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// First document (in insertion order) matching `filter`
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Window of `limit` documents starting at `skip`, plus the collection's total size
    async fn find_page(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)>;

    /// Number of documents matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    /// Updates the first document matching `filter`, or inserts one if none does
    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpsertOutcome>;

    /// Connectivity check
    async fn ping(&self) -> StoreResult<()>;
}
