/// Typed collection handle
///
/// Wraps the injected [`DocumentStore`] with a collection name and an entity
/// type. Encoding and decoding happen here; a stored document that does not
/// decode into `T` becomes a [`StoreError::Decode`] for the one request that
/// hit it.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Document, DocumentStore, Filter, RequestScope, StoreError, StoreResult, Update};

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Size of the whole collection, independent of the window
    pub total_count: u64,
}

/// Result of [`Collection::upsert_one`]
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub entity: T,

    /// True if the upsert created the document
    pub upserted: bool,
}

/// Typed view of one collection
pub struct Collection<T> {
    name: &'static str,
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn DocumentStore>, name: &'static str) -> Self {
        Self {
            name,
            store,
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn decode(&self, doc: Document) -> StoreResult<T> {
        serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode {
            collection: self.name.to_string(),
            message: e.to_string(),
        })
    }

    fn encode(entity: &T) -> StoreResult<Document> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(other) => Err(StoreError::Encode(format!(
                "expected a JSON object, got {}",
                other
            ))),
            Err(e) => Err(StoreError::Encode(e.to_string())),
        }
    }

    pub async fn find_one(&self, scope: &RequestScope, filter: Filter) -> StoreResult<Option<T>> {
        scope
            .run(self.store.find_one(self.name, &filter))
            .await?
            .map(|doc| self.decode(doc))
            .transpose()
    }

    /// Whether any document matches `filter`
    pub async fn exists(&self, scope: &RequestScope, filter: Filter) -> StoreResult<bool> {
        Ok(self.count(scope, filter).await? > 0)
    }

    pub async fn count(&self, scope: &RequestScope, filter: Filter) -> StoreResult<u64> {
        scope.run(self.store.count(self.name, &filter)).await
    }

    pub async fn find_page(&self, scope: &RequestScope, skip: u64, limit: u64) -> StoreResult<Page<T>> {
        let (docs, total_count) = scope
            .run(self.store.find_page(self.name, skip, limit))
            .await?;

        let items = docs
            .into_iter()
            .map(|doc| self.decode(doc))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page { items, total_count })
    }

    pub async fn insert_one(&self, scope: &RequestScope, entity: &T) -> StoreResult<()> {
        let doc = Self::encode(entity)?;
        scope.run(self.store.insert_one(self.name, doc)).await
    }

    /// Update-or-insert keyed by `filter`
    pub async fn upsert_one(
        &self,
        scope: &RequestScope,
        filter: Filter,
        update: Update,
    ) -> StoreResult<Upserted<T>> {
        let outcome = scope
            .run(self.store.upsert_one(self.name, &filter, &update))
            .await?;

        Ok(Upserted {
            entity: self.decode(outcome.document)?,
            upserted: outcome.upserted,
        })
    }
}
