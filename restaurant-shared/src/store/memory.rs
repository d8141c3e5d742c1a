/// In-memory document store
///
/// Collections are vectors of documents kept in insertion order behind a
/// single `RwLock`. Every write holds the write lock for the duration of one
/// document mutation, which gives the same per-document atomicity as the
/// database backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Document, DocumentStore, Filter, StoreResult, Update, UpsertOutcome};

/// Document store living entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection` (zero if it was never written)
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn find_page(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok((Vec::new(), 0));
        };

        let window = docs
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((window, docs.len() as u64))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map_or(0, |docs| docs.iter().filter(|doc| filter.matches(doc)).count()) as u64)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpsertOutcome> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter_mut().find(|doc| filter.matches(doc)) {
            update.apply_to(existing);
            return Ok(UpsertOutcome {
                document: existing.clone(),
                upserted: false,
            });
        }

        let document = update.document_for_insert(filter);
        docs.push(document.clone());

        Ok(UpsertOutcome {
            document,
            upserted: true,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
