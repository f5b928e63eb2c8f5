//! In-memory document store.
//!
//! Stands in for the remote database in tests and embedded use. Supports
//! failure injection per operation and counts every call so tests can assert
//! on the exact remote traffic a cache operation produced.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use mongochrome_core::{Document, PersistenceError, StoreOperation};
use tokio::sync::RwLock;

use crate::store::{DocumentStore, StoreResult};

/// In-memory document store with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
    failing: DashSet<StoreOperation>,
    failing_collections: DashSet<(StoreOperation, String)>,
    calls: DashMap<StoreOperation, usize>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with records, replacing any existing ones.
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.collections.get_mut().insert(name.into(), documents);
        self
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failing.insert(operation);
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: StoreOperation) {
        self.failing.remove(&operation);
    }

    /// Make every subsequent call of `operation` on `collection` fail, leaving
    /// other collections untouched.
    pub fn fail_on_collection(&self, operation: StoreOperation, collection: impl Into<String>) {
        self.failing_collections.insert((operation, collection.into()));
    }

    /// Stop failing every operation, collection-scoped failures included.
    pub fn recover_all(&self) {
        self.failing.clear();
        self.failing_collections.clear();
    }

    /// Number of times `operation` has been called, failed calls included.
    pub fn call_count(&self, operation: StoreOperation) -> usize {
        self.calls.get(&operation).map(|count| *count).unwrap_or(0)
    }

    /// Snapshot of a collection's records, or `None` if it does not exist.
    pub async fn documents(&self, collection: &str) -> Option<Vec<Document>> {
        self.collections.read().await.get(collection).cloned()
    }

    /// Whether a collection exists.
    pub async fn has_collection(&self, collection: &str) -> bool {
        self.collections.read().await.contains_key(collection)
    }

    fn enter(&self, operation: StoreOperation, collection: &str) -> StoreResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if self.failing.contains(&operation)
            || self
                .failing_collections
                .contains(&(operation, collection.to_string()))
        {
            return Err(PersistenceError::new(
                operation,
                collection,
                "injected failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        self.enter(StoreOperation::FindOne, collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.key == key))
            .cloned())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.enter(StoreOperation::FindAll, collection)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn save(&self, collection: &str, document: &Document) -> StoreResult<Document> {
        self.enter(StoreOperation::Save, collection)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.key == document.key) {
            Some(existing) => *existing = document.clone(),
            None => docs.push(document.clone()),
        }
        Ok(document.clone())
    }

    async fn delete_one(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.enter(StoreOperation::DeleteOne, collection)?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            if let Some(index) = docs.iter().position(|d| d.key == key) {
                docs.remove(index);
            }
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str) -> StoreResult<()> {
        self.enter(StoreOperation::DeleteMany, collection)?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.clear();
        }
        Ok(())
    }

    async fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        self.enter(StoreOperation::ListCollectionNames, "")?;
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn drop_collection(&self, collection: &str) -> StoreResult<()> {
        self.enter(StoreOperation::DropCollection, collection)?;
        self.collections.write().await.remove(collection);
        Ok(())
    }
}
