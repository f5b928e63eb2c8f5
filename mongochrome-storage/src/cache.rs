//! Collection cache: the in-memory mirror of the backing store.
//!
//! Maps a collection name to its documents in insertion order. This is a full
//! mirror, not a bounded cache: there is no eviction, and every read on a
//! collection handle is served from here.
//!
//! The cache is an owned value tied to one connection. Cloning it shares the
//! same underlying map, so handles and the synchronizer all see one mirror.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mongochrome_core::{Document, Filter, StorageError};

type Collections = HashMap<String, Vec<Document>>;

/// Outcome of removing a document from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removal {
    /// A document with the key was present and has been removed.
    pub removed: bool,
    /// The removal left the collection empty, so its entry was removed too.
    pub collection_emptied: bool,
}

/// Process-local mirror of remote collections.
#[derive(Debug, Clone, Default)]
pub struct CollectionCache {
    collections: Arc<RwLock<Collections>>,
}

impl CollectionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StorageError> {
        self.collections.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StorageError> {
        self.collections.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Get the document stored under `key`.
    pub fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StorageError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.key == key))
            .cloned())
    }

    /// Whether a document is cached under `key`.
    pub fn contains(&self, collection: &str, key: &str) -> Result<bool, StorageError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .is_some_and(|docs| docs.iter().any(|d| d.key == key)))
    }

    /// Whether the cache holds an entry for the collection.
    pub fn has_collection(&self, collection: &str) -> Result<bool, StorageError> {
        Ok(self.read()?.contains_key(collection))
    }

    /// Snapshot of a collection's documents; empty if the collection is absent.
    pub fn documents(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        Ok(self.read()?.get(collection).cloned().unwrap_or_default())
    }

    /// Number of cached documents in a collection.
    pub fn len(&self, collection: &str) -> Result<usize, StorageError> {
        Ok(self.read()?.get(collection).map_or(0, Vec::len))
    }

    /// Documents matching a filter, in insertion order.
    pub fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    /// Replace the cached document with the same key, or append it.
    ///
    /// Replacing keeps the document's position, so a racing insert of the same
    /// key never produces a duplicate entry.
    pub fn upsert(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.key == document.key) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
        Ok(())
    }

    /// Remove the document under `key`; drops the collection entry if that
    /// leaves it empty.
    pub fn remove(&self, collection: &str, key: &str) -> Result<Removal, StorageError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(Removal::default());
        };
        let Some(index) = docs.iter().position(|d| d.key == key) else {
            return Ok(Removal::default());
        };

        docs.remove(index);
        let collection_emptied = docs.is_empty();
        if collection_emptied {
            collections.remove(collection);
        }
        Ok(Removal {
            removed: true,
            collection_emptied,
        })
    }

    /// Replace a collection's documents wholesale, as a full sync does.
    pub fn replace_collection(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StorageError> {
        self.write()?.insert(collection.to_string(), documents);
        Ok(())
    }

    /// Remove a collection entry. Returns whether it existed.
    pub fn remove_collection(&self, collection: &str) -> Result<bool, StorageError> {
        Ok(self.write()?.remove(collection).is_some())
    }

    /// Names of all cached collections, sorted.
    pub fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Snapshot of the whole cache, ordered by collection name.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Vec<Document>>, StorageError> {
        Ok(self
            .read()?
            .iter()
            .map(|(name, docs)| (name.clone(), docs.clone()))
            .collect())
    }
}
