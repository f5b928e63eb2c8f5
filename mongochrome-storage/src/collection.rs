//! Collection handle: the per-collection read/write API.
//!
//! Reads are served synchronously from the collection cache. Writes are
//! validated and transformed by the key parser and value codec, persisted
//! through the document store, and mirrored into the cache.
//!
//! # Write policy
//!
//! Under `WritePolicy::Optimistic` the cache is mutated before the store is
//! asked to persist, and the mutation stays if the store fails: the cache can
//! then show a value the store never durably stored. Under
//! `WritePolicy::Pessimistic` the cache is only touched after the store
//! confirms. Either way a store failure is never returned as `Err`; it is
//! published on the connection's event channel and the operation's return
//! value degrades.

use std::sync::Arc;

use mongochrome_core::{
    json_type_name, merge_at, normalize_collection_name, read_at, remove_at, tag_elements,
    Document, Filter, KeyPath, MongochromeResult, ValidationError, WritePolicy,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::CollectionCache;
use crate::events::EventChannel;
use crate::locks::KeyLocks;
use crate::store::DocumentStore;
use crate::sync::{SyncReport, Synchronizer};

/// Result of a `set` or `push`.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The store saved the document; carries the persisted record.
    Persisted(Document),
    /// The write was a deletion request (an empty array); carries what
    /// `delete` returned.
    Deleted(bool),
    /// The store rejected the write. `cached` tells whether the optimistic
    /// cache mutation was applied and remains in place.
    Failed { cached: bool },
}

impl WriteOutcome {
    /// The persisted record, if the store saved one.
    pub fn document(&self) -> Option<&Document> {
        match self {
            WriteOutcome::Persisted(document) => Some(document),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, WriteOutcome::Failed { .. })
    }
}

/// Handle on one named collection.
///
/// Cheap to clone; every clone shares the connection's cache, store and
/// event channel.
pub struct CollectionHandle<S: DocumentStore + ?Sized> {
    name: String,
    store: Arc<S>,
    cache: CollectionCache,
    events: EventChannel,
    locks: Arc<KeyLocks>,
    policy: WritePolicy,
}

impl<S: DocumentStore + ?Sized> Clone for CollectionHandle<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            events: self.events.clone(),
            locks: Arc::clone(&self.locks),
            policy: self.policy,
        }
    }
}

impl<S: DocumentStore + ?Sized> CollectionHandle<S> {
    pub(crate) fn new(
        name: &str,
        store: Arc<S>,
        cache: CollectionCache,
        events: EventChannel,
        locks: Arc<KeyLocks>,
        policy: WritePolicy,
    ) -> Self {
        Self {
            name: normalize_collection_name(name),
            store,
            cache,
            events,
            locks,
            policy,
        }
    }

    /// The normalized collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Snapshot of every cached document in this collection.
    pub fn data(&self) -> MongochromeResult<Vec<Document>> {
        Ok(self.cache.documents(&self.name)?)
    }

    /// Number of cached documents in this collection.
    pub fn size(&self) -> MongochromeResult<usize> {
        Ok(self.cache.len(&self.name)?)
    }

    /// Value at `raw_key`.
    ///
    /// Returns `None` when no document is cached under the root key, or when
    /// the addressed nested field does not exist.
    pub fn get(&self, raw_key: &str) -> MongochromeResult<Option<Value>> {
        let path = KeyPath::parse(raw_key)?;
        let Some(document) = self.cache.get(&self.name, path.root_key())? else {
            return Ok(None);
        };
        Ok(read_at(&path, &document.value).cloned())
    }

    /// The whole cached entry for the root key of `raw_key`, storage id
    /// included.
    pub fn get_full(&self, raw_key: &str) -> MongochromeResult<Option<Document>> {
        let path = KeyPath::parse(raw_key)?;
        Ok(self.cache.get(&self.name, path.root_key())?)
    }

    /// Every cached document matching `filter`, in insertion order.
    ///
    /// The returned documents are copies; mutating them does not touch the
    /// cache.
    pub fn find(&self, filter: &Filter) -> MongochromeResult<Vec<Document>> {
        Ok(self.cache.find(&self.name, filter)?)
    }

    /// First cached document matching `filter`.
    pub fn find_one(&self, filter: &Filter) -> MongochromeResult<Option<Document>> {
        Ok(self.find(filter)?.into_iter().next())
    }

    /// Re-run a full sync of every collection on the connection.
    pub async fn sync(&self) -> MongochromeResult<SyncReport> {
        Synchronizer::new(
            Arc::clone(&self.store),
            self.cache.clone(),
            self.events.clone(),
        )
        .sync_all()
        .await
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Write `value` at `raw_key`.
    ///
    /// A nested key merges into the existing document and keeps its other
    /// fields. An empty array is a deletion request and behaves exactly like
    /// `delete(raw_key)`. Object elements of a non-empty array are tagged with
    /// an identifier before storing.
    pub async fn set(&self, raw_key: &str, value: Value) -> MongochromeResult<WriteOutcome> {
        let path = KeyPath::parse(raw_key)?;
        let applied = {
            let _gate = self.locks.share_collection(&self.name).await;
            let _guard = self.locks.acquire(&self.name, path.root_key()).await;
            self.set_at(&path, value).await?
        };
        self.settle(applied).await
    }

    /// Append `values` to the array at `raw_key`.
    ///
    /// An absent key is initialized with `values`. An absent nested field on
    /// an existing document is initialized too.
    ///
    /// # Errors
    ///
    /// - `ValidationError::NotAnArray` if `values` is not an array
    /// - `ValidationError::TypeMismatch` if the existing target is not an array
    pub async fn push(&self, raw_key: &str, values: Value) -> MongochromeResult<WriteOutcome> {
        let path = KeyPath::parse(raw_key)?;
        let mut additions = match values {
            Value::Array(additions) => additions,
            other => {
                return Err(ValidationError::NotAnArray {
                    context: format!("push to {:?}", raw_key),
                    received: json_type_name(&other),
                }
                .into())
            }
        };
        tag_elements(&mut additions);

        let applied = {
            let _gate = self.locks.share_collection(&self.name).await;
            let _guard = self.locks.acquire(&self.name, path.root_key()).await;
            let current = self.cache.get(&self.name, path.root_key())?;
            let next = match current {
                None => merge_at(&path, Value::Array(additions), Value::Object(Map::new())),
                Some(document) => append_at(&path, document.value, additions, raw_key)?,
            };
            self.set_at(&path.to_root(), next).await?
        };
        self.settle(applied).await
    }

    /// Delete the value at `raw_key`.
    ///
    /// A nested key removes that field and writes the document back; the
    /// document survives even if it becomes an empty object. A root key
    /// deletes the document, and deleting the last document of a collection
    /// drops the collection from the cache and the store.
    ///
    /// Returns `false` if nothing is cached at `raw_key`. Otherwise returns
    /// whether the local cache mutation was applied, independent of whether
    /// the store accepted it.
    pub async fn delete(&self, raw_key: &str) -> MongochromeResult<bool> {
        let path = KeyPath::parse(raw_key)?;
        let applied = {
            let _gate = self.locks.share_collection(&self.name).await;
            let _guard = self.locks.acquire(&self.name, path.root_key()).await;
            self.delete_at(&path).await?
        };
        self.settle(applied).await
    }

    /// Delete every document of this collection and drop it.
    ///
    /// Always returns `true`; store failures are only reported. Under
    /// `WritePolicy::Pessimistic` a failed `delete_many` leaves the cache
    /// entry in place and skips the drop.
    pub async fn delete_all(&self) -> MongochromeResult<bool> {
        let _gate = self.locks.lock_collection(&self.name).await;

        if let Err(e) = self.store.delete_many(&self.name).await {
            self.events.report(e);
            if self.policy == WritePolicy::Pessimistic {
                warn!(collection = %self.name, "Delete all not persisted, cache kept");
                return Ok(true);
            }
        }
        self.cache.remove_collection(&self.name)?;
        if let Err(e) = self.store.drop_collection(&self.name).await {
            self.events.report(e);
        }
        debug!(collection = %self.name, "Deleted all documents");
        Ok(true)
    }

    // ========================================================================
    // INTERNALS (callers hold the collection gate and the key lock)
    // ========================================================================

    async fn set_at(&self, path: &KeyPath, value: Value) -> MongochromeResult<Applied<WriteOutcome>> {
        let value = match value {
            Value::Array(elements) if elements.is_empty() => {
                return Ok(self.delete_at(path).await?.map(WriteOutcome::Deleted));
            }
            Value::Array(mut elements) => {
                tag_elements(&mut elements);
                Value::Array(elements)
            }
            other => other,
        };
        Ok(Applied::kept(self.write_document(path, value).await?))
    }

    async fn delete_at(&self, path: &KeyPath) -> MongochromeResult<Applied<bool>> {
        let Some(document) = self.cache.get(&self.name, path.root_key())? else {
            return Ok(Applied::kept(false));
        };

        if path.is_nested() {
            if read_at(path, &document.value).is_none() {
                return Ok(Applied::kept(false));
            }
            let remaining = remove_at(path, document.value);
            let removed = match self.write_document(&path.to_root(), remaining).await? {
                WriteOutcome::Failed { cached } => cached,
                _ => true,
            };
            return Ok(Applied::kept(removed));
        }

        self.remove_document(path.root_key()).await
    }

    /// Read the stored record, merge, mirror into the cache and save.
    async fn write_document(&self, path: &KeyPath, value: Value) -> MongochromeResult<WriteOutcome> {
        let root_key = path.root_key();

        let existing = match self.store.find_one(&self.name, root_key).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(collection = %self.name, key = %root_key, "Write aborted: lookup failed");
                self.events.report(e);
                return Ok(WriteOutcome::Failed { cached: false });
            }
        };

        let document = match existing {
            Some(mut record) => {
                record.value = merge_at(path, value, record.value);
                record
            }
            None => Document::new(root_key, merge_at(path, value, Value::Object(Map::new()))),
        };

        let optimistic = self.policy == WritePolicy::Optimistic;
        if optimistic {
            self.cache.upsert(&self.name, document.clone())?;
        }

        match self.store.save(&self.name, &document).await {
            Ok(saved) => {
                if !optimistic {
                    self.cache.upsert(&self.name, saved.clone())?;
                }
                debug!(collection = %self.name, key = %root_key, "Saved document");
                Ok(WriteOutcome::Persisted(saved))
            }
            Err(e) => {
                warn!(
                    collection = %self.name,
                    key = %root_key,
                    cached = optimistic,
                    "Write not persisted"
                );
                self.events.report(e);
                Ok(WriteOutcome::Failed { cached: optimistic })
            }
        }
    }

    /// Delete a whole document. Reports whether the cache entry for the
    /// collection went away with it.
    async fn remove_document(&self, root_key: &str) -> MongochromeResult<Applied<bool>> {
        if let Err(e) = self.store.delete_one(&self.name, root_key).await {
            self.events.report(e);
            if self.policy == WritePolicy::Pessimistic {
                return Ok(Applied::kept(false));
            }
        }

        let removal = self.cache.remove(&self.name, root_key)?;
        Ok(Applied {
            value: removal.removed,
            emptied: removal.collection_emptied,
        })
    }

    /// Finish a write after its gate and key lock are released: drop the
    /// collection if the write emptied it.
    async fn settle<T>(&self, applied: Applied<T>) -> MongochromeResult<T> {
        if applied.emptied {
            self.drop_if_empty().await?;
        }
        Ok(applied.value)
    }

    /// Drop the backing collection unless a write refilled the cache while
    /// the exclusive gate was pending.
    async fn drop_if_empty(&self) -> MongochromeResult<()> {
        let _gate = self.locks.lock_collection(&self.name).await;
        if self.cache.has_collection(&self.name)? {
            debug!(collection = %self.name, "Collection refilled, drop skipped");
            return Ok(());
        }

        debug!(collection = %self.name, "Last document deleted, dropping collection");
        if let Err(e) = self.store.drop_collection(&self.name).await {
            self.events.report(e);
        }
        Ok(())
    }
}

/// Value of a write plus whether it left the collection's cache entry empty.
struct Applied<T> {
    value: T,
    emptied: bool,
}

impl<T> Applied<T> {
    fn kept(value: T) -> Self {
        Self {
            value,
            emptied: false,
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            emptied: self.emptied,
        }
    }
}

/// Concatenate `additions` onto the array addressed by `path` inside `current`.
fn append_at(
    path: &KeyPath,
    current: Value,
    additions: Vec<Value>,
    raw_key: &str,
) -> Result<Value, ValidationError> {
    let mismatch = |found: &Value| ValidationError::TypeMismatch {
        key: raw_key.to_string(),
        received: json_type_name(found),
    };

    if !path.is_nested() {
        return match current {
            Value::Array(mut existing) => {
                existing.extend(additions);
                Ok(Value::Array(existing))
            }
            other => Err(mismatch(&other)),
        };
    }

    let combined = match read_at(path, &current) {
        None => additions,
        Some(Value::Array(existing)) => existing.iter().cloned().chain(additions).collect(),
        Some(other) => return Err(mismatch(other)),
    };
    Ok(merge_at(path, Value::Array(combined), current))
}
