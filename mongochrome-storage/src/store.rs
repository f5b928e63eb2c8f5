//! Document store adapter trait.
//!
//! The backing document database is an external collaborator. This trait is
//! the boundary the write-through engine calls into; every operation is
//! scoped to one (already normalized) collection name except
//! `list_collection_names`.

use async_trait::async_trait;
use mongochrome_core::{Document, PersistenceError};

/// Result type for backing-store operations.
pub type StoreResult<T> = Result<T, PersistenceError>;

/// Per-collection persistence operations of a document database.
///
/// Implementations must treat `save` as an upsert keyed by `Document::key`
/// and create the collection implicitly on first save.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find the record stored under `key`.
    async fn find_one(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    /// Fetch every record of a collection, in storage order.
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Insert or replace the record stored under `document.key`.
    async fn save(&self, collection: &str, document: &Document) -> StoreResult<Document>;

    /// Delete the record stored under `key`. Deleting a missing key succeeds.
    async fn delete_one(&self, collection: &str, key: &str) -> StoreResult<()>;

    /// Delete every record of a collection.
    async fn delete_many(&self, collection: &str) -> StoreResult<()>;

    /// Names of all collections in the database.
    async fn list_collection_names(&self) -> StoreResult<Vec<String>>;

    /// Drop a collection entirely.
    async fn drop_collection(&self, collection: &str) -> StoreResult<()>;
}
