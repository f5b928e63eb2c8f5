//! mongochrome Storage - Write-Through Collection Cache
//!
//! Keeps an in-process mirror of every collection of a document database and
//! serves reads from it synchronously. Writes go through a
//! `CollectionHandle`, which persists them via a `DocumentStore` and mirrors
//! them into the cache according to the configured `WritePolicy`.
//!
//! Persistence failures never surface as `Err` from a handle; subscribe to
//! the connection's event channel to observe them.

pub mod cache;
pub mod collection;
pub mod connection;
pub mod events;
pub mod locks;
pub mod memory;
pub mod store;
pub mod sync;

pub use cache::{CollectionCache, Removal};
pub use collection::{CollectionHandle, WriteOutcome};
pub use connection::Connection;
pub use events::{ConnectionEvent, EventChannel};
pub use locks::KeyLocks;
pub use memory::InMemoryDocumentStore;
pub use store::{DocumentStore, StoreResult};
pub use sync::{SyncReport, Synchronizer};

// Re-export the core types callers need alongside a connection
pub use mongochrome_core::{
    Document, Filter, KeyPath, MongochromeConfig, MongochromeError, MongochromeResult,
    PersistenceError, StoreOperation, ValidationError, WritePolicy,
};
