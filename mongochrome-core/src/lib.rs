//! mongochrome Core - Data Types and Pure Transformations
//!
//! Documents, key paths, the value codec, filters and configuration.
//! Everything here is synchronous and free of I/O; the cache and the
//! write-through engine live in mongochrome-storage.

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod identity;
pub mod key;
pub mod naming;

pub use codec::{merge_at, merge_nested, read_at, remove_at, tag_array_elements, tag_elements};
pub use config::{MongochromeConfig, WritePolicy};
pub use document::Document;
pub use error::{
    json_type_name, ConfigError, MongochromeError, MongochromeResult, PersistenceError,
    StorageError, StoreOperation, ValidationError,
};
pub use filter::Filter;
pub use identity::{new_element_id, new_storage_id, StorageId, Timestamp, ELEMENT_ID_FIELD};
pub use key::KeyPath;
pub use naming::normalize_collection_name;
