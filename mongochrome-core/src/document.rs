//! Document records shared by the cache and the backing store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{new_storage_id, StorageId};

/// A document addressed by its root key.
///
/// The same shape serves as the backing-store record and as the cached
/// mirror of it; `storage_id` lets updates and deletes be correlated without
/// a remote round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub storage_id: StorageId,
    pub key: String,
    pub value: Value,
}

impl Document {
    /// Create a document with a freshly generated storage id.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            storage_id: new_storage_id(),
            key: key.into(),
            value,
        }
    }
}
