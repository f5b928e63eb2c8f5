//! Identity types for cached documents

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Backing-store identifier of a document record.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type StorageId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Field name under which array elements carry their identifier.
pub const ELEMENT_ID_FIELD: &str = "_id";

/// Generate a new UUIDv7 StorageId (timestamp-sortable).
pub fn new_storage_id() -> StorageId {
    Uuid::now_v7()
}

/// Generate a time-ordered identifier for an array element.
///
/// Rendered as 32 lowercase hex digits so that string order matches
/// creation order.
pub fn new_element_id() -> String {
    Uuid::now_v7().simple().to_string()
}
