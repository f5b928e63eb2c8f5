//! Error types for mongochrome operations

use std::fmt;
use thiserror::Error;

/// Backing-store operation that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FindOne,
    FindAll,
    Save,
    DeleteOne,
    DeleteMany,
    ListCollectionNames,
    DropCollection,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOperation::FindOne => "findOne",
            StoreOperation::FindAll => "findAll",
            StoreOperation::Save => "save",
            StoreOperation::DeleteOne => "deleteOne",
            StoreOperation::DeleteMany => "deleteMany",
            StoreOperation::ListCollectionNames => "listCollectionNames",
            StoreOperation::DropCollection => "dropCollection",
        };
        f.write_str(name)
    }
}

/// A backing-store operation failed.
///
/// Write operations on a collection handle never return this to their caller;
/// it is published on the connection's event channel instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Persistence failed during {operation} on {collection}: {reason}")]
pub struct PersistenceError {
    pub operation: StoreOperation,
    /// Collection the operation targeted (empty for connection-wide operations).
    pub collection: String,
    pub reason: String,
}

impl PersistenceError {
    pub fn new(
        operation: StoreOperation,
        collection: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            collection: collection.into(),
            reason: reason.into(),
        }
    }
}

/// Input validation errors. These are programmer errors and fail fast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Expected an array for {context}, received {received}")]
    NotAnArray {
        context: String,
        received: &'static str,
    },

    #[error("Expected target {key:?} to be an array, received {received}")]
    TypeMismatch { key: String, received: &'static str },

    #[error("Expected an object for {context}, received {received}")]
    NotAnObject {
        context: String,
        received: &'static str,
    },

    #[error("Invalid collection name {name:?}: {reason}")]
    InvalidCollectionName { name: String, reason: String },
}

/// In-process storage errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Master error type for all mongochrome errors.
#[derive(Debug, Error)]
pub enum MongochromeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for mongochrome operations.
pub type MongochromeResult<T> = Result<T, MongochromeError>;

/// Short name of a JSON value's type, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// TESTS
// =============================================================================
