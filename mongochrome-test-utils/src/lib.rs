//! mongochrome Test Utilities
//!
//! Shared test infrastructure for the mongochrome workspace:
//! - Proptest generators for keys, values and collection names
//! - Fixtures for seeded stores and opened connections
//! - Custom assertions for mongochrome error variants
//! - Tracing setup for tests

use std::sync::Arc;

// Re-export storage and core types for convenience
pub use mongochrome_core::{
    Document, Filter, KeyPath, MongochromeConfig, MongochromeError, MongochromeResult,
    StoreOperation, ValidationError, WritePolicy, ELEMENT_ID_FIELD,
};
pub use mongochrome_storage::{
    CollectionHandle, Connection, ConnectionEvent, InMemoryDocumentStore, WriteOutcome,
};

/// Install a fmt subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`. Safe to call from every test; only the first call
/// installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for mongochrome inputs.

    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    /// A valid root key (no dots).
    pub fn arb_root_key() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_]{1,12}"
    }

    /// A valid field name for the nested part of a key.
    pub fn arb_field_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,8}"
    }

    /// A valid `root.field` key, returned with its parts.
    pub fn arb_nested_key() -> impl Strategy<Value = (String, String, String)> {
        (arb_root_key(), arb_field_name())
            .prop_map(|(root, field)| (format!("{}.{}", root, field), root, field))
    }

    /// A JSON scalar: null, bool, integer or string.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
        ]
    }

    /// A flat JSON object of scalars.
    pub fn arb_object() -> impl Strategy<Value = Value> {
        btree_map(arb_field_name(), arb_scalar(), 0..6)
            .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>()))
    }

    /// A non-empty array of scalars.
    pub fn arb_scalar_array() -> impl Strategy<Value = Value> {
        vec(arb_scalar(), 1..6).prop_map(Value::Array)
    }

    /// A value that `set` stores as-is: anything but an array.
    pub fn arb_stored_value() -> impl Strategy<Value = Value> {
        prop_oneof![arb_scalar(), arb_object()]
    }

    /// A raw collection name with arbitrary case and padding.
    pub fn arb_collection_name() -> impl Strategy<Value = String> {
        "[ ]{0,2}[a-zA-Z]{1,10}[ ]{0,2}"
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use serde_json::json;

    /// Config with no sync on open, for tests that seed nothing.
    pub fn minimal_config() -> MongochromeConfig {
        MongochromeConfig::default().with_sync_on_open(false)
    }

    /// Store holding a `users` collection (two players) and an `items`
    /// collection (one sword).
    pub fn seeded_store() -> Arc<InMemoryDocumentStore> {
        Arc::new(
            InMemoryDocumentStore::new()
                .with_collection(
                    "users",
                    vec![
                        Document::new("player1", json!({"hp": 10, "inventory": ["apple"]})),
                        Document::new("player2", json!({"hp": 20})),
                    ],
                )
                .with_collection("items", vec![Document::new("sword", json!({"dmg": 5}))]),
        )
    }

    /// Open a connection over `store` with `config`.
    pub async fn open_connection(
        store: Arc<InMemoryDocumentStore>,
        config: MongochromeConfig,
    ) -> MongochromeResult<Connection<InMemoryDocumentStore>> {
        let connection = Connection::new(store, config)?;
        connection.open().await?;
        Ok(connection)
    }

    /// Open a connection with default config over an empty store.
    pub async fn empty_connection(
    ) -> MongochromeResult<(Connection<InMemoryDocumentStore>, Arc<InMemoryDocumentStore>)> {
        let store = Arc::new(InMemoryDocumentStore::new());
        let connection = open_connection(Arc::clone(&store), MongochromeConfig::default()).await?;
        Ok((connection, store))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for mongochrome error variants.

    use super::*;

    /// Assert that a result is an `InvalidKey` validation error.
    #[track_caller]
    pub fn assert_invalid_key<T: std::fmt::Debug>(result: &MongochromeResult<T>) {
        match result {
            Err(MongochromeError::Validation(ValidationError::InvalidKey { .. })) => {}
            other => panic!("Expected InvalidKey error, got: {:?}", other),
        }
    }

    /// Assert that a result is a `TypeMismatch` validation error.
    #[track_caller]
    pub fn assert_type_mismatch<T: std::fmt::Debug>(result: &MongochromeResult<T>) {
        match result {
            Err(MongochromeError::Validation(ValidationError::TypeMismatch { .. })) => {}
            other => panic!("Expected TypeMismatch error, got: {:?}", other),
        }
    }

    /// Assert that a result is a `NotAnArray` validation error.
    #[track_caller]
    pub fn assert_not_an_array<T: std::fmt::Debug>(result: &MongochromeResult<T>) {
        match result {
            Err(MongochromeError::Validation(ValidationError::NotAnArray { .. })) => {}
            other => panic!("Expected NotAnArray error, got: {:?}", other),
        }
    }

    /// Assert that a result is a config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &MongochromeResult<T>) {
        match result {
            Err(MongochromeError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that an event is a persistence error for `operation`.
    #[track_caller]
    pub fn assert_persistence_event(event: &ConnectionEvent, operation: StoreOperation) {
        match event {
            ConnectionEvent::Error(e) => assert_eq!(e.operation, operation),
            other => panic!("Expected Error event for {}, got: {:?}", operation, other),
        }
    }
}
