//! Property-based tests for collection handle reads and writes
//!
//! Runs every write against a fresh in-memory store and checks the cache
//! and the store agree afterwards.

use mongochrome_core::{normalize_collection_name, tag_array_elements};
use mongochrome_test_utils::generators::*;
use mongochrome_test_utils::{fixtures, init_test_tracing, ELEMENT_ID_FIELD};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use serde_json::Value;

fn runtime() -> Result<tokio::runtime::Runtime, TestCaseError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A root-key write is read back unchanged, and the store holds the same value.
    #[test]
    fn prop_set_then_get_root(key in arb_root_key(), value in arb_stored_value()) {
        init_test_tracing();
        runtime()?.block_on(async {
            let (conn, store) = fixtures::empty_connection()
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let handle = conn.open_collection("things").unwrap();

            let outcome = handle.set(&key, value.clone()).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(outcome.document().is_some());
            prop_assert_eq!(handle.get(&key).ok().flatten(), Some(value.clone()));

            let stored = store.documents("things").await.unwrap_or_default();
            prop_assert_eq!(stored.len(), 1);
            prop_assert_eq!(&stored[0].value, &value);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// A nested write is read back and leaves sibling fields untouched.
    #[test]
    fn prop_nested_set_preserves_siblings(
        (raw_key, root, field) in arb_nested_key(),
        base in arb_object(),
        value in arb_stored_value(),
    ) {
        runtime()?.block_on(async {
            let (conn, _) = fixtures::empty_connection()
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let handle = conn.open_collection("things").unwrap();

            handle.set(&root, base.clone()).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            handle.set(&raw_key, value.clone()).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(handle.get(&raw_key).ok().flatten(), Some(value.clone()));

            let whole = handle.get(&root).ok().flatten().unwrap_or(Value::Null);
            for (name, original) in base.as_object().into_iter().flatten() {
                if name != &field {
                    prop_assert_eq!(&whole[name], original);
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Pushing twice yields the concatenation, in order.
    #[test]
    fn prop_push_concatenates(
        key in arb_root_key(),
        first in arb_scalar_array(),
        second in arb_scalar_array(),
    ) {
        runtime()?.block_on(async {
            let (conn, _) = fixtures::empty_connection()
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let handle = conn.open_collection("lists").unwrap();

            handle.push(&key, first.clone()).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            handle.push(&key, second.clone()).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut expected = first.as_array().cloned().unwrap_or_default();
            expected.extend(second.as_array().cloned().unwrap_or_default());
            prop_assert_eq!(handle.get(&key).ok().flatten(), Some(Value::Array(expected)));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Deleting a key that was set makes it unreadable and empties the store.
    #[test]
    fn prop_delete_after_set(key in arb_root_key(), value in arb_stored_value()) {
        runtime()?.block_on(async {
            let (conn, store) = fixtures::empty_connection()
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let handle = conn.open_collection("things").unwrap();

            handle.set(&key, value).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let deleted = handle.delete(&key).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert!(deleted);
            prop_assert_eq!(handle.get(&key).ok().flatten(), None);
            prop_assert!(!store.has_collection("things").await);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Tagging an already tagged array changes nothing.
    #[test]
    fn prop_tagging_is_idempotent(objects in proptest::collection::vec(arb_object(), 0..5)) {
        let once = tag_array_elements(Value::Array(objects))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let twice = tag_array_elements(once.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(&once, &twice);
        for element in once.as_array().into_iter().flatten() {
            prop_assert!(element[ELEMENT_ID_FIELD].is_string());
        }
    }

    /// Normalizing a collection name twice is the same as once.
    #[test]
    fn prop_collection_name_normalization_is_stable(name in arb_collection_name()) {
        let once = normalize_collection_name(&name);
        prop_assert_eq!(normalize_collection_name(&once), once.clone());
        prop_assert!(once.ends_with('s'));
        prop_assert!(!once.chars().any(char::is_whitespace));
    }
}

#[test]
fn test_generators_produce_parseable_keys() {
    use mongochrome_test_utils::KeyPath;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    let mut runner = TestRunner::default();
    for _ in 0..32 {
        let (raw, root, field) = arb_nested_key()
            .new_tree(&mut runner)
            .unwrap()
            .current();
        let path = KeyPath::parse(&raw).unwrap();
        assert_eq!(path.root_key(), root);
        assert_eq!(path.nested_field(), Some(field.as_str()));
    }
}
