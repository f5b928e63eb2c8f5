//! End-to-end scenarios over a connection opened on a seeded store
//!
//! Tests verify:
//! - Bootstrap loads every collection before handles are used
//! - Reads, writes and deletes keep cache and store in step
//! - Persistence failures reach subscribers and degrade return values
//! - Validation errors fail fast without touching the store

use std::sync::Arc;

use mongochrome_test_utils::assertions::*;
use mongochrome_test_utils::fixtures::*;
use mongochrome_test_utils::*;
use serde_json::json;

// ============================================================================
// BOOTSTRAP
// ============================================================================

#[tokio::test]
async fn test_bootstrap_mirrors_the_store() {
    init_test_tracing();
    let store = seeded_store();
    let conn = open_connection(Arc::clone(&store), MongochromeConfig::default())
        .await
        .unwrap();

    let users = conn.open_collection("User").unwrap();
    assert_eq!(users.size().unwrap(), 2);
    assert_eq!(users.get("player1.hp").unwrap(), Some(json!(10)));
    assert_eq!(users.get("player2").unwrap(), Some(json!({"hp": 20})));

    let items = conn.open_collection("item").unwrap();
    assert_eq!(items.get("sword.dmg").unwrap(), Some(json!(5)));
    assert_eq!(store.call_count(StoreOperation::FindAll), 2);
}

#[tokio::test]
async fn test_bootstrap_reports_failed_fetches_then_resyncs() {
    let store = seeded_store();
    store.fail_on(StoreOperation::FindAll);
    let conn = Connection::new(Arc::clone(&store), MongochromeConfig::default()).unwrap();
    let mut rx = conn.subscribe();

    let report = conn.open().await.unwrap().unwrap();
    assert_eq!(report.failed.len(), 2);
    assert!(!report.is_complete());

    assert_eq!(rx.recv().await.unwrap(), ConnectionEvent::Opened);
    assert_persistence_event(&rx.recv().await.unwrap(), StoreOperation::FindAll);
    assert_persistence_event(&rx.recv().await.unwrap(), StoreOperation::FindAll);

    store.recover(StoreOperation::FindAll);
    let report = conn.sync().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(conn.open_collection("users").unwrap().size().unwrap(), 2);
}

// ============================================================================
// READ / WRITE
// ============================================================================

#[tokio::test]
async fn test_nested_write_preserves_fields_in_store() {
    let store = seeded_store();
    let conn = open_connection(Arc::clone(&store), MongochromeConfig::default())
        .await
        .unwrap();
    let users = conn.open_collection("users").unwrap();

    users.set("player1.hp", json!(7)).await.unwrap();

    assert_eq!(
        users.get("player1").unwrap(),
        Some(json!({"hp": 7, "inventory": ["apple"]}))
    );
    let stored = store.documents("users").await.unwrap();
    let player1 = stored.iter().find(|d| d.key == "player1").unwrap();
    assert_eq!(player1.value["hp"], json!(7));
    assert_eq!(player1.value["inventory"], json!(["apple"]));
}

#[tokio::test]
async fn test_push_into_seeded_inventory_tags_objects() {
    let conn = open_connection(seeded_store(), MongochromeConfig::default())
        .await
        .unwrap();
    let users = conn.open_collection("users").unwrap();

    users
        .push("player1.inventory", json!([{"name": "potion"}]))
        .await
        .unwrap();

    let inventory = users.get("player1.inventory").unwrap().unwrap();
    assert_eq!(inventory[0], json!("apple"));
    assert_eq!(inventory[1]["name"], json!("potion"));
    assert!(inventory[1][ELEMENT_ID_FIELD].is_string());
}

#[tokio::test]
async fn test_find_over_seeded_documents() {
    let conn = open_connection(seeded_store(), MongochromeConfig::default())
        .await
        .unwrap();
    let users = conn.open_collection("users").unwrap();

    let strong = users
        .find(&Filter::predicate(|d| d.value["hp"].as_i64().unwrap_or(0) > 15))
        .unwrap();
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].key, "player2");

    let apple_owner = users.find_one(&Filter::contains("inventory")).unwrap();
    assert_eq!(apple_owner.map(|d| d.key), Some("player1".to_string()));
}

// ============================================================================
// DELETE
// ============================================================================

#[tokio::test]
async fn test_deleting_every_document_drops_the_collection_once() {
    let store = seeded_store();
    let conn = open_connection(Arc::clone(&store), MongochromeConfig::default())
        .await
        .unwrap();
    let items = conn.open_collection("items").unwrap();

    assert!(items.delete("sword").await.unwrap());

    assert!(!conn.collections().unwrap().contains_key("items"));
    assert!(!store.has_collection("items").await);
    assert_eq!(store.call_count(StoreOperation::DropCollection), 1);
    assert!(!items.delete("sword").await.unwrap());
    assert_eq!(store.call_count(StoreOperation::DropCollection), 1);
}

#[tokio::test]
async fn test_empty_array_set_matches_delete() {
    let conn = open_connection(seeded_store(), MongochromeConfig::default())
        .await
        .unwrap();
    let users = conn.open_collection("users").unwrap();

    assert_eq!(
        users.set("player2", json!([])).await.unwrap(),
        WriteOutcome::Deleted(true)
    );
    assert_eq!(users.get_full("player2").unwrap(), None);
    assert_eq!(
        users.set("player1.inventory", json!([])).await.unwrap(),
        WriteOutcome::Deleted(true)
    );
    assert_eq!(users.get("player1").unwrap(), Some(json!({"hp": 10})));
}

// ============================================================================
// FAILURES
// ============================================================================

#[tokio::test]
async fn test_save_failure_is_published_not_returned() {
    let store = seeded_store();
    let conn = open_connection(Arc::clone(&store), MongochromeConfig::default())
        .await
        .unwrap();
    let mut rx = conn.subscribe();
    let users = conn.open_collection("users").unwrap();
    store.fail_on(StoreOperation::Save);

    let outcome = users.set("player1.hp", json!(1)).await.unwrap();

    assert_eq!(outcome, WriteOutcome::Failed { cached: true });
    assert_eq!(users.get("player1.hp").unwrap(), Some(json!(1)));
    assert_persistence_event(&rx.recv().await.unwrap(), StoreOperation::Save);
}

#[tokio::test]
async fn test_validation_errors_fail_fast() {
    let store = seeded_store();
    let conn = open_connection(Arc::clone(&store), minimal_config())
        .await
        .unwrap();
    let users = conn.open_collection("users").unwrap();

    assert_invalid_key(&users.get("a.b.c"));
    assert_invalid_key(&users.set("", json!(1)).await);
    assert_invalid_key(&users.delete(".hp").await);
    assert_not_an_array(&users.push("list", json!({"a": 1})).await);

    users.set("count", json!(3)).await.unwrap();
    assert_type_mismatch(&users.push("count", json!([4])).await);

    let invalid = MongochromeConfig::default().with_event_capacity(0);
    assert_config_error(&Connection::new(store, invalid).map(|_| ()));
}
