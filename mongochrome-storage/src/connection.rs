//! Connection: owns the collection cache and hands out collection handles.

use std::collections::BTreeMap;
use std::sync::Arc;

use mongochrome_core::{Document, MongochromeConfig, MongochromeResult, ValidationError};
use tokio::sync::{broadcast, OnceCell};
use tracing::info;

use crate::cache::CollectionCache;
use crate::collection::CollectionHandle;
use crate::events::{ConnectionEvent, EventChannel};
use crate::locks::KeyLocks;
use crate::store::DocumentStore;
use crate::sync::{SyncReport, Synchronizer};

/// A connection to one document database.
///
/// The cache, event channel and key locks are shared by every handle the
/// connection opens, so two handles on the same collection always observe
/// each other's writes.
pub struct Connection<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    cache: CollectionCache,
    events: EventChannel,
    locks: Arc<KeyLocks>,
    config: MongochromeConfig,
    opened: OnceCell<Option<SyncReport>>,
}

impl<S: DocumentStore + ?Sized> Connection<S> {
    /// Create a connection over `store`. Nothing is loaded until `open`.
    pub fn new(store: Arc<S>, config: MongochromeConfig) -> MongochromeResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            cache: CollectionCache::new(),
            events: EventChannel::new(config.event_capacity),
            locks: Arc::new(KeyLocks::new(config.serialize_key_writes)),
            config,
            opened: OnceCell::new(),
        })
    }

    pub fn with_defaults(store: Arc<S>) -> MongochromeResult<Self> {
        Self::new(store, MongochromeConfig::default())
    }

    /// Open the connection and, if `sync_on_open` is set, load every remote
    /// collection into the cache.
    ///
    /// Publishes `Opened` and then `Loaded`. Calling `open` again is a no-op
    /// that returns the first call's sync report.
    pub async fn open(&self) -> MongochromeResult<Option<SyncReport>> {
        let report = self
            .opened
            .get_or_try_init(|| async {
                self.events.publish(ConnectionEvent::Opened);
                let report = if self.config.sync_on_open {
                    Some(self.synchronizer().sync_all().await?)
                } else {
                    None
                };
                let collections = report.as_ref().map_or(0, |r| r.listed);
                self.events.publish(ConnectionEvent::Loaded { collections });
                info!(
                    collections,
                    sync_on_open = self.config.sync_on_open,
                    write_policy = ?self.config.write_policy,
                    "Connection opened"
                );
                Ok::<_, mongochrome_core::MongochromeError>(report)
            })
            .await?;
        Ok(report.clone())
    }

    /// Whether `open` has completed.
    pub fn is_ready(&self) -> bool {
        self.opened.initialized()
    }

    /// Handle on the collection `name`, normalized (trimmed, lower-cased,
    /// pluralized).
    ///
    /// The collection does not need to exist; it is created by the first
    /// write.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidCollectionName` if `name` is empty or only
    /// whitespace.
    pub fn open_collection(&self, name: &str) -> MongochromeResult<CollectionHandle<S>> {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidCollectionName {
                name: name.to_string(),
                reason: "collection name must not be blank".to_string(),
            }
            .into());
        }
        Ok(CollectionHandle::new(
            name,
            Arc::clone(&self.store),
            self.cache.clone(),
            self.events.clone(),
            Arc::clone(&self.locks),
            self.config.write_policy,
        ))
    }

    /// Re-load every remote collection and publish `Loaded`.
    pub async fn sync(&self) -> MongochromeResult<SyncReport> {
        let report = self.synchronizer().sync_all().await?;
        self.events.publish(ConnectionEvent::Loaded {
            collections: report.listed,
        });
        Ok(report)
    }

    /// Snapshot of the whole cache, keyed by collection name.
    pub fn collections(&self) -> MongochromeResult<BTreeMap<String, Vec<Document>>> {
        Ok(self.cache.snapshot()?)
    }

    /// Subscribe to connection events, persistence failures included.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.cache
    }

    pub fn config(&self) -> &MongochromeConfig {
        &self.config
    }

    fn synchronizer(&self) -> Synchronizer<S> {
        Synchronizer::new(
            Arc::clone(&self.store),
            self.cache.clone(),
            self.events.clone(),
        )
    }
}
