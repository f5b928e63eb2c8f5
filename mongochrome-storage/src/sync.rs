//! Bootstrap synchronizer.
//!
//! Enumerates every remote collection and loads each one into the collection
//! cache. Per-collection fetches are issued concurrently and are independent:
//! a failing collection is reported on the event channel and skipped, it does
//! not block the others. Nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use mongochrome_core::{MongochromeResult, Timestamp};
use tracing::{debug, info};

use crate::cache::CollectionCache;
use crate::events::EventChannel;
use crate::store::DocumentStore;

/// Summary of one full sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Number of collections the store listed.
    pub listed: usize,
    /// Collections loaded into the cache, sorted.
    pub loaded: Vec<String>,
    /// Collections whose fetch failed, sorted.
    pub failed: Vec<String>,
    /// Total documents loaded.
    pub documents: usize,
    /// Listing the collections failed, so nothing was loaded.
    pub listing_failed: bool,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl SyncReport {
    fn empty(started_at: Timestamp) -> Self {
        Self {
            listed: 0,
            loaded: Vec::new(),
            failed: Vec::new(),
            documents: 0,
            listing_failed: false,
            started_at,
            finished_at: started_at,
        }
    }

    /// Every listed collection was loaded.
    pub fn is_complete(&self) -> bool {
        !self.listing_failed && self.failed.is_empty()
    }
}

/// Loads the whole backing store into a collection cache.
pub struct Synchronizer<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    cache: CollectionCache,
    events: EventChannel,
}

impl<S: DocumentStore + ?Sized> Synchronizer<S> {
    pub fn new(store: Arc<S>, cache: CollectionCache, events: EventChannel) -> Self {
        Self {
            store,
            cache,
            events,
        }
    }

    /// Run one full sync.
    ///
    /// Store failures are reported on the event channel and recorded in the
    /// report; only a poisoned cache lock is returned as an error.
    pub async fn sync_all(&self) -> MongochromeResult<SyncReport> {
        let mut report = SyncReport::empty(Utc::now());

        let names = match self.store.list_collection_names().await {
            Ok(names) => names,
            Err(e) => {
                self.events.report(e);
                report.listing_failed = true;
                report.finished_at = Utc::now();
                return Ok(report);
            }
        };
        report.listed = names.len();

        let fetches = names.into_iter().map(|name| async move {
            let result = self.store.find_all(&name).await;
            (name, result)
        });

        for (name, result) in join_all(fetches).await {
            match result {
                Ok(documents) => {
                    debug!(collection = %name, documents = documents.len(), "Loaded collection");
                    report.documents += documents.len();
                    self.cache.replace_collection(&name, documents)?;
                    report.loaded.push(name);
                }
                Err(e) => {
                    self.events.report(e);
                    report.failed.push(name);
                }
            }
        }

        report.loaded.sort();
        report.failed.sort();
        report.finished_at = Utc::now();
        info!(
            listed = report.listed,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            documents = report.documents,
            "Sync completed"
        );
        Ok(report)
    }
}
