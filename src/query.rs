//! Response cache and async request dispatch.
//!
//! Requests run on the tokio runtime and report back over a channel tagged
//! with the [`QueryKey`] they were issued for. The UI thread owns the cache
//! and decides whether an arriving response still matters.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::client::FilingsSource;
use crate::error::FetchFailure;
use crate::location::QueryState;
use crate::models::{CompaniesPage, CompanyFilings};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Companies(QueryState),
    Company(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Companies(CompaniesPage),
    Company(CompanyFilings),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub key: QueryKey,
    pub result: Result<Payload, FetchFailure>,
}

/// Entries untouched for this many stale windows are dropped on insert.
const EVICT_AFTER_WINDOWS: u32 = 5;

struct CacheEntry {
    payload: Payload,
    fetched_at: Instant,
    invalidated: bool,
}

/// Last successful payload per key.
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<&Payload> {
        self.entries.get(key).map(|e| &e.payload)
    }

    /// Present and younger than the stale window, so no refetch is needed.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| !e.invalidated && e.fetched_at.elapsed() < self.stale_after)
    }

    pub fn insert(&mut self, key: QueryKey, payload: Payload) {
        let horizon = self.stale_after.saturating_mul(EVICT_AFTER_WINDOWS);
        let before = self.entries.len();
        self.entries.retain(|_, e| e.fetched_at.elapsed() < horizon);
        if self.entries.len() < before {
            debug!(evicted = before - self.entries.len(), "pruned cache");
        }
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Force the next lookup of `key` to refetch while keeping the data visible.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Spawns fetches and hands back their results in arrival order.
pub struct Fetcher {
    source: Arc<dyn FilingsSource>,
    runtime: Handle,
    tx: UnboundedSender<Response>,
    rx: UnboundedReceiver<Response>,
    in_flight: HashSet<QueryKey>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn FilingsSource>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            runtime,
            tx,
            rx,
            in_flight: HashSet::new(),
        }
    }

    /// Start a fetch for `key` unless one is already running.
    pub fn request(&mut self, key: QueryKey) {
        if !self.in_flight.insert(key.clone()) {
            debug!(?key, "request already in flight");
            return;
        }
        debug!(?key, "request issued");
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = match &key {
                QueryKey::Companies(state) => source
                    .list_companies(state)
                    .await
                    .map(Payload::Companies),
                QueryKey::Company(id) => source.company_filings(id).await.map(Payload::Company),
            };
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(Response {
                key,
                result: result.map_err(FetchFailure::from),
            });
        });
    }

    #[cfg(test)]
    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Non-blocking poll used by the UI loop.
    pub fn try_next(&mut self) -> Option<Response> {
        let response = self.rx.try_recv().ok()?;
        self.in_flight.remove(&response.key);
        Some(response)
    }

    /// Wait for the next response.
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<Response> {
        let response = self.rx.recv().await?;
        self.in_flight.remove(&response.key);
        Some(response)
    }
}
