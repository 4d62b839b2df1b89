/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Keyed remote-collection store.
//!
//! One entry per request signature, shared by every consumer of that key.
//! Fetches run on background worker threads and report back over a channel;
//! the host drains completions with [`CollectionStore::pump`] (or
//! [`CollectionStore::settle`] when it can block). A per-key generation
//! counter de-duplicates concurrent fetches and lets a later fetch supersede
//! an earlier one's result. Invalidation is caller-driven: there is no
//! automatic expiry and no automatic retry after an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::api::{ApiError, ApiTransport};
use crate::model::Record;

/// A request signature: the full resource URL, query and path parameters
/// included.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct FetchKey(String);

impl FetchKey {
    pub fn from_url(url: &Url) -> Self {
        Self(url.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FetchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a consumer sees for one key. Data and error are mutually
/// exclusive; both absent with no timestamp means the initial fetch has not
/// resolved yet.
#[derive(Clone, Debug, Default)]
pub struct EntrySnapshot {
    pub data: Option<Arc<Vec<Record>>>,
    pub error: Option<ApiError>,
    pub last_fetched_at: Option<OffsetDateTime>,
}

impl EntrySnapshot {
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

/// Change notification for one observed key.
#[derive(Clone, Debug)]
pub struct KeyChanged {
    pub key: FetchKey,
}

/// A per-key change-notification handle. Dropping it detaches the consumer;
/// a fetch that resolves afterwards updates the entry silently.
pub struct Subscription {
    key: FetchKey,
    rx: Receiver<KeyChanged>,
    // Held only so the matching `Weak` in the store observes this
    // consumer's lifetime.
    _alive: Arc<()>,
}

impl Subscription {
    pub fn key(&self) -> &FetchKey {
        &self.key
    }

    /// Non-blocking: has this key changed since the last check?
    pub fn try_changed(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Block up to `timeout` for a change notification.
    pub fn changed_within(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }
}

#[derive(Default)]
struct CacheEntry {
    data: Option<Arc<Vec<Record>>>,
    error: Option<ApiError>,
    last_fetched_at: Option<OffsetDateTime>,
    stale: bool,
}

impl CacheEntry {
    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
        }
    }
}

struct FetchCompletion {
    key: FetchKey,
    generation: u64,
    result: Result<Vec<Record>, ApiError>,
}

enum Completion {
    Fetch(FetchCompletion),
    MutationDone,
}

/// Liveness is tracked through the subscription's `alive` token so a
/// dropped consumer stops counting as an observer immediately, not only
/// once a notification bounces.
struct SubscriberHandle {
    alive: Weak<()>,
    tx: Sender<KeyChanged>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<FetchKey, CacheEntry>,
    in_flight: HashMap<FetchKey, u64>,
    mutations_in_flight: usize,
    next_generation: u64,
    subscribers: HashMap<FetchKey, Vec<SubscriberHandle>>,
}

/// Process-wide cache of remote collections, keyed by request signature.
pub struct CollectionStore {
    transport: Arc<dyn ApiTransport>,
    state: Mutex<StoreState>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
}

impl CollectionStore {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        Self {
            transport,
            state: Mutex::new(StoreState::default()),
            completion_tx,
            completion_rx,
        }
    }

    /// The transport this store fetches through, shared with mutation
    /// callers so the whole crate rides one seam.
    pub fn transport(&self) -> Arc<dyn ApiTransport> {
        Arc::clone(&self.transport)
    }

    /// Read the entry for `key`, starting the initial fetch if the key has
    /// never been fetched (or was invalidated) and no fetch is in flight.
    pub fn observe(&self, key: &FetchKey) -> EntrySnapshot {
        let Some(mut state) = self.lock_state() else {
            return EntrySnapshot::default();
        };
        let needs_fetch = {
            let entry = state.entries.entry(key.clone()).or_default();
            entry.last_fetched_at.is_none() || entry.stale
        };
        if needs_fetch && !state.in_flight.contains_key(key) {
            self.start_fetch(&mut state, key);
        }
        state
            .entries
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_default()
    }

    /// Register a change-notification subscription for `key`.
    pub fn subscribe(&self, key: &FetchKey) -> Subscription {
        let (tx, rx) = unbounded();
        let alive = Arc::new(());
        if let Some(mut state) = self.lock_state() {
            state
                .subscribers
                .entry(key.clone())
                .or_default()
                .push(SubscriberHandle {
                    alive: Arc::downgrade(&alive),
                    tx,
                });
        }
        Subscription {
            key: key.clone(),
            rx,
            _alive: alive,
        }
    }

    /// Mark `key` stale and, when the key is currently observed, kick off a
    /// re-fetch immediately. A fetch already in flight is superseded: its
    /// completion will be ignored in favor of the newer one.
    pub fn invalidate(&self, key: &FetchKey) {
        let Some(mut state) = self.lock_state() else {
            return;
        };
        state.entries.entry(key.clone()).or_default().stale = true;
        let observed = match state.subscribers.get_mut(key) {
            Some(subs) => {
                subs.retain(|sub| sub.alive.upgrade().is_some());
                !subs.is_empty()
            }
            None => false,
        };
        if observed {
            self.start_fetch(&mut state, key);
        }
    }

    /// Run a blocking mutation on a worker thread so the caller returns
    /// immediately. [`CollectionStore::settle`] waits for spawned mutations
    /// the same way it waits for fetches.
    pub fn spawn_mutation(&self, job: impl FnOnce() + Send + 'static) {
        {
            let Some(mut state) = self.lock_state() else {
                return;
            };
            state.mutations_in_flight += 1;
        }
        let tx = self.completion_tx.clone();
        thread::spawn(move || {
            job();
            let _ = tx.send(Completion::MutationDone);
        });
    }

    /// Drain every completed fetch and mutation without blocking. Returns
    /// how many completions were applied.
    pub fn pump(&self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until no fetch is in flight or `timeout` elapses. Returns
    /// `true` when the store settled.
    pub fn settle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            let idle = self
                .lock_state()
                .map(|state| state.in_flight.is_empty() && state.mutations_in_flight == 0)
                .unwrap_or(true);
            if idle {
                return true;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.completion_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    self.apply(completion);
                }
                Err(_) => return false,
            }
        }
    }

    fn lock_state(&self) -> Option<MutexGuard<'_, StoreState>> {
        match self.state.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("collection store state poisoned; dropping operation");
                None
            }
        }
    }

    fn start_fetch(&self, state: &mut StoreState, key: &FetchKey) {
        let generation = state.next_generation;
        state.next_generation += 1;
        state.in_flight.insert(key.clone(), generation);

        let transport = Arc::clone(&self.transport);
        let tx = self.completion_tx.clone();
        let key = key.clone();
        thread::spawn(move || {
            let result = fetch_collection(transport.as_ref(), &key);
            let _ = tx.send(Completion::Fetch(FetchCompletion {
                key,
                generation,
                result,
            }));
        });
    }

    fn apply(&self, completion: Completion) -> bool {
        match completion {
            Completion::Fetch(fetch) => self.apply_fetch(fetch),
            Completion::MutationDone => {
                if let Some(mut state) = self.lock_state() {
                    state.mutations_in_flight = state.mutations_in_flight.saturating_sub(1);
                }
                true
            }
        }
    }

    /// Returns `false` when the completion was superseded and dropped.
    fn apply_fetch(&self, completion: FetchCompletion) -> bool {
        let Some(mut state) = self.lock_state() else {
            return false;
        };
        if state.in_flight.get(&completion.key) != Some(&completion.generation) {
            debug!("superseded fetch for {} ignored", completion.key);
            return false;
        }
        state.in_flight.remove(&completion.key);

        let now = OffsetDateTime::now_utc();
        let entry = state.entries.entry(completion.key.clone()).or_default();
        match completion.result {
            Ok(records) => {
                entry.data = Some(Arc::new(records));
                entry.error = None;
            }
            Err(error) => {
                entry.data = None;
                entry.error = Some(error);
            }
        }
        entry.last_fetched_at = Some(now);
        entry.stale = false;
        if let Ok(stamp) = now.format(&Rfc3339) {
            debug!("{} settled at {stamp}", completion.key);
        }

        if let Some(subs) = state.subscribers.get_mut(&completion.key) {
            // Dead receivers fall out here; a consumer that went away just
            // stops being notified.
            subs.retain(|sub| {
                sub.tx
                    .send(KeyChanged {
                        key: completion.key.clone(),
                    })
                    .is_ok()
            });
        }
        true
    }
}

fn fetch_collection(
    transport: &dyn ApiTransport,
    key: &FetchKey,
) -> Result<Vec<Record>, ApiError> {
    let url = Url::parse(key.as_str()).map_err(|_| ApiError::InvalidUrl)?;
    let body = transport.get_json(&url)?;
    let Value::Array(items) = body else {
        return Err(ApiError::Body);
    };
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match Record::from_value(item) {
            Some(record) => records.push(record),
            None => warn!("{key}: dropping record without a string id"),
        }
    }
    Ok(records)
}
