//! Last-commit cache with single-flight computation.
//!
//! Keys carry the resolved commit hash rather than a ref name, and history
//! below a commit never changes, so a stored value never goes stale. Entries
//! only leave the cache through the backing store's own eviction policy.
//!
//! - Backing store: pluggable via [`CacheStore`] (`UnboundedStore`, `LruStore`)
//! - Single flight: concurrent misses for one key share one computation
//! - Failures are handed to every waiter of that flight but never stored
//!
//! The computation runs in its own spawned task, so a caller that gives up
//! (timeout, disconnect) does not stop it. The task stores the result and
//! clears the in-flight slot on every exit path, so other waiters are never
//! left blocked.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use git2::Oid;
use lru::LruCache;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::CommitInfo;

/// Key-value store the cache keeps finished results in.
pub trait CacheStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn insert(&self, key: K, value: V);
    fn len(&self) -> usize;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps every entry for the lifetime of the process.
pub struct UnboundedStore<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> UnboundedStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for UnboundedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStore<K, V> for UnboundedStore<K, V>
where
    K: Hash + Eq + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        lock(&self.entries).get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        lock(&self.entries).insert(key, value);
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Evicts the least recently used entry once `capacity` is reached.
pub struct LruStore<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V> LruStore<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<K, V> CacheStore<K, V> for LruStore<K, V>
where
    K: Hash + Eq + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        lock(&self.entries).get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        lock(&self.entries).put(key, value);
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Identifies one last-commit lookup: repository, resolved commit, path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitEntryKey {
    pub repo_id: String,
    pub commit: Oid,
    pub path: String,
}

impl CommitEntryKey {
    pub fn new(repo_id: &str, commit: Oid, path: &str) -> Self {
        Self {
            repo_id: repo_id.to_string(),
            commit,
            path: path.to_string(),
        }
    }
}

type FlightResult<V> = std::result::Result<V, Arc<AppError>>;
type Flight<V> = Shared<BoxFuture<'static, FlightResult<V>>>;

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    joined: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    /// Requests that waited on another request's computation.
    pub joined: u64,
}

pub struct SingleFlightCache<K, V> {
    store: Arc<dyn CacheStore<K, V>>,
    in_flight: Arc<Mutex<HashMap<K, Flight<V>>>>,
    counters: Counters,
}

pub type LastCommitCache = SingleFlightCache<CommitEntryKey, CommitInfo>;

impl<K, V> SingleFlightCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn CacheStore<K, V>>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            counters: Counters::default(),
        }
    }

    /// LRU-bounded cache, or unbounded when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let store: Arc<dyn CacheStore<K, V>> = match NonZeroUsize::new(capacity) {
            Some(capacity) => Arc::new(LruStore::new(capacity)),
            None => Arc::new(UnboundedStore::new()),
        };
        Self::new(store)
    }

    /// Returns the cached value for `key`, or runs `compute` on the blocking
    /// pool. Concurrent calls for the same key share a single run of `compute`.
    pub async fn get_or_compute<F>(&self, key: K, compute: F) -> FlightResult<V>
    where
        F: FnOnce() -> Result<V> + Send + 'static,
    {
        if let Some(value) = self.store.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        let flight = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(flight) = in_flight.get(&key) {
                self.counters.joined.fetch_add(1, Ordering::Relaxed);
                flight.clone()
            } else if let Some(value) = self.store.get(&key) {
                // The flight finished between the first check and taking the lock.
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value);
            } else {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                let flight = self.start_flight(key.clone(), compute);
                in_flight.insert(key, flight.clone());
                flight
            }
        };

        flight.await
    }

    fn start_flight<F>(&self, key: K, compute: F) -> Flight<V>
    where
        F: FnOnce() -> Result<V> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);

        let task = tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(compute).await {
                Ok(result) => result,
                Err(e) => Err(AppError::Internal(format!("cache computation failed to run: {}", e))),
            };

            if let Ok(value) = &result {
                store.insert(key.clone(), value.clone());
            }
            lock(&in_flight).remove(&key);

            result.map_err(Arc::new)
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(Arc::new(AppError::Internal(format!("cache task failed: {}", e)))))
        }
        .boxed()
        .shared()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.len(),
            in_flight: lock(&self.in_flight).len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            joined: self.counters.joined.load(Ordering::Relaxed),
        }
    }
}
