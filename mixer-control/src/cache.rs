//! Bounded least-recently-used cache of per-route service configuration.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Default number of route configs kept by a [`RouteConfigCache`].
pub const DEFAULT_CAPACITY: usize = 1000;

/// A fixed-capacity, thread-safe LRU map from opaque route ids to values.
///
/// Both [`insert`](Self::insert) and [`lookup`](Self::lookup) count as a use:
/// a looked-up route moves to the most-recently-used position, so routes that
/// keep receiving traffic survive bursts of one-off registrations.
///
/// A single lock guards the map and its recency order. It is held only for
/// the map operation itself; values are cloned out before it is released.
pub struct RouteConfigCache<V> {
    entries: Mutex<LruCache<String, V>>,
}

impl<V: Clone> RouteConfigCache<V> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            warn!("route config cache capacity of 0 requested, using 1");
            NonZeroUsize::MIN
        });
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Inserts or replaces the value for `id` and marks it most recently used.
    ///
    /// When `id` is new and the cache is full, the least recently used entry
    /// is evicted first.
    pub fn insert(&self, id: impl Into<String>, value: V) {
        let id = id.into();
        let displaced = self.entries.lock().push(id.clone(), value);

        match displaced {
            Some((evicted, _)) if evicted != id => {
                warn!(route = %evicted, "evicted route config");
            }
            Some(_) => debug!(route = %id, "replaced route config"),
            None => debug!(route = %id, "added route config"),
        }
    }

    /// Returns the value for `id`, marking it most recently used.
    pub fn lookup(&self, id: &str) -> Option<V> {
        self.entries.lock().get(id).cloned()
    }

    /// Returns true if `id` is cached, without touching its recency.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains(id)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

impl<V: Clone> Default for RouteConfigCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<V> fmt::Debug for RouteConfigCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("RouteConfigCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish()
    }
}
