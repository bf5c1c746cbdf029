//! # Bounded LRU Cache
//!
//! Fixed-capacity map that evicts the least-recently-used entry once it
//! grows past `max_entries`.
//!
//! Recency is a monotonically increasing stamp per access; the ordering
//! index maps stamps back to keys so eviction is `O(log n)`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use thiserror::Error;

/// Errors raised when building a cache.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// A cache that can hold nothing would evict every insert immediately.
    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,
}

/// Callback invoked with every evicted entry.
pub type EvictFn<K, V> = Box<dyn FnMut(&K, &V)>;

struct Slot<V> {
    value: V,
    stamp: u64,
}

/// A least-recently-used cache with an eviction callback.
///
/// `get`, `get_mut`, `set` and `touch` mark a key most-recently-used;
/// `has` and `peek` do not.
///
/// # Example
///
/// ```rust
/// use overpave_core::BoundedCache;
///
/// let mut cache = BoundedCache::new(2).unwrap();
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.touch(&"a");
/// let evicted = cache.set("c", 3);
/// assert_eq!(evicted, Some(("b", 2)));
/// ```
pub struct BoundedCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    max_entries: usize,
    clock: u64,
    on_evict: Option<EvictFn<K, V>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `max_entries` entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::ZeroCapacity`] if `max_entries` is zero.
    pub fn new(max_entries: usize) -> Result<Self, CacheError> {
        if max_entries == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        Ok(Self {
            entries: HashMap::with_capacity(max_entries + 1),
            order: BTreeMap::new(),
            max_entries,
            clock: 0,
            on_evict: None,
        })
    }

    /// Creates a cache that calls `on_evict` for every evicted entry, right
    /// before the entry is handed back from [`BoundedCache::set`].
    ///
    /// # Errors
    ///
    /// [`CacheError::ZeroCapacity`] if `max_entries` is zero.
    pub fn with_eviction(
        max_entries: usize,
        on_evict: impl FnMut(&K, &V) + 'static,
    ) -> Result<Self, CacheError> {
        let mut cache = Self::new(max_entries)?;
        cache.on_evict = Some(Box::new(on_evict));
        Ok(cache)
    }

    /// Maximum number of entries kept.
    #[inline]
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Current number of entries.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` is cached. Does not affect recency.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Marks `key` most-recently-used. Returns false if it is not cached.
    pub fn touch(&mut self, key: &K) -> bool {
        let stamp = self.tick();
        let Some(slot) = self.entries.get_mut(key) else {
            return false;
        };
        self.order.remove(&slot.stamp);
        slot.stamp = stamp;
        self.order.insert(stamp, key.clone());
        true
    }

    /// Looks up `key` and marks it most-recently-used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.touch(key) {
            return None;
        }
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Mutable lookup; marks `key` most-recently-used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if !self.touch(key) {
            return None;
        }
        self.entries.get_mut(key).map(|slot| &mut slot.value)
    }

    /// Looks up `key` without affecting recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Inserts or replaces `key`, marking it most-recently-used.
    ///
    /// If the cache grows past its capacity, the least-recently-used entry
    /// is evicted, passed to the eviction callback and returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        let stamp = self.tick();
        if let Some(old) = self.entries.insert(key.clone(), Slot { value, stamp }) {
            self.order.remove(&old.stamp);
        }
        self.order.insert(stamp, key);

        if self.entries.len() <= self.max_entries {
            return None;
        }
        self.evict_oldest()
    }

    /// Removes `key` without invoking the eviction callback.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.stamp);
        Some(slot.value)
    }

    /// Keys from least- to most-recently-used.
    pub fn keys_lru(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    /// Entries from least- to most-recently-used. Does not affect recency.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .values()
            .filter_map(|key| self.entries.get(key).map(|slot| (key, &slot.value)))
    }

    /// Drops every entry without invoking the eviction callback.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&key, &slot.value);
        }
        Some((key, slot.value))
    }
}

impl<K, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("size", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}
