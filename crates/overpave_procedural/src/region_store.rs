//! # Region Store
//!
//! Bounded cache of per-region objects (canvases, pathpavers) together
//! with their generation state.
//!
//! ## Lifecycle
//!
//! ```text
//! absent --checkout--> checked out --checkin--> cached (partial?) --mark_complete--> complete
//!                            ^                       |
//!                            +-------checkout--------+        (LRU eviction from "cached")
//! ```
//!
//! A checked-out entry lives outside the cache, so it can never be evicted
//! while a neighborhood is writing into it. Flags and metadata travel with
//! the entry, so eviction drops them in the same step.

use std::collections::BTreeSet;

use overpave_core::BoundedCache;
use tracing::trace;

use crate::error::{GenError, GenResult};
use crate::units::RegionCoord;

/// A cached region object plus its generation state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionEntry<T, M = ()> {
    /// The cached object.
    pub value: T,
    /// The region's own generator has run.
    pub partial: bool,
    /// The region's generator and all required neighbor layers have run.
    pub complete: bool,
    /// Caller-defined metadata.
    pub meta: M,
}

impl<T, M: Default> RegionEntry<T, M> {
    /// Fresh, ungenerated entry.
    pub fn new(value: T) -> Self {
        Self {
            value,
            partial: false,
            complete: false,
            meta: M::default(),
        }
    }
}

/// A region entry dropped from the store to make room.
pub type Evicted<T, M> = (RegionCoord, RegionEntry<T, M>);

/// Bounded, check-out/check-in store of region entries.
#[derive(Debug)]
pub struct RegionStore<T, M = ()> {
    cache: BoundedCache<RegionCoord, RegionEntry<T, M>>,
    checked_out: BTreeSet<RegionCoord>,
    evictions: u64,
    name: &'static str,
}

impl<T: 'static, M: Default + 'static> RegionStore<T, M> {
    /// Creates a store holding at most `max_entries` regions.
    ///
    /// # Errors
    ///
    /// [`GenError::Cache`] if `max_entries` is zero.
    pub fn new(name: &'static str, max_entries: usize) -> GenResult<Self> {
        let cache = BoundedCache::with_eviction(max_entries, move |region: &RegionCoord, entry: &RegionEntry<T, M>| {
            trace!(store = name, %region, complete = entry.complete, "evicting region");
        })?;
        Ok(Self {
            cache,
            checked_out: BTreeSet::new(),
            evictions: 0,
            name,
        })
    }

    /// Maximum number of cached regions.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.cache.max_entries()
    }

    /// Number of cached regions, checked-out ones excluded.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cache.size()
    }

    /// Number of regions evicted so far.
    #[must_use]
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns true if `region` is cached (not checked out).
    #[must_use]
    pub fn contains(&self, region: RegionCoord) -> bool {
        self.cache.has(&region)
    }

    /// Returns true if `region` is currently checked out.
    #[must_use]
    pub fn is_checked_out(&self, region: RegionCoord) -> bool {
        self.checked_out.contains(&region)
    }

    /// Returns true if `region` is cached and complete.
    #[must_use]
    pub fn is_complete(&self, region: RegionCoord) -> bool {
        self.cache.peek(&region).is_some_and(|e| e.complete)
    }

    /// Returns true if `region` is cached and its generator has run.
    #[must_use]
    pub fn is_partial(&self, region: RegionCoord) -> bool {
        self.cache.peek(&region).is_some_and(|e| e.partial)
    }

    /// Cached entry, marked most-recently-used.
    pub fn get(&mut self, region: RegionCoord) -> Option<&RegionEntry<T, M>> {
        self.cache.get(&region)
    }

    /// Cached entry, recency untouched.
    #[must_use]
    pub fn peek(&self, region: RegionCoord) -> Option<&RegionEntry<T, M>> {
        self.cache.peek(&region)
    }

    /// Cached entries from least- to most-recently-used.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionCoord, &RegionEntry<T, M>)> {
        self.cache.iter()
    }

    /// Takes `region` out of the cache, creating it with `make` if absent.
    ///
    /// # Errors
    ///
    /// [`GenError::RegionBusy`] if `region` is already checked out.
    pub fn checkout(&mut self, region: RegionCoord, make: impl FnOnce() -> T) -> GenResult<RegionEntry<T, M>> {
        if !self.checked_out.insert(region) {
            return Err(GenError::RegionBusy(region));
        }
        Ok(self
            .cache
            .remove(&region)
            .unwrap_or_else(|| RegionEntry::new(make())))
    }

    /// Returns a checked-out entry to the cache as most-recently-used.
    ///
    /// Returns the entry evicted to make room, if any.
    pub fn checkin(&mut self, region: RegionCoord, entry: RegionEntry<T, M>) -> Option<Evicted<T, M>> {
        self.checked_out.remove(&region);
        let evicted = self.cache.set(region, entry);
        if evicted.is_some() {
            self.evictions += 1;
        }
        evicted
    }

    /// Promotes a cached region to complete.
    ///
    /// Returns false if the region is not cached.
    pub fn mark_complete(&mut self, region: RegionCoord) -> bool {
        let Some(entry) = self.cache.get_mut(&region) else {
            return false;
        };
        entry.complete = true;
        true
    }

    /// Store name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max: usize) -> RegionStore<u32, u8> {
        RegionStore::new("test", max).unwrap()
    }

    #[test]
    fn test_checkout_creates_lazily() {
        let mut s = store(4);
        let r = RegionCoord::new(0, 0);
        let entry = s.checkout(r, || 7).unwrap();
        assert_eq!(entry.value, 7);
        assert!(!entry.partial && !entry.complete);
        assert!(s.is_checked_out(r));
        assert!(!s.contains(r));

        assert!(s.checkin(r, entry).is_none());
        assert!(s.contains(r));
        assert!(!s.is_checked_out(r));

        let again = s.checkout(r, || 99).unwrap();
        assert_eq!(again.value, 7, "cached value is reused");
    }

    #[test]
    fn test_double_checkout_is_busy() {
        let mut s = store(4);
        let r = RegionCoord::new(1, 2);
        let _held = s.checkout(r, || 0).unwrap();
        assert!(matches!(s.checkout(r, || 0), Err(GenError::RegionBusy(b)) if b == r));
    }

    #[test]
    fn test_checked_out_entries_survive_churn() {
        let mut s = store(2);
        let held_region = RegionCoord::new(0, 0);
        let mut held = s.checkout(held_region, || 1).unwrap();
        held.partial = true;

        for x in 1..10 {
            let r = RegionCoord::new(x, 0);
            let e = s.checkout(r, || 0).unwrap();
            s.checkin(r, e);
            assert!(s.size() <= 2);
        }
        assert_eq!(s.evictions(), 7);

        s.checkin(held_region, held);
        assert!(s.is_partial(held_region));
    }

    #[test]
    fn test_flags_are_dropped_with_the_entry() {
        let mut s = store(1);
        let a = RegionCoord::new(0, 0);
        let e = s.checkout(a, || 1).unwrap();
        s.checkin(a, e);
        assert!(s.mark_complete(a));
        assert!(s.is_complete(a));

        let b = RegionCoord::new(5, 5);
        let e = s.checkout(b, || 2).unwrap();
        let (evicted, entry) = s.checkin(b, e).unwrap();
        assert_eq!(evicted, a);
        assert!(entry.complete);
        assert!(!s.is_complete(a));
        assert!(!s.mark_complete(a));
    }
}
