//! Central region plus its 8 planar neighbors, checked out of a
//! [`RegionStore`] together.
//!
//! Calls are fanned out to the center first, then to every neighbor that
//! was not complete at checkout, in [`RegionCoord::neighbors`] order.
//! Complete neighbors are final and are left in the store.

use std::collections::BTreeMap;

use crate::error::GenResult;
use crate::region_store::{Evicted, RegionEntry, RegionStore};
use crate::units::RegionCoord;

/// Per-region results of a broadcast call.
pub type RegionMap<R> = BTreeMap<RegionCoord, R>;

/// Broadcast wrapper over a checked-out 3x3 window.
#[derive(Debug)]
pub struct Neighborhood<T, M = ()> {
    center: RegionCoord,
    slots: Vec<(RegionCoord, RegionEntry<T, M>)>,
}

impl<T: 'static, M: Default + 'static> Neighborhood<T, M> {
    /// Checks out `center` and its non-complete neighbors, creating missing
    /// entries with `make`.
    ///
    /// # Errors
    ///
    /// [`crate::GenError::RegionBusy`] if any of them is already checked
    /// out. Entries taken before the failure are returned to the store.
    pub fn checkout(
        store: &mut RegionStore<T, M>,
        center: RegionCoord,
        mut make: impl FnMut(RegionCoord) -> T,
    ) -> GenResult<Self> {
        let mut hood = Self {
            center,
            slots: Vec::with_capacity(9),
        };
        let wanted = std::iter::once(center).chain(
            center
                .neighbors()
                .into_iter()
                .filter(|&n| !store.is_complete(n))
                .collect::<Vec<_>>(),
        );
        for region in wanted {
            match store.checkout(region, || make(region)) {
                Ok(entry) => hood.slots.push((region, entry)),
                Err(e) => {
                    hood.release(store);
                    return Err(e);
                }
            }
        }
        Ok(hood)
    }

    /// Returns every entry to the store. Yields whatever the store evicted.
    pub fn release(self, store: &mut RegionStore<T, M>) -> Vec<Evicted<T, M>> {
        self.slots
            .into_iter()
            .filter_map(|(region, entry)| store.checkin(region, entry))
            .collect()
    }
}

impl<T, M> Neighborhood<T, M> {
    /// The central region.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> RegionCoord {
        self.center
    }

    /// Regions held, center first.
    pub fn regions(&self) -> impl Iterator<Item = RegionCoord> + '_ {
        self.slots.iter().map(|(r, _)| *r)
    }

    /// Neighbors held (those that were not complete at checkout).
    pub fn neighbors(&self) -> impl Iterator<Item = RegionCoord> + '_ {
        self.regions().skip(1)
    }

    /// Number of regions held, center included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; the center is always held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The central entry.
    #[must_use]
    pub fn center_entry(&self) -> &RegionEntry<T, M> {
        &self.slots[0].1
    }

    /// The central entry, mutable.
    pub fn center_entry_mut(&mut self) -> &mut RegionEntry<T, M> {
        &mut self.slots[0].1
    }

    /// Held entries with their regions, center first.
    pub fn entries(&self) -> impl Iterator<Item = (RegionCoord, &RegionEntry<T, M>)> + '_ {
        self.slots.iter().map(|(r, e)| (*r, e))
    }

    /// Held entries with their regions, mutable.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = (RegionCoord, &mut RegionEntry<T, M>)> + '_ {
        self.slots.iter_mut().map(|(r, e)| (*r, e))
    }

    /// Held object of `region`.
    #[must_use]
    pub fn get(&self, region: RegionCoord) -> Option<&T> {
        self.slots.iter().find(|(r, _)| *r == region).map(|(_, e)| &e.value)
    }

    /// Held object of `region`, mutable.
    pub fn get_mut(&mut self, region: RegionCoord) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find(|(r, _)| *r == region)
            .map(|(_, e)| &mut e.value)
    }

    /// Calls `f` on every held object and collects the results per region.
    pub fn broadcast<R>(&mut self, mut f: impl FnMut(&mut T) -> R) -> RegionMap<R> {
        self.slots
            .iter_mut()
            .map(|(region, entry)| (*region, f(&mut entry.value)))
            .collect()
    }

    /// Calls `f` on every held object and ORs the results. Every object is
    /// visited, whatever the earlier results.
    pub fn broadcast_any(&mut self, mut f: impl FnMut(&mut T) -> bool) -> bool {
        self.slots
            .iter_mut()
            .fold(false, |any, (_, entry)| f(&mut entry.value) | any)
    }

    /// [`Neighborhood::broadcast`] restricted to entries that are not
    /// complete. Only the center can be complete once checked out.
    pub fn broadcast_open<R>(&mut self, mut f: impl FnMut(&mut T) -> R) -> RegionMap<R> {
        self.slots
            .iter_mut()
            .filter(|(_, entry)| !entry.complete)
            .map(|(region, entry)| (*region, f(&mut entry.value)))
            .collect()
    }

    /// [`Neighborhood::broadcast_any`] restricted to entries that are not
    /// complete.
    pub fn broadcast_open_any(&mut self, mut f: impl FnMut(&mut T) -> bool) -> bool {
        self.slots
            .iter_mut()
            .filter(|(_, entry)| !entry.complete)
            .fold(false, |any, (_, entry)| f(&mut entry.value) | any)
    }

    /// Read-only broadcast.
    pub fn inspect<R>(&self, mut f: impl FnMut(&T) -> R) -> RegionMap<R> {
        self.slots
            .iter()
            .map(|(region, entry)| (*region, f(&entry.value)))
            .collect()
    }
}
