//! Pathpaver counterpart of the megacanvas: the central region's collision
//! index plus those of its non-complete neighbors.
//!
//! Saves are broadcast to every held pathpaver. Point lookups and
//! [`Megapathpaver::query`] run over the union of their paths, so a path
//! known to several regions is reported once, in (distance, id) order.
//!
//! The layout queries (crossings, spacing, merging) only see the paths the
//! central region laid out itself. Whatever the neighbors have planned so
//! far depends on request order, so it must never steer a decision.

use std::collections::BTreeSet;

use overpave_core::{Graph, PathHit, PathId, PointId, Vec3};

use crate::error::GenResult;
use crate::neighborhood::{Neighborhood, RegionMap};
use crate::pathpaver::{MergeTarget, ParallelOverlap, PathQuery, Pathpaver};
use crate::region_store::{Evicted, RegionStore};
use crate::units::{RegionCoord, Units};

/// Store of region pathpavers with per-region metadata `M`.
pub type PaverStore<M = ()> = RegionStore<Pathpaver, M>;

/// Broadcast wrapper over the pathpavers of a 3x3 window.
#[derive(Debug)]
pub struct Megapathpaver<M = ()> {
    hood: Neighborhood<Pathpaver, M>,
}

impl<M: Default + 'static> Megapathpaver<M> {
    /// Checks out the pathpavers around `center`, creating missing ones.
    ///
    /// # Errors
    ///
    /// [`crate::GenError::RegionBusy`] if one of them is already in use.
    pub fn new(store: &mut PaverStore<M>, units: Units, center: RegionCoord) -> GenResult<Self> {
        let hood = Neighborhood::checkout(store, center, |region| Pathpaver::new(units, region))?;
        Ok(Self { hood })
    }

    /// Returns the pathpavers to the store. Yields whatever it evicted.
    pub fn release(self, store: &mut PaverStore<M>) -> Vec<Evicted<Pathpaver, M>> {
        self.hood.release(store)
    }
}

impl<M> Megapathpaver<M> {
    /// The central region.
    #[must_use]
    pub const fn center(&self) -> RegionCoord {
        self.hood.center()
    }

    /// The central pathpaver.
    #[must_use]
    pub fn center_paver(&self) -> &Pathpaver {
        &self.hood.center_entry().value
    }

    /// Metadata of the central region.
    #[must_use]
    pub fn center_meta(&self) -> &M {
        &self.hood.center_entry().meta
    }

    /// Metadata of the central region, mutable.
    pub fn center_meta_mut(&mut self) -> &mut M {
        &mut self.hood.center_entry_mut().meta
    }

    /// Returns true if the central region has been laid out before.
    #[must_use]
    pub fn is_center_partial(&self) -> bool {
        self.hood.center_entry().partial
    }

    /// Records that the central region has been laid out.
    pub fn mark_center_partial(&mut self) {
        self.hood.center_entry_mut().partial = true;
    }

    /// Regions held, center first.
    pub fn regions(&self) -> impl Iterator<Item = RegionCoord> + '_ {
        self.hood.regions()
    }

    /// Records `point` in every pathpaver whose bounds contain it.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn save_point(&mut self, graph: &Graph, point: PointId) -> GenResult<bool> {
        let saved = self.hood.broadcast(|paver| paver.save_point(graph, point));
        let mut any = false;
        for result in saved.into_values() {
            any |= result?;
        }
        Ok(any)
    }

    /// Records `path` in every pathpaver it reaches.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn save_path(&mut self, graph: &Graph, path: PathId) -> GenResult<bool> {
        let saved = self.hood.broadcast(|paver| paver.save_path(graph, path));
        let mut any = false;
        for result in saved.into_values() {
            any |= result?;
        }
        Ok(any)
    }

    /// Records `path` everywhere it reaches and claims it for the central
    /// region.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn save_own_path(&mut self, graph: &Graph, path: PathId) -> GenResult<bool> {
        let saved = self.save_path(graph, path)?;
        self.hood.center_entry_mut().value.claim(path);
        Ok(saved)
    }

    /// Drops dead ids from every held pathpaver. Returns how many went.
    pub fn prune(&mut self, graph: &Graph) -> usize {
        self.hood.broadcast(|paver| paver.prune(graph)).into_values().sum()
    }

    /// Union of the paths known to every held pathpaver.
    #[must_use]
    pub fn paths(&self) -> BTreeSet<PathId> {
        let mut all = BTreeSet::new();
        for paths in self.hood.inspect(|paver| paver.paths().clone()).into_values() {
            all.extend(paths);
        }
        all
    }

    /// Paths recorded per region.
    #[must_use]
    pub fn path_counts(&self) -> RegionMap<usize> {
        self.hood.inspect(|paver| paver.paths().len())
    }

    /// Query over the union of held paths.
    #[must_use]
    pub fn query<'g>(&self, graph: &'g Graph) -> PathQuery<'g> {
        PathQuery::new(graph, self.paths())
    }

    /// Query over the paths the central region laid out itself.
    #[must_use]
    pub fn own_query<'g>(&self, graph: &'g Graph) -> PathQuery<'g> {
        self.center_paver().own_query(graph)
    }

    /// Recorded points within `radius` of `pos`, nearest first, without
    /// duplicates. With `only_local`, only points inside the central region.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn colliding_points(&self, graph: &Graph, pos: Vec3, radius: f64, only_local: bool) -> GenResult<Vec<PointId>> {
        let core = self.center_paver().core();
        let mut found = BTreeSet::new();
        for result in self
            .hood
            .inspect(|paver| paver.colliding_points(graph, pos, radius, false))
            .into_values()
        {
            found.extend(result?);
        }
        let mut found: Vec<PointId> = found.into_iter().collect();
        if only_local {
            let mut local = Vec::with_capacity(found.len());
            for p in found {
                if core.contains(graph.position(p)?) {
                    local.push(p);
                }
            }
            found = local;
        }
        graph.sort_by_distance(&mut found, pos)?;
        Ok(found)
    }

    /// [`PathQuery::crossings`] over the central region's own paths.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn crossings(&self, graph: &Graph, a: Vec3, b: Vec3, exclude: &BTreeSet<PathId>) -> GenResult<Vec<PathHit>> {
        self.own_query(graph).crossings(a, b, exclude)
    }

    /// [`PathQuery::near_parallel`] over the central region's own paths.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn near_parallel(
        &self,
        graph: &Graph,
        a: Vec3,
        b: Vec3,
        spacing: f64,
        tolerance: f64,
        exclude: &BTreeSet<PathId>,
    ) -> GenResult<bool> {
        self.own_query(graph).near_parallel(a, b, spacing, tolerance, exclude)
    }

    /// [`PathQuery::parallel_overlap`] over the central region's own paths.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn parallel_overlap(
        &self,
        graph: &Graph,
        a: Vec3,
        b: Vec3,
        spacing: f64,
        tolerance: f64,
        exclude: &BTreeSet<PathId>,
    ) -> GenResult<Option<ParallelOverlap>> {
        self.own_query(graph).parallel_overlap(a, b, spacing, tolerance, exclude)
    }

    /// [`PathQuery::merge_target`] over the central region's own paths.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn merge_target(
        &self,
        graph: &Graph,
        pos: Vec3,
        direction: Vec3,
        radius: f64,
        tolerance: f64,
        exclude: &BTreeSet<PathId>,
    ) -> GenResult<Option<MergeTarget>> {
        self.own_query(graph).merge_target(pos, direction, radius, tolerance, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Units {
        Units::new(8, 4).unwrap()
    }

    fn v(x: f64, z: f64) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    #[test]
    fn test_saves_reach_every_overlapping_region() {
        let mut store: PaverStore = RegionStore::new("paver", 25).unwrap();
        let mut graph = Graph::new();
        let mut mega = Megapathpaver::new(&mut store, units(), RegionCoord::new(0, 0)).unwrap();

        let border_road = graph.new_path(v(-10.0, 16.0), v(10.0, 16.0));
        assert!(mega.save_path(&graph, border_road).unwrap());

        let counts = mega.path_counts();
        assert_eq!(counts[&RegionCoord::new(0, 0)], 1);
        assert_eq!(counts[&RegionCoord::new(-1, 0)], 1);
        assert_eq!(counts[&RegionCoord::new(1, 1)], 0);
        assert_eq!(mega.paths().len(), 1);

        let hits = mega
            .query(&graph)
            .colliding_segments(v(0.0, 10.0), v(0.0, 20.0), 0.5, &BTreeSet::new())
            .unwrap();
        assert_eq!(hits.len(), 1, "one hit despite two pathpavers knowing the path");

        let start = graph.path(border_road).unwrap().start;
        let points = mega.colliding_points(&graph, v(-9.0, 16.0), 2.0, false).unwrap();
        assert_eq!(points, vec![start]);
        assert!(mega.colliding_points(&graph, v(-9.0, 16.0), 2.0, true).unwrap().is_empty());

        mega.release(&mut store);
        assert_eq!(store.size(), 9);
    }

    #[test]
    fn test_layout_queries_ignore_neighbor_paths() {
        let mut store: PaverStore = RegionStore::new("paver", 25).unwrap();
        let mut graph = Graph::new();
        let mut mega = Megapathpaver::new(&mut store, units(), RegionCoord::new(0, 0)).unwrap();

        let own = graph.new_path(v(4.0, 8.0), v(28.0, 8.0));
        let spill = graph.new_path(v(4.0, 24.0), v(28.0, 24.0));
        mega.save_own_path(&graph, own).unwrap();
        mega.save_path(&graph, spill).unwrap();
        assert_eq!(mega.paths().len(), 2);

        let none = BTreeSet::new();
        let across = mega.crossings(&graph, v(16.0, 0.0), v(16.0, 30.0), &none).unwrap();
        assert_eq!(across.iter().map(|h| h.path).collect::<Vec<_>>(), vec![own]);
        let tol = 10f64.to_radians();
        assert!(mega.near_parallel(&graph, v(4.0, 10.0), v(28.0, 10.0), 3.0, tol, &none).unwrap());
        assert!(!mega.near_parallel(&graph, v(4.0, 22.0), v(28.0, 22.0), 3.0, tol, &none).unwrap());

        graph.remove_path(own).unwrap();
        assert!(mega.prune(&graph) >= 3);
        assert!(mega.center_paver().own_paths().is_empty());
        mega.release(&mut store);
    }

    #[test]
    fn test_center_meta_travels_with_entry() {
        let mut store: PaverStore<u32> = RegionStore::new("paver", 25).unwrap();
        let center = RegionCoord::new(4, 4);
        let mut mega = Megapathpaver::new(&mut store, units(), center).unwrap();
        *mega.center_meta_mut() += 3;
        mega.release(&mut store);
        assert_eq!(store.peek(center).map(|e| e.meta), Some(3));
    }
}
