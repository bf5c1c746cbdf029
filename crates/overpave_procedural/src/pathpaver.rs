//! # Pathpaver
//!
//! Per-region index of the graph geometry near that region, used for
//! collision queries while streets are laid out.
//!
//! A pathpaver only records ids; the geometry lives in the shared
//! [`Graph`]. Points are recorded when they lie inside the region plus its
//! overgeneration margin, paths when any of their segments reaches that
//! area. Ids of paths that have since been removed from the graph are
//! skipped by every query.

use std::collections::BTreeSet;

use overpave_core::{
    is_parallel, point_segment_distance, segment_intersects, Graph, PathHit, PathId, PointId, Vec3, EPSILON,
};

use crate::error::GenResult;
use crate::units::{RegionCoord, Units};

/// Axis-aligned rectangle in the horizontal plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest z.
    pub min_z: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest z.
    pub max_z: f64,
}

impl Bounds {
    /// Bounds of `region`, grown by `margin` on every side.
    #[must_use]
    pub fn of_region(units: Units, region: RegionCoord, margin: f64) -> Self {
        let (x, z) = units.region_origin(region);
        let size = f64::from(units.region_size());
        Self {
            min_x: f64::from(x) - margin,
            min_z: f64::from(z) - margin,
            max_x: f64::from(x) + size + margin,
            max_z: f64::from(z) + size + margin,
        }
    }

    /// Returns true if `pos` lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, pos: Vec3) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.z >= self.min_z && pos.z <= self.max_z
    }

    /// Returns true if segment `a`-`b` touches the rectangle.
    #[must_use]
    pub fn touches_segment(&self, a: Vec3, b: Vec3) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let corners = [
            Vec3::new(self.min_x, 0.0, self.min_z),
            Vec3::new(self.max_x, 0.0, self.min_z),
            Vec3::new(self.max_x, 0.0, self.max_z),
            Vec3::new(self.min_x, 0.0, self.max_z),
        ];
        (0..4).any(|i| {
            segment_intersects(a, b, corners[i], corners[(i + 1) % 4], 0.0).is_some_and(|hit| hit.intersects)
        })
    }
}

/// Where a candidate segment runs alongside existing paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallelOverlap {
    /// Share of the candidate covered by parallel neighbors (0 to 1).
    pub fraction: f64,
    /// Parameter along the candidate where the first overlap starts.
    pub first_t: f64,
}

/// A point on an existing path a street end can merge into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergeTarget {
    /// Path merged into.
    pub path: PathId,
    /// Segment start.
    pub from: PointId,
    /// Segment end.
    pub to: PointId,
    /// Closest point on the segment.
    pub point: Vec3,
    /// Distance from the street end.
    pub distance: f64,
}

/// Collision queries over a fixed set of paths.
///
/// Results are ordered by distance, then by id, so equal inputs always
/// produce equal outputs.
#[derive(Debug)]
pub struct PathQuery<'g> {
    graph: &'g Graph,
    paths: Vec<PathId>,
}

impl<'g> PathQuery<'g> {
    /// Query over `paths`, dead ids dropped.
    pub fn new(graph: &'g Graph, paths: impl IntoIterator<Item = PathId>) -> Self {
        let paths: BTreeSet<PathId> = paths.into_iter().filter(|&p| graph.contains_path(p)).collect();
        Self {
            graph,
            paths: paths.into_iter().collect(),
        }
    }

    /// Paths searched, in id order.
    #[must_use]
    pub fn paths(&self) -> &[PathId] {
        &self.paths
    }

    fn segments(&self, exclude: &BTreeSet<PathId>) -> GenResult<Vec<(PathId, PointId, PointId, Vec3, Vec3)>> {
        let mut out = Vec::new();
        for &path in self.paths.iter().filter(|p| !exclude.contains(p)) {
            for (from, to) in self.graph.all_segments(path)? {
                out.push((path, from, to, self.graph.position(from)?, self.graph.position(to)?));
            }
        }
        Ok(out)
    }

    /// Path segments within `margin` of `a`-`b`.
    ///
    /// # Errors
    ///
    /// Propagates graph corruption.
    pub fn colliding_segments(&self, a: Vec3, b: Vec3, margin: f64, exclude: &BTreeSet<PathId>) -> GenResult<Vec<PathHit>> {
        let mut hits = Vec::new();
        for &path in self.paths.iter().filter(|p| !exclude.contains(p)) {
            hits.extend(self.graph.intersects_segment(path, a, b, margin)?);
        }
        hits.sort_by(|x, y| {
            x.hit
                .distance
                .total_cmp(&y.hit.distance)
                .then(x.path.cmp(&y.path))
                .then(x.from.cmp(&y.from))
        });
        Ok(hits)
    }

    /// True crossings of `a`-`b` with path segments, ordered from `a`.
    ///
    /// `hit.on_second` is the crossing on `a`-`b`, `hit.t_second` its
    /// parameter.
    ///
    /// # Errors
    ///
    /// Propagates graph corruption.
    pub fn crossings(&self, a: Vec3, b: Vec3, exclude: &BTreeSet<PathId>) -> GenResult<Vec<PathHit>> {
        let mut hits = self.colliding_segments(a, b, EPSILON, exclude)?;
        hits.retain(|h| h.hit.intersects);
        hits.sort_by(|x, y| {
            x.hit
                .t_second
                .total_cmp(&y.hit.t_second)
                .then(x.path.cmp(&y.path))
                .then(x.from.cmp(&y.from))
        });
        Ok(hits)
    }

    /// Returns true if some path segment parallel to `a`-`b` runs within
    /// `spacing` of it.
    ///
    /// # Errors
    ///
    /// Propagates graph corruption.
    pub fn near_parallel(&self, a: Vec3, b: Vec3, spacing: f64, tolerance: f64, exclude: &BTreeSet<PathId>) -> GenResult<bool> {
        let dir = b - a;
        for (_, _, _, c, d) in self.segments(exclude)? {
            if !is_parallel(dir, d - c, tolerance) {
                continue;
            }
            if segment_intersects(a, b, c, d, spacing).is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// How much of `a`-`b` runs within `spacing` of parallel path segments.
    ///
    /// Each parallel segment is projected onto `a`-`b`; the projected span
    /// counts when the segment lies within `spacing` at its middle.
    ///
    /// # Errors
    ///
    /// Propagates graph corruption.
    pub fn parallel_overlap(
        &self,
        a: Vec3,
        b: Vec3,
        spacing: f64,
        tolerance: f64,
        exclude: &BTreeSet<PathId>,
    ) -> GenResult<Option<ParallelOverlap>> {
        let dir = (b - a).flat();
        let len_sq = dir.flat_dot(dir);
        if len_sq <= EPSILON {
            return Ok(None);
        }

        let mut spans: Vec<(f64, f64)> = Vec::new();
        for (_, _, _, c, d) in self.segments(exclude)? {
            if !is_parallel(dir, d - c, tolerance) {
                continue;
            }
            let tc = (c - a).flat_dot(dir) / len_sq;
            let td = (d - a).flat_dot(dir) / len_sq;
            let lo = tc.min(td).max(0.0);
            let hi = tc.max(td).min(1.0);
            if hi - lo <= EPSILON {
                continue;
            }
            let middle = a.lerp(b, (lo + hi) / 2.0);
            let (distance, _, _) = point_segment_distance(middle, c, d);
            if distance <= spacing {
                spans.push((lo, hi));
            }
        }
        if spans.is_empty() {
            return Ok(None);
        }

        spans.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));
        let first_t = spans[0].0;
        let mut covered = 0.0;
        let (mut start, mut end) = spans[0];
        for &(lo, hi) in &spans[1..] {
            if lo > end {
                covered += end - start;
                start = lo;
                end = hi;
            } else {
                end = end.max(hi);
            }
        }
        covered += end - start;
        Ok(Some(ParallelOverlap {
            fraction: covered.min(1.0),
            first_t,
        }))
    }

    /// Nearest point within `radius` of `pos` on a path segment that is not
    /// parallel to `direction`.
    ///
    /// # Errors
    ///
    /// Propagates graph corruption.
    pub fn merge_target(
        &self,
        pos: Vec3,
        direction: Vec3,
        radius: f64,
        tolerance: f64,
        exclude: &BTreeSet<PathId>,
    ) -> GenResult<Option<MergeTarget>> {
        let mut best: Option<MergeTarget> = None;
        for (path, from, to, c, d) in self.segments(exclude)? {
            if is_parallel(direction, d - c, tolerance) {
                continue;
            }
            let (distance, point, _) = point_segment_distance(pos, c, d);
            if distance > radius {
                continue;
            }
            let better = best.map_or(true, |b| {
                distance < b.distance || (distance <= b.distance && (path, from) < (b.path, b.from))
            });
            if better {
                best = Some(MergeTarget {
                    path,
                    from,
                    to,
                    point,
                    distance,
                });
            }
        }
        Ok(best)
    }
}

/// Collision index of one region.
#[derive(Clone, Debug, PartialEq)]
pub struct Pathpaver {
    region: RegionCoord,
    core: Bounds,
    outer: Bounds,
    points: BTreeSet<PointId>,
    paths: BTreeSet<PathId>,
    own: BTreeSet<PathId>,
}

impl Pathpaver {
    /// Empty index for `region`.
    #[must_use]
    pub fn new(units: Units, region: RegionCoord) -> Self {
        Self {
            region,
            core: Bounds::of_region(units, region, 0.0),
            outer: Bounds::of_region(units, region, f64::from(units.margin())),
            points: BTreeSet::new(),
            paths: BTreeSet::new(),
            own: BTreeSet::new(),
        }
    }

    /// Region indexed.
    #[must_use]
    pub const fn region(&self) -> RegionCoord {
        self.region
    }

    /// Region bounds, margin excluded.
    #[must_use]
    pub const fn core(&self) -> Bounds {
        self.core
    }

    /// Region bounds, margin included.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.outer
    }

    /// Recorded points.
    #[must_use]
    pub fn points(&self) -> &BTreeSet<PointId> {
        &self.points
    }

    /// Recorded paths.
    #[must_use]
    pub fn paths(&self) -> &BTreeSet<PathId> {
        &self.paths
    }

    /// Paths laid out by this region itself.
    #[must_use]
    pub fn own_paths(&self) -> &BTreeSet<PathId> {
        &self.own
    }

    /// Marks a recorded path as laid out by this region. Returns false if
    /// the path was never recorded here.
    pub fn claim(&mut self, path: PathId) -> bool {
        if !self.paths.contains(&path) {
            return false;
        }
        self.own.insert(path);
        true
    }

    /// Returns true if `pos` lies inside the region itself.
    #[must_use]
    pub fn is_local(&self, pos: Vec3) -> bool {
        self.core.contains(pos)
    }

    /// Records `point` if it lies within the bounds. Returns true if newly
    /// recorded.
    ///
    /// # Errors
    ///
    /// [`overpave_core::GraphError::UnknownPoint`] for a dead id.
    pub fn save_point(&mut self, graph: &Graph, point: PointId) -> GenResult<bool> {
        if !self.outer.contains(graph.position(point)?) {
            return Ok(false);
        }
        Ok(self.points.insert(point))
    }

    /// Records the in-bounds points of `path`, and the path itself if any
    /// segment reaches the bounds. Returns true if the path is newly
    /// recorded.
    ///
    /// # Errors
    ///
    /// Propagates graph errors for a dead or corrupt path.
    pub fn save_path(&mut self, graph: &Graph, path: PathId) -> GenResult<bool> {
        let order = graph.all_points(path)?;
        let mut reaches = false;
        for &p in &order {
            reaches |= self.save_point(graph, p)? || self.points.contains(&p);
        }
        if !reaches {
            for pair in order.windows(2) {
                if self.outer.touches_segment(graph.position(pair[0])?, graph.position(pair[1])?) {
                    reaches = true;
                    break;
                }
            }
        }
        Ok(reaches && self.paths.insert(path))
    }

    /// Drops ids no longer alive in `graph`. Returns how many were dropped.
    pub fn prune(&mut self, graph: &Graph) -> usize {
        let before = self.points.len() + self.paths.len();
        self.points.retain(|&p| graph.contains_point(p));
        self.paths.retain(|&p| graph.contains_path(p));
        self.own.retain(|p| self.paths.contains(p));
        before - self.points.len() - self.paths.len()
    }

    /// Query over every recorded path.
    #[must_use]
    pub fn query<'g>(&self, graph: &'g Graph) -> PathQuery<'g> {
        PathQuery::new(graph, self.paths.iter().copied())
    }

    /// Query over the paths this region laid out itself.
    #[must_use]
    pub fn own_query<'g>(&self, graph: &'g Graph) -> PathQuery<'g> {
        PathQuery::new(graph, self.own.iter().copied())
    }

    /// Recorded points within `radius` of `pos`, nearest first. With
    /// `only_local`, points outside the region itself are skipped.
    ///
    /// # Errors
    ///
    /// Propagates graph errors.
    pub fn colliding_points(&self, graph: &Graph, pos: Vec3, radius: f64, only_local: bool) -> GenResult<Vec<PointId>> {
        let mut found = Vec::new();
        for &p in self.points.iter().filter(|&&p| graph.contains_point(p)) {
            let at = graph.position(p)?;
            if at.flat_distance(pos) <= radius && (!only_local || self.is_local(at)) {
                found.push(p);
            }
        }
        graph.sort_by_distance(&mut found, pos)?;
        Ok(found)
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
    fn test_bounds() {
        let b = Bounds::of_region(units(), RegionCoord::new(0, 0), 16.0);
        assert!(b.contains(v(-16.0, 48.0)));
        assert!(!b.contains(v(-16.5, 0.0)));
        assert!(b.touches_segment(v(-100.0, 10.0), v(100.0, 10.0)));
        assert!(!b.touches_segment(v(-100.0, -20.0), v(100.0, -20.0)));
    }

    #[test]
    fn test_save_only_within_margin() {
        let mut graph = Graph::new();
        let mut paver = Pathpaver::new(units(), RegionCoord::new(0, 0));

        let inside = graph.new_path(v(0.0, 0.0), v(20.0, 0.0));
        let passing = graph.new_path(v(-100.0, 30.0), v(100.0, 30.0));
        let far = graph.new_path(v(200.0, 200.0), v(300.0, 200.0));

        assert!(paver.save_path(&graph, inside).unwrap());
        assert!(!paver.save_path(&graph, inside).unwrap(), "already recorded");
        assert!(paver.save_path(&graph, passing).unwrap());
        assert!(!paver.save_path(&graph, far).unwrap());

        assert_eq!(paver.paths().len(), 2);
        assert_eq!(paver.points().len(), 2, "only the inside path's points are in bounds");
    }

    #[test]
    fn test_colliding_points_sorted_and_local() {
        let mut graph = Graph::new();
        let mut paver = Pathpaver::new(units(), RegionCoord::new(0, 0));
        let near = graph.new_point(v(1.0, 0.0));
        let margin_point = graph.new_point(v(-2.0, 0.0));
        let far = graph.new_point(v(20.0, 20.0));
        for p in [far, margin_point, near] {
            paver.save_point(&graph, p).unwrap();
        }

        let hits = paver.colliding_points(&graph, v(0.0, 0.0), 5.0, false).unwrap();
        assert_eq!(hits, vec![near, margin_point]);
        let local = paver.colliding_points(&graph, v(0.0, 0.0), 5.0, true).unwrap();
        assert_eq!(local, vec![near]);
    }

    #[test]
    fn test_crossings_ordered_along_segment() {
        let mut graph = Graph::new();
        let a = graph.new_path(v(10.0, -5.0), v(10.0, 5.0));
        let b = graph.new_path(v(4.0, -5.0), v(4.0, 5.0));
        let query = PathQuery::new(&graph, [a, b]);

        let hits = query.crossings(v(0.0, 0.0), v(20.0, 0.0), &BTreeSet::new()).unwrap();
        assert_eq!(hits.iter().map(|h| h.path).collect::<Vec<_>>(), vec![b, a]);
        assert!((hits[0].hit.on_second.x - 4.0).abs() < 1e-9);

        let only_a = query.crossings(v(0.0, 0.0), v(20.0, 0.0), &BTreeSet::from([b])).unwrap();
        assert_eq!(only_a.len(), 1);

        let close = query.colliding_segments(v(0.0, 6.0), v(20.0, 6.0), 2.0, &BTreeSet::new()).unwrap();
        assert_eq!(close.len(), 2);
        assert!(close.iter().all(|h| !h.hit.intersects));
    }

    #[test]
    fn test_parallel_overlap_and_rejection() {
        let mut graph = Graph::new();
        let existing = graph.new_path(v(50.0, 4.0), v(150.0, 4.0));
        let query = PathQuery::new(&graph, [existing]);
        let tol = 10f64.to_radians();
        let none = BTreeSet::new();

        let overlap = query
            .parallel_overlap(v(0.0, 0.0), v(100.0, 0.0), 6.0, tol, &none)
            .unwrap()
            .unwrap();
        assert!((overlap.fraction - 0.5).abs() < 1e-9);
        assert!((overlap.first_t - 0.5).abs() < 1e-9);
        assert!(query.near_parallel(v(0.0, 0.0), v(100.0, 0.0), 6.0, tol, &none).unwrap());

        assert!(query.parallel_overlap(v(0.0, 0.0), v(100.0, 0.0), 3.0, tol, &none).unwrap().is_none());
        assert!(query.parallel_overlap(v(60.0, -50.0), v(60.0, 50.0), 6.0, tol, &none).unwrap().is_none());
        assert!(!query.near_parallel(v(60.0, -50.0), v(60.0, 50.0), 6.0, tol, &none).unwrap());
    }

    #[test]
    fn test_merge_target_skips_parallel_paths() {
        let mut graph = Graph::new();
        let parallel = graph.new_path(v(0.0, 2.0), v(100.0, 2.0));
        let crossing = graph.new_path(v(104.0, -50.0), v(104.0, 50.0));
        let query = PathQuery::new(&graph, [parallel, crossing]);

        let target = query
            .merge_target(v(100.0, 0.0), v(1.0, 0.0), 10.0, 10f64.to_radians(), &BTreeSet::new())
            .unwrap()
            .unwrap();
        assert_eq!(target.path, crossing);
        assert!((target.point.x - 104.0).abs() < 1e-9);
        assert!((target.distance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_dead_ids_are_skipped_and_pruned() {
        let mut graph = Graph::new();
        let mut paver = Pathpaver::new(units(), RegionCoord::new(0, 0));
        let path = graph.new_path(v(0.0, 0.0), v(10.0, 0.0));
        paver.save_path(&graph, path).unwrap();
        graph.remove_path(path).unwrap();

        assert!(paver.query(&graph).paths().is_empty());
        assert!(paver.colliding_points(&graph, v(0.0, 0.0), 50.0, false).unwrap().is_empty());
        assert_eq!(paver.prune(&graph), 3);
        assert!(paver.paths().is_empty());
    }

    #[test]
    fn test_own_query_sees_only_claimed_paths() {
        let mut graph = Graph::new();
        let mut paver = Pathpaver::new(units(), RegionCoord::new(0, 0));
        let own = graph.new_path(v(0.0, 10.0), v(30.0, 10.0));
        let foreign = graph.new_path(v(0.0, 20.0), v(30.0, 20.0));
        paver.save_path(&graph, own).unwrap();
        paver.save_path(&graph, foreign).unwrap();

        let far = graph.new_path(v(500.0, 500.0), v(600.0, 500.0));
        assert!(!paver.claim(far), "unrecorded paths cannot be claimed");
        assert!(paver.claim(own));

        assert_eq!(paver.query(&graph).paths(), &[own, foreign]);
        assert_eq!(paver.own_query(&graph).paths(), &[own]);
        let crossing = paver
            .own_query(&graph)
            .crossings(v(15.0, 0.0), v(15.0, 30.0), &BTreeSet::new())
            .unwrap();
        assert_eq!(crossing.len(), 1);
        assert_eq!(crossing[0].path, own);

        graph.remove_path(own).unwrap();
        paver.prune(&graph);
        assert!(paver.own_paths().is_empty());
    }
}
