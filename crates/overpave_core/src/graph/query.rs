//! Path shaping and planar collision queries.

use crate::geometry::{point_segment_distance, segment_intersects, turn_angle, SegmentHit, Vec3};

use super::arena::Graph;
use super::element::{PathId, PointId};
use super::error::{GraphError, GraphResult};

/// A hit between an outside segment and one segment of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathHit {
    /// Path the segment belongs to.
    pub path: PathId,
    /// Segment start.
    pub from: PointId,
    /// Segment end.
    pub to: PointId,
    /// Geometry; `on_first` lies on the path segment.
    pub hit: SegmentHit,
}

/// A hit between a segment of one path and a segment of another (or the same) path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathCrossing {
    /// Segment on the path being queried.
    pub own: (PointId, PointId),
    /// Segment on the other path.
    pub other: (PointId, PointId),
    /// Geometry; `on_first` lies on `own`.
    pub hit: SegmentHit,
}

/// The closest approach of a path to a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointHit {
    /// Segment start.
    pub from: PointId,
    /// Segment end.
    pub to: PointId,
    /// Planar distance from the position to the segment.
    pub distance: f64,
    /// Closest point on the segment.
    pub closest: Vec3,
}

impl Graph {
    /// Consecutive point pairs of `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn all_segments(&self, path: PathId) -> GraphResult<Vec<(PointId, PointId)>> {
        let order = self.all_points(path)?;
        Ok(order.windows(2).map(|w| (w[0], w[1])).collect())
    }

    /// Planar length of `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn path_length(&self, path: PathId) -> GraphResult<f64> {
        let positions = self.positions(path)?;
        Ok(positions.windows(2).map(|w| w[0].flat_distance(w[1])).sum())
    }

    /// Inserts points so no segment is longer than `max_len`.
    ///
    /// Returns the inserted point ids in path order.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidLength`] unless `max_len` is positive and finite.
    pub fn subdivide(&mut self, path: PathId, max_len: f64) -> GraphResult<Vec<PointId>> {
        if !(max_len.is_finite() && max_len > 0.0) {
            return Err(GraphError::InvalidLength(max_len));
        }
        let mut inserted = Vec::new();
        for (a, b) in self.all_segments(path)? {
            let from = self.position(a)?;
            let to = self.position(b)?;
            let length = from.flat_distance(to);
            let pieces = (length / max_len).ceil() as usize;
            let mut previous = a;
            for i in 1..pieces {
                let pos = from.lerp(to, i as f64 / pieces as f64);
                previous = self.insert_between(previous, b, pos)?;
                inserted.push(previous);
            }
        }
        Ok(inserted)
    }

    /// Removes intermediate points where the path turns by less than
    /// `angle` radians. Branch origins and attached points are kept.
    ///
    /// Returns the number of points removed.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn unsubdivide(&mut self, path: PathId, angle: f64) -> GraphResult<usize> {
        let mut removed = 0;
        for p in self.intermediate_points(path)? {
            let point = self.point(p)?;
            if !point.attached.is_empty() || !point.branches.is_empty() {
                continue;
            }
            let prev = point.prev.ok_or(GraphError::Corrupt(path))?;
            let next = point.next.ok_or(GraphError::Corrupt(path))?;
            if turn_angle(self.position(prev)?, point.pos, self.position(next)?) < angle {
                self.remove(p)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Segments of `path` within `margin` of segment `a`-`b`, in path order.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn intersects_segment(
        &self,
        path: PathId,
        a: Vec3,
        b: Vec3,
        margin: f64,
    ) -> GraphResult<Vec<PathHit>> {
        let mut hits = Vec::new();
        for (from, to) in self.all_segments(path)? {
            let start = self.position(from)?;
            let end = self.position(to)?;
            if let Some(hit) = segment_intersects(start, end, a, b, margin) {
                hits.push(PathHit { path, from, to, hit });
            }
        }
        Ok(hits)
    }

    /// Segment pairs of `path` and `other` within `margin` of each other.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`] for either path.
    pub fn intersects_path(
        &self,
        path: PathId,
        other: PathId,
        margin: f64,
    ) -> GraphResult<Vec<PathCrossing>> {
        let theirs = self.segment_positions(other)?;
        let mut crossings = Vec::new();
        for (own, (a, b)) in self.segment_positions(path)? {
            for &(other_seg, (c, d)) in &theirs {
                if let Some(hit) = segment_intersects(a, b, c, d, margin) {
                    crossings.push(PathCrossing { own, other: other_seg, hit });
                }
            }
        }
        Ok(crossings)
    }

    /// The segment of `path` closest to `pos`, if within `margin`.
    ///
    /// Ties are broken by path order.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn intersects_point(&self, path: PathId, pos: Vec3, margin: f64) -> GraphResult<Option<PointHit>> {
        let mut best: Option<PointHit> = None;
        for ((from, to), (a, b)) in self.segment_positions(path)? {
            let (distance, closest, _) = point_segment_distance(pos, a, b);
            if distance <= margin && best.map_or(true, |hit| distance < hit.distance) {
                best = Some(PointHit { from, to, distance, closest });
            }
        }
        Ok(best)
    }

    /// Pairs of non-adjacent segments of `path` within `margin` of each other.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn self_intersections(&self, path: PathId, margin: f64) -> GraphResult<Vec<PathCrossing>> {
        let segments = self.segment_positions(path)?;
        let mut crossings = Vec::new();
        for i in 0..segments.len() {
            for j in (i + 2)..segments.len() {
                let (own, (a, b)) = segments[i];
                let (other, (c, d)) = segments[j];
                if let Some(hit) = segment_intersects(a, b, c, d, margin) {
                    crossings.push(PathCrossing { own, other, hit });
                }
            }
        }
        Ok(crossings)
    }

    /// Sorts point ids by planar distance from `from`, ties by id.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if any id is not alive.
    pub fn sort_by_distance(&self, ids: &mut [PointId], from: Vec3) -> GraphResult<()> {
        let mut keyed = Vec::with_capacity(ids.len());
        for &id in ids.iter() {
            keyed.push((self.position(id)?.flat_distance(from), id));
        }
        keyed.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        for (slot, (_, id)) in ids.iter_mut().zip(keyed) {
            *slot = id;
        }
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn segment_positions(&self, path: PathId) -> GraphResult<Vec<((PointId, PointId), (Vec3, Vec3))>> {
        self.all_segments(path)?
            .into_iter()
            .map(|(from, to)| Ok(((from, to), (self.position(from)?, self.position(to)?))))
            .collect()
    }
}
