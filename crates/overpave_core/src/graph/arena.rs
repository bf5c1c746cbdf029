//! # Graph Arena
//!
//! Owns every point and path. Relations between them (links, attachment,
//! branches) are plain id sets, so removing anything goes through
//! [`Graph::remove_point`] / [`Graph::remove_path`], which clear every
//! relation that mentions the removed id before freeing it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::geometry::Vec3;

use super::element::{Path, PathId, Point, PointId};
use super::error::{GraphError, GraphResult};

/// Tolerance used when deciding whether two endpoints coincide.
const JOIN_TOLERANCE: f64 = 1e-9;

/// Arena of points and paths.
///
/// Id counters live here rather than in process-wide statics: two graphs
/// built from the same sequence of calls hand out identical ids.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub(crate) points: BTreeMap<PointId, Point>,
    pub(crate) paths: BTreeMap<PathId, Path>,
    next_point_id: u64,
    next_path_id: u64,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live points.
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of live paths.
    #[inline]
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if the point is alive.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, id: PointId) -> bool {
        self.points.contains_key(&id)
    }

    /// Returns true if the path is alive.
    #[inline]
    #[must_use]
    pub fn contains_path(&self, id: PathId) -> bool {
        self.paths.contains_key(&id)
    }

    /// Looks up a point.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if the id is not alive.
    pub fn point(&self, id: PointId) -> GraphResult<&Point> {
        self.points.get(&id).ok_or(GraphError::UnknownPoint(id))
    }

    /// Looks up a path.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPath`] if the id is not alive.
    pub fn path(&self, id: PathId) -> GraphResult<&Path> {
        self.paths.get(&id).ok_or(GraphError::UnknownPath(id))
    }

    fn point_mut(&mut self, id: PointId) -> GraphResult<&mut Point> {
        self.points.get_mut(&id).ok_or(GraphError::UnknownPoint(id))
    }

    fn path_mut(&mut self, id: PathId) -> GraphResult<&mut Path> {
        self.paths.get_mut(&id).ok_or(GraphError::UnknownPath(id))
    }

    /// Position of a point.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if the id is not alive.
    pub fn position(&self, id: PointId) -> GraphResult<Vec3> {
        Ok(self.point(id)?.pos)
    }

    /// Iterates over all live paths in id order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.values()
    }

    /// Creates a free point (not on any path).
    pub fn new_point(&mut self, pos: Vec3) -> PointId {
        let id = PointId(self.next_point_id);
        self.next_point_id += 1;
        self.points.insert(id, Point::new(id, pos));
        id
    }

    fn alloc_path_id(&mut self) -> PathId {
        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        id
    }

    /// Creates a two-point path.
    pub fn new_path(&mut self, start: Vec3, finish: Vec3) -> PathId {
        let id = self.alloc_path_id();
        let start_id = self.new_point(start);
        let finish_id = self.new_point(finish);

        if let Some(p) = self.points.get_mut(&start_id) {
            p.path = Some(id);
            p.next = Some(finish_id);
        }
        if let Some(p) = self.points.get_mut(&finish_id) {
            p.path = Some(id);
            p.prev = Some(start_id);
        }

        self.paths.insert(
            id,
            Path {
                id,
                start: start_id,
                finish: finish_id,
                points: BTreeSet::from([start_id, finish_id]),
                branch_points: BTreeSet::new(),
            },
        );
        id
    }

    /// Creates a path through `positions` in order.
    ///
    /// # Errors
    ///
    /// [`GraphError::TooFewPoints`] for fewer than two positions.
    pub fn path_from_positions(&mut self, positions: &[Vec3]) -> GraphResult<PathId> {
        let [first, .., last] = positions else {
            return Err(GraphError::TooFewPoints(positions.len()));
        };
        let id = self.new_path(*first, *last);
        let finish = self.path(id)?.finish;
        for pos in &positions[1..positions.len() - 1] {
            self.insert_before(finish, *pos)?;
        }
        Ok(id)
    }

    /// Links `a -> b`. Both points must already be members of the same path.
    ///
    /// This is the raw link primitive; it does not repair the previous
    /// neighbors of either point.
    ///
    /// # Errors
    ///
    /// [`GraphError::DifferentPaths`] if the points are not on one path.
    pub fn link(&mut self, a: PointId, b: PointId) -> GraphResult<()> {
        let pa = self.point(a)?.path;
        let pb = self.point(b)?.path;
        match (pa, pb) {
            (Some(x), Some(y)) if x == y => {}
            _ => return Err(GraphError::DifferentPaths { a, b }),
        }
        self.point_mut(a)?.next = Some(b);
        self.point_mut(b)?.prev = Some(a);
        Ok(())
    }

    /// Breaks the link `a -> b`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotAdjacent`] if `a.next` is not `b`.
    pub fn unlink(&mut self, a: PointId, b: PointId) -> GraphResult<()> {
        if self.point(a)?.next != Some(b) || self.point(b)?.prev != Some(a) {
            return Err(GraphError::NotAdjacent { a, b });
        }
        self.point_mut(a)?.next = None;
        self.point_mut(b)?.prev = None;
        Ok(())
    }

    /// Attaches two points so they share a position. `b` (and everything
    /// already attached to it) moves onto `a`.
    ///
    /// # Errors
    ///
    /// [`GraphError::SelfAttachment`] if `a == b`.
    pub fn attach(&mut self, a: PointId, b: PointId) -> GraphResult<()> {
        if a == b {
            return Err(GraphError::SelfAttachment(a));
        }
        let pos = self.position(a)?;
        self.set_position(b, pos)?;
        self.point_mut(a)?.attached.insert(b);
        self.point_mut(b)?.attached.insert(a);
        Ok(())
    }

    /// Removes the attachment between two points, if any.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if either id is not alive.
    pub fn detach(&mut self, a: PointId, b: PointId) -> GraphResult<()> {
        self.point_mut(a)?.attached.remove(&b);
        self.point_mut(b)?.attached.remove(&a);
        Ok(())
    }

    /// Every point transitively attached to `p`, `p` included.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if `p` is not alive.
    pub fn attachment_closure(&self, p: PointId) -> GraphResult<BTreeSet<PointId>> {
        let mut seen = BTreeSet::from([p]);
        let mut queue = VecDeque::from([p]);
        while let Some(current) = queue.pop_front() {
            for &other in &self.point(current)?.attached {
                if seen.insert(other) {
                    queue.push_back(other);
                }
            }
        }
        Ok(seen)
    }

    /// Moves `p` and every point attached to it.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if `p` is not alive.
    pub fn set_position(&mut self, p: PointId, pos: Vec3) -> GraphResult<()> {
        for id in self.attachment_closure(p)? {
            self.point_mut(id)?.pos = pos;
        }
        Ok(())
    }

    /// Starts a new path at `origin`, ending at `finish`.
    ///
    /// The new path's start is a fresh point attached to `origin`; the path
    /// is recorded in `origin.branches` and `origin` is marked as a branch
    /// point of its own path.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPoint`] if `origin` is not alive.
    pub fn branch(&mut self, origin: PointId, finish: Vec3) -> GraphResult<PathId> {
        let origin_pos = self.position(origin)?;
        let id = self.new_path(origin_pos, finish);
        let start = self.path(id)?.start;
        self.attach(origin, start)?;

        let owner = {
            let point = self.point_mut(origin)?;
            point.branches.insert(id);
            point.path
        };
        if let Some(owner) = owner {
            self.path_mut(owner)?.branch_points.insert(origin);
        }
        Ok(id)
    }

    /// The point a branch path grows from, if `path` is a branch.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPath`] if the path is not alive.
    pub fn branch_origin(&self, path: PathId) -> GraphResult<Option<PointId>> {
        let start = self.path(path)?.start;
        for &candidate in &self.point(start)?.attached {
            if self.point(candidate)?.branches.contains(&path) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Inserts a new point between the consecutive points `a` and `b`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotAdjacent`] unless `a.next == b`.
    pub fn insert_between(&mut self, a: PointId, b: PointId, pos: Vec3) -> GraphResult<PointId> {
        let point_a = self.point(a)?;
        if point_a.next != Some(b) {
            return Err(GraphError::NotAdjacent { a, b });
        }
        let path = point_a.path.ok_or(GraphError::Detached(a))?;

        let id = self.new_point(pos);
        {
            let point = self.point_mut(id)?;
            point.path = Some(path);
            point.prev = Some(a);
            point.next = Some(b);
        }
        self.point_mut(a)?.next = Some(id);
        self.point_mut(b)?.prev = Some(id);
        self.path_mut(path)?.points.insert(id);
        Ok(id)
    }

    /// Inserts a new point so that it ends up at `index` in the path order.
    ///
    /// # Errors
    ///
    /// [`GraphError::IndexOutOfRange`] unless `1 <= index < len`.
    pub fn insert_at(&mut self, path: PathId, index: usize, pos: Vec3) -> GraphResult<PointId> {
        let order = self.all_points(path)?;
        if index == 0 || index >= order.len() {
            return Err(GraphError::IndexOutOfRange { index, len: order.len() });
        }
        self.insert_between(order[index - 1], order[index], pos)
    }

    /// Inserts a new point right before `p`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Endpoint`] if `p` is the start of its path.
    pub fn insert_before(&mut self, p: PointId, pos: Vec3) -> GraphResult<PointId> {
        let point = self.point(p)?;
        point.path.ok_or(GraphError::Detached(p))?;
        let prev = point.prev.ok_or(GraphError::Endpoint(p))?;
        self.insert_between(prev, p, pos)
    }

    /// Inserts a new point right after `p`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Endpoint`] if `p` is the finish of its path.
    pub fn insert_after(&mut self, p: PointId, pos: Vec3) -> GraphResult<PointId> {
        let point = self.point(p)?;
        point.path.ok_or(GraphError::Detached(p))?;
        let next = point.next.ok_or(GraphError::Endpoint(p))?;
        self.insert_between(p, next, pos)
    }

    /// Removes an intermediate point from its path and frees it.
    ///
    /// Branches rooted on the point are removed with it.
    ///
    /// # Errors
    ///
    /// [`GraphError::Endpoint`] for a start or finish point,
    /// [`GraphError::Detached`] for a point not on a path.
    pub fn remove(&mut self, p: PointId) -> GraphResult<()> {
        let point = self.point(p)?;
        let path_id = point.path.ok_or(GraphError::Detached(p))?;
        if self.path(path_id)?.is_endpoint(p) {
            return Err(GraphError::Endpoint(p));
        }
        let prev = point.prev.ok_or(GraphError::Corrupt(path_id))?;
        let next = point.next.ok_or(GraphError::Corrupt(path_id))?;

        self.point_mut(prev)?.next = Some(next);
        self.point_mut(next)?.prev = Some(prev);
        {
            let path = self.path_mut(path_id)?;
            path.points.remove(&p);
            path.branch_points.remove(&p);
        }
        {
            let point = self.point_mut(p)?;
            point.path = None;
            point.prev = None;
            point.next = None;
        }
        self.free_point(p)
    }

    /// Appends a new finish point; the old finish becomes intermediate.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPath`] if the path is not alive.
    pub fn extend(&mut self, path: PathId, pos: Vec3) -> GraphResult<PointId> {
        let finish = self.path(path)?.finish;
        let id = self.new_point(pos);
        {
            let point = self.point_mut(id)?;
            point.path = Some(path);
            point.prev = Some(finish);
        }
        self.point_mut(finish)?.next = Some(id);
        let path = self.path_mut(path)?;
        path.points.insert(id);
        path.finish = id;
        Ok(id)
    }

    /// Drops the finish point; its predecessor becomes the finish.
    ///
    /// # Errors
    ///
    /// [`GraphError::NoIntermediatePoints`] if only start and finish remain.
    pub fn shorten(&mut self, path_id: PathId) -> GraphResult<()> {
        let path = self.path(path_id)?;
        if path.count_intermediate() == 0 {
            return Err(GraphError::NoIntermediatePoints(path_id));
        }
        let old = path.finish;
        let prev = self.point(old)?.prev.ok_or(GraphError::Corrupt(path_id))?;

        self.point_mut(prev)?.next = None;
        {
            let path = self.path_mut(path_id)?;
            path.finish = prev;
            path.points.remove(&old);
            path.branch_points.remove(&old);
        }
        {
            let point = self.point_mut(old)?;
            point.path = None;
            point.prev = None;
        }
        self.free_point(old)
    }

    /// Splits the path at intermediate point `p`.
    ///
    /// `p` stays as the finish of the old path; a new point attached to `p`
    /// becomes the start of the returned path, which holds everything that
    /// came after `p`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NoIntermediatePoints`] for a two-point path,
    /// [`GraphError::Endpoint`] if `p` is the start or finish.
    pub fn split_at(&mut self, p: PointId) -> GraphResult<PathId> {
        let point = self.point(p)?;
        let old_id = point.path.ok_or(GraphError::Detached(p))?;
        let pos = point.pos;
        let old = self.path(old_id)?;
        if old.count_intermediate() == 0 {
            return Err(GraphError::NoIntermediatePoints(old_id));
        }
        if old.is_endpoint(p) {
            return Err(GraphError::Endpoint(p));
        }
        let old_finish = old.finish;

        let order = self.all_points(old_id)?;
        let index = order
            .iter()
            .position(|&q| q == p)
            .ok_or(GraphError::Corrupt(old_id))?;
        let tail: Vec<PointId> = order[index + 1..].to_vec();
        let first_tail = *tail.first().ok_or(GraphError::Corrupt(old_id))?;

        let new_id = self.alloc_path_id();
        let start = self.new_point(pos);

        let mut moved_branch_points = BTreeSet::new();
        {
            let old = self.path_mut(old_id)?;
            old.finish = p;
            for q in &tail {
                old.points.remove(q);
                if old.branch_points.remove(q) {
                    moved_branch_points.insert(*q);
                }
            }
        }
        for &q in &tail {
            self.point_mut(q)?.path = Some(new_id);
        }
        {
            let point = self.point_mut(start)?;
            point.path = Some(new_id);
            point.next = Some(first_tail);
        }
        self.point_mut(first_tail)?.prev = Some(start);
        self.point_mut(p)?.next = None;

        let mut points: BTreeSet<PointId> = tail.into_iter().collect();
        points.insert(start);
        self.paths.insert(
            new_id,
            Path {
                id: new_id,
                start,
                finish: old_finish,
                points,
                branch_points: moved_branch_points,
            },
        );
        self.attach(p, start)?;
        Ok(new_id)
    }

    /// Appends `second` to `first` and removes `second`.
    ///
    /// `second` must start where `first` finishes (attached or at the same
    /// position). Its start point is dropped, so `join` undoes `split_at`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotJoinable`] if the endpoints do not coincide.
    pub fn join(&mut self, first: PathId, second: PathId) -> GraphResult<()> {
        if first == second {
            return Err(GraphError::NotJoinable { first, second });
        }
        let finish = self.path(first)?.finish;
        let start = self.path(second)?.start;
        let finish_point = self.point(finish)?;
        let start_point = self.point(start)?;
        if !finish_point.attached.contains(&start)
            && !finish_point.pos.flat_eq(start_point.pos, JOIN_TOLERANCE)
        {
            return Err(GraphError::NotJoinable { first, second });
        }
        let after_start = start_point.next.ok_or(GraphError::Corrupt(second))?;

        if let Some(origin) = self.branch_origin(second)? {
            self.forget_branch(origin, second);
        }
        let absorbed = self.paths.remove(&second).ok_or(GraphError::UnknownPath(second))?;

        // Branches rooted on the dropped start move over to `finish`.
        let orphaned: Vec<PathId> = self.point(start)?.branches.iter().copied().collect();
        for branch in orphaned {
            let branch_start = self.path(branch)?.start;
            self.detach(start, branch_start)?;
            self.attach(finish, branch_start)?;
            self.point_mut(finish)?.branches.insert(branch);
            self.path_mut(first)?.branch_points.insert(finish);
        }
        {
            let point = self.point_mut(start)?;
            point.branches.clear();
            point.path = None;
            point.next = None;
        }
        self.free_point(start)?;

        for &q in &absorbed.points {
            if q != start {
                self.point_mut(q)?.path = Some(first);
            }
        }
        self.point_mut(finish)?.next = Some(after_start);
        self.point_mut(after_start)?.prev = Some(finish);

        let path = self.path_mut(first)?;
        path.points.extend(absorbed.points.iter().filter(|&&q| q != start));
        path.branch_points.extend(absorbed.branch_points.iter().filter(|&&q| q != start));
        path.finish = absorbed.finish;
        Ok(())
    }

    /// Removes a point from the arena.
    ///
    /// Path members go through [`Graph::remove`] (so endpoints are refused);
    /// free points are detached and freed directly.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::remove`] for path members.
    pub fn remove_point(&mut self, p: PointId) -> GraphResult<()> {
        if self.point(p)?.path.is_some() {
            self.remove(p)
        } else {
            self.free_point(p)
        }
    }

    /// Removes a path, all of its points, and every branch rooted on them.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPath`] if the path is not alive.
    pub fn remove_path(&mut self, path_id: PathId) -> GraphResult<()> {
        let origin = self.branch_origin(path_id)?;
        let path = self.paths.remove(&path_id).ok_or(GraphError::UnknownPath(path_id))?;
        if let Some(origin) = origin {
            self.forget_branch(origin, path_id);
        }
        for p in path.points {
            if let Some(point) = self.points.get_mut(&p) {
                point.path = None;
                point.prev = None;
                point.next = None;
            }
            self.free_point(p)?;
        }
        Ok(())
    }

    /// Points of `path` in order from start to finish.
    ///
    /// # Errors
    ///
    /// [`GraphError::Corrupt`] if the links do not form a chain covering
    /// exactly the member set.
    pub fn all_points(&self, path_id: PathId) -> GraphResult<Vec<PointId>> {
        let path = self.path(path_id)?;
        let expected = path.points.len();
        let mut order = Vec::with_capacity(expected);
        let mut current = path.start;
        loop {
            order.push(current);
            if current == path.finish {
                break;
            }
            if order.len() >= expected {
                return Err(GraphError::Corrupt(path_id));
            }
            current = self.point(current)?.next.ok_or(GraphError::Corrupt(path_id))?;
        }
        if order.len() != expected {
            return Err(GraphError::Corrupt(path_id));
        }
        Ok(order)
    }

    /// Points strictly between start and finish, in order.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn intermediate_points(&self, path_id: PathId) -> GraphResult<Vec<PointId>> {
        let mut order = self.all_points(path_id)?;
        order.pop();
        order.remove(0);
        Ok(order)
    }

    /// Number of points strictly between start and finish.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownPath`] if the path is not alive.
    pub fn count_intermediate(&self, path_id: PathId) -> GraphResult<usize> {
        Ok(self.path(path_id)?.count_intermediate())
    }

    /// Positions of `path` in order.
    ///
    /// # Errors
    ///
    /// Same as [`Graph::all_points`].
    pub fn positions(&self, path_id: PathId) -> GraphResult<Vec<Vec3>> {
        self.all_points(path_id)?
            .into_iter()
            .map(|p| self.position(p))
            .collect()
    }

    fn forget_branch(&mut self, origin: PointId, path_id: PathId) {
        let Some(point) = self.points.get_mut(&origin) else {
            return;
        };
        point.branches.remove(&path_id);
        if point.branches.is_empty() {
            if let Some(owner) = point.path {
                if let Some(path) = self.paths.get_mut(&owner) {
                    path.branch_points.remove(&origin);
                }
            }
        }
    }

    /// Frees a point that has already been unlinked from any path.
    fn free_point(&mut self, p: PointId) -> GraphResult<()> {
        let Some(point) = self.points.remove(&p) else {
            return Ok(());
        };
        for other in &point.attached {
            if let Some(other) = self.points.get_mut(other) {
                other.attached.remove(&p);
            }
        }
        for branch in point.branches {
            if self.paths.contains_key(&branch) {
                self.remove_path(branch)?;
            }
        }
        Ok(())
    }
}
