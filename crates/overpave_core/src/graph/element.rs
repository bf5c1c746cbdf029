//! Points, paths and their identifiers.

use std::collections::BTreeSet;
use std::fmt;

use crate::geometry::Vec3;

/// Unique identifier of a point.
///
/// Ids are handed out monotonically by the owning [`Graph`](super::Graph)
/// and never reused, so sorting by id is a reproducible tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PointId(pub(crate) u64);

impl PointId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Unique identifier of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PathId(pub(crate) u64);

impl PathId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A positioned node, optionally linked into a path.
#[derive(Clone, Debug)]
pub struct Point {
    /// This point's id.
    pub id: PointId,
    /// Position (y is up).
    pub pos: Vec3,
    /// Predecessor on the owning path.
    pub prev: Option<PointId>,
    /// Successor on the owning path.
    pub next: Option<PointId>,
    /// Points sharing this position. Symmetric, non-owning.
    pub attached: BTreeSet<PointId>,
    /// Paths whose start is attached here. Owned by this point.
    pub branches: BTreeSet<PathId>,
    /// The path this point belongs to, if any.
    pub path: Option<PathId>,
}

impl Point {
    pub(crate) fn new(id: PointId, pos: Vec3) -> Self {
        Self {
            id,
            pos,
            prev: None,
            next: None,
            attached: BTreeSet::new(),
            branches: BTreeSet::new(),
            path: None,
        }
    }
}

/// An ordered chain of points from `start` to `finish`.
#[derive(Clone, Debug)]
pub struct Path {
    /// This path's id.
    pub id: PathId,
    /// First point.
    pub start: PointId,
    /// Last point.
    pub finish: PointId,
    /// Every member point, endpoints included.
    pub points: BTreeSet<PointId>,
    /// Members that have at least one branch rooted on them.
    pub branch_points: BTreeSet<PointId>,
}

impl Path {
    /// Number of member points, endpoints included.
    #[inline]
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of points strictly between start and finish.
    #[inline]
    #[must_use]
    pub fn count_intermediate(&self) -> usize {
        self.points.len().saturating_sub(2)
    }

    /// Returns true if `point` is the start or the finish.
    #[inline]
    #[must_use]
    pub fn is_endpoint(&self, point: PointId) -> bool {
        point == self.start || point == self.finish
    }
}
