//! # Graph Error Types
//!
//! Every variant is a broken caller contract, not a runtime condition.

use thiserror::Error;

use super::element::{PathId, PointId};

/// Errors raised by point/path graph operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The point id does not exist in the arena (never created or removed).
    #[error("unknown point: {0}")]
    UnknownPoint(PointId),

    /// The path id does not exist in the arena.
    #[error("unknown path: {0}")]
    UnknownPath(PathId),

    /// The point does not belong to any path.
    #[error("point {0} is not on a path")]
    Detached(PointId),

    /// The point belongs to a different path than the one named.
    #[error("point {point} is not on path {path}")]
    NotOnPath {
        /// The offending point.
        point: PointId,
        /// The path it was expected on.
        path: PathId,
    },

    /// Two points were expected to share a path.
    #[error("points {a} and {b} are on different paths")]
    DifferentPaths {
        /// First point.
        a: PointId,
        /// Second point.
        b: PointId,
    },

    /// Two points were expected to be consecutive (`a.next == b`).
    #[error("points {a} and {b} are not adjacent")]
    NotAdjacent {
        /// Expected predecessor.
        a: PointId,
        /// Expected successor.
        b: PointId,
    },

    /// Start and finish points cannot be removed, split at, or transferred.
    #[error("point {0} is the start or finish of its path")]
    Endpoint(PointId),

    /// The operation needs at least one intermediate point.
    #[error("path {0} has no intermediate points")]
    NoIntermediatePoints(PathId),

    /// Insert position outside `1..=len-1`.
    #[error("insert index {index} out of range for path of {len} points")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current point count.
        len: usize,
    },

    /// A point cannot be attached to itself.
    #[error("point {0} cannot be attached to itself")]
    SelfAttachment(PointId),

    /// Subdivision needs a positive, finite segment length.
    #[error("invalid segment length: {0}")]
    InvalidLength(f64),

    /// `join` needs the second path to start where the first finishes.
    #[error("path {second} does not start where path {first} finishes")]
    NotJoinable {
        /// Path that would be extended.
        first: PathId,
        /// Path that would be absorbed.
        second: PathId,
    },

    /// A path needs at least a start and a finish.
    #[error("a path needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Walking `next` from start did not reach finish in `len - 1` steps.
    #[error("path {0} is corrupt: start does not reach finish")]
    Corrupt(PathId),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
