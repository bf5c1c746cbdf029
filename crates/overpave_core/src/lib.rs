//! # OVERPAVE Core
//!
//! The world-agnostic building blocks of the road network generator.
//!
//! ## Core Components
//!
//! - `geometry`: 3D positions with planar collision math
//! - `graph`: arena of points and paths with branching and attachment
//! - `cache`: least-recently-used bounded cache with eviction callback
//!
//! ## Example
//!
//! ```rust
//! use overpave_core::{Graph, Vec3};
//!
//! let mut graph = Graph::new();
//! let road = graph.new_path(Vec3::new(0.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0));
//! graph.subdivide(road, 25.0).unwrap();
//! assert_eq!(graph.count_intermediate(road).unwrap(), 3);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod geometry;
pub mod graph;

pub use cache::{BoundedCache, CacheError};
pub use geometry::{
    angle_between, grid_line_crossing, grid_line_crossings, is_parallel, point_segment_distance,
    segment_intersects, turn_angle, Axis, SegmentHit, Vec3, EPSILON,
};
pub use graph::{Graph, GraphError, GraphResult, Path, PathCrossing, PathHit, PathId, Point, PointHit, PointId};
