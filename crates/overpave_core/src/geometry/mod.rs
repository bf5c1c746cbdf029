//! # Geometry
//!
//! 3D positions with planar (horizontal) collision math.
//!
//! ## Conventions
//!
//! - `y` is up; collision and spacing only look at `x` and `z`
//! - Parallel and zero-length segments never divide by a near-zero
//!   determinant
//! - A hit within a margin is reported separately from a true crossing

mod planar;
mod vec3;

pub use planar::{
    angle_between, grid_line_crossing, grid_line_crossings, is_parallel, point_segment_distance,
    segment_intersects, turn_angle, Axis, SegmentHit, EPSILON,
};
pub use vec3::Vec3;
