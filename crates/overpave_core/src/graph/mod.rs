//! # Point/Path Graph
//!
//! A mutable, doubly-linked model of road geometry.
//!
//! ## Model
//!
//! - A **point** has a position, optional `prev`/`next` links and belongs
//!   to at most one path
//! - A **path** is the chain `start -> ... -> finish`; both endpoints always
//!   exist, only intermediate points can be removed or split at
//! - **Attachment** makes points share a position (moving one moves all)
//! - A **branch** is a path whose start is attached to a point of another
//!   path; the origin point owns it
//!
//! ## Storage
//!
//! Everything lives in a [`Graph`] arena keyed by monotonic ids. Relations
//! are id sets, and removal explicitly clears every relation referencing
//! the removed id.

mod arena;
mod element;
mod error;
mod query;

pub use arena::Graph;
pub use element::{Path, PathId, Point, PointId};
pub use error::{GraphError, GraphResult};
pub use query::{PathCrossing, PathHit, PointHit};
