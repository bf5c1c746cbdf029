//! # Roads
//!
//! Road planning on top of the megacanvas and megapathpaver.
//!
//! - `border`: edge points both neighbors agree on
//! - `tier`: the road hierarchy and its brushes
//! - `layout`: the region generator and its memory
//! - `paving`: placement of main roads and streets within one run

pub mod border;
pub mod layout;
mod paving;
pub mod tier;

pub use border::{border_connections, border_point, main_road_positions, pair_endpoints, Edge, RegionEdges, Side};
pub use layout::{LayoutStats, RegionMeta, Rejection, RoadLayout};
pub use tier::Tier;
