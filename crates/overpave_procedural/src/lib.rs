//! # OVERPAVE Procedural
//!
//! Deterministic road networks, generated one region at a time.
//!
//! ## Core Principle
//!
//! **Same seed = same roads, ALWAYS.**
//!
//! Regions can be requested in any order. Every random choice is keyed by
//! the world seed and absolute coordinates, so two neighbors that are
//! generated independently agree on everything they share: the points on
//! their common edge, and every road that spills across it.
//!
//! ## Components
//!
//! - `canvas` / `megacanvas`: material rasters and the 3x3 overgeneration
//!   window
//! - `pathpaver` / `megapathpaver`: per-region collision indexes
//! - `roads`: main roads and recursively branching streets
//! - `world`: the [`RoadGenerator`] entry point
//! - `terrain`: copying finished canvases into a host terrain
//!
//! ## Example
//!
//! ```rust,no_run
//! use overpave_procedural::{GeneratorConfig, RegionCoord, RoadGenerator, WorldSeed};
//!
//! let mut generator = RoadGenerator::new(WorldSeed::new(12345), GeneratorConfig::default()).unwrap();
//! let canvas = generator.canvas(RegionCoord::new(0, 0)).unwrap();
//! println!("{} asphalt cells", canvas.count(overpave_procedural::Material::Asphalt));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod canvas;
pub mod config;
pub mod error;
pub mod material;
pub mod megacanvas;
pub mod megapathpaver;
pub mod neighborhood;
pub mod pathpaver;
pub mod region_store;
pub mod roads;
pub mod seed;
pub mod shape;
pub mod terrain;
pub mod units;
pub mod world;

pub use canvas::{Canvas, Cell, Surface};
pub use config::{GeneratorConfig, StreetTiers, TierConfig};
pub use error::{ConfigError, GenError, GenResult};
pub use material::{Material, MARKER_THRESHOLD};
pub use megacanvas::{CanvasStore, Megacanvas, RegionGenerator};
pub use megapathpaver::{Megapathpaver, PaverStore};
pub use neighborhood::{Neighborhood, RegionMap};
pub use pathpaver::{Bounds, Pathpaver};
pub use region_store::{RegionEntry, RegionStore};
pub use roads::{border_connections, border_point, Edge, LayoutStats, Rejection, RoadLayout, Side, Tier};
pub use seed::WorldSeed;
pub use shape::{Shape, ShapeCache};
pub use terrain::{blit_tile, TerrainSink};
pub use units::{RegionCoord, Units};
pub use world::RoadGenerator;
