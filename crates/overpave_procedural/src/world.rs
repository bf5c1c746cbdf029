//! # Road Generator
//!
//! Entry point for a host engine: ask for the canvas of any region, get
//! it back complete.
//!
//! ```text
//! canvas(region)
//!   complete?  -> cached canvas
//!   otherwise  -> Megacanvas::generate(layout, recursion_level)
//! ```
//!
//! Regions may be requested in any order and any number of times, and a
//! canvas evicted in between comes back byte for byte. A complete canvas is
//! never drawn into again.

use tracing::{debug, info};

use overpave_core::{Graph, Vec3};

use crate::canvas::Canvas;
use crate::config::GeneratorConfig;
use crate::error::{GenError, GenResult};
use crate::megacanvas::{CanvasStore, Megacanvas};
use crate::region_store::RegionStore;
use crate::roads::{LayoutStats, RoadLayout};
use crate::seed::WorldSeed;
use crate::terrain::{blit_tile, TerrainSink};
use crate::units::{RegionCoord, Units};

/// Generates and caches road canvases for a world.
#[derive(Debug)]
pub struct RoadGenerator {
    config: GeneratorConfig,
    units: Units,
    canvases: CanvasStore,
    layout: RoadLayout,
}

impl RoadGenerator {
    /// Creates a generator for `seed`.
    ///
    /// # Errors
    ///
    /// [`GenError::Config`] if `config` does not validate.
    pub fn new(seed: WorldSeed, config: GeneratorConfig) -> GenResult<Self> {
        let layout = RoadLayout::new(seed, config.clone())?;
        let units = config.units()?;
        let canvases = RegionStore::new("canvas", config.max_cached_regions)?;
        info!(
            seed = seed.value(),
            tile_size = units.tile_size(),
            region_tiles = units.region_tiles(),
            cached_regions = config.max_cached_regions,
            "road generator ready"
        );
        Ok(Self {
            config,
            units,
            canvases,
            layout,
        })
    }

    /// Complete canvas of the region containing `pos`.
    ///
    /// # Errors
    ///
    /// See [`RoadGenerator::canvas`].
    pub fn canvas_for(&mut self, pos: Vec3) -> GenResult<&Canvas> {
        self.canvas(self.units.region_of(pos))
    }

    /// Complete canvas of `region`, generating it and its neighbors first
    /// if needed.
    ///
    /// # Errors
    ///
    /// Propagates generation errors. [`GenError::RegionMissing`] if the
    /// canvas was evicted before it could be completed, which a validated
    /// cache size rules out.
    pub fn canvas(&mut self, region: RegionCoord) -> GenResult<&Canvas> {
        if !self.canvases.is_complete(region) {
            debug!(%region, "canvas requested");
            Megacanvas::new(&mut self.canvases, self.units, region)?.generate(
                &mut self.canvases,
                &mut self.layout,
                self.config.recursion_level,
            )?;
        }
        self.canvases
            .get(region)
            .filter(|entry| entry.complete)
            .map(|entry| &entry.value)
            .ok_or(GenError::RegionMissing(region))
    }

    /// Returns true if `region` has a complete canvas cached.
    #[must_use]
    pub fn is_complete(&self, region: RegionCoord) -> bool {
        self.canvases.is_complete(region)
    }

    /// Generator runs so far, one per region laid out or redrawn.
    #[must_use]
    pub const fn generator_runs(&self) -> u64 {
        self.layout.runs()
    }

    /// Layout counters over every run.
    #[must_use]
    pub const fn stats(&self) -> LayoutStats {
        self.layout.stats()
    }

    /// Writes the roads of the tile containing `tile_pos` into `sink` at
    /// the configured ground level. Returns the number of nodes written.
    ///
    /// # Errors
    ///
    /// See [`RoadGenerator::canvas`].
    pub fn paint_tile<S>(&mut self, tile_pos: Vec3, sink: &mut S) -> GenResult<usize>
    where
        S: TerrainSink + ?Sized,
    {
        let tile_min = self.units.tile_origin(tile_pos);
        let (tile_size, ground) = (self.units.tile_size(), self.config.ground_level);
        let canvas = self.canvas_for(tile_pos)?;
        Ok(blit_tile(canvas, tile_min, tile_size, ground, sink))
    }

    /// Unit system.
    #[must_use]
    pub const fn units(&self) -> Units {
        self.units
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The road graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        self.layout.graph()
    }

    /// The road planner.
    #[must_use]
    pub const fn layout(&self) -> &RoadLayout {
        &self.layout
    }
}
