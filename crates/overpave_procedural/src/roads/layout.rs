//! # Road Layout
//!
//! The region generator that plans roads. It owns the shared point/path
//! graph and the pathpaver store, and hands each planning run to a
//! short-lived `Paving` context.
//!
//! ## Plans
//!
//! A region's plan depends only on the world seed and the region. The
//! center pathpaver carries a [`RegionMeta`] listing the paths the region
//! owns. A run draws the plan from memory when it has one and plans first
//! otherwise; either way the same cells come out. When a pathpaver is
//! evicted, the paths it owns are removed from the graph, and planning the
//! region again rebuilds them identically.
//!
//! ## Junctions
//!
//! Neighbors never see each other's paths while planning. Once a region is
//! planned, each of its path ends that sits exactly on an end of a
//! neighbor's path (shared main-road endpoints, border connections) is
//! attached to it, so the graph stays connected across borders whichever
//! side was planned first.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use overpave_core::{Graph, PathId, PointId, Vec3};
use tracing::{debug, trace, warn};

use super::paving::{draw_path, Paving};
use super::tier::Tier;
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::megacanvas::{Megacanvas, RegionGenerator};
use crate::megapathpaver::{Megapathpaver, PaverStore};
use crate::pathpaver::Pathpaver;
use crate::region_store::{Evicted, RegionStore};
use crate::seed::WorldSeed;
use crate::shape::ShapeCache;
use crate::units::{RegionCoord, Units};

/// Why a candidate street was not created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rejection {
    /// Shorter than the minimum after border adjustment.
    TooShort(f64),
    /// Runs alongside an existing path for this fraction of its length.
    Parallel(f64),
    /// Too short once cut back before a parallel path.
    OverlapCut(f64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(length) => write!(f, "too short ({length:.1})"),
            Self::Parallel(fraction) => write!(f, "parallel over {:.0}%", fraction * 100.0),
            Self::OverlapCut(length) => write!(f, "too short after overlap cut ({length:.1})"),
        }
    }
}

/// Counters of the layout work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Regions planned.
    pub regions: usize,
    /// Main roads laid.
    pub roads: usize,
    /// Streets placed.
    pub streets: usize,
    /// Streets rejected as too short.
    pub rejected_short: usize,
    /// Streets rejected for running alongside another path.
    pub rejected_parallel: usize,
    /// Streets rejected after an overlap cut.
    pub rejected_overlap: usize,
    /// Streets ending on a border connection point.
    pub snapped: usize,
    /// Streets ending on another path.
    pub merged: usize,
    /// Intersections recorded.
    pub intersections: usize,
    /// Path ends joined to a neighbor's path, counted by whichever side
    /// was planned second.
    pub stitched: usize,
    /// Paths drawn again from memory.
    pub redrawn: usize,
    /// Paths dropped with an evicted pathpaver.
    pub removed_paths: usize,
}

impl LayoutStats {
    /// Streets rejected for any reason.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.rejected_short + self.rejected_parallel + self.rejected_overlap
    }

    pub(crate) fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::TooShort(_) => self.rejected_short += 1,
            Rejection::Parallel(_) => self.rejected_parallel += 1,
            Rejection::OverlapCut(_) => self.rejected_overlap += 1,
        }
    }
}

impl AddAssign for LayoutStats {
    fn add_assign(&mut self, rhs: Self) {
        self.regions += rhs.regions;
        self.roads += rhs.roads;
        self.streets += rhs.streets;
        self.rejected_short += rhs.rejected_short;
        self.rejected_parallel += rhs.rejected_parallel;
        self.rejected_overlap += rhs.rejected_overlap;
        self.snapped += rhs.snapped;
        self.merged += rhs.merged;
        self.intersections += rhs.intersections;
        self.stitched += rhs.stitched;
        self.redrawn += rhs.redrawn;
        self.removed_paths += rhs.removed_paths;
    }
}

/// What a planned region remembers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionMeta {
    /// Counters of the region's own run.
    pub stats: LayoutStats,
    /// Paths the region planned, in planning order.
    pub owned: Vec<(PathId, Tier)>,
}

/// Road-planning region generator.
#[derive(Debug)]
pub struct RoadLayout {
    seed: WorldSeed,
    config: GeneratorConfig,
    units: Units,
    graph: Graph,
    pavers: PaverStore<RegionMeta>,
    shapes: ShapeCache,
    junctions: BTreeMap<(i64, i64), Vec<(RegionCoord, PointId)>>,
    stats: LayoutStats,
    runs: u64,
}

fn junction_key(pos: Vec3) -> (i64, i64) {
    (pos.x.round() as i64, pos.z.round() as i64)
}

impl RoadLayout {
    /// Creates a layout with an empty graph.
    ///
    /// # Errors
    ///
    /// [`crate::GenError::Config`] if `config` does not validate.
    pub fn new(seed: WorldSeed, config: GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        let units = config.units()?;
        let pavers = RegionStore::new("pathpaver", config.max_cached_regions)?;
        Ok(Self {
            seed,
            config,
            units,
            graph: Graph::new(),
            pavers,
            shapes: ShapeCache::new(),
            junctions: BTreeMap::new(),
            stats: LayoutStats::default(),
            runs: 0,
        })
    }

    /// The world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The road graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Totals over every run.
    #[must_use]
    pub const fn stats(&self) -> LayoutStats {
        self.stats
    }

    /// Number of generator runs, redraws included.
    #[must_use]
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    /// Memory of a planned region, if its pathpaver is cached.
    #[must_use]
    pub fn region_meta(&self, region: RegionCoord) -> Option<&RegionMeta> {
        self.pavers
            .peek(region)
            .filter(|entry| entry.partial)
            .map(|entry| &entry.meta)
    }

    /// Counters of one planned region.
    #[must_use]
    pub fn region_stats(&self, region: RegionCoord) -> Option<LayoutStats> {
        self.region_meta(region).map(|meta| meta.stats)
    }

    fn lay_out(&mut self, paver: &mut Megapathpaver<RegionMeta>, canvas: &mut Megacanvas) -> GenResult<()> {
        let center = canvas.center();
        let pruned = paver.prune(&self.graph);
        if pruned > 0 {
            trace!(%center, pruned, "dropped collected ids");
        }

        if paver.is_center_partial() {
            let redrawn = self.draw(canvas, &paver.center_meta().owned)?;
            paver.center_meta_mut().stats.redrawn += redrawn;
            self.stats.redrawn += redrawn;
            debug!(%center, redrawn, "region redrawn from memory");
            return Ok(());
        }

        let mut paving = Paving::new(&mut self.graph, paver, &self.config, self.seed, self.units);
        paving.run()?;
        let mut meta = paving.finish();
        meta.stats.regions = 1;
        meta.stats.stitched = self.stitch(center, &meta.owned)?;
        self.draw(canvas, &meta.owned)?;

        debug!(
            %center,
            roads = meta.stats.roads,
            streets = meta.stats.streets,
            rejected = meta.stats.rejected(),
            stitched = meta.stats.stitched,
            "region laid out"
        );
        self.stats += meta.stats;
        *paver.center_meta_mut() = meta;
        paver.mark_center_partial();
        Ok(())
    }

    /// Draws a plan. Returns the number of paths drawn.
    fn draw(&mut self, canvas: &mut Megacanvas, owned: &[(PathId, Tier)]) -> GenResult<usize> {
        let mut drawn = 0;
        for &(path, tier) in owned {
            if self.graph.contains_path(path) {
                draw_path(&self.graph, canvas, &mut self.shapes, path, tier, self.config.draw_markers)?;
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    /// Attaches the path ends of `region` to path ends of other regions at
    /// the same position. Returns the number of attachments made.
    fn stitch(&mut self, region: RegionCoord, owned: &[(PathId, Tier)]) -> GenResult<usize> {
        let mut stitched = 0;
        for &(path, _) in owned {
            let ends = {
                let path = self.graph.path(path)?;
                [path.start, path.finish]
            };
            for end in ends {
                let pos = self.graph.position(end)?;
                let known = self.junctions.entry(junction_key(pos)).or_default();
                let others: Vec<PointId> = known
                    .iter()
                    .filter(|(owner, _)| *owner != region)
                    .map(|&(_, point)| point)
                    .collect();
                known.push((region, end));

                for other in others {
                    if !self.graph.contains_point(other) || self.graph.position(other)? != pos {
                        continue;
                    }
                    if self.graph.attachment_closure(other)?.contains(&end) {
                        continue;
                    }
                    self.graph.attach(other, end)?;
                    stitched += 1;
                }
            }
        }
        Ok(stitched)
    }

    /// Drops the paths owned by evicted pathpavers.
    fn collect(&mut self, evicted: Vec<Evicted<Pathpaver, RegionMeta>>) {
        if evicted.is_empty() {
            return;
        }
        for (region, entry) in evicted {
            let mut removed = 0;
            for (path, _) in entry.meta.owned {
                if !self.graph.contains_path(path) {
                    continue;
                }
                match self.graph.remove_path(path) {
                    Ok(()) => removed += 1,
                    Err(error) => warn!(%region, %path, %error, "cannot remove evicted path"),
                }
            }
            self.stats.removed_paths += removed;
            debug!(%region, removed, "pathpaver evicted");
        }
        let graph = &self.graph;
        self.junctions.retain(|_, ends| {
            ends.retain(|&(_, point)| graph.contains_point(point));
            !ends.is_empty()
        });
    }
}

impl RegionGenerator for RoadLayout {
    fn generate_region(&mut self, canvas: &mut Megacanvas) -> GenResult<()> {
        let mut paver = Megapathpaver::new(&mut self.pavers, self.units, canvas.center())?;
        let result = self.lay_out(&mut paver, canvas);
        let evicted = paver.release(&mut self.pavers);
        self.collect(evicted);
        result?;
        self.runs += 1;
        Ok(())
    }

    fn region_completed(&mut self, region: RegionCoord) -> GenResult<()> {
        self.pavers.mark_complete(region);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::megacanvas::CanvasStore;
    use crate::roads::border::{border_point, Edge, Side};

    fn layout(max_cached_regions: usize) -> RoadLayout {
        let config = GeneratorConfig {
            max_cached_regions,
            ..GeneratorConfig::default()
        };
        RoadLayout::new(WorldSeed::new(42), config).unwrap()
    }

    fn plan(layout: &mut RoadLayout, canvases: &mut CanvasStore, region: RegionCoord) {
        let units = layout.units;
        Megacanvas::new(canvases, units, region)
            .unwrap()
            .generate(canvases, layout, 0)
            .unwrap();
    }

    fn endpoints(layout: &RoadLayout, region: RegionCoord) -> Vec<overpave_core::Vec3> {
        let meta = layout.region_meta(region).unwrap();
        let mut out = Vec::new();
        for &(path, tier) in &meta.owned {
            if tier == Tier::Main {
                let positions = layout.graph().positions(path).unwrap();
                out.push(positions[0]);
                out.push(positions[positions.len() - 1]);
            }
        }
        out
    }

    fn plan_shape(layout: &RoadLayout, region: RegionCoord) -> Vec<(Tier, Vec<Vec3>)> {
        let meta = layout.region_meta(region).unwrap();
        meta.owned
            .iter()
            .map(|&(path, tier)| (tier, layout.graph().positions(path).unwrap()))
            .collect()
    }

    #[test]
    fn test_region_gets_two_main_roads() {
        let mut layout = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        let region = RegionCoord::new(0, 0);
        plan(&mut layout, &mut canvases, region);

        let stats = layout.region_stats(region).unwrap();
        assert_eq!(stats.roads, 2);
        assert_eq!(stats.regions, 1);
        assert_eq!(layout.runs(), 1);
        assert!(layout.graph().path_count() >= 2);

        let canvas = &canvases.peek(region).unwrap().value;
        assert!(canvas.count(Material::Asphalt) > 0);
        assert!(canvas.count(Material::Margin) > 0);
    }

    #[test]
    fn test_neighbors_share_main_road_endpoints() {
        let mut layout = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        let west = RegionCoord::new(3, -1);
        let east = west.offset(1, 0);
        plan(&mut layout, &mut canvases, west);
        plan(&mut layout, &mut canvases, east);

        let units = layout.units;
        let edge = Edge::of(units, west, Side::East, 0);
        let shared = border_point(layout.seed(), &edge, layout.config.corner_margin);
        let tolerance = layout.config.vertex_snap + 1e-6;
        for region in [west, east] {
            assert!(
                endpoints(&layout, region).iter().any(|p| p.flat_eq(shared, tolerance)),
                "{region} has no main road ending at {shared:?}"
            );
        }
        assert!(layout.region_stats(west).unwrap().stitched == 0);
        assert!(layout.region_stats(east).unwrap().stitched >= 1);
    }

    #[test]
    fn test_plan_ignores_neighbors_planned_first() {
        let region = RegionCoord::new(4, 4);

        let mut alone = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        plan(&mut alone, &mut canvases, region);
        let alone_canvas = canvases.peek(region).unwrap().value.to_compressed();

        let mut after = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        plan(&mut after, &mut canvases, region.offset(-1, 0));
        plan(&mut after, &mut canvases, region.offset(0, 1));
        let mut fresh: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        plan(&mut after, &mut fresh, region);

        assert_eq!(plan_shape(&alone, region), plan_shape(&after, region));
        let (a, b) = (alone.region_stats(region).unwrap(), after.region_stats(region).unwrap());
        assert_eq!((a.streets, a.rejected(), a.intersections), (b.streets, b.rejected(), b.intersections));
        assert_eq!(fresh.peek(region).unwrap().value.to_compressed(), alone_canvas);
    }

    #[test]
    fn test_replanning_after_eviction_is_identical() {
        let mut layout = layout(25);
        let region = RegionCoord::new(0, 0);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 100).unwrap();
        plan(&mut layout, &mut canvases, region);
        let first = plan_shape(&layout, region);

        plan(&mut layout, &mut canvases, RegionCoord::new(10, 0));
        plan(&mut layout, &mut canvases, RegionCoord::new(20, 0));
        assert!(layout.region_meta(region).is_none());

        let mut fresh: CanvasStore = RegionStore::new("canvas", 100).unwrap();
        plan(&mut layout, &mut fresh, region);
        assert_eq!(plan_shape(&layout, region), first);
        assert_eq!(
            fresh.peek(region).unwrap().value.to_compressed(),
            canvases.peek(region).unwrap().value.to_compressed()
        );
    }

    #[test]
    fn test_streets_stay_in_their_region() {
        let mut layout = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        let region = RegionCoord::new(-2, 5);
        plan(&mut layout, &mut canvases, region);

        let units = layout.units;
        let core = crate::pathpaver::Bounds::of_region(units, region, layout.config.vertex_snap);
        let meta = layout.region_meta(region).unwrap().clone();
        for (path, _) in meta.owned {
            for pos in layout.graph().positions(path).unwrap() {
                assert!(core.contains(pos), "{path} leaves the region at {pos:?}");
            }
        }
    }

    #[test]
    fn test_evicted_pathpavers_drop_their_paths() {
        let mut layout = layout(25);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 100).unwrap();
        let first = RegionCoord::new(0, 0);
        plan(&mut layout, &mut canvases, first);
        let owned: Vec<PathId> = layout.region_meta(first).unwrap().owned.iter().map(|&(p, _)| p).collect();
        assert!(!owned.is_empty());

        plan(&mut layout, &mut canvases, RegionCoord::new(10, 0));
        plan(&mut layout, &mut canvases, RegionCoord::new(20, 0));

        assert!(layout.region_meta(first).is_none());
        assert!(owned.iter().all(|&p| !layout.graph().contains_path(p)));
        assert!(layout.stats().removed_paths >= owned.len().min(2));
    }

    #[test]
    fn test_evicted_canvas_is_redrawn_from_memory() {
        let mut layout = layout(64);
        let mut canvases: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        let region = RegionCoord::new(1, 1);
        plan(&mut layout, &mut canvases, region);
        let paths = layout.graph().path_count();

        // Fresh canvas store stands in for an evicted canvas
        let mut fresh: CanvasStore = RegionStore::new("canvas", 64).unwrap();
        plan(&mut layout, &mut fresh, region);

        assert_eq!(layout.graph().path_count(), paths);
        assert_eq!(layout.region_stats(region).unwrap().redrawn, layout.region_meta(region).unwrap().owned.len());
        assert_eq!(layout.runs(), 2);
        assert!(fresh.peek(region).unwrap().value.count(Material::Asphalt) > 0);
        assert_eq!(
            fresh.peek(region).unwrap().value.to_compressed(),
            canvases.peek(region).unwrap().value.to_compressed()
        );
    }
}
