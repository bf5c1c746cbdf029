//! Street placement for one region.
//!
//! A [`Paving`] lives for exactly one planning run. It lays the main roads,
//! grows the street tiers off them and records every intersection in the
//! graph. It never looks at paths other regions laid out, and it draws
//! nothing: the caller draws the finished plan, so a plan drawn from memory
//! later produces the same cells.

use std::collections::BTreeSet;

use overpave_core::{point_segment_distance, Graph, PathId, PointId, Vec3};
use rand::Rng;
use tracing::debug;

use super::border::{main_road_positions, nearest_within, pair_endpoints, RegionEdges};
use super::layout::{LayoutStats, RegionMeta, Rejection};
use super::tier::Tier;
use crate::canvas::Surface;
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::material::Material;
use crate::megacanvas::Megacanvas;
use crate::megapathpaver::Megapathpaver;
use crate::pathpaver::Bounds;
use crate::seed::{salt, WorldSeed};
use crate::shape::ShapeCache;
use crate::units::{RegionCoord, Units};

/// Distance under which a crossing is taken to lie on a segment.
const ON_SEGMENT: f64 = 1e-3;

/// Draws `path` with the brushes of `tier`, plus vertex markers.
///
/// # Errors
///
/// Propagates graph errors for a dead or corrupt path.
pub(crate) fn draw_path(
    graph: &Graph,
    canvas: &mut Megacanvas,
    shapes: &mut ShapeCache,
    path: PathId,
    tier: Tier,
    markers: bool,
) -> GenResult<()> {
    let positions = graph.positions(path)?;
    let mut last: Option<(i32, i32)> = None;
    for pair in positions.windows(2) {
        let steps = (pair[0].flat_distance(pair[1]).ceil() as usize).max(1);
        for i in 0..=steps {
            let at = pair[0].lerp(pair[1], i as f64 / steps as f64);
            let node = (at.x.round() as i32, at.z.round() as i32);
            if last == Some(node) {
                continue;
            }
            last = Some(node);
            if !canvas.set_cursor_absolute(node.0, node.1) {
                continue;
            }
            for &(radius, material) in tier.brushes() {
                canvas.draw_circle(shapes, radius, material);
            }
        }
    }

    if markers {
        for (i, at) in positions.iter().enumerate() {
            let marker = if i == 0 { Material::Origin } else { Material::Midpoint };
            if canvas.set_cursor_absolute(at.x.round() as i32, at.z.round() as i32) {
                canvas.write_cell(0, 0, marker);
            }
        }
    }
    Ok(())
}

/// Per-run street placement context.
pub(crate) struct Paving<'a> {
    graph: &'a mut Graph,
    paver: &'a mut Megapathpaver<RegionMeta>,
    config: &'a GeneratorConfig,
    seed: WorldSeed,
    region: RegionCoord,
    edges: RegionEdges,
    core: Bounds,
    stats: LayoutStats,
    owned: Vec<(PathId, Tier)>,
}

impl<'a> Paving<'a> {
    pub(crate) fn new(
        graph: &'a mut Graph,
        paver: &'a mut Megapathpaver<RegionMeta>,
        config: &'a GeneratorConfig,
        seed: WorldSeed,
        units: Units,
    ) -> Self {
        let region = paver.center();
        let edges = RegionEdges::new(seed, units, region, config);
        let core = paver.center_paver().core();
        Self {
            graph,
            paver,
            config,
            seed,
            region,
            edges,
            core,
            stats: LayoutStats::default(),
            owned: Vec::new(),
        }
    }

    /// Statistics and owned paths of the run.
    pub(crate) fn finish(self) -> RegionMeta {
        RegionMeta {
            stats: self.stats,
            owned: self.owned,
        }
    }

    /// Lays main roads and grows streets off them.
    pub(crate) fn run(&mut self) -> GenResult<()> {
        let endpoints = self.edges.main_endpoints(self.seed, self.config.corner_margin);
        let mut mains = Vec::with_capacity(2);
        for (a, b) in pair_endpoints(self.seed, endpoints) {
            let positions = main_road_positions(self.seed, a, b);
            let road = self.graph.path_from_positions(&positions)?;
            self.stats.intersections += self.register(road, &BTreeSet::new())?;
            self.owned.push((road, Tier::Main));
            self.stats.roads += 1;
            mains.push(road);
        }
        for road in mains {
            self.grow(road, Tier::Main)?;
        }
        Ok(())
    }

    /// Records where `path` crosses the region's own paths and saves
    /// everything it touched. Returns the number of new intersections.
    fn register(&mut self, path: PathId, exclude: &BTreeSet<PathId>) -> GenResult<usize> {
        let mut skip = exclude.clone();
        skip.insert(path);

        let positions = self.graph.positions(path)?;
        let mut hits = Vec::new();
        for pair in positions.windows(2) {
            hits.extend(self.paver.crossings(self.graph, pair[0], pair[1], &skip)?);
        }

        let mut touched = BTreeSet::new();
        let mut count = 0;
        for hit in hits {
            if !self.graph.contains_path(hit.path) {
                continue;
            }
            let Some(other) = self.vertex_at(hit.path, hit.hit.on_first)? else {
                continue;
            };
            let Some(own) = self.vertex_at(path, hit.hit.on_second)? else {
                continue;
            };
            if self.graph.attachment_closure(other)?.contains(&own) {
                continue;
            }
            self.graph.attach(other, own)?;
            touched.insert(hit.path);
            count += 1;
        }

        self.paver.save_own_path(self.graph, path)?;
        for other in touched {
            self.paver.save_path(self.graph, other)?;
        }
        Ok(count)
    }

    /// Vertex of `path` at `pos`: an existing one within the snap distance,
    /// or a new one inserted into the segment under `pos`.
    fn vertex_at(&mut self, path: PathId, pos: Vec3) -> GenResult<Option<PointId>> {
        for (a, b) in self.graph.all_segments(path)? {
            let (pa, pb) = (self.graph.position(a)?, self.graph.position(b)?);
            if pa.flat_distance(pos) <= self.config.vertex_snap {
                return Ok(Some(a));
            }
            if pb.flat_distance(pos) <= self.config.vertex_snap {
                return Ok(Some(b));
            }
            let (distance, on, _) = point_segment_distance(pos, pa, pb);
            if distance <= ON_SEGMENT {
                return Ok(Some(self.graph.insert_between(a, b, on)?));
            }
        }
        Ok(None)
    }

    /// Branches the next tier off `parent` and recurses into every street
    /// that survives.
    fn grow(&mut self, parent: PathId, tier: Tier) -> GenResult<()> {
        let Some(next) = tier.next() else {
            return Ok(());
        };
        let Some(&params) = next.config(&self.config.streets) else {
            return Ok(());
        };

        self.graph.subdivide(parent, params.spacing)?;
        for candidate in self.graph.intermediate_points(parent)? {
            if !self.graph.contains_point(candidate) {
                continue;
            }
            let point = self.graph.point(candidate)?;
            if !point.attached.is_empty() || !point.branches.is_empty() || !self.core.contains(point.pos) {
                continue;
            }
            // Each candidate rolls from its own stream, keyed by where it is
            let mut rng = self.seed.stream(&[
                salt::STREETS,
                i64::from(next.depth()),
                point.pos.x.round() as i64,
                point.pos.z.round() as i64,
            ]);
            if !rng.gen_bool(params.probability) {
                continue;
            }
            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let length = rng.gen_range(params.min_length..=params.max_length);
            let merge_roll: f64 = rng.gen();
            if let Some(street) = self.try_branch(parent, candidate, next, side, length, merge_roll)? {
                self.grow(street, next)?;
            }
        }
        self.graph.unsubdivide(parent, self.config.simplify_angle())?;
        Ok(())
    }

    fn try_branch(
        &mut self,
        parent: PathId,
        origin: PointId,
        tier: Tier,
        side: f64,
        length: f64,
        merge_roll: f64,
    ) -> GenResult<Option<PathId>> {
        let config = self.config;
        let point = self.graph.point(origin)?;
        let from = point.pos;
        let (Some(prev), Some(next)) = (point.prev, point.next) else {
            return Ok(None);
        };
        let heading = (self.graph.position(next)? - self.graph.position(prev)?).normalized_flat();
        let normal = heading.perpendicular_flat() * side;
        let mut finish = from + normal * length;
        let mut snapped = false;

        if let Some((edge, exit)) = self.edges.exit(from, finish) {
            if let Some((_, connection)) = nearest_within(self.edges.connections(edge), exit, config.snap_radius) {
                finish = connection;
                snapped = true;
            } else {
                finish = exit - normal * config.border_clearance;
            }
        } else if let Some((_, connection)) = self.edges.connection_ahead(finish, normal, config.snap_radius) {
            finish = connection;
            snapped = true;
        }
        finish.y = from.y;

        let mut length = from.flat_distance(finish);
        if length < config.min_street_length {
            return Ok(self.reject(origin, tier, Rejection::TooShort(length)));
        }

        let exclude = BTreeSet::from([parent]);
        let tolerance = config.parallel_tolerance();
        let overlap = if self
            .paver
            .near_parallel(self.graph, from, finish, config.min_spacing, tolerance, &exclude)?
        {
            self.paver
                .parallel_overlap(self.graph, from, finish, config.min_spacing, tolerance, &exclude)?
        } else {
            None
        };
        if let Some(overlap) = overlap {
            if overlap.fraction >= config.parallel_reject_fraction {
                return Ok(self.reject(origin, tier, Rejection::Parallel(overlap.fraction)));
            }
            let cut = overlap.first_t * length - config.min_spacing;
            if cut < config.min_street_length {
                return Ok(self.reject(origin, tier, Rejection::OverlapCut(cut.max(0.0))));
            }
            finish = from.lerp(finish, cut / length);
            length = cut;
            snapped = false;
        }

        let mut merged = false;
        if !snapped && merge_roll < config.merge_probability {
            let direction = finish - from;
            if let Some(target) = self
                .paver
                .merge_target(self.graph, finish, direction, config.merge_radius, tolerance, &exclude)?
            {
                let reach = from.flat_distance(target.point);
                if self.core.contains(target.point) && reach >= config.min_street_length {
                    finish = target.point;
                    length = reach;
                    merged = true;
                }
            }
        }

        let street = self.graph.branch(origin, finish)?;
        self.stats.intersections += self.register(street, &exclude)?;
        self.owned.push((street, tier));

        self.stats.streets += 1;
        self.stats.snapped += usize::from(snapped);
        self.stats.merged += usize::from(merged);
        debug!(
            region = %self.region,
            tier = tier.name(),
            %street,
            length,
            snapped,
            merged,
            "street placed"
        );
        Ok(Some(street))
    }

    fn reject(&mut self, origin: PointId, tier: Tier, why: Rejection) -> Option<PathId> {
        self.stats.record(why);
        debug!(
            region = %self.region,
            tier = tier.name(),
            %origin,
            %why,
            "street rejected"
        );
        None
    }
}
