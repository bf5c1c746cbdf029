//! # Region Borders
//!
//! Points on region edges that both adjacent regions must agree on.
//!
//! An edge is identified by its fixed coordinate and the start of its span,
//! never by the region that asks. The east edge of region `(0, 0)` and the
//! west edge of region `(1, 0)` are the same [`Edge`], so both regions seed
//! the same streams and compute the same points without talking to each
//! other.

use overpave_core::{grid_line_crossing, Axis, Vec3};
use rand::Rng;

use crate::config::GeneratorConfig;
use crate::seed::{salt, WorldSeed};
use crate::units::{RegionCoord, Units};

/// Side of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Smallest x.
    West,
    /// Largest x.
    East,
    /// Smallest z.
    North,
    /// Largest z.
    South,
}

impl Side {
    /// All sides, in endpoint order.
    pub const ALL: [Self; 4] = [Self::West, Self::East, Self::North, Self::South];

    /// Outward unit direction.
    #[must_use]
    pub const fn outward(self) -> Vec3 {
        match self {
            Self::West => Vec3::new(-1.0, 0.0, 0.0),
            Self::East => Vec3::new(1.0, 0.0, 0.0),
            Self::North => Vec3::new(0.0, 0.0, -1.0),
            Self::South => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// An axis-aligned region edge in absolute node coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Axis whose coordinate is fixed along the edge.
    pub axis: Axis,
    /// The fixed coordinate.
    pub line: i64,
    /// Start of the span along the other axis.
    pub span_start: i64,
    /// Span length.
    pub length: i64,
    /// Height of points placed on the edge.
    pub ground: i32,
}

impl Edge {
    /// Edge on `side` of `region`.
    #[must_use]
    pub fn of(units: Units, region: RegionCoord, side: Side, ground: i32) -> Self {
        let (x, z) = units.region_origin(region);
        let (x, z, size) = (i64::from(x), i64::from(z), i64::from(units.region_size()));
        let (axis, line, span_start) = match side {
            Side::West => (Axis::X, x, z),
            Side::East => (Axis::X, x + size, z),
            Side::North => (Axis::Z, z, x),
            Side::South => (Axis::Z, z + size, x),
        };
        Self {
            axis,
            line,
            span_start,
            length: size,
            ground,
        }
    }

    /// Point `offset` nodes along the edge.
    #[must_use]
    pub fn point_at(&self, offset: i64) -> Vec3 {
        let along = (self.span_start + offset) as f64;
        let fixed = self.line as f64;
        let y = f64::from(self.ground);
        match self.axis {
            Axis::X => Vec3::new(fixed, y, along),
            Axis::Z => Vec3::new(along, y, fixed),
        }
    }

    /// Offset of `pos` along the edge.
    #[must_use]
    pub fn offset_of(&self, pos: Vec3) -> f64 {
        self.axis.other().component(pos) - self.span_start as f64
    }

    fn salts(&self, purpose: i64) -> [i64; 4] {
        let axis = match self.axis {
            Axis::X => 0,
            Axis::Z => 1,
        };
        [purpose, axis, self.line, self.span_start]
    }

    fn usable(&self, corner_margin: f64) -> (i64, i64) {
        let lo = (corner_margin.round() as i64).clamp(0, self.length / 2);
        (lo, self.length - lo)
    }
}

/// The main-road endpoint on `edge`, at least `corner_margin` from both
/// corners.
#[must_use]
pub fn border_point(seed: WorldSeed, edge: &Edge, corner_margin: f64) -> Vec3 {
    let (lo, hi) = edge.usable(corner_margin);
    let mut rng = seed.stream(&edge.salts(salt::EDGE_POINT));
    edge.point_at(rng.gen_range(lo..=hi))
}

/// Street connection points on `edge`, ordered along it.
///
/// The usable span is cut into `connections_per_edge` slots with one
/// point in each.
#[must_use]
pub fn border_connections(seed: WorldSeed, edge: &Edge, config: &GeneratorConfig) -> Vec<Vec3> {
    let (lo, hi) = edge.usable(config.corner_margin);
    let span = hi - lo + 1;
    let count = i64::from(config.connections_per_edge).min(span).max(1);
    let slot = span / count;
    let mut rng = seed.stream(&edge.salts(salt::EDGE_CONNECTIONS));
    (0..count)
        .map(|i| {
            let start = lo + i * slot;
            let end = if i == count - 1 { hi } else { start + slot - 1 };
            edge.point_at(rng.gen_range(start..=end))
        })
        .collect()
}

/// Pairs the four main-road endpoints `[west, east, north, south]`.
///
/// One of three pairings is chosen by a stream keyed on the endpoints.
#[must_use]
pub fn pair_endpoints(seed: WorldSeed, endpoints: [Vec3; 4]) -> [(Vec3, Vec3); 2] {
    let mut salts = vec![salt::PAIRING];
    for p in endpoints {
        salts.push(p.x.round() as i64);
        salts.push(p.z.round() as i64);
    }
    let [w, e, n, s] = endpoints;
    match seed.stream(&salts).gen_range(0..3) {
        0 => [(w, e), (n, s)],
        1 => [(w, n), (e, s)],
        _ => [(w, s), (e, n)],
    }
}

/// Positions of a main road from `a` to `b`: straight, or with one bend so
/// that one leg runs at 45 degrees.
///
/// The bend sits at the `a` end or the `b` end of the straight leg, chosen
/// by a stream keyed on both endpoints.
#[must_use]
pub fn main_road_positions(seed: WorldSeed, a: Vec3, b: Vec3) -> Vec<Vec3> {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let straight = dx.abs() - dz.abs();
    if dx.abs() < 1.0 || dz.abs() < 1.0 || straight.abs() < 1.0 {
        return vec![a, b];
    }

    let step = if straight > 0.0 {
        Vec3::new(dx.signum() * straight, 0.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, dz.signum() * -straight)
    };
    let mut rng = seed.stream(&[
        salt::BEND,
        a.x.round() as i64,
        a.z.round() as i64,
        b.x.round() as i64,
        b.z.round() as i64,
    ]);
    let bend = if rng.gen_bool(0.5) { a + step } else { b - step };
    vec![a, Vec3::new(bend.x, a.y, bend.z), b]
}

/// The four edges of one region with their connection points.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionEdges {
    edges: [(Side, Edge); 4],
    connections: [Vec<Vec3>; 4],
}

impl RegionEdges {
    /// Computes the edges and connection points of `region`.
    #[must_use]
    pub fn new(seed: WorldSeed, units: Units, region: RegionCoord, config: &GeneratorConfig) -> Self {
        let edges = Side::ALL.map(|side| (side, Edge::of(units, region, side, config.ground_level)));
        let connections = edges.map(|(_, edge)| border_connections(seed, &edge, config));
        Self { edges, connections }
    }

    /// Edge on `side`.
    #[must_use]
    pub fn edge(&self, side: Side) -> &Edge {
        &self.edges[side as usize].1
    }

    /// Connection points on `side`.
    #[must_use]
    pub fn connections(&self, side: Side) -> &[Vec3] {
        &self.connections[side as usize]
    }

    /// Main-road endpoints `[west, east, north, south]`.
    #[must_use]
    pub fn main_endpoints(&self, seed: WorldSeed, corner_margin: f64) -> [Vec3; 4] {
        self.edges.map(|(_, edge)| border_point(seed, &edge, corner_margin))
    }

    /// First point where `from`-`to` leaves the region, with its side.
    ///
    /// `None` when `to` is inside (or on the border of) the region.
    #[must_use]
    pub fn exit(&self, from: Vec3, to: Vec3) -> Option<(Side, Vec3)> {
        let mut best: Option<(f64, Side, Vec3)> = None;
        for &(side, edge) in &self.edges {
            let Some(hit) = grid_line_crossing(from, to, edge.axis, edge.line as f64) else {
                continue;
            };
            let offset = edge.offset_of(hit);
            if offset < 0.0 || offset > edge.length as f64 {
                continue;
            }
            let distance = from.flat_distance(hit);
            if best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, side, hit));
            }
        }
        let (distance, side, hit) = best?;
        (distance < from.flat_distance(to)).then_some((side, hit))
    }

    /// Nearest connection point within `radius` of `pos` on a side that
    /// `heading` points towards.
    #[must_use]
    pub fn connection_ahead(&self, pos: Vec3, heading: Vec3, radius: f64) -> Option<(Side, Vec3)> {
        let mut best: Option<(f64, Side, Vec3)> = None;
        for side in Side::ALL {
            if side.outward().flat_dot(heading) <= 0.0 {
                continue;
            }
            if let Some((distance, point)) = nearest_within(self.connections(side), pos, radius) {
                if best.map_or(true, |(d, _, _)| distance < d) {
                    best = Some((distance, side, point));
                }
            }
        }
        best.map(|(_, side, point)| (side, point))
    }
}

/// Nearest of `points` within `radius` of `pos`, first one on ties.
#[must_use]
pub fn nearest_within(points: &[Vec3], pos: Vec3, radius: f64) -> Option<(f64, Vec3)> {
    let mut best: Option<(f64, Vec3)> = None;
    for &p in points {
        let distance = p.flat_distance(pos);
        if distance <= radius && best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, p));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WorldSeed, Units, GeneratorConfig) {
        let config = GeneratorConfig::default();
        (WorldSeed::new(1234), config.units().unwrap(), config)
    }

    #[test]
    fn test_shared_edges_are_identical() {
        let (_, units, _) = setup();
        let a = RegionCoord::new(0, 0);
        assert_eq!(Edge::of(units, a, Side::East, 0), Edge::of(units, a.offset(1, 0), Side::West, 0));
        assert_eq!(Edge::of(units, a, Side::South, 0), Edge::of(units, a.offset(0, 1), Side::North, 0));
        assert_ne!(Edge::of(units, a, Side::West, 0), Edge::of(units, a, Side::East, 0));
    }

    #[test]
    fn test_border_point_respects_corner_margin() {
        let (seed, units, config) = setup();
        for x in -3..3 {
            let edge = Edge::of(units, RegionCoord::new(x, 7), Side::North, 0);
            let p = border_point(seed, &edge, config.corner_margin);
            let offset = edge.offset_of(p);
            assert!((80.0..=720.0).contains(&offset), "offset {offset}");
            assert!((p.z - 7.0 * 800.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_connections_are_ordered_and_slotted() {
        let (seed, units, config) = setup();
        let edge = Edge::of(units, RegionCoord::new(-2, 5), Side::West, 0);
        let points = border_connections(seed, &edge, &config);
        assert_eq!(points.len(), 4);
        let offsets: Vec<f64> = points.iter().map(|&p| edge.offset_of(p)).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert!(offsets.iter().all(|o| (80.0..=720.0).contains(o)));
        assert!(points.iter().all(|p| (p.x - -1600.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_pairing_uses_every_endpoint_once() {
        let seed = WorldSeed::new(5);
        let w = Vec3::new(0.0, 0.0, 300.0);
        let e = Vec3::new(800.0, 0.0, 500.0);
        let n = Vec3::new(200.0, 0.0, 0.0);
        let s = Vec3::new(600.0, 0.0, 800.0);
        let pairs = pair_endpoints(seed, [w, e, n, s]);
        let mut used: Vec<Vec3> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        used.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert_eq!(used, vec![w, n, s, e]);
        assert_eq!(pairs, pair_endpoints(seed, [w, e, n, s]));
    }

    #[test]
    fn test_main_road_bend_is_45_degrees() {
        let seed = WorldSeed::new(9);
        let a = Vec3::new(0.0, 0.0, 300.0);
        let b = Vec3::new(800.0, 0.0, 500.0);
        let positions = main_road_positions(seed, a, b);
        assert_eq!(positions.len(), 3);
        let bend = positions[1];
        let legs = [(a, bend), (bend, b)];
        let diagonal = legs
            .iter()
            .filter(|(p, q)| ((q.x - p.x).abs() - (q.z - p.z).abs()).abs() < 1e-9)
            .count();
        let straight = legs.iter().filter(|(p, q)| (q.z - p.z).abs() < 1e-9).count();
        assert_eq!((diagonal, straight), (1, 1));

        let aligned = main_road_positions(seed, a, Vec3::new(800.0, 0.0, 300.0));
        assert_eq!(aligned.len(), 2);
    }

    #[test]
    fn test_exit_and_connection_ahead() {
        let (seed, units, config) = setup();
        let edges = RegionEdges::new(seed, units, RegionCoord::new(0, 0), &config);

        let (side, hit) = edges.exit(Vec3::new(400.0, 0.0, 400.0), Vec3::new(900.0, 0.0, 400.0)).unwrap();
        assert_eq!(side, Side::East);
        assert!((hit.x - 800.0).abs() < f64::EPSILON);
        assert!(edges.exit(Vec3::new(400.0, 0.0, 400.0), Vec3::new(700.0, 0.0, 400.0)).is_none());

        let target = edges.connections(Side::South)[0];
        let near = target + Vec3::new(0.0, 0.0, -10.0);
        let (side, found) = edges.connection_ahead(near, Vec3::new(0.0, 0.0, 1.0), 20.0).unwrap();
        assert_eq!(side, Side::South);
        assert_eq!(found, target);
        assert!(edges.connection_ahead(near, Vec3::new(0.0, 0.0, -1.0), 20.0).is_none());
    }
}
