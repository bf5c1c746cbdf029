//! # Overgeneration Integration Test
//!
//! Regions generated independently, in any order, must agree on everything
//! they share, and a complete region is never generated again.

use std::collections::BTreeMap;

use overpave_procedural::{
    border_connections, border_point, Canvas, CanvasStore, Edge, GenResult, GeneratorConfig, Material, Megacanvas,
    RegionCoord, RegionStore, RoadGenerator, Side, Surface, TerrainSink, Units, WorldSeed, MARKER_THRESHOLD,
};

const SEED: u64 = 0x0005_eed5;

fn generator() -> RoadGenerator {
    RoadGenerator::new(WorldSeed::new(SEED), GeneratorConfig::default()).unwrap()
}

/// Test: two fresh generators produce byte-identical canvases.
#[test]
fn test_fresh_generators_agree_byte_for_byte() {
    let mut first = generator();
    let mut second = generator();
    for region in [RegionCoord::new(0, 0), RegionCoord::new(-3, 2)] {
        let a = first.canvas(region).unwrap().to_compressed();
        let b = second.canvas(region).unwrap().to_compressed();
        assert_eq!(a, b, "canvas of {region} differs between runs");
    }
    assert_eq!(first.stats(), second.stats());
}

/// Test: the request order does not change a region's own main roads.
#[test]
fn test_main_road_endpoints_ignore_request_order() {
    let units = GeneratorConfig::default().units().unwrap();
    let region = RegionCoord::new(4, 4);

    let mut forward = generator();
    forward.canvas(region.offset(-1, 0)).unwrap();
    forward.canvas(region).unwrap();

    let mut backward = generator();
    backward.canvas(region.offset(1, 0)).unwrap();
    backward.canvas(region).unwrap();

    for side in Side::ALL {
        let edge = Edge::of(units, region, side, 0);
        let point = border_point(WorldSeed::new(SEED), &edge, GeneratorConfig::default().corner_margin);
        for generator in [&mut forward, &mut backward] {
            let (x, z) = (point.x as i32, point.z as i32);
            let material = generator.canvas(region).unwrap().material_at_absolute(x, z);
            assert!(
                material.is_some_and(|m| m != Material::Empty),
                "{side:?} endpoint {point:?} of {region} not drawn"
            );
        }
    }
}

/// Test: a region's canvas is byte-identical whichever regions were
/// requested before it.
#[test]
fn test_canvas_ignores_request_order() {
    let orders: [&[(i32, i32)]; 4] = [&[(-1, 0)], &[(1, 0), (0, -1)], &[(2, 2), (-1, -1), (1, 1)], &[(0, 2), (0, 1)]];
    for region in [RegionCoord::new(4, 4), RegionCoord::new(0, 0), RegionCoord::new(-3, 2)] {
        let expected = generator().canvas(region).unwrap().to_compressed();
        for order in orders {
            let mut generator = generator();
            for &(dx, dz) in order {
                generator.canvas(region.offset(dx, dz)).unwrap();
            }
            let canvas = generator.canvas(region).unwrap().to_compressed();
            assert!(canvas == expected, "{region} differs after requesting {order:?} first");
        }
    }
}

/// Test: a canvas evicted during a long walk comes back byte for byte.
#[test]
fn test_canvas_survives_eviction_round_trip() {
    let config = GeneratorConfig {
        max_cached_regions: 25,
        ..GeneratorConfig::default()
    };
    let origin = RegionCoord::new(0, 0);
    let expected = RoadGenerator::new(WorldSeed::new(SEED), config.clone())
        .unwrap()
        .canvas(origin)
        .unwrap()
        .to_compressed();

    let mut generator = RoadGenerator::new(WorldSeed::new(SEED), config).unwrap();
    generator.canvas(origin).unwrap();
    for x in (1..=7).chain((1..7).rev()) {
        generator.canvas(RegionCoord::new(x, 0)).unwrap();
    }
    assert!(generator.stats().removed_paths > 0, "the walk must evict the origin's paths");
    let returned = generator.canvas(origin).unwrap().to_compressed();
    assert!(returned == expected, "{origin} differs after eviction");
    assert!(generator.is_complete(origin));
}

/// Test: both sides of a shared edge compute the same points.
#[test]
fn test_border_agreement() {
    let config = GeneratorConfig::default();
    let units = config.units().unwrap();
    let seed = WorldSeed::new(SEED);
    for x in -5..5 {
        for z in -5..5 {
            let region = RegionCoord::new(x, z);
            let pairs = [
                (Edge::of(units, region, Side::East, 0), Edge::of(units, region.offset(1, 0), Side::West, 0)),
                (Edge::of(units, region, Side::South, 0), Edge::of(units, region.offset(0, 1), Side::North, 0)),
            ];
            for (ours, theirs) in pairs {
                assert_eq!(border_connections(seed, &ours, &config), border_connections(seed, &theirs, &config));
                assert_eq!(
                    border_point(seed, &ours, config.corner_margin),
                    border_point(seed, &theirs, config.corner_margin)
                );
            }
        }
    }
}

/// Test: a write lands only when its priority is at least the cell's.
#[test]
fn test_priority_monotonicity() {
    let units = Units::new(8, 4).unwrap();
    for before in Material::ALL {
        for after in Material::ALL {
            let mut canvas = Canvas::new(units, RegionCoord::new(0, 0));
            canvas.set_cursor(3, 3);
            canvas.write_cell(0, 0, before);
            let cell_before = canvas.material_at(3, 3).unwrap();
            canvas.write_cell(0, 0, after);
            let expected = if after.priority() >= cell_before.priority() { after } else { cell_before };
            assert_eq!(canvas.material_at(3, 3), Some(expected), "{before:?} then {after:?}");
        }
    }

    let mut canvas = Canvas::new(units, RegionCoord::new(0, 0));
    canvas.set_cursor(1, 1);
    canvas.write_cell(0, 0, Material::Margin);
    canvas.write_cell(0, 0, Material::Asphalt);
    assert_eq!(canvas.read_cell(0, 0), Some(Material::Asphalt));
    canvas.write_cell(0, 0, Material::Margin);
    assert_eq!(canvas.read_cell(0, 0), Some(Material::Asphalt));
}

/// Test: tile 80, region 10 tiles. The second request for the region at
/// the origin returns the cached canvas without running the generator.
#[test]
fn test_second_request_is_cached() {
    let mut generator = generator();
    let origin = RegionCoord::new(0, 0);

    let first = generator.canvas(origin).unwrap().to_compressed();
    let runs = generator.generator_runs();
    assert_eq!(runs, 9);
    assert!(generator.is_complete(origin));

    let second = generator.canvas(origin).unwrap().to_compressed();
    assert_eq!(generator.generator_runs(), runs);
    assert_eq!(first, second);
}

/// Test: the same scenario with a plain counting generator.
#[test]
fn test_counting_generator_runs_once_per_region() {
    let units = Units::new(80, 10).unwrap();
    let mut store: CanvasStore = RegionStore::new("canvas", 25).unwrap();
    let mut calls: BTreeMap<RegionCoord, u32> = BTreeMap::new();
    let mut counting = |canvas: &mut Megacanvas| -> GenResult<()> {
        *calls.entry(canvas.center()).or_default() += 1;
        canvas.set_cursor(400, 400);
        canvas.write_cell(0, 0, Material::Asphalt);
        Ok(())
    };

    let origin = RegionCoord::new(0, 0);
    for _ in 0..2 {
        if !store.is_complete(origin) {
            Megacanvas::new(&mut store, units, origin)
                .unwrap()
                .generate(&mut store, &mut counting, 1)
                .unwrap();
        }
    }

    assert_eq!(calls.len(), 9);
    assert!(calls.values().all(|&n| n == 1));
    let canvas = &store.peek(origin).unwrap().value;
    assert_eq!(canvas.material_at(400, 400), Some(Material::Asphalt));
}

/// Test: neighbors of a complete region are themselves not complete, and
/// completing them later never reruns the first region.
#[test]
fn test_walk_completes_each_region_once() {
    let mut generator = generator();
    for x in 0..3 {
        generator.canvas(RegionCoord::new(x, 0)).unwrap();
    }
    // 9 for the first window, then 3 new regions per step east
    assert_eq!(generator.generator_runs(), 15);
    assert!((0..3).all(|x| generator.is_complete(RegionCoord::new(x, 0))));
    assert!(!generator.is_complete(RegionCoord::new(3, 0)));
    assert!(generator.stats().roads >= 30);
}

#[derive(Default)]
struct Terrain {
    nodes: BTreeMap<(i32, i32, i32), u8>,
}

impl TerrainSink for Terrain {
    type Node = u8;

    fn translate(&self, material: Material) -> Option<u8> {
        Some(material.id())
    }

    fn write(&mut self, x: i32, y: i32, z: i32, node: u8) {
        self.nodes.insert((x, y, z), node);
    }
}

/// Test: painting tiles never writes marker ids and stays at ground level.
#[test]
fn test_paint_tile_never_writes_markers() {
    let mut generator = generator();
    let units = generator.units();
    let mut terrain = Terrain::default();
    let mut written = 0;
    for tx in 0..units.region_tiles() {
        for tz in 0..units.region_tiles() {
            let pos = overpave_core::Vec3::new(f64::from(tx * 80 + 5), 0.0, f64::from(tz * 80 + 5));
            written += generator.paint_tile(pos, &mut terrain).unwrap();
        }
    }
    assert!(written > 0);
    assert_eq!(written, terrain.nodes.len());
    assert!(terrain.nodes.values().all(|&id| id < MARKER_THRESHOLD));
    assert!(terrain.nodes.keys().all(|&(_, y, _)| y == 0));
}
