//! Copying finished canvases into a host terrain.

use crate::canvas::Canvas;
use crate::material::Material;

/// Terrain that road cells are written into.
pub trait TerrainSink {
    /// Host representation of a terrain node.
    type Node;

    /// Host node for a surface material, `None` to leave the node alone.
    fn translate(&self, material: Material) -> Option<Self::Node>;

    /// Writes one node at absolute coordinates.
    fn write(&mut self, x: i32, y: i32, z: i32, node: Self::Node);
}

/// Copies the canvas cells of one tile into `sink` at height `ground_y`.
///
/// `tile_min` is the tile's north-west corner in absolute nodes. Empty
/// cells are skipped; marker cells are written as the road surface they
/// sit on. Returns the number of nodes written.
pub fn blit_tile<S>(canvas: &Canvas, tile_min: (i32, i32), tile_size: i32, ground_y: i32, sink: &mut S) -> usize
where
    S: TerrainSink + ?Sized,
{
    let (min_x, min_z) = tile_min;
    let mut written = 0;
    for z in min_z..min_z + tile_size {
        for x in min_x..min_x + tile_size {
            let Some(surface) = canvas.material_at_absolute(x, z).and_then(Material::surface) else {
                continue;
            };
            if let Some(node) = sink.translate(surface) {
                sink.write(x, ground_y, z, node);
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::canvas::Surface;
    use crate::units::{RegionCoord, Units};

    #[derive(Default)]
    struct Recorder {
        nodes: BTreeMap<(i32, i32, i32), u8>,
    }

    impl TerrainSink for Recorder {
        type Node = u8;

        fn translate(&self, material: Material) -> Option<u8> {
            (material != Material::Margin).then_some(material.id())
        }

        fn write(&mut self, x: i32, y: i32, z: i32, node: u8) {
            self.nodes.insert((x, y, z), node);
        }
    }

    #[test]
    fn test_blit_skips_empty_and_surfaces_markers() {
        let units = Units::new(8, 4).unwrap();
        let mut canvas = Canvas::new(units, RegionCoord::new(1, 0));
        canvas.set_cursor(2, 2);
        canvas.write_cell(0, 0, Material::Asphalt);
        canvas.write_cell(1, 0, Material::Margin);
        canvas.write_cell(0, 1, Material::Midpoint);

        let mut sink = Recorder::default();
        let written = blit_tile(&canvas, (32, 0), 8, 64, &mut sink);

        assert_eq!(written, 2);
        assert_eq!(sink.nodes.get(&(34, 64, 2)), Some(&Material::Asphalt.id()));
        assert_eq!(sink.nodes.get(&(34, 64, 3)), Some(&Material::Asphalt.id()));
        assert!(sink.nodes.values().all(|&id| !Material::from_id(id).is_some_and(Material::is_marker)));
    }
}
