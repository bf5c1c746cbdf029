//! # Canvas
//!
//! A per-region 2D material raster covering the region plus its
//! overgeneration margin on every side.
//!
//! ## Coordinates
//!
//! Cell `(0, 0)` is the region's north-west node. Valid relative
//! coordinates run from `-margin` to `size + margin - 1` on both axes.
//!
//! ## Cursor
//!
//! All writes go through a cursor. Moving the cursor outside the raster
//! clears its `inside` flag and every write is suppressed until it comes
//! back, so a drawing call aimed at another region costs one comparison.
//!
//! ## Storage Format
//!
//! Cells are one byte each (the material id), row-major by z then x.
//! Snapshots are the raw cells, LZ4-compressed with the size prepended.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use crate::error::{GenError, GenResult};
use crate::material::{priority_of_id, Material};
use crate::shape::{Shape, ShapeCache};
use crate::units::{RegionCoord, Units};

/// One raster cell: a material id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Cell(u8);

impl Cell {
    /// Cell holding `material`.
    #[inline]
    #[must_use]
    pub const fn new(material: Material) -> Self {
        Self(material.id())
    }

    /// Material held by this cell.
    #[inline]
    #[must_use]
    pub fn material(self) -> Material {
        Material::from_id(self.0).unwrap_or_default()
    }

    #[inline]
    const fn priority(self) -> u8 {
        priority_of_id(self.0)
    }
}

/// Drawing interface shared by a single canvas and a 3x3 megacanvas.
///
/// Every method returns true if it reached at least one raster.
pub trait Surface {
    /// Moves the cursor to `(x, z)` relative to the (central) region origin.
    fn set_cursor(&mut self, x: i32, z: i32) -> bool;

    /// Moves the cursor to absolute node coordinates.
    fn set_cursor_absolute(&mut self, x: i32, z: i32) -> bool;

    /// Moves the cursor by an offset.
    fn move_cursor(&mut self, dx: i32, dz: i32) -> bool;

    /// Writes one cell at an offset from the cursor, honoring priorities.
    fn write_cell(&mut self, dx: i32, dz: i32, material: Material) -> bool;

    /// Writes every cell of `shape` around the cursor.
    fn draw_shape(&mut self, shape: &Shape) -> bool;

    /// Draws a rectangle with its north-west corner on the cursor.
    fn draw_rectangle(&mut self, shapes: &mut ShapeCache, width: u32, depth: u32, material: Material) -> bool {
        let shape = shapes.rectangle(width, depth, material);
        self.draw_shape(&shape)
    }

    /// Draws a square centered on the cursor.
    fn draw_square(&mut self, shapes: &mut ShapeCache, size: u32, material: Material) -> bool {
        let shape = shapes.square(size, material);
        self.draw_shape(&shape)
    }

    /// Draws a disc centered on the cursor.
    fn draw_circle(&mut self, shapes: &mut ShapeCache, radius: u32, material: Material) -> bool {
        let shape = shapes.circle(radius, material);
        self.draw_shape(&shape)
    }
}

/// Material raster of one region plus margin.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    region: RegionCoord,
    origin: (i32, i32),
    size: i32,
    margin: i32,
    span: i32,
    cells: Vec<Cell>,
    cursor: (i32, i32),
    inside: bool,
}

impl Canvas {
    /// Creates an empty canvas for `region`, cursor on the region origin.
    #[must_use]
    pub fn new(units: Units, region: RegionCoord) -> Self {
        let size = units.region_size();
        let margin = units.margin();
        let span = size + 2 * margin;
        Self {
            region,
            origin: units.region_origin(region),
            size,
            margin,
            span,
            cells: vec![Cell::default(); (span * span) as usize],
            cursor: (0, 0),
            inside: true,
        }
    }

    /// Region this canvas belongs to.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> RegionCoord {
        self.region
    }

    /// Absolute coordinates of the region origin.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Region edge in nodes, margin excluded.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Margin on each side in nodes.
    #[inline]
    #[must_use]
    pub const fn margin(&self) -> i32 {
        self.margin
    }

    /// Raster edge in nodes, margin included.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> i32 {
        self.span
    }

    /// Cursor position relative to the region origin.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (i32, i32) {
        self.cursor
    }

    /// Returns true while the cursor lies on the raster.
    #[inline]
    #[must_use]
    pub const fn is_inside(&self) -> bool {
        self.inside
    }

    #[inline]
    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let gx = x + self.margin;
        let gz = z + self.margin;
        if gx < 0 || gz < 0 || gx >= self.span || gz >= self.span {
            return None;
        }
        Some((gz * self.span + gx) as usize)
    }

    /// Returns true if relative `(x, z)` lies on the raster.
    #[inline]
    #[must_use]
    pub fn covers(&self, x: i32, z: i32) -> bool {
        self.index(x, z).is_some()
    }

    /// Returns true if absolute `(x, z)` lies on the raster.
    #[inline]
    #[must_use]
    pub fn covers_absolute(&self, x: i32, z: i32) -> bool {
        self.covers(x - self.origin.0, z - self.origin.1)
    }

    /// Material at relative `(x, z)`.
    #[must_use]
    pub fn material_at(&self, x: i32, z: i32) -> Option<Material> {
        self.index(x, z).map(|i| self.cells[i].material())
    }

    /// Material at absolute `(x, z)`.
    #[must_use]
    pub fn material_at_absolute(&self, x: i32, z: i32) -> Option<Material> {
        self.material_at(x - self.origin.0, z - self.origin.1)
    }

    /// Material at an offset from the cursor.
    #[must_use]
    pub fn read_cell(&self, dx: i32, dz: i32) -> Option<Material> {
        self.material_at(self.cursor.0 + dx, self.cursor.1 + dz)
    }

    /// Reads the cell at an offset from the cursor, then writes `material`
    /// if its priority allows. Returns the material found before the write.
    pub fn read_write_cell(&mut self, dx: i32, dz: i32, material: Material) -> Option<Material> {
        if !self.inside {
            return None;
        }
        let i = self.index(self.cursor.0 + dx, self.cursor.1 + dz)?;
        let before = self.cells[i];
        if material.priority() >= before.priority() {
            self.cells[i] = Cell::new(material);
        }
        Some(before.material())
    }

    /// Relative coordinates of every cell holding `material`, row by row.
    #[must_use]
    pub fn search_for_material(&self, material: Material) -> Vec<(i32, i32)> {
        let wanted = Cell::new(material);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == wanted)
            .map(|(i, _)| {
                let i = i as i32;
                (i % self.span - self.margin, i / self.span - self.margin)
            })
            .collect()
    }

    /// Offset from the cursor of the nearest cell within `radius` holding
    /// `material`. Ties go to the first cell in row order.
    #[must_use]
    pub fn search_in_circle(&self, radius: u32, material: Material) -> Option<(i32, i32)> {
        let r = radius as i32;
        let limit = r * r + r;
        let mut best: Option<(i32, (i32, i32))> = None;
        for dz in -r..=r {
            for dx in -r..=r {
                let d2 = dx * dx + dz * dz;
                if d2 > limit || best.is_some_and(|(b, _)| d2 >= b) {
                    continue;
                }
                if self.read_cell(dx, dz) == Some(material) {
                    best = Some((d2, (dx, dz)));
                }
            }
        }
        best.map(|(_, offset)| offset)
    }

    /// Number of cells holding `material`.
    #[must_use]
    pub fn count(&self, material: Material) -> usize {
        let wanted = Cell::new(material);
        self.cells.iter().filter(|&&cell| cell == wanted).count()
    }

    /// Raw cells.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells viewed as bytes (one material id per cell).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    /// LZ4 snapshot of the cells.
    #[must_use]
    pub fn to_compressed(&self) -> Vec<u8> {
        compress_prepend_size(self.as_bytes())
    }

    /// Restores a canvas of `region` from [`Canvas::to_compressed`] output.
    ///
    /// # Errors
    ///
    /// [`GenError::Snapshot`] if the data does not decompress, has the wrong
    /// size for `units`, or holds an unknown material id.
    pub fn from_compressed(units: Units, region: RegionCoord, data: &[u8]) -> GenResult<Self> {
        let bytes = decompress_size_prepended(data).map_err(|e| GenError::Snapshot(e.to_string()))?;
        let mut canvas = Self::new(units, region);
        if bytes.len() != canvas.cells.len() {
            return Err(GenError::Snapshot(format!(
                "expected {} cells, found {}",
                canvas.cells.len(),
                bytes.len()
            )));
        }
        if let Some(&bad) = bytes.iter().find(|&&b| Material::from_id(b).is_none()) {
            return Err(GenError::Snapshot(format!("unknown material id {bad}")));
        }
        canvas.cells.copy_from_slice(bytemuck::cast_slice(&bytes));
        Ok(canvas)
    }
}

impl Surface for Canvas {
    fn set_cursor(&mut self, x: i32, z: i32) -> bool {
        self.cursor = (x, z);
        self.inside = self.covers(x, z);
        self.inside
    }

    fn set_cursor_absolute(&mut self, x: i32, z: i32) -> bool {
        self.set_cursor(x - self.origin.0, z - self.origin.1)
    }

    fn move_cursor(&mut self, dx: i32, dz: i32) -> bool {
        self.set_cursor(self.cursor.0 + dx, self.cursor.1 + dz)
    }

    fn write_cell(&mut self, dx: i32, dz: i32, material: Material) -> bool {
        if !self.inside {
            return false;
        }
        let Some(i) = self.index(self.cursor.0 + dx, self.cursor.1 + dz) else {
            return false;
        };
        if material.priority() < self.cells[i].priority() {
            return false;
        }
        self.cells[i] = Cell::new(material);
        true
    }

    fn draw_shape(&mut self, shape: &Shape) -> bool {
        if !self.inside {
            return false;
        }
        let mut wrote = false;
        for &(dx, dz, material) in shape.cells() {
            wrote |= self.write_cell(dx, dz, material);
        }
        wrote
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("region", &self.region)
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("margin", &self.margin)
            .field("cursor", &self.cursor)
            .field("inside", &self.inside)
            .finish_non_exhaustive()
    }
}
