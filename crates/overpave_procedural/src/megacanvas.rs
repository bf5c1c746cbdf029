//! # Megacanvas
//!
//! A canvas and its 8 planar neighbors behaving as one drawing surface,
//! plus the memoized neighbor recursion that makes overgeneration work.
//!
//! ## Overgeneration
//!
//! A generator draws only its own region's features, but brushes and
//! streets spill over the border. Every neighbor that is not complete
//! receives the spill. Each canvas remembers which regions of its 3x3
//! window have drawn into it ([`Contributions`]); it is complete once all
//! nine have, because only then has every feature that can reach it been
//! drawn.
//!
//! ```text
//! generate(center, level)
//!   an open canvas lacks the center's drawing -> run generator, record it
//!   release canvases
//!   level > 0 -> generate(neighbor, level - 1) for each neighbor the center
//!                canvas still lacks (and each non-complete one if level > 1)
//!             -> mark center complete
//! ```
//!
//! Level 0 never completes a region; level 1 is the normal request depth.
//! A canvas evicted and created again starts with no contributions, so its
//! neighbors replay their drawings into it even if they are cached as
//! partial or complete. Complete canvases are never drawn into.

use tracing::{debug, warn};

use crate::canvas::{Canvas, Surface};
use crate::error::GenResult;
use crate::material::Material;
use crate::neighborhood::{Neighborhood, RegionMap};
use crate::region_store::{Evicted, RegionStore};
use crate::shape::Shape;
use crate::units::{RegionCoord, Units};

/// Store of region canvases.
pub type CanvasStore = RegionStore<Canvas, Contributions>;

/// Regions of a canvas's 3x3 window whose generators have drawn into it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contributions(u16);

impl Contributions {
    const FULL: u16 = 0x1ff;

    fn bit(canvas: RegionCoord, from: RegionCoord) -> Option<u16> {
        let dx = i64::from(from.x) - i64::from(canvas.x);
        let dz = i64::from(from.z) - i64::from(canvas.z);
        if dx.abs() > 1 || dz.abs() > 1 {
            return None;
        }
        Some(1 << ((dx + 1) * 3 + dz + 1))
    }

    /// Records that `from` has drawn into the canvas of `canvas`. Regions
    /// outside the window are ignored.
    pub fn record(&mut self, canvas: RegionCoord, from: RegionCoord) {
        if let Some(bit) = Self::bit(canvas, from) {
            self.0 |= bit;
        }
    }

    /// Returns true if `from` has drawn into the canvas of `canvas`.
    #[must_use]
    pub fn contains(self, canvas: RegionCoord, from: RegionCoord) -> bool {
        Self::bit(canvas, from).is_some_and(|bit| self.0 & bit != 0)
    }

    /// Returns true once the whole window has drawn.
    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 == Self::FULL
    }

    /// Window regions that have not drawn into the canvas of `canvas`,
    /// the region itself first, then its neighbors in order.
    #[must_use]
    pub fn missing(self, canvas: RegionCoord) -> Vec<RegionCoord> {
        std::iter::once(canvas)
            .chain(canvas.neighbors())
            .filter(|&from| !self.contains(canvas, from))
            .collect()
    }
}

/// Fills one region of a megacanvas.
///
/// Implementations must depend only on the world seed and the region's
/// coordinates; anything else breaks agreement between neighbors that are
/// generated in a different order.
pub trait RegionGenerator {
    /// Draws the central region's features into `canvas`.
    ///
    /// # Errors
    ///
    /// Any error aborts the request; the region stays not partial.
    fn generate_region(&mut self, canvas: &mut Megacanvas) -> GenResult<()>;

    /// Called once when `region` is promoted to complete.
    ///
    /// # Errors
    ///
    /// Any error aborts the request.
    fn region_completed(&mut self, _region: RegionCoord) -> GenResult<()> {
        Ok(())
    }
}

impl<F> RegionGenerator for F
where
    F: FnMut(&mut Megacanvas) -> GenResult<()>,
{
    fn generate_region(&mut self, canvas: &mut Megacanvas) -> GenResult<()> {
        self(canvas)
    }
}

/// Central canvas plus its non-complete neighbors.
#[derive(Debug)]
pub struct Megacanvas {
    units: Units,
    origin: (i32, i32),
    hood: Neighborhood<Canvas, Contributions>,
}

impl Megacanvas {
    /// Checks out the canvases around `center`, creating missing ones.
    ///
    /// # Errors
    ///
    /// [`crate::GenError::RegionBusy`] if one of them is already in use.
    pub fn new(store: &mut CanvasStore, units: Units, center: RegionCoord) -> GenResult<Self> {
        let hood = Neighborhood::checkout(store, center, |region| Canvas::new(units, region))?;
        Ok(Self {
            units,
            origin: units.region_origin(center),
            hood,
        })
    }

    /// Returns the canvases to the store. Yields whatever the store evicted.
    pub fn release(self, store: &mut CanvasStore) -> Vec<Evicted<Canvas, Contributions>> {
        self.hood.release(store)
    }

    /// The central region.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> RegionCoord {
        self.hood.center()
    }

    /// Absolute coordinates of the central region origin.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Unit system.
    #[inline]
    #[must_use]
    pub const fn units(&self) -> Units {
        self.units
    }

    /// Regions drawn into, center first.
    pub fn regions(&self) -> impl Iterator<Item = RegionCoord> + '_ {
        self.hood.regions()
    }

    /// The central canvas.
    #[must_use]
    pub fn center_canvas(&self) -> &Canvas {
        &self.hood.center_entry().value
    }

    /// Canvas of `region`, if held.
    #[must_use]
    pub fn canvas(&self, region: RegionCoord) -> Option<&Canvas> {
        self.hood.get(region)
    }

    /// Cell at an offset from the cursor, per canvas.
    #[must_use]
    pub fn read_cell(&self, dx: i32, dz: i32) -> RegionMap<Option<Material>> {
        self.hood.inspect(|c| c.read_cell(dx, dz))
    }

    /// [`Canvas::read_write_cell`] on every canvas that is not complete.
    pub fn read_write_cell(&mut self, dx: i32, dz: i32, material: Material) -> RegionMap<Option<Material>> {
        self.hood.broadcast_open(|c| c.read_write_cell(dx, dz, material))
    }

    /// [`Canvas::search_for_material`] on every canvas.
    #[must_use]
    pub fn search_for_material(&self, material: Material) -> RegionMap<Vec<(i32, i32)>> {
        self.hood.inspect(|c| c.search_for_material(material))
    }

    /// [`Canvas::search_in_circle`] on every canvas.
    #[must_use]
    pub fn search_in_circle(&self, radius: u32, material: Material) -> RegionMap<Option<(i32, i32)>> {
        self.hood.inspect(|c| c.search_in_circle(radius, material))
    }

    /// Runs `generator` for the center if an open canvas lacks its
    /// drawing, then recurses into the neighbors `recursion_level` layers
    /// deep.
    ///
    /// Consumes the megacanvas; its canvases are back in `store` when this
    /// returns, whether or not it succeeded.
    ///
    /// # Errors
    ///
    /// Propagates generator and checkout errors.
    pub fn generate<G>(mut self, store: &mut CanvasStore, generator: &mut G, recursion_level: u32) -> GenResult<()>
    where
        G: RegionGenerator + ?Sized,
    {
        let center = self.center();
        let units = self.units;
        let was_complete = self.hood.center_entry().complete;

        let outcome = if self.lacks_center() {
            debug!(%center, recursion_level, "generating region");
            let result = generator.generate_region(&mut self);
            if result.is_ok() {
                for (region, entry) in self.hood.entries_mut().filter(|(_, e)| !e.complete) {
                    entry.meta.record(region, center);
                }
                if !was_complete {
                    self.hood.center_entry_mut().partial = true;
                }
            }
            result
        } else {
            Ok(())
        };

        let missing = self.hood.center_entry().meta.missing(center);
        self.release(store);
        outcome?;

        if recursion_level == 0 || was_complete {
            return Ok(());
        }
        for neighbor in center.neighbors() {
            let deeper = recursion_level > 1 && !store.is_complete(neighbor);
            if deeper || missing.contains(&neighbor) {
                Megacanvas::new(store, units, neighbor)?.generate(store, generator, recursion_level - 1)?;
            }
        }

        let finished = store.peek(center).is_some_and(|entry| entry.meta.is_full());
        if finished && store.mark_complete(center) {
            debug!(%center, "region complete");
            generator.region_completed(center)?;
        } else {
            warn!(%center, "region lost drawings to eviction before it could be completed");
        }
        Ok(())
    }

    /// Returns true if some canvas that is not complete still lacks the
    /// central region's drawing.
    fn lacks_center(&self) -> bool {
        let center = self.center();
        self.hood
            .entries()
            .any(|(region, entry)| !entry.complete && !entry.meta.contains(region, center))
    }
}

impl Surface for Megacanvas {
    fn set_cursor(&mut self, x: i32, z: i32) -> bool {
        let (ox, oz) = self.origin;
        self.set_cursor_absolute(ox + x, oz + z)
    }

    fn set_cursor_absolute(&mut self, x: i32, z: i32) -> bool {
        self.hood.broadcast_open_any(|c| c.set_cursor_absolute(x, z))
    }

    fn move_cursor(&mut self, dx: i32, dz: i32) -> bool {
        self.hood.broadcast_open_any(|c| c.move_cursor(dx, dz))
    }

    fn write_cell(&mut self, dx: i32, dz: i32, material: Material) -> bool {
        self.hood.broadcast_open_any(|c| c.write_cell(dx, dz, material))
    }

    fn draw_shape(&mut self, shape: &Shape) -> bool {
        self.hood.broadcast_open_any(|c| c.draw_shape(shape))
    }
}
