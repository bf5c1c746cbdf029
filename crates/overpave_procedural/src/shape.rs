//! Brush shapes: lists of cell offsets with a material, built once per
//! parameter set and shared afterwards.

use std::collections::HashMap;
use std::rc::Rc;

use crate::material::Material;

/// A list of `(dx, dz, material)` cell writes relative to the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    cells: Vec<(i32, i32, Material)>,
}

impl Shape {
    /// Builds a shape from raw cells.
    #[must_use]
    pub fn new(cells: Vec<(i32, i32, Material)>) -> Self {
        Self { cells }
    }

    /// Filled axis-aligned rectangle with its north-west corner on the cursor.
    #[must_use]
    pub fn rectangle(width: u32, depth: u32, material: Material) -> Self {
        let mut cells = Vec::with_capacity((width * depth) as usize);
        for dz in 0..depth as i32 {
            for dx in 0..width as i32 {
                cells.push((dx, dz, material));
            }
        }
        Self { cells }
    }

    /// Filled square centered on the cursor. Even sizes lean north-west.
    #[must_use]
    pub fn square(size: u32, material: Material) -> Self {
        let half = size as i32 / 2;
        let mut shape = Self::rectangle(size, size, material);
        for cell in &mut shape.cells {
            cell.0 -= half;
            cell.1 -= half;
        }
        shape
    }

    /// Filled disc of `radius` nodes centered on the cursor.
    #[must_use]
    pub fn circle(radius: u32, material: Material) -> Self {
        let r = radius as i32;
        let limit = r * r + r;
        let mut cells = Vec::new();
        for dz in -r..=r {
            for dx in -r..=r {
                if dx * dx + dz * dz <= limit {
                    cells.push((dx, dz, material));
                }
            }
        }
        Self { cells }
    }

    /// Cell writes in drawing order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[(i32, i32, Material)] {
        &self.cells
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true for a shape without cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ShapeKey {
    Rectangle(u32, u32, Material),
    Square(u32, Material),
    Circle(u32, Material),
}

/// Memoized shape generators, keyed by their parameters.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: HashMap<ShapeKey, Rc<Shape>>,
}

impl ShapeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_build(&mut self, key: ShapeKey) -> Rc<Shape> {
        let shape = self.shapes.entry(key).or_insert_with(|| {
            Rc::new(match key {
                ShapeKey::Rectangle(w, d, m) => Shape::rectangle(w, d, m),
                ShapeKey::Square(s, m) => Shape::square(s, m),
                ShapeKey::Circle(r, m) => Shape::circle(r, m),
            })
        });
        Rc::clone(shape)
    }

    /// Cached [`Shape::rectangle`].
    pub fn rectangle(&mut self, width: u32, depth: u32, material: Material) -> Rc<Shape> {
        self.get_or_build(ShapeKey::Rectangle(width, depth, material))
    }

    /// Cached [`Shape::square`].
    pub fn square(&mut self, size: u32, material: Material) -> Rc<Shape> {
        self.get_or_build(ShapeKey::Square(size, material))
    }

    /// Cached [`Shape::circle`].
    pub fn circle(&mut self, radius: u32, material: Material) -> Rc<Shape> {
        self.get_or_build(ShapeKey::Circle(radius, material))
    }

    /// Number of distinct shapes built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns true before the first shape is built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_and_square_extent() {
        let rect = Shape::rectangle(3, 2, Material::Asphalt);
        assert_eq!(rect.len(), 6);
        assert!(rect.cells().contains(&(2, 1, Material::Asphalt)));

        let square = Shape::square(3, Material::Margin);
        assert_eq!(square.len(), 9);
        assert!(square.cells().contains(&(-1, -1, Material::Margin)));
        assert!(square.cells().contains(&(1, 1, Material::Margin)));
    }

    #[test]
    fn test_circle_is_symmetric() {
        let circle = Shape::circle(3, Material::Gravel);
        for &(dx, dz, _) in circle.cells() {
            assert!(circle.cells().contains(&(-dx, dz, Material::Gravel)));
            assert!(circle.cells().contains(&(dz, dx, Material::Gravel)));
        }
        assert!(circle.cells().contains(&(3, 0, Material::Gravel)));
        assert!(!circle.cells().contains(&(3, 3, Material::Gravel)));
        assert_eq!(Shape::circle(0, Material::Gravel).len(), 1);
    }

    #[test]
    fn test_cache_reuses_shapes() {
        let mut cache = ShapeCache::new();
        let a = cache.circle(4, Material::Asphalt);
        let b = cache.circle(4, Material::Asphalt);
        assert!(Rc::ptr_eq(&a, &b));
        cache.circle(4, Material::Margin);
        cache.square(4, Material::Asphalt);
        assert_eq!(cache.len(), 3);
    }
}
