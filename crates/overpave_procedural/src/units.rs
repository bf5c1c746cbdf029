//! # Units
//!
//! Tile and region arithmetic in node coordinates.
//!
//! A **tile** is the cube the host engine asks for at once; a **region**
//! is `region_tiles x region_tiles` tiles and is the unit of road
//! generation and caching. Only the horizontal plane matters here.

use std::fmt;

use overpave_core::Vec3;

use crate::error::ConfigError;

/// Region coordinate (identifies a region in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    /// X coordinate (in regions, not nodes).
    pub x: i32,
    /// Z coordinate (in regions, not nodes).
    pub z: i32,
}

impl RegionCoord {
    /// Creates a new region coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Stable spatial hash of this region.
    ///
    /// Packs both coordinates into one `u64`; equal regions always hash
    /// equally across runs and platforms.
    #[inline]
    #[must_use]
    pub const fn spatial_hash(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.z as u32 as u64)
    }

    /// Offsets this coordinate by whole regions.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The 8 planar neighbors, row by row from the north-west corner.
    #[must_use]
    pub fn neighbors(self) -> [Self; 8] {
        [
            self.offset(-1, -1),
            self.offset(0, -1),
            self.offset(1, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(-1, 1),
            self.offset(0, 1),
            self.offset(1, 1),
        ]
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Tile/region conversions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Units {
    tile_size: i32,
    region_tiles: i32,
}

impl Units {
    /// Creates the unit system.
    ///
    /// # Errors
    ///
    /// Returns an error unless both sizes are positive.
    pub fn new(tile_size: i32, region_tiles: i32) -> Result<Self, ConfigError> {
        if tile_size <= 0 {
            return Err(ConfigError::invalid("tile_size", format!("must be positive, got {tile_size}")));
        }
        if region_tiles <= 0 {
            return Err(ConfigError::invalid("region_tiles", format!("must be positive, got {region_tiles}")));
        }
        Ok(Self { tile_size, region_tiles })
    }

    /// Tile edge length in nodes.
    #[inline]
    #[must_use]
    pub const fn tile_size(self) -> i32 {
        self.tile_size
    }

    /// Tiles per region edge.
    #[inline]
    #[must_use]
    pub const fn region_tiles(self) -> i32 {
        self.region_tiles
    }

    /// Region edge length in nodes.
    #[inline]
    #[must_use]
    pub const fn region_size(self) -> i32 {
        self.tile_size * self.region_tiles
    }

    /// Overgeneration margin in nodes: two tiles, or one tile when a region
    /// is fewer than four tiles across.
    #[inline]
    #[must_use]
    pub const fn margin(self) -> i32 {
        if self.region_tiles < 4 {
            self.tile_size
        } else {
            self.tile_size * 2
        }
    }

    /// Region containing node `(x, z)`.
    #[inline]
    #[must_use]
    pub const fn region_of_node(self, x: i32, z: i32) -> RegionCoord {
        let size = self.region_size();
        RegionCoord::new(x.div_euclid(size), z.div_euclid(size))
    }

    /// Region containing `pos`.
    #[must_use]
    pub fn region_of(self, pos: Vec3) -> RegionCoord {
        self.region_of_node(pos.x.floor() as i32, pos.z.floor() as i32)
    }

    /// Region containing tile `(tx, tz)` (in tile units).
    #[inline]
    #[must_use]
    pub const fn tile_to_region(self, tx: i32, tz: i32) -> RegionCoord {
        RegionCoord::new(tx.div_euclid(self.region_tiles), tz.div_euclid(self.region_tiles))
    }

    /// Node coordinates of the north-west corner of the tile containing `pos`.
    #[must_use]
    pub fn tile_origin(self, pos: Vec3) -> (i32, i32) {
        let x = (pos.x.floor() as i32).div_euclid(self.tile_size) * self.tile_size;
        let z = (pos.z.floor() as i32).div_euclid(self.tile_size) * self.tile_size;
        (x, z)
    }

    /// Node coordinates of the region's north-west corner.
    #[inline]
    #[must_use]
    pub const fn region_origin(self, region: RegionCoord) -> (i32, i32) {
        let size = self.region_size();
        (region.x * size, region.z * size)
    }

    /// Node coordinates of the region's last node (south-east corner).
    #[inline]
    #[must_use]
    pub const fn region_terminus(self, region: RegionCoord) -> (i32, i32) {
        let (x, z) = self.region_origin(region);
        let size = self.region_size();
        (x + size - 1, z + size - 1)
    }

    /// Origins of the region's 8 planar neighbors, in
    /// [`RegionCoord::neighbors`] order.
    #[must_use]
    pub fn neighbor_origins(self, region: RegionCoord) -> [(i32, i32); 8] {
        region.neighbors().map(|n| self.region_origin(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> Units {
        Units::new(80, 10).unwrap()
    }

    #[test]
    fn test_region_from_nodes() {
        let u = units();
        assert_eq!(u.region_of_node(0, 0), RegionCoord::new(0, 0));
        assert_eq!(u.region_of_node(799, 799), RegionCoord::new(0, 0));
        assert_eq!(u.region_of_node(800, 0), RegionCoord::new(1, 0));
        assert_eq!(u.region_of_node(-1, -800), RegionCoord::new(-1, -1));
        assert_eq!(u.region_of_node(-801, 0), RegionCoord::new(-2, 0));
        assert_eq!(u.region_of(Vec3::new(-0.5, 12.0, 400.0)), RegionCoord::new(-1, 0));
    }

    #[test]
    fn test_origin_terminus_and_tiles() {
        let u = units();
        let r = RegionCoord::new(-1, 2);
        assert_eq!(u.region_origin(r), (-800, 1600));
        assert_eq!(u.region_terminus(r), (-1, 2399));
        assert_eq!(u.tile_to_region(-1, 19), RegionCoord::new(-1, 1));
        assert_eq!(u.tile_origin(Vec3::new(-1.0, 0.0, 161.0)), (-80, 160));
    }

    #[test]
    fn test_margin_depends_on_region_size() {
        assert_eq!(units().margin(), 160);
        assert_eq!(Units::new(80, 3).unwrap().margin(), 80);
        assert!(Units::new(0, 10).is_err());
    }

    #[test]
    fn test_neighbors_and_hash() {
        let r = RegionCoord::new(0, 0);
        let n = r.neighbors();
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&r));
        assert_eq!(units().neighbor_origins(r)[0], (-800, -800));

        assert_ne!(RegionCoord::new(1, 0).spatial_hash(), RegionCoord::new(0, 1).spatial_hash());
        assert_ne!(RegionCoord::new(-1, 0).spatial_hash(), RegionCoord::new(0, -1).spatial_hash());
    }
}
