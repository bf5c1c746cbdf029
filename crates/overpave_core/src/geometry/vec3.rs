//! Positions and directions.
//!
//! `y` is the vertical axis. Everything the generator decides about
//! collisions and spacing happens in the horizontal `x`/`z` plane; `y` is
//! carried along and interpolated into results.

use serde::{Deserialize, Serialize};

/// 3D vector - positions and planar directions
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (east)
    pub x: f64,
    /// Y component (up)
    pub y: f64,
    /// Z component (south)
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Creates from integer node coordinates
    #[must_use]
    pub fn from_nodes(x: i32, y: i32, z: i32) -> Self {
        Self::new(f64::from(x), f64::from(y), f64::from(z))
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Dot product of the horizontal projections
    #[must_use]
    pub fn flat_dot(self, other: Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    /// Planar cross product (the y component of `self x other` with y dropped)
    #[must_use]
    pub fn flat_cross(self, other: Self) -> f64 {
        self.x * other.z - self.z * other.x
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Length of the horizontal projection
    #[must_use]
    pub fn flat_length(self) -> f64 {
        self.flat_dot(self).sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Horizontal distance to another point
    #[must_use]
    pub fn flat_distance(self, other: Self) -> f64 {
        (self - other).flat_length()
    }

    /// Same vector with the vertical component dropped
    #[must_use]
    pub const fn flat(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Horizontal unit direction, or zero for a vertical/zero vector
    #[must_use]
    pub fn normalized_flat(self) -> Self {
        let len = self.flat_length();
        if len <= f64::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, 0.0, self.z / len)
        }
    }

    /// Horizontal perpendicular, rotated a quarter turn counter-clockwise
    /// when looking down the y axis.
    #[must_use]
    pub const fn perpendicular_flat(self) -> Self {
        Self::new(-self.z, 0.0, self.x)
    }

    /// Linear interpolation, `t = 0` is `self`
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Rounds every component to the nearest node
    #[must_use]
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.z.round())
    }

    /// Returns true when both horizontal coordinates match within `tolerance`
    #[must_use]
    pub fn flat_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.z - other.z).abs() <= tolerance
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(a.flat_dot(b), 22.0);
    }

    #[test]
    fn test_flat_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 100.0, 4.0);
        assert_eq!(a.flat_distance(b), 5.0);
        assert!(a.distance(b) > 100.0);
    }

    #[test]
    fn test_perpendicular_is_orthogonal() {
        let d = Vec3::new(3.0, 0.0, -2.0);
        assert_eq!(d.flat_dot(d.perpendicular_flat()), 0.0);
        assert_eq!(Vec3::ZERO.normalized_flat(), Vec3::ZERO);
    }
}
