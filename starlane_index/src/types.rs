// Copyright 2026 the Starlane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

/// A position in 3D space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Coord3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Coord3 {
    /// The origin `(0, 0, 0)`.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a coordinate from its components.
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance to another coordinate.
    #[inline]
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    pub(crate) fn axis(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Whether any component is NaN.
    #[inline]
    pub fn is_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

impl From<[f64; 3]> for Coord3 {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Coord3> for [f64; 3] {
    #[inline]
    fn from(c: Coord3) -> Self {
        [c.x, c.y, c.z]
    }
}

/// Axis-aligned box in 3D.
///
/// Boxes are half-open on every axis: a coordinate equal to `min` is inside,
/// a coordinate equal to `max` is outside. Two boxes sharing a face therefore
/// never both contain a point on that face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3D {
    /// Inclusive lower corner.
    pub min: Coord3,
    /// Exclusive upper corner.
    pub max: Coord3,
}

impl Aabb3D {
    /// Create a new box from min/max corners.
    #[inline(always)]
    pub const fn new(min: Coord3, max: Coord3) -> Self {
        Self { min, max }
    }

    /// Whether this box contains the point.
    #[inline]
    pub fn contains(&self, p: Coord3) -> bool {
        self.min.x <= p.x
            && p.x < self.max.x
            && self.min.y <= p.y
            && p.y < self.max.y
            && self.min.z <= p.z
            && p.z < self.max.z
    }

    /// Return true if the box is empty or inverted (no volume). Assumes no NaN.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y || self.max.z <= self.min.z
    }

    /// The smallest box containing every point within `radius` of `center`.
    ///
    /// The upper bound is nudged past `center + radius` so that points exactly on the
    /// sphere's far side are still inside the half-open box.
    #[inline]
    pub fn around(center: Coord3, radius: f64) -> Self {
        let hi = |v: f64| (v + radius).next_up();
        Self {
            min: Coord3::new(center.x - radius, center.y - radius, center.z - radius),
            max: Coord3::new(hi(center.x), hi(center.y), hi(center.z)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb3D, Coord3};

    #[test]
    fn distance_sq_is_symmetric() {
        let a = Coord3::new(1.0, 2.0, 3.0);
        let b = Coord3::new(4.0, 6.0, 3.0);
        assert_eq!(a.distance_sq(b), 25.0);
        assert_eq!(b.distance_sq(a), 25.0);
        assert_eq!(a.distance_sq(a), 0.0);
    }

    #[test]
    fn box_is_half_open() {
        let b = Aabb3D::new(Coord3::new(0.0, 0.0, 0.0), Coord3::new(10.0, 10.0, 10.0));
        assert!(b.contains(Coord3::new(0.0, 0.0, 0.0)));
        assert!(b.contains(Coord3::new(9.999, 5.0, 5.0)));
        assert!(!b.contains(Coord3::new(10.0, 5.0, 5.0)));
        assert!(!b.contains(Coord3::new(5.0, -0.001, 5.0)));
        assert!(!b.is_empty());

        let flat = Aabb3D::new(Coord3::new(0.0, 0.0, 0.0), Coord3::new(10.0, 0.0, 10.0));
        assert!(flat.is_empty());
    }

    #[test]
    fn around_includes_far_surface() {
        let c = Coord3::new(1.0, 1.0, 1.0);
        let b = Aabb3D::around(c, 2.0);
        assert!(b.contains(Coord3::new(3.0, 1.0, 1.0)));
        assert!(b.contains(Coord3::new(-1.0, 1.0, 1.0)));
        assert!(!b.contains(Coord3::new(3.5, 1.0, 1.0)));
    }
}
