//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. Angles on game objects are stored in degrees and
//! converted at the physics and drawing boundaries; positive rotation is
//! clockwise because screen space has y pointing down.

pub use glam::{Affine2, Mat2, Vec2};

/// Degrees to radians.
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Radians to degrees.
pub fn rad_to_deg(radians: f32) -> f32 {
    radians.to_degrees()
}

/// Round to three decimal places.
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Round both components of a vector to three decimal places.
pub fn round3_vec(v: Vec2) -> Vec2 {
    Vec2::new(round3(v.x), round3(v.y))
}

/// An axis-aligned box described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    /// Box anchored at `min` (top-left corner).
    pub fn from_corner(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Box centered on `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            size,
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict interval overlap on both axes. Touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x + self.size.x > other.min.x
            && self.min.y + self.size.y > other.min.y
            && self.min.x < other.min.x + other.size.x
            && self.min.y < other.min.y + other.size.y
    }

    /// Strict containment: a point exactly on an edge is outside.
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x > self.min.x && point.y > self.min.y && point.x < max.x && point.y < max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round3_trims_float_noise() {
        assert_eq!(round3(6.123e-17), 0.0);
        assert_eq!(round3(0.99996), 1.0);
        assert_eq!(round3(-0.70710677), -0.707);
    }

    #[test]
    fn overlap_excludes_touching_edges() {
        let a = Aabb::from_corner(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_corner(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        let c = Aabb::from_corner(Vec2::new(9.0, 9.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn centered_box_contains_strictly() {
        let b = Aabb::from_center(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0));
        assert!(b.contains(Vec2::new(100.0, 100.0)));
        assert!(b.contains(Vec2::new(76.0, 100.0)));
        assert!(!b.contains(Vec2::new(75.0, 100.0)));
        assert!(!b.contains(Vec2::new(125.0, 100.0)));
    }
}
