//! Vector and placement value types exchanged with the host.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Three-component single-precision vector.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vector3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vector3 {
    /// The zero vector.
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);

    /// Construct from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;

    fn mul(self, rhs: f32) -> Vector3 {
        Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Position plus orientation basis, as the host describes an entity.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PositionAndOrientation {
    /// World position.
    pub position: Vector3,
    /// Forward basis vector.
    pub forward: Vector3,
    /// Up basis vector.
    pub up: Vector3,
}

impl PositionAndOrientation {
    /// Construct from its three vectors.
    pub fn new(position: Vector3, forward: Vector3, up: Vector3) -> Self {
        Self {
            position,
            forward,
            up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(0.5, -2.0, 1.0);
        assert_eq!(a + b, Vector3::new(1.5, 0.0, 4.0));
        assert_eq!(a - b, Vector3::new(0.5, 4.0, 2.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn length_of_axis_vector() {
        assert_eq!(Vector3::new(0.0, 3.0, 4.0).length(), 5.0);
    }

    #[test]
    fn nan_is_not_finite() {
        assert!(!Vector3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(Vector3::ZERO.is_finite());
    }
}
