// animation/mod.rs - Pose interpolation primitives for the car

pub mod tween;

pub use tween::*;

use serde::{Deserialize, Serialize};

// ============================================================================
// PLAYBACK STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Finished,
}

// ============================================================================
// CORE MATH TYPES
// ============================================================================

/// World-space vector. Y is up; the maze lies on the XZ plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Unit vector on the XZ plane for a yaw measured clockwise from +Z.
    #[inline]
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        let (sin, cos) = yaw.to_radians().sin_cos();
        Self::new(sin, 0.0, cos)
    }

    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ============================================================================
// HEADING
// ============================================================================

/// Yaw angle in degrees, normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading(f32);

impl Heading {
    #[inline]
    pub fn new(degrees: f32) -> Self {
        Self(degrees.rem_euclid(360.0))
    }

    #[inline]
    pub fn degrees(self) -> f32 {
        self.0
    }

    /// Signed shortest rotation from `self` to `target`, in `[-180, 180)`.
    #[inline]
    pub fn shortest_delta(self, target: Heading) -> f32 {
        (target.0 - self.0 + 180.0).rem_euclid(360.0) - 180.0
    }
}

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_normalizes() {
        assert_eq!(Heading::new(-90.0).degrees(), 270.0);
        assert_eq!(Heading::new(450.0).degrees(), 90.0);
    }

    #[test]
    fn test_shortest_delta_crosses_zero() {
        assert_eq!(Heading::new(270.0).shortest_delta(Heading::new(0.0)), 90.0);
        assert_eq!(Heading::new(0.0).shortest_delta(Heading::new(270.0)), -90.0);
        assert_eq!(Heading::new(90.0).shortest_delta(Heading::new(180.0)), 90.0);
    }

    #[test]
    fn test_yaw_vectors() {
        let forward = Vec3::from_yaw_degrees(0.0);
        assert!((forward.z - 1.0).abs() < 1e-6 && forward.x.abs() < 1e-6);
        let right = Vec3::from_yaw_degrees(90.0);
        assert!((right.x - 1.0).abs() < 1e-6 && right.z.abs() < 1e-6);
    }
}
