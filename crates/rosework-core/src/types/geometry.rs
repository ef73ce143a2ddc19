//! Lathe-plane geometry primitives.
//!
//! All cutter geometry lives in the XZ half-plane and is revolved around Z;
//! there is deliberately no Y coordinate. Spindle angles are degrees.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Axis snap threshold. Perpendicular/tangent components smaller than this
/// are forced to exactly `0.0` so that `-0.0` never propagates into
/// direction sign tests.
pub const AXIS_EPSILON: f64 = 1e-12;

/// Unique identifier for a rosette, variant, or other core entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a new unique entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ent({})", &self.0.to_string()[..8])
    }
}

/// A point (or free vector) in the lathe XZ half-plane.
///
/// X is radial distance from the spindle axis, Z is axial position along it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LathePoint {
    /// Radial coordinate (distance from the spindle axis).
    pub x: f64,
    /// Axial coordinate (along the spindle axis).
    pub z: f64,
}

impl LathePoint {
    /// Create a new point.
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// The origin of the lathe plane.
    pub fn origin() -> Self {
        Self { x: 0.0, z: 0.0 }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &LathePoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    /// Vector length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or the zero vector when the
    /// length is below [`AXIS_EPSILON`].
    pub fn normalized(&self) -> LathePoint {
        let len = self.length();
        if len < AXIS_EPSILON {
            LathePoint::origin()
        } else {
            LathePoint::new(self.x / len, self.z / len).snapped()
        }
    }

    /// Scale both components.
    pub fn scaled(&self, factor: f64) -> LathePoint {
        LathePoint::new(self.x * factor, self.z * factor)
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &LathePoint) -> f64 {
        self.x * other.x + self.z * other.z
    }

    /// The vector rotated by `degrees` within the lathe plane
    /// (positive rotates X toward Z).
    pub fn rotated(&self, degrees: f64) -> LathePoint {
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        LathePoint::new(self.x * cos - self.z * sin, self.x * sin + self.z * cos).snapped()
    }

    /// Perpendicular vector (90 degrees counter-clockwise in the plane).
    pub fn perp(&self) -> LathePoint {
        LathePoint::new(-self.z, self.x)
    }

    /// Both components passed through [`snap_zero`].
    pub fn snapped(&self) -> LathePoint {
        LathePoint::new(snap_zero(self.x), snap_zero(self.z))
    }
}

impl std::ops::Add for LathePoint {
    type Output = LathePoint;
    fn add(self, rhs: LathePoint) -> LathePoint {
        LathePoint::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl std::ops::Sub for LathePoint {
    type Output = LathePoint;
    fn sub(self, rhs: LathePoint) -> LathePoint {
        LathePoint::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl std::ops::Neg for LathePoint {
    type Output = LathePoint;
    fn neg(self) -> LathePoint {
        LathePoint::new(-self.x, -self.z)
    }
}

/// Normalize an angle in degrees into `[0, 360)` by repeated ±360
/// adjustment. Idempotent; non-finite inputs come back unchanged.
pub fn angle_check(mut degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return degrees;
    }
    while degrees < 0.0 {
        degrees += 360.0;
    }
    while degrees >= 360.0 {
        degrees -= 360.0;
    }
    degrees
}

/// Snap values within [`AXIS_EPSILON`] of zero to exactly `0.0`.
pub fn snap_zero(value: f64) -> f64 {
    if value.abs() < AXIS_EPSILON {
        0.0
    } else {
        value
    }
}

/// Spindle rotation direction policy for a pass plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationPolicy {
    /// All passes sweep 0 -> 360.
    Forward,
    /// All passes sweep 360 -> 0.
    Reverse,
    /// Forward passes, with the final pass reversed to cancel accumulated
    /// backlash.
    ReverseLastPass,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy::ReverseLastPass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_check_wraps() {
        assert_eq!(angle_check(-30.0), 330.0);
        assert_eq!(angle_check(725.0), 5.0);
        assert_eq!(angle_check(0.0), 0.0);
        assert_eq!(angle_check(360.0), 0.0);
        assert_eq!(angle_check(-720.0), 0.0);
    }

    #[test]
    fn test_angle_check_idempotent() {
        for a in [-1000.0, -30.0, 0.0, 45.0, 359.999, 360.0, 725.0] {
            let once = angle_check(a);
            assert_eq!(angle_check(once), once);
            assert!((0.0..360.0).contains(&once));
        }
    }

    #[test]
    fn test_snap_zero() {
        assert_eq!(snap_zero(1e-13), 0.0);
        assert_eq!(snap_zero(-1e-13), 0.0);
        assert!(snap_zero(-1e-13).is_sign_positive());
        assert_eq!(snap_zero(1e-6), 1e-6);
    }

    #[test]
    fn test_rotated_quarter_turn() {
        let v = LathePoint::new(1.0, 0.0);
        let r = v.rotated(90.0);
        assert!((r.x - 0.0).abs() < 1e-9);
        assert!((r.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_degenerate() {
        let v = LathePoint::new(1e-15, -1e-15);
        assert_eq!(v.normalized(), LathePoint::origin());
    }

    #[test]
    fn test_distance() {
        let a = LathePoint::new(0.0, 0.0);
        let b = LathePoint::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
