use crate::math::Vector2;
use nalgebra as na;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A 2D rotation stored as sine/cosine of the angle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Rotation2 {
    /// Sine of the angle
    pub s: f32,

    /// Cosine of the angle
    pub c: f32,
}

impl Rotation2 {
    /// Creates a rotation from an angle in radians
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    /// The identity rotation
    #[inline]
    pub fn identity() -> Self {
        Self { s: 0.0, c: 1.0 }
    }

    /// Returns the angle in radians, in the range [-PI, PI]
    #[inline]
    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    /// Rotates a vector
    #[inline]
    pub fn rotate(&self, v: Vector2) -> Vector2 {
        Vector2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Rotates a vector by the inverse of this rotation
    #[inline]
    pub fn inverse_rotate(&self, v: Vector2) -> Vector2 {
        Vector2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }
}

impl Default for Rotation2 {
    fn default() -> Self {
        Self::identity()
    }
}

/// A rigid 2D transform: translation plus rotation, no scale
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform2 {
    /// Translation
    pub position: Vector2,

    /// Rotation
    pub rotation: Rotation2,
}

impl Transform2 {
    /// Creates a transform from a position and an angle in radians
    #[inline]
    pub fn new(position: Vector2, angle: f32) -> Self {
        Self {
            position,
            rotation: Rotation2::from_angle(angle),
        }
    }

    /// The identity transform
    #[inline]
    pub fn identity() -> Self {
        Self {
            position: Vector2::zero(),
            rotation: Rotation2::identity(),
        }
    }

    /// Creates a transform from just a position
    #[inline]
    pub fn from_position(position: Vector2) -> Self {
        Self {
            position,
            rotation: Rotation2::identity(),
        }
    }

    /// Returns the rotation angle in radians
    #[inline]
    pub fn get_angle(&self) -> f32 {
        self.rotation.angle()
    }

    /// Maps a point from local space to world space
    #[inline]
    pub fn transform_point(&self, point: Vector2) -> Vector2 {
        self.rotation.rotate(point) + self.position
    }

    /// Maps a point from world space into the local space of this transform
    #[inline]
    pub fn inverse_transform_point(&self, point: Vector2) -> Vector2 {
        self.rotation.inverse_rotate(point - self.position)
    }

    /// Converts to a nalgebra isometry
    pub fn to_nalgebra(&self) -> na::Isometry2<f32> {
        na::Isometry2::new(self.position.to_nalgebra(), self.get_angle())
    }

    /// Converts from a nalgebra isometry
    pub fn from_nalgebra(iso: &na::Isometry2<f32>) -> Self {
        Self::new(
            Vector2::from_nalgebra(&iso.translation.vector),
            iso.rotation.angle(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn inverse_undoes_transform() {
        let xf = Transform2::new(Vector2::new(3.0, -1.0), 0.7);
        let p = Vector2::new(0.25, 4.0);
        let back = xf.inverse_transform_point(xf.transform_point(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
    }

    #[test]
    fn matches_nalgebra_isometry() {
        let xf = Transform2::new(Vector2::new(1.0, 2.0), FRAC_PI_2);
        let p = Vector2::new(1.0, 0.0);
        let ours = xf.transform_point(p);
        let theirs = xf.to_nalgebra() * na::Point2::new(1.0, 0.0);
        assert_relative_eq!(ours.x, theirs.x, epsilon = 1e-5);
        assert_relative_eq!(ours.y, theirs.y, epsilon = 1e-5);

        let round = Transform2::from_nalgebra(&xf.to_nalgebra());
        assert_relative_eq!(round.get_angle(), FRAC_PI_2, epsilon = 1e-5);
    }
}
