mod vector;
mod transform;
mod aabb;
mod color;

pub use vector::Vector2;
pub use transform::{Rotation2, Transform2};
pub use aabb::Aabb2;
pub use color::{Color, ColorChannel, ParticleColor, byte_to_unit, unit_to_byte};

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}
