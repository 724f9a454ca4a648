use std::sync::Arc;

use crate::core::ParticleGroupHandle;
use crate::math::{Color, Vector2};
use crate::particles::{ParticleFlags, ParticleGroupFlags};
use crate::shapes::Shape;

/// Describes a particle group to create, or particles to append to an
/// existing group
///
/// Particles are placed either by filling `shape` on a grid of `stride`
/// spacing or, when `position_data` is set, at those positions instead. Both
/// are in group-local space and mapped through `position` and `angle`.
#[derive(Debug, Clone)]
pub struct ParticleGroupDef {
    /// Flags given to every particle of the group
    pub flags: ParticleFlags,

    /// Flags of the group itself
    pub group_flags: ParticleGroupFlags,

    pub position: Vector2,
    pub angle: f32,
    pub linear_velocity: Vector2,
    pub angular_velocity: f32,

    /// Color given to every particle of the group
    pub color: Color,

    /// Cohesion of rigid and elastic groups
    pub strength: f32,

    /// Region to fill with particles
    pub shape: Option<Arc<dyn Shape>>,

    /// Grid spacing of the fill; 0 uses the engine default of 0.75 diameters
    pub stride: f32,

    /// Upper bound on particles placed by the fill; 0 fills the whole shape
    pub particle_count: usize,

    /// Explicit local positions, replacing the shape fill
    pub position_data: Option<Vec<Vector2>>,

    /// Lifetime of every particle of the group, `<= 0` to live forever
    pub lifetime: f32,

    /// Existing group to append the particles to
    pub group: Option<ParticleGroupHandle>,
}

impl Default for ParticleGroupDef {
    fn default() -> Self {
        Self {
            flags: ParticleFlags::WATER,
            group_flags: ParticleGroupFlags::empty(),
            position: Vector2::zero(),
            angle: 0.0,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            color: Color::TRANSPARENT,
            strength: 1.0,
            shape: None,
            stride: 0.0,
            particle_count: 0,
            position_data: None,
            lifetime: 0.0,
            group: None,
        }
    }
}

impl ParticleGroupDef {
    /// A group filling the given shape
    pub fn from_shape<S: Shape>(shape: S) -> Self {
        Self {
            shape: Some(Arc::new(shape)),
            ..Self::default()
        }
    }

    /// A group with particles at exactly the given local positions
    pub fn from_positions(positions: Vec<Vector2>) -> Self {
        Self {
            position_data: Some(positions),
            ..Self::default()
        }
    }

    /// Replaces the particle flags with the union of `flags`
    pub fn with_flags<I: IntoIterator<Item = ParticleFlags>>(mut self, flags: I) -> Self {
        self.flags = flags.into_iter().collect();
        self
    }

    /// Replaces the group flags with the union of `flags`
    pub fn with_group_flags<I>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = ParticleGroupFlags>,
    {
        self.group_flags = flags.into_iter().collect();
        self
    }

    pub fn with_transform(mut self, position: Vector2, angle: f32) -> Self {
        self.position = position;
        self.angle = angle;
        self
    }

    pub fn with_stride(mut self, stride: f32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Appends to `group` instead of creating a new one
    pub fn extending(mut self, group: ParticleGroupHandle) -> Self {
        self.group = Some(group);
        self
    }
}
