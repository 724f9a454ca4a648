use crate::core::ParticleGroupHandle;
use crate::math::{Color, Vector2};
use crate::particles::ParticleFlags;

/// Describes a single particle to create
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDef {
    /// Behaviour flags, already combined
    pub flags: ParticleFlags,

    /// World position
    pub position: Vector2,

    /// Linear velocity
    pub velocity: Vector2,

    /// Color in unit-interval channels; the engine stores bytes, so it is
    /// truncated to the nearest lower 1/255 step
    pub color: Color,

    /// Seconds until the particle is destroyed by age, `<= 0` to live forever
    pub lifetime: f32,

    /// Group to add the particle to
    pub group: Option<ParticleGroupHandle>,
}

impl Default for ParticleDef {
    fn default() -> Self {
        Self {
            flags: ParticleFlags::WATER,
            position: Vector2::zero(),
            velocity: Vector2::zero(),
            color: Color::TRANSPARENT,
            lifetime: 0.0,
            group: None,
        }
    }
}

impl ParticleDef {
    /// Creates a water particle at the given position
    pub fn at(position: Vector2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Replaces the flags with the union of `flags`
    pub fn with_flags<I: IntoIterator<Item = ParticleFlags>>(mut self, flags: I) -> Self {
        self.flags = flags.into_iter().collect();
        self
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn in_group(mut self, group: ParticleGroupHandle) -> Self {
        self.group = Some(group);
        self
    }
}
