use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Configuration parameters for a world
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    /// The fixed time step for the simulation
    pub time_step: f32,

    /// The maximum number of substeps one call to `World::step` may run
    pub max_substeps: u32,

    /// Gravity applied to every particle system, scaled per system
    pub gravity: Vector2,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            max_substeps: 10,
            gravity: Vector2::new(0.0, -10.0),
        }
    }
}

/// Construction parameters of a particle system
///
/// The tuning coefficients are fixed once the system exists. Radius, density,
/// gravity scale, max count and damping have setters on the system itself.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ParticleSystemDef {
    /// Enable strict particle/body contact check
    pub strict_contact_check: bool,

    /// Particle density, applied right after creation
    pub density: f32,

    /// Scale applied to the world's gravity for this system
    pub gravity_scale: f32,

    /// Particle radius
    pub radius: f32,

    /// Maximum number of particles, 0 means unlimited
    pub max_count: usize,

    /// Increases pressure in response to compression
    pub pressure_strength: f32,

    /// Reduces velocity along the collision normal
    pub damping_strength: f32,

    /// Restores shape of elastic particle groups
    pub elastic_strength: f32,

    /// Restores length of spring particle groups
    pub spring_strength: f32,

    /// Reduces relative velocity of viscous particles
    pub viscous_strength: f32,

    /// Produces pressure on tensile particles
    pub surface_tension_pressure_strength: f32,

    /// Smoothes outline of tensile particles
    pub surface_tension_normal_strength: f32,

    /// Produces additional pressure on repulsive particles
    pub repulsive_strength: f32,

    /// Produces repulsion between powder particles
    pub powder_strength: f32,

    /// Pushes particles out of solid particle groups
    pub ejection_strength: f32,

    /// Produces static pressure
    pub static_pressure_strength: f32,

    /// Reduces instability in static pressure calculation
    pub static_pressure_relaxation: f32,

    /// Computes static pressure more precisely
    pub static_pressure_iterations: i32,

    /// Determines how fast colors are mixed
    pub color_mixing_strength: f32,

    /// Whether particles with a finite lifetime are destroyed when it runs out
    pub destroy_by_age: bool,

    /// Granularity of particle lifetimes in seconds
    pub lifetime_granularity: f32,
}

impl Default for ParticleSystemDef {
    fn default() -> Self {
        Self {
            strict_contact_check: false,
            density: 1.0,
            gravity_scale: 1.0,
            radius: 1.0,
            max_count: 0,
            pressure_strength: 0.05,
            damping_strength: 1.0,
            elastic_strength: 0.25,
            spring_strength: 0.25,
            viscous_strength: 0.25,
            surface_tension_pressure_strength: 0.2,
            surface_tension_normal_strength: 0.2,
            repulsive_strength: 1.0,
            powder_strength: 0.5,
            ejection_strength: 0.5,
            static_pressure_strength: 0.2,
            static_pressure_relaxation: 0.2,
            static_pressure_iterations: 8,
            color_mixing_strength: 0.5,
            destroy_by_age: true,
            lifetime_granularity: 1.0 / 60.0,
        }
    }
}

impl ParticleSystemDef {
    /// Creates a definition with default coefficients and the given radius
    pub fn with_radius(radius: f32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }
}
