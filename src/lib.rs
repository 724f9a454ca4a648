pub mod math;
pub mod core;
pub mod shapes;
pub mod particles;
pub mod engine;

/// Re-export common types for easier usage
pub use crate::core::{
    World, WorldConfig, ParticleSystemDef, ParticleSystemHandle, ParticleGroupHandle, SharedWorld,
    DestructionListener, DestroyedParticle, WorldEvent, WorldEventType,
};
pub use crate::particles::{
    ParticleSystem, ParticleDef, ParticleGroupDef, ParticleFlags, ParticleGroupFlags,
};
pub use crate::engine::{ParticleEngine, SoftwareEngine, NativeAddr};
pub use crate::math::{Vector2, Transform2, Color, ColorChannel, ParticleColor};
pub use crate::shapes::{Shape, CircleShape, PolygonShape};
pub use crate::error::ParticleError;

/// Error types for the binding layer
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum ParticleError {
        /// The handle was never issued by this world
        #[error("Invalid {kind} handle")]
        InvalidHandle { kind: &'static str },

        /// The handle was issued by this world but its object has since been destroyed
        #[error("{kind} handle used after it was destroyed")]
        UseAfterFree { kind: &'static str },

        #[error("Particle capacity exceeded: {live} live particles, maximum {max}")]
        CapacityExceeded { live: usize, max: usize },

        #[error("Particle index {index} out of range for {count} live particles")]
        IndexOutOfRange { index: usize, count: usize },

        #[error("`{0}` is not allowed while the world is locked in a callback")]
        InvalidOperationInCallback(&'static str),

        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),
    }
}

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, error::ParticleError>;

/// Binding version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
