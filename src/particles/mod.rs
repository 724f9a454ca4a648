//! Particle-facing API: flags, definitions, per-system buffer caches and the
//! checked [`ParticleSystem`] view.

mod flags;
mod particle;
mod group;
mod buffers;
mod system;

pub use self::flags::{
    combine_group_flags, combine_particle_flags, ParticleFlags, ParticleGroupFlags,
};
pub use self::particle::ParticleDef;
pub use self::group::ParticleGroupDef;
pub use self::buffers::ParticleBuffers;
pub use self::system::ParticleSystem;
