use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

bitflags! {
    /// Per-particle behaviour flags, bit-compatible with the engine's flag word
    ///
    /// Flags combine by bitwise OR. Collecting an iterator of flags yields their
    /// union and an empty iterator yields [`ParticleFlags::WATER`], the zero word.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct ParticleFlags: u32 {
        /// Water particle (the zero flag word)
        const WATER = 0;

        /// Removed on the next step
        const ZOMBIE = 1 << 1;

        /// Zero velocity
        const WALL = 1 << 2;

        /// With restitution from stretching
        const SPRING = 1 << 3;

        /// With restitution from deformation
        const ELASTIC = 1 << 4;

        /// With viscosity
        const VISCOUS = 1 << 5;

        /// Without isotropic pressure
        const POWDER = 1 << 6;

        /// With surface tension
        const TENSILE = 1 << 7;

        /// Mix color between contacting particles
        const COLOR_MIXING = 1 << 8;

        /// Call the destruction listener on destruction
        const DESTRUCTION_LISTENER = 1 << 9;

        /// Prevents other particles from leaking
        const BARRIER = 1 << 10;

        /// Less compressibility
        const STATIC_PRESSURE = 1 << 11;

        /// Makes pairs or triads with other particles
        const REACTIVE = 1 << 12;

        /// With high repulsive force
        const REPULSIVE = 1 << 13;

        /// Report contacts with fixtures
        const FIXTURE_CONTACT_LISTENER = 1 << 14;

        /// Report contacts with other particles
        const PARTICLE_CONTACT_LISTENER = 1 << 15;

        /// Filter contacts with fixtures
        const FIXTURE_CONTACT_FILTER = 1 << 16;

        /// Filter contacts with other particles
        const PARTICLE_CONTACT_FILTER = 1 << 17;
    }
}

bitflags! {
    /// Flags of a particle group
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct ParticleGroupFlags: u32 {
        /// Prevents overlapping or leaking
        const SOLID = 1 << 0;

        /// Keeps its shape
        const RIGID = 1 << 1;

        /// Survives when all of its particles are gone
        const CAN_BE_EMPTY = 1 << 2;

        /// Destroyed on the next step
        const WILL_BE_DESTROYED = 1 << 3;

        /// Depth needs recomputing
        const NEEDS_UPDATE_DEPTH = 1 << 4;
    }
}

/// ORs a set of particle flags into one flag word; 0 for an empty set
pub fn combine_particle_flags<I>(flags: I) -> u32
where
    I: IntoIterator<Item = ParticleFlags>,
{
    flags.into_iter().collect::<ParticleFlags>().bits()
}

/// ORs a set of group flags into one flag word; 0 for an empty set
pub fn combine_group_flags<I>(flags: I) -> u32
where
    I: IntoIterator<Item = ParticleGroupFlags>,
{
    flags.into_iter().collect::<ParticleGroupFlags>().bits()
}
