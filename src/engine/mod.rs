//! The native side of the binding.
//!
//! Every call passes an opaque [`NativeAddr`] plus primitive arguments and gets
//! primitives or flat buffers back, the same shape as an FFI boundary. The
//! engine does no handle checking of its own: unknown addresses yield zeros or
//! empty buffers. Callers go through [`crate::World`], which validates handles
//! before anything crosses.

mod software;

pub use self::software::SoftwareEngine;

use crate::core::ParticleSystemDef;
use crate::math::{ColorChannel, ParticleColor, Transform2, Vector2};
use crate::shapes::Shape;

/// Sentinel returned by `create_particle` when no particle was created
pub const INVALID_PARTICLE_INDEX: i32 = -1;

/// An opaque engine-side address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NativeAddr(pub u64);

impl NativeAddr {
    /// The null address, meaning "none" or "creation failed"
    pub const NULL: NativeAddr = NativeAddr(0);

    /// Returns true for the null address
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A particle definition in marshalled form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawParticleDef {
    /// Combined `ParticleFlags` bits
    pub flags: u32,
    pub position: Vector2,
    pub velocity: Vector2,
    pub color: ParticleColor,
    /// Seconds to live, `<= 0` for infinite
    pub lifetime: f32,
    /// Group to add the particle to, or `NULL`
    pub group: NativeAddr,
}

/// A particle group definition in marshalled form
#[derive(Debug, Clone, Copy)]
pub struct RawGroupDef<'a> {
    /// Combined `ParticleFlags` bits for every particle in the group
    pub flags: u32,
    /// Combined `ParticleGroupFlags` bits
    pub group_flags: u32,
    pub position: Vector2,
    pub angle: f32,
    pub linear_velocity: Vector2,
    pub angular_velocity: f32,
    pub color: ParticleColor,
    pub strength: f32,
    /// Region filled on a grid of `stride` spacing
    pub shape: Option<&'a dyn Shape>,
    /// Grid spacing, `<= 0` picks the engine default
    pub stride: f32,
    /// Cap on procedurally placed particles, 0 for no cap
    pub particle_count: usize,
    /// Explicit local-space positions that replace the shape fill
    pub position_data: Option<&'a [Vector2]>,
    pub lifetime: f32,
    /// Existing group to extend, or `NULL` for a new group
    pub group: NativeAddr,
}

/// A particle the engine removed during a step, reported only when flagged
/// for a destruction listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDestroyedParticle {
    pub index: i32,
    pub flags: u32,
    pub position: Vector2,
}

/// What one step removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Removed particles that asked for a listener notification
    pub destroyed_particles: Vec<RawDestroyedParticle>,

    /// Every group the engine destroyed
    pub destroyed_groups: Vec<NativeAddr>,
}

/// The native engine collaborator
///
/// Implementations own all simulation state. Particle indices returned here are
/// invalidated by a step that removes particles, which compacts the buffers.
/// Adding a particle to a group, extending a group and joining groups also
/// reorder the buffers so every group stays contiguous.
pub trait ParticleEngine: Send {
    /// Returns the engine version string
    fn version_string(&self) -> String;

    /// Creates a particle system; returns `NULL` on failure
    fn create_system(&mut self, def: &ParticleSystemDef) -> NativeAddr;

    /// Releases a particle system and everything it owns
    fn destroy_system(&mut self, system: NativeAddr);

    /// Creates one particle; returns its index or [`INVALID_PARTICLE_INDEX`]
    fn create_particle(&mut self, system: NativeAddr, def: &RawParticleDef) -> i32;

    /// Flags a particle for removal on the next step
    fn destroy_particle(&mut self, system: NativeAddr, index: i32, call_listener: bool);

    /// Flags the `rank`-th oldest live particle for removal on the next step
    fn destroy_oldest_particle(&mut self, system: NativeAddr, rank: i32, call_listener: bool);

    /// Flags every live particle inside the shape; returns how many were flagged
    fn destroy_particles_in_shape(
        &mut self,
        system: NativeAddr,
        shape: &dyn Shape,
        transform: &Transform2,
        call_listener: bool,
    ) -> i32;

    /// Creates or extends a group; returns its address or `NULL` when over capacity
    fn create_group(&mut self, system: NativeAddr, def: &RawGroupDef<'_>) -> NativeAddr;

    /// Moves every particle of `b` into `a` and destroys `b`
    fn join_groups(&mut self, system: NativeAddr, a: NativeAddr, b: NativeAddr);

    /// Flags every particle of the group for removal on the next step
    fn destroy_group_particles(
        &mut self,
        system: NativeAddr,
        group: NativeAddr,
        call_listener: bool,
    );

    fn group_particle_count(&self, system: NativeAddr, group: NativeAddr) -> i32;
    fn group_buffer_index(&self, system: NativeAddr, group: NativeAddr) -> i32;
    fn group_flags(&self, system: NativeAddr, group: NativeAddr) -> u32;
    fn set_group_flags(&mut self, system: NativeAddr, group: NativeAddr, flags: u32);
    fn group_strength(&self, system: NativeAddr, group: NativeAddr) -> f32;

    fn particle_count(&self, system: NativeAddr) -> i32;
    fn group_count(&self, system: NativeAddr) -> i32;

    fn radius(&self, system: NativeAddr) -> f32;
    fn set_radius(&mut self, system: NativeAddr, radius: f32);
    fn density(&self, system: NativeAddr) -> f32;
    fn set_density(&mut self, system: NativeAddr, density: f32);
    fn gravity_scale(&self, system: NativeAddr) -> f32;
    fn set_gravity_scale(&mut self, system: NativeAddr, scale: f32);
    fn max_particle_count(&self, system: NativeAddr) -> i32;
    fn set_max_particle_count(&mut self, system: NativeAddr, count: i32);
    fn damping(&self, system: NativeAddr) -> f32;
    fn set_damping(&mut self, system: NativeAddr, damping: f32);
    fn paused(&self, system: NativeAddr) -> bool;
    fn set_paused(&mut self, system: NativeAddr, paused: bool);

    fn particle_flags(&self, system: NativeAddr, index: i32) -> u32;
    fn set_particle_flags(&mut self, system: NativeAddr, index: i32, flags: u32);
    /// Remaining lifetime in seconds, 0 for particles that live forever
    fn particle_lifetime(&self, system: NativeAddr, index: i32) -> f32;
    fn set_particle_lifetime(&mut self, system: NativeAddr, index: i32, lifetime: f32);

    /// Writes interleaved `x, y` pairs into `out`; returns the number of particles written
    fn fill_position_buffer(&self, system: NativeAddr, out: &mut [f32]) -> usize;
    fn position_buffer_x(&self, system: NativeAddr) -> Vec<f32>;
    fn position_buffer_y(&self, system: NativeAddr) -> Vec<f32>;

    /// Replaces the contents of `out` with the velocity buffer
    fn fill_velocity_buffer(&self, system: NativeAddr, out: &mut Vec<Vector2>);
    fn velocity_buffer_x(&self, system: NativeAddr) -> Vec<f32>;
    fn velocity_buffer_y(&self, system: NativeAddr) -> Vec<f32>;

    /// Replaces the contents of `out` with the color buffer
    fn fill_color_buffer(&self, system: NativeAddr, out: &mut Vec<ParticleColor>);
    fn color_buffer_channel(&self, system: NativeAddr, channel: ColorChannel) -> Vec<i32>;

    /// Advances one system; paused systems are left untouched
    fn step(&mut self, system: NativeAddr, time_step: f32, gravity: Vector2) -> StepReport;
}
