use log::{debug, warn};

use crate::core::{
    ArenaHandle, ParticleGroupHandle, ParticleSystemDef, ParticleSystemHandle, World, WorldEvent,
    WorldEventType,
};
use crate::core::storage::Storage;
use crate::core::world::GroupEntry;
use crate::engine::{
    NativeAddr, ParticleEngine, RawGroupDef, RawParticleDef, INVALID_PARTICLE_INDEX,
};
use crate::error::ParticleError;
use crate::math::{Color, ColorChannel, ParticleColor, Transform2, Vector2};
use crate::particles::{
    ParticleBuffers, ParticleDef, ParticleFlags, ParticleGroupDef, ParticleGroupFlags,
};
use crate::shapes::Shape;
use crate::Result;

/// A checked view of one particle system, borrowed from its [`World`]
///
/// Particle indices are positions in the system's buffers. Any of these
/// calls can shift the indices of existing particles, grouped or not:
///
/// - a [`World::step`] that removes particles, which compacts the buffers
/// - [`create_particle`](Self::create_particle) into a group
/// - [`create_particle_group`](Self::create_particle_group) extending a group
/// - [`join_particle_groups`](Self::join_particle_groups)
///
/// The last three keep each group's particles contiguous by moving other
/// particles behind them.
pub struct ParticleSystem<'w> {
    world: &'w mut World,
    handle: ParticleSystemHandle,
}

impl<'w> ParticleSystem<'w> {
    pub(crate) fn new(world: &'w mut World, handle: ParticleSystemHandle) -> Self {
        Self { world, handle }
    }

    /// The handle this view was opened with
    pub fn handle(&self) -> ParticleSystemHandle {
        self.handle
    }

    fn native(&self) -> Result<NativeAddr> {
        Ok(self.world.systems.lookup(self.handle)?.native)
    }

    fn engine(&self) -> &dyn ParticleEngine {
        &*self.world.engine
    }

    fn group_native(&self, group: ParticleGroupHandle) -> Result<NativeAddr> {
        let entry = self.world.groups.lookup(group)?;
        if entry.system != self.handle {
            return Err(ParticleError::InvalidHandle { kind: ParticleGroupHandle::KIND });
        }
        Ok(entry.native)
    }

    fn live_count(&self, native: NativeAddr) -> usize {
        self.engine().particle_count(native).max(0) as usize
    }

    /// Converts a buffer index for the engine, rejecting indices past the live range
    fn checked_index(&self, native: NativeAddr, index: usize) -> Result<i32> {
        let count = self.live_count(native);
        if index >= count {
            return Err(ParticleError::IndexOutOfRange { index, count });
        }
        Ok(index as i32)
    }

    /// Particles in the buffers that are not pending removal
    fn surviving_count(&self, native: NativeAddr) -> usize {
        let engine = self.engine();
        (0..self.live_count(native) as i32)
            .filter(|&i| engine.particle_flags(native, i) & ParticleFlags::ZOMBIE.bits() == 0)
            .count()
    }

    fn capacity_error(&self, native: NativeAddr) -> ParticleError {
        let error = ParticleError::CapacityExceeded {
            live: self.live_count(native),
            max: self.engine().max_particle_count(native).max(0) as usize,
        };
        warn!("{}", error);
        error
    }

    fn buffers(&self) -> Result<&ParticleBuffers> {
        Ok(&self.world.systems.lookup(self.handle)?.buffers)
    }

    fn buffers_mut(&mut self) -> Result<(&mut ParticleBuffers, &dyn ParticleEngine, NativeAddr)> {
        let world = &mut *self.world;
        let entry = world.systems.lookup_mut(self.handle)?;
        Ok((&mut entry.buffers, &*world.engine, entry.native))
    }

    // Particles

    /// Creates a particle and returns its buffer index
    pub fn create_particle(&mut self, def: &ParticleDef) -> Result<usize> {
        self.world.ensure_unlocked("create_particle")?;
        let native = self.native()?;
        let group = match def.group {
            Some(group) => self.group_native(group)?,
            None => NativeAddr::NULL,
        };

        let raw = RawParticleDef {
            flags: def.flags.bits(),
            position: def.position,
            velocity: def.velocity,
            color: ParticleColor::from(def.color),
            lifetime: def.lifetime,
            group,
        };
        let index = self.world.engine.create_particle(native, &raw);
        if index == INVALID_PARTICLE_INDEX {
            return Err(self.capacity_error(native));
        }
        usize::try_from(index).map_err(|_| self.capacity_error(native))
    }

    /// Flags a particle for removal on the next step
    ///
    /// The particle stays in every buffer until then. Destroying it again
    /// before the step does nothing.
    pub fn destroy_particle(&mut self, index: usize) -> Result<()> {
        self.destroy_particle_impl(index, false)
    }

    /// Like [`destroy_particle`](Self::destroy_particle), notifying the
    /// destruction listener when the particle is removed
    pub fn destroy_particle_with_listener(&mut self, index: usize) -> Result<()> {
        self.destroy_particle_impl(index, true)
    }

    fn destroy_particle_impl(&mut self, index: usize, call_listener: bool) -> Result<()> {
        let native = self.native()?;
        let index = self.checked_index(native, index)?;
        self.world.engine.destroy_particle(native, index, call_listener);
        Ok(())
    }

    /// Flags the `rank`-th oldest particle for removal on the next step,
    /// 0 being the oldest particle not already pending removal
    ///
    /// `rank` must be below the number of such particles.
    pub fn destroy_oldest_particle(&mut self, rank: usize) -> Result<()> {
        self.destroy_oldest_impl(rank, false)
    }

    pub fn destroy_oldest_particle_with_listener(&mut self, rank: usize) -> Result<()> {
        self.destroy_oldest_impl(rank, true)
    }

    fn destroy_oldest_impl(&mut self, rank: usize, call_listener: bool) -> Result<()> {
        let native = self.native()?;
        let count = self.surviving_count(native);
        if rank >= count {
            return Err(ParticleError::IndexOutOfRange { index: rank, count });
        }
        self.world.engine.destroy_oldest_particle(native, rank as i32, call_listener);
        Ok(())
    }

    /// Flags every particle inside `shape` placed at `transform`; returns how
    /// many were flagged
    pub fn destroy_particles_in_shape(
        &mut self,
        shape: &dyn Shape,
        transform: &Transform2,
    ) -> Result<usize> {
        self.destroy_in_shape_impl(shape, transform, false)
    }

    pub fn destroy_particles_in_shape_with_listener(
        &mut self,
        shape: &dyn Shape,
        transform: &Transform2,
    ) -> Result<usize> {
        self.destroy_in_shape_impl(shape, transform, true)
    }

    fn destroy_in_shape_impl(
        &mut self,
        shape: &dyn Shape,
        transform: &Transform2,
        call_listener: bool,
    ) -> Result<usize> {
        let native = self.native()?;
        let destroyed = self
            .world
            .engine
            .destroy_particles_in_shape(native, shape, transform, call_listener);
        Ok(destroyed.max(0) as usize)
    }

    pub fn get_particle_flags(&self, index: usize) -> Result<ParticleFlags> {
        let native = self.native()?;
        let index = self.checked_index(native, index)?;
        Ok(ParticleFlags::from_bits_retain(self.engine().particle_flags(native, index)))
    }

    pub fn set_particle_flags(&mut self, index: usize, flags: ParticleFlags) -> Result<()> {
        let native = self.native()?;
        let index = self.checked_index(native, index)?;
        self.world.engine.set_particle_flags(native, index, flags.bits());
        Ok(())
    }

    /// Remaining lifetime in seconds, 0 for a particle that lives forever
    pub fn get_particle_lifetime(&self, index: usize) -> Result<f32> {
        let native = self.native()?;
        let index = self.checked_index(native, index)?;
        Ok(self.engine().particle_lifetime(native, index))
    }

    /// Sets the remaining lifetime, rounded up to the lifetime granularity;
    /// `<= 0` makes the particle live forever
    pub fn set_particle_lifetime(&mut self, index: usize, lifetime: f32) -> Result<()> {
        let native = self.native()?;
        let index = self.checked_index(native, index)?;
        self.world.engine.set_particle_lifetime(native, index, lifetime);
        Ok(())
    }

    // Groups

    /// Creates a particle group, or appends to `def.group` when set
    ///
    /// The particle flags and the group flags are kept apart: `def.flags` goes
    /// to every particle, `def.group_flags` to the group.
    pub fn create_particle_group(&mut self, def: &ParticleGroupDef) -> Result<ParticleGroupHandle> {
        self.world.ensure_unlocked("create_particle_group")?;
        let native = self.native()?;

        if !def.stride.is_finite() || def.stride < 0.0 {
            return Err(ParticleError::InvalidParameter(format!(
                "group stride must be finite and non-negative, got {}",
                def.stride
            )));
        }
        let extended = match def.group {
            Some(group) => Some((group, self.group_native(group)?)),
            None => None,
        };

        let raw = RawGroupDef {
            flags: def.flags.bits(),
            group_flags: def.group_flags.bits(),
            position: def.position,
            angle: def.angle,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            color: ParticleColor::from(def.color),
            strength: def.strength,
            shape: def.shape.as_deref(),
            stride: def.stride,
            particle_count: def.particle_count,
            position_data: def.position_data.as_deref(),
            lifetime: def.lifetime,
            group: extended.map_or(NativeAddr::NULL, |(_, addr)| addr),
        };
        let created = self.world.engine.create_group(native, &raw);
        if created.is_null() {
            return Err(self.capacity_error(native));
        }

        if let Some((group, _)) = extended {
            return Ok(group);
        }

        let world = &mut *self.world;
        let group = world.groups.add(GroupEntry {
            native: created,
            system: self.handle,
        });
        world.groups_by_native.insert(created, group);
        world.events.push(WorldEvent {
            event_type: WorldEventType::GroupCreated,
            system: self.handle,
            group: Some(group),
        });
        debug!(
            "created group {:#x} with {} particles",
            created.0,
            world.engine.group_particle_count(native, created)
        );

        Ok(group)
    }

    /// Moves every particle of `b` into `a`; `b` is invalid afterwards
    pub fn join_particle_groups(
        &mut self,
        a: ParticleGroupHandle,
        b: ParticleGroupHandle,
    ) -> Result<()> {
        self.world.ensure_unlocked("join_particle_groups")?;
        let native = self.native()?;
        let group_a = self.group_native(a)?;
        let group_b = self.group_native(b)?;
        if a == b {
            return Err(ParticleError::InvalidParameter(
                "a particle group cannot be joined with itself".to_string(),
            ));
        }

        self.world.engine.join_groups(native, group_a, group_b);
        self.world.forget_group(b);
        self.world.events.push(WorldEvent {
            event_type: WorldEventType::GroupJoined,
            system: self.handle,
            group: Some(b),
        });
        debug!("joined group {:#x} into {:#x}", group_b.0, group_a.0);

        Ok(())
    }

    /// Flags every particle of the group for removal; the group itself goes
    /// with them on the next step, even if it may be empty
    pub fn destroy_particle_group(&mut self, group: ParticleGroupHandle) -> Result<()> {
        self.destroy_group_impl(group, false)
    }

    pub fn destroy_particle_group_with_listener(
        &mut self,
        group: ParticleGroupHandle,
    ) -> Result<()> {
        self.destroy_group_impl(group, true)
    }

    fn destroy_group_impl(
        &mut self,
        group: ParticleGroupHandle,
        call_listener: bool,
    ) -> Result<()> {
        self.world.ensure_unlocked("destroy_particle_group")?;
        let native = self.native()?;
        let addr = self.group_native(group)?;

        let engine = &mut self.world.engine;
        engine.destroy_group_particles(native, addr, call_listener);
        let flags = engine.group_flags(native, addr) | ParticleGroupFlags::WILL_BE_DESTROYED.bits();
        engine.set_group_flags(native, addr, flags);
        Ok(())
    }

    /// Handles of the system's live groups
    pub fn particle_groups(&self) -> Vec<ParticleGroupHandle> {
        self.world
            .groups
            .iter()
            .filter(|(_, entry)| entry.system == self.handle)
            .map(|(group, _)| group)
            .collect()
    }

    pub fn get_group_particle_count(&self, group: ParticleGroupHandle) -> Result<usize> {
        let native = self.native()?;
        let addr = self.group_native(group)?;
        Ok(self.engine().group_particle_count(native, addr).max(0) as usize)
    }

    /// Buffer index of the group's first particle; a group's particles are contiguous
    pub fn get_group_buffer_index(&self, group: ParticleGroupHandle) -> Result<usize> {
        let native = self.native()?;
        let addr = self.group_native(group)?;
        Ok(self.engine().group_buffer_index(native, addr).max(0) as usize)
    }

    pub fn get_group_flags(&self, group: ParticleGroupHandle) -> Result<ParticleGroupFlags> {
        let native = self.native()?;
        let addr = self.group_native(group)?;
        Ok(ParticleGroupFlags::from_bits_retain(self.engine().group_flags(native, addr)))
    }

    pub fn set_group_flags(
        &mut self,
        group: ParticleGroupHandle,
        flags: ParticleGroupFlags,
    ) -> Result<()> {
        let native = self.native()?;
        let addr = self.group_native(group)?;
        self.world.engine.set_group_flags(native, addr, flags.bits());
        Ok(())
    }

    pub fn get_group_strength(&self, group: ParticleGroupHandle) -> Result<f32> {
        let native = self.native()?;
        let addr = self.group_native(group)?;
        Ok(self.engine().group_strength(native, addr))
    }

    // Buffers

    /// Interleaved `x, y` positions, refreshed from the engine first when `update` is set
    pub fn position_buffer(&mut self, update: bool) -> Result<&[f32]> {
        let (buffers, engine, native) = self.buffers_mut()?;
        if update {
            buffers.refresh_positions(engine, native);
        }
        Ok(buffers.positions())
    }

    pub fn refresh_position_buffer(&mut self) -> Result<()> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_positions(engine, native);
        Ok(())
    }

    /// Current x coordinates, read straight from the engine
    pub fn position_buffer_x(&self) -> Result<Vec<f32>> {
        let native = self.native()?;
        Ok(self.engine().position_buffer_x(native))
    }

    /// Current y coordinates, read straight from the engine
    pub fn position_buffer_y(&self) -> Result<Vec<f32>> {
        let native = self.native()?;
        Ok(self.engine().position_buffer_y(native))
    }

    /// Refreshes the velocity snapshot and returns it
    pub fn velocity_buffer(&mut self) -> Result<&[Vector2]> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_velocities(engine, native);
        Ok(buffers.velocities())
    }

    /// The velocity snapshot from the last refresh
    pub fn velocity_buffer_without_update(&self) -> Result<&[Vector2]> {
        Ok(self.buffers()?.velocities())
    }

    pub fn update_velocity_buffer(&mut self) -> Result<()> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_velocities(engine, native);
        Ok(())
    }

    pub fn velocity_buffer_x(&self) -> Result<Vec<f32>> {
        let native = self.native()?;
        Ok(self.engine().velocity_buffer_x(native))
    }

    pub fn velocity_buffer_y(&self) -> Result<Vec<f32>> {
        let native = self.native()?;
        Ok(self.engine().velocity_buffer_y(native))
    }

    /// Refreshes the color snapshot and returns it in unit-interval channels
    pub fn color_buffer(&mut self) -> Result<&[Color]> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_colors(engine, native);
        Ok(buffers.colors())
    }

    /// The color snapshot from the last refresh
    pub fn color_buffer_without_update(&self) -> Result<&[Color]> {
        Ok(self.buffers()?.colors())
    }

    /// The color snapshot from the last refresh, in engine bytes
    pub fn raw_color_buffer_without_update(&self) -> Result<&[ParticleColor]> {
        Ok(self.buffers()?.raw_colors())
    }

    pub fn update_color_buffer(&mut self) -> Result<()> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_colors(engine, native);
        Ok(())
    }

    /// One color channel as engine bytes in `0..=255`, read straight from the engine
    pub fn color_buffer_channel(&self, channel: ColorChannel) -> Result<Vec<i32>> {
        let native = self.native()?;
        Ok(self.engine().color_buffer_channel(native, channel))
    }

    /// Refreshes the position, velocity and color snapshots
    pub fn refresh_buffers(&mut self) -> Result<()> {
        let (buffers, engine, native) = self.buffers_mut()?;
        buffers.refresh_all(engine, native);
        Ok(())
    }

    // Scalars

    pub fn get_particle_count(&self) -> Result<usize> {
        let native = self.native()?;
        Ok(self.live_count(native))
    }

    pub fn get_particle_group_count(&self) -> Result<usize> {
        let native = self.native()?;
        Ok(self.engine().group_count(native).max(0) as usize)
    }

    pub fn get_radius(&self) -> Result<f32> {
        let native = self.native()?;
        Ok(self.engine().radius(native))
    }

    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        let native = self.native()?;
        self.world.engine.set_radius(native, radius);
        Ok(())
    }

    pub fn get_density(&self) -> Result<f32> {
        let native = self.native()?;
        Ok(self.engine().density(native))
    }

    pub fn set_density(&mut self, density: f32) -> Result<()> {
        let native = self.native()?;
        self.world.engine.set_density(native, density);
        Ok(())
    }

    pub fn get_gravity_scale(&self) -> Result<f32> {
        let native = self.native()?;
        Ok(self.engine().gravity_scale(native))
    }

    pub fn set_gravity_scale(&mut self, scale: f32) -> Result<()> {
        let native = self.native()?;
        self.world.engine.set_gravity_scale(native, scale);
        Ok(())
    }

    /// Maximum particle count, 0 when unlimited
    pub fn get_max_particle_count(&self) -> Result<usize> {
        let native = self.native()?;
        Ok(self.engine().max_particle_count(native).max(0) as usize)
    }

    /// Sets the maximum particle count; the engine ignores a value below the live count
    pub fn set_max_particle_count(&mut self, count: usize) -> Result<()> {
        let native = self.native()?;
        let count = i32::try_from(count).map_err(|_| {
            ParticleError::InvalidParameter(format!("max particle count {} is too large", count))
        })?;
        self.world.engine.set_max_particle_count(native, count);
        Ok(())
    }

    pub fn get_damping(&self) -> Result<f32> {
        let native = self.native()?;
        Ok(self.engine().damping(native))
    }

    pub fn set_damping(&mut self, damping: f32) -> Result<()> {
        let native = self.native()?;
        self.world.engine.set_damping(native, damping);
        Ok(())
    }

    pub fn get_paused(&self) -> Result<bool> {
        let native = self.native()?;
        Ok(self.engine().paused(native))
    }

    /// A paused system is skipped by [`World::step`]
    pub fn set_paused(&mut self, paused: bool) -> Result<()> {
        let native = self.native()?;
        self.world.engine.set_paused(native, paused);
        Ok(())
    }

    pub fn get_version_string(&self) -> String {
        self.world.get_version_string()
    }

    /// The definition the system was created with
    pub fn definition(&self) -> Result<&ParticleSystemDef> {
        Ok(&self.world.systems.lookup(self.handle)?.def)
    }

    /// Destroys the system, consuming the view
    pub fn destroy(self) -> Result<()> {
        self.world.destroy_particle_system(self.handle)
    }
}
