use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};

use crate::core::{
    DestroyedParticle, DestructionListener, EventQueue, ParticleGroupHandle, ParticleSystemDef,
    ParticleSystemHandle, WorldConfig, WorldEvent, WorldEventType,
};
use crate::core::storage::{HandleArena, Storage};
use crate::engine::{NativeAddr, ParticleEngine, SoftwareEngine, StepReport};
use crate::error::ParticleError;
use crate::math::Vector2;
use crate::particles::{ParticleBuffers, ParticleFlags, ParticleSystem};
use crate::Result;

/// A world behind one mutex, held for the duration of every call that touches
/// the world or its particle systems
pub type SharedWorld = Arc<Mutex<World>>;

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// A registered particle system
pub(crate) struct SystemEntry {
    pub(crate) native: NativeAddr,
    pub(crate) def: ParticleSystemDef,
    pub(crate) buffers: ParticleBuffers,
}

/// A registered particle group
pub(crate) struct GroupEntry {
    pub(crate) native: NativeAddr,
    pub(crate) system: ParticleSystemHandle,
}

/// The simulation container owning every particle system and the engine
/// behind them
pub struct World {
    /// Identity stamped into every handle this world issues
    id: u32,

    pub(crate) engine: Box<dyn ParticleEngine>,

    config: WorldConfig,

    pub(crate) systems: HandleArena<SystemEntry, ParticleSystemHandle>,
    systems_by_native: HashMap<NativeAddr, ParticleSystemHandle>,

    pub(crate) groups: HandleArena<GroupEntry, ParticleGroupHandle>,
    pub(crate) groups_by_native: HashMap<NativeAddr, ParticleGroupHandle>,

    listener: Option<Box<dyn DestructionListener>>,

    /// Set while destruction callbacks run
    locked: bool,

    pub(crate) events: EventQueue,

    /// The total elapsed simulation time
    time: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world with default settings, backed by a [`SoftwareEngine`]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world with the given configuration, backed by a [`SoftwareEngine`]
    pub fn with_config(config: WorldConfig) -> Self {
        Self::with_engine(config, Box::new(SoftwareEngine::new()))
    }

    /// Creates a world driving the given engine
    pub fn with_engine(config: WorldConfig, engine: Box<dyn ParticleEngine>) -> Self {
        let id = NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed);
        debug!("created world {} on {}", id, engine.version_string());

        Self {
            id,
            engine,
            config,
            systems: HandleArena::new(id),
            systems_by_native: HashMap::new(),
            groups: HandleArena::new(id),
            groups_by_native: HashMap::new(),
            listener: None,
            locked: false,
            events: EventQueue::new(),
            time: 0.0,
        }
    }

    /// Moves the world behind a mutex for use from several threads
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(Mutex::new(self))
    }

    /// Returns the current simulation time
    pub fn get_time(&self) -> f32 {
        self.time
    }

    /// Returns a reference to the world configuration
    pub fn get_config(&self) -> &WorldConfig {
        &self.config
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.config.gravity = gravity;
    }

    /// Gets the current gravity
    pub fn get_gravity(&self) -> Vector2 {
        self.config.gravity
    }

    /// Returns the engine's version string
    pub fn get_version_string(&self) -> String {
        self.engine.version_string()
    }

    /// Returns true while destruction callbacks run
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Events recorded since the start of the last step
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Mutable access to the event queue, for draining it with
    /// [`EventQueue::next_event`]
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Installs the listener notified of destroyed particles and groups
    pub fn set_destruction_listener(&mut self, listener: Box<dyn DestructionListener>) {
        self.listener = Some(listener);
    }

    /// Removes and returns the destruction listener
    pub fn clear_destruction_listener(&mut self) -> Option<Box<dyn DestructionListener>> {
        self.listener.take()
    }

    pub(crate) fn ensure_unlocked(&self, operation: &'static str) -> Result<()> {
        if self.locked {
            warn!("`{}` refused while world {} is locked", operation, self.id);
            return Err(ParticleError::InvalidOperationInCallback(operation));
        }
        Ok(())
    }

    /// Creates a particle system and registers it with this world
    pub fn create_particle_system(
        &mut self,
        def: &ParticleSystemDef,
    ) -> Result<ParticleSystemHandle> {
        self.ensure_unlocked("create_particle_system")?;

        if !(def.radius > 0.0) || !def.radius.is_finite() {
            return Err(ParticleError::InvalidParameter(format!(
                "particle radius must be positive, got {}",
                def.radius
            )));
        }
        let max_count = i32::try_from(def.max_count).map_err(|_| {
            ParticleError::InvalidParameter(format!(
                "max particle count {} is too large",
                def.max_count
            ))
        })?;

        let native = self.engine.create_system(def);
        if native.is_null() {
            return Err(ParticleError::InvalidParameter(
                "engine refused to create the particle system".to_string(),
            ));
        }
        self.engine.set_density(native, def.density);
        self.engine.set_gravity_scale(native, def.gravity_scale);
        if max_count > 0 {
            self.engine.set_max_particle_count(native, max_count);
        }

        let handle = self.systems.add(SystemEntry {
            native,
            def: def.clone(),
            buffers: ParticleBuffers::new(),
        });
        self.systems_by_native.insert(native, handle);

        self.events.push(WorldEvent {
            event_type: WorldEventType::SystemCreated,
            system: handle,
            group: None,
        });
        debug!("world {}: registered particle system {:#x}", self.id, native.0);

        Ok(handle)
    }

    /// Deregisters a particle system and its groups, then releases it in the engine
    pub fn destroy_particle_system(&mut self, handle: ParticleSystemHandle) -> Result<()> {
        self.ensure_unlocked("destroy_particle_system")?;
        let native = self.systems.lookup(handle)?.native;

        let owned: Vec<ParticleGroupHandle> = self
            .groups
            .iter()
            .filter(|(_, group)| group.system == handle)
            .map(|(group, _)| group)
            .collect();
        for group in owned {
            self.forget_group(group);
        }
        self.systems_by_native.remove(&native);
        self.systems.remove(handle);

        self.engine.destroy_system(native);

        self.events.push(WorldEvent {
            event_type: WorldEventType::SystemDestroyed,
            system: handle,
            group: None,
        });
        debug!("world {}: destroyed particle system {:#x}", self.id, native.0);

        Ok(())
    }

    /// Borrows a particle system for the duration of the returned view
    pub fn particle_system(&mut self, handle: ParticleSystemHandle) -> Result<ParticleSystem<'_>> {
        self.systems.lookup(handle)?;
        Ok(ParticleSystem::new(self, handle))
    }

    /// Returns true if the handle refers to a live system of this world
    pub fn contains_particle_system(&self, handle: ParticleSystemHandle) -> bool {
        self.systems.contains(handle)
    }

    /// Handles of every registered particle system
    pub fn particle_systems(&self) -> Vec<ParticleSystemHandle> {
        self.systems.handles()
    }

    pub fn particle_system_count(&self) -> usize {
        self.systems.len()
    }

    /// Looks up the system registered under an engine address
    pub fn system_for_native(&self, native: NativeAddr) -> Option<ParticleSystemHandle> {
        self.systems_by_native.get(&native).copied()
    }

    /// Returns the engine address behind a system handle
    pub fn native_address(&self, handle: ParticleSystemHandle) -> Result<NativeAddr> {
        Ok(self.systems.lookup(handle)?.native)
    }

    pub(crate) fn forget_group(&mut self, group: ParticleGroupHandle) {
        if let Some(entry) = self.groups.remove(group) {
            self.groups_by_native.remove(&entry.native);
        }
    }

    /// Advances every particle system by `time_step`
    ///
    /// The step is split into substeps of at most the configured time step,
    /// up to `max_substeps` of them. Particles destroyed since the last step are
    /// removed and their buffers compacted, so previously returned indices are
    /// invalid afterwards.
    pub fn step(&mut self, time_step: f32) -> Result<()> {
        self.ensure_unlocked("step")?;
        if !time_step.is_finite() || time_step < 0.0 {
            return Err(ParticleError::InvalidParameter(format!(
                "time step must be finite and non-negative, got {}",
                time_step
            )));
        }

        // Clear events from previous step
        self.events.clear();

        let fixed_step = self.config.time_step;
        let max_steps = self.config.max_substeps.max(1);

        let mut remaining_time = time_step;
        let mut steps = 0;

        loop {
            let dt = if fixed_step > 0.0 {
                fixed_step.min(remaining_time)
            } else {
                remaining_time
            };

            self.step_systems(dt);

            remaining_time -= dt;
            steps += 1;
            if remaining_time <= 0.0 || steps >= max_steps {
                break;
            }
        }

        self.time += time_step;
        trace!("world {}: stepped {} in {} substeps", self.id, time_step, steps);
        Ok(())
    }

    /// Performs a single engine step of every system, then reports removals
    fn step_systems(&mut self, dt: f32) {
        let gravity = self.config.gravity;

        let mut reports: Vec<(ParticleSystemHandle, StepReport)> = Vec::new();
        for (handle, entry) in self.systems.iter() {
            let report = self.engine.step(entry.native, dt, gravity);
            if !report.destroyed_particles.is_empty() || !report.destroyed_groups.is_empty() {
                reports.push((handle, report));
            }
        }

        if !reports.is_empty() {
            self.dispatch_destruction(reports);
        }
    }

    fn dispatch_destruction(&mut self, reports: Vec<(ParticleSystemHandle, StepReport)>) {
        let mut listener = self.listener.take();
        self.locked = true;

        for (system, report) in reports {
            if let Some(listener) = listener.as_mut() {
                for raw in &report.destroyed_particles {
                    let particle = DestroyedParticle {
                        system,
                        index: raw.index.max(0) as usize,
                        flags: ParticleFlags::from_bits_retain(raw.flags),
                        position: raw.position,
                    };
                    listener.say_goodbye_particle(self, particle);
                }
            }

            for native in &report.destroyed_groups {
                let Some(group) = self.groups_by_native.get(native).copied() else {
                    continue;
                };
                if let Some(listener) = listener.as_mut() {
                    listener.say_goodbye_group(self, group);
                }
                self.forget_group(group);

                self.events.push(WorldEvent {
                    event_type: WorldEventType::GroupDestroyed,
                    system,
                    group: Some(group),
                });
                debug!("world {}: engine destroyed group {:#x}", self.id, native.0);
            }
        }

        self.locked = false;
        // A listener installed from inside a callback wins
        if self.listener.is_none() {
            self.listener = listener;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_from_another_world_are_invalid() {
        let mut a = World::new();
        let mut b = World::new();
        let handle = a.create_particle_system(&ParticleSystemDef::default()).unwrap();
        b.create_particle_system(&ParticleSystemDef::default()).unwrap();

        assert!(matches!(
            b.particle_system(handle).err(),
            Some(ParticleError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut world = World::new();
        let result = world.create_particle_system(&ParticleSystemDef::with_radius(0.0));
        assert!(matches!(result, Err(ParticleError::InvalidParameter(_))));
        assert_eq!(world.particle_system_count(), 0);
    }

    #[test]
    fn long_steps_are_capped_by_max_substeps() {
        let config = WorldConfig {
            time_step: 0.1,
            max_substeps: 2,
            gravity: Vector2::new(0.0, -10.0),
        };
        let mut world = World::with_config(config);
        let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
        world
            .particle_system(handle)
            .unwrap()
            .create_particle(&crate::particles::ParticleDef::default())
            .unwrap();

        world.step(1.0).unwrap();

        // Only two substeps of 0.1 were integrated
        let mut system = world.particle_system(handle).unwrap();
        let velocity = system.velocity_buffer().unwrap()[0];
        approx::assert_relative_eq!(velocity.y, -2.0, epsilon = 1e-5);
    }
}
