use liquidfun_bind::{
    World, WorldConfig, ParticleSystemDef, ParticleSystemHandle, ParticleGroupHandle, ParticleDef,
    ParticleGroupDef, ParticleFlags, ParticleError, DestructionListener, DestroyedParticle,
    WorldEventType, Vector2,
};
use std::sync::{Arc, Mutex};
use std::thread;

fn still_world() -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    World::with_config(WorldConfig {
        gravity: Vector2::zero(),
        ..WorldConfig::default()
    })
}

#[derive(Default)]
struct Log {
    particles: Vec<DestroyedParticle>,
    groups: Vec<ParticleGroupHandle>,
    refusals: Vec<ParticleError>,
    locked_during_callback: bool,
}

/// Records callbacks and tries operations the lock refuses
struct Recorder {
    log: Arc<Mutex<Log>>,
    join: Option<(ParticleGroupHandle, ParticleGroupHandle)>,
}

impl DestructionListener for Recorder {
    fn say_goodbye_particle(&mut self, world: &mut World, particle: DestroyedParticle) {
        let mut log = self.log.lock().unwrap();
        log.particles.push(particle);
        log.locked_during_callback = world.is_locked();

        if let Err(error) = world.create_particle_system(&ParticleSystemDef::default()) {
            log.refusals.push(error);
        }
        if let Err(error) = world.step(1.0 / 60.0) {
            log.refusals.push(error);
        }

        let mut system = world.particle_system(particle.system).unwrap();
        // Reads stay available
        system.get_particle_count().unwrap();
        if let Err(error) = system.create_particle(&ParticleDef::default()) {
            log.refusals.push(error);
        }
        if let Some((a, b)) = self.join {
            if let Err(error) = system.join_particle_groups(a, b) {
                log.refusals.push(error);
            }
        }
    }

    fn say_goodbye_group(&mut self, _world: &mut World, group: ParticleGroupHandle) {
        self.log.lock().unwrap().groups.push(group);
    }
}

fn install_recorder(
    world: &mut World,
    join: Option<(ParticleGroupHandle, ParticleGroupHandle)>,
) -> Arc<Mutex<Log>> {
    let log = Arc::new(Mutex::new(Log::default()));
    world.set_destruction_listener(Box::new(Recorder {
        log: Arc::clone(&log),
        join,
    }));
    log
}

fn spawn_row(world: &mut World, handle: ParticleSystemHandle, count: usize) {
    let mut system = world.particle_system(handle).unwrap();
    for i in 0..count {
        system.create_particle(&ParticleDef::at(Vector2::new(i as f32, 0.0))).unwrap();
    }
}

#[test]
fn test_system_registration() {
    let mut world = still_world();
    let handles: Vec<ParticleSystemHandle> = (0..3)
        .map(|_| world.create_particle_system(&ParticleSystemDef::default()).unwrap())
        .collect();

    assert_eq!(world.particle_system_count(), 3);
    for handle in &handles {
        assert!(world.particle_systems().contains(handle));
        let native = world.native_address(*handle).unwrap();
        assert_eq!(world.system_for_native(native), Some(*handle));
    }
    assert_eq!(world.events().events_of_type(WorldEventType::SystemCreated).len(), 3);

    let victim = handles[1];
    let native = world.native_address(victim).unwrap();
    world.destroy_particle_system(victim).unwrap();

    assert_eq!(world.particle_system_count(), 2);
    assert!(!world.particle_systems().contains(&victim));
    assert!(!world.contains_particle_system(victim));
    assert_eq!(world.system_for_native(native), None);
    assert_eq!(world.events().events_for_system(victim).len(), 2);
}

#[test]
fn test_use_after_free() {
    let mut world = still_world();
    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    let group = world
        .particle_system(handle)
        .unwrap()
        .create_particle_group(&ParticleGroupDef::from_positions(vec![Vector2::zero()]))
        .unwrap();

    world.particle_system(handle).unwrap().destroy().unwrap();

    assert_eq!(
        world.particle_system(handle).err(),
        Some(ParticleError::UseAfterFree { kind: "particle system" })
    );
    assert_eq!(
        world.destroy_particle_system(handle),
        Err(ParticleError::UseAfterFree { kind: "particle system" })
    );

    // The system's groups went with it
    let other = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    assert_eq!(
        world.particle_system(other).unwrap().get_group_particle_count(group),
        Err(ParticleError::UseAfterFree { kind: "particle group" })
    );
}

#[test]
fn test_groups_are_scoped_to_their_system() {
    let mut world = still_world();
    let first = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    let second = world.create_particle_system(&ParticleSystemDef::default()).unwrap();

    let group = world
        .particle_system(first)
        .unwrap()
        .create_particle_group(&ParticleGroupDef::from_positions(vec![Vector2::zero()]))
        .unwrap();

    let mut system = world.particle_system(second).unwrap();
    assert_eq!(
        system.get_group_particle_count(group),
        Err(ParticleError::InvalidHandle { kind: "particle group" })
    );
    let def = ParticleDef::default().in_group(group);
    assert!(matches!(system.create_particle(&def), Err(ParticleError::InvalidHandle { .. })));
}

#[test]
fn test_listener_sees_flagged_particles_only() {
    let mut world = still_world();
    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    spawn_row(&mut world, handle, 3);
    world
        .particle_system(handle)
        .unwrap()
        .create_particle(
            &ParticleDef::at(Vector2::new(3.0, 0.0))
                .with_flags([ParticleFlags::DESTRUCTION_LISTENER]),
        )
        .unwrap();
    let log = install_recorder(&mut world, None);

    {
        let mut system = world.particle_system(handle).unwrap();
        system.destroy_particle(0).unwrap();
        system.destroy_particle_with_listener(2).unwrap();
        system.destroy_particle(3).unwrap();
    }
    world.step(1.0 / 60.0).unwrap();

    let log = log.lock().unwrap();
    let indices: Vec<usize> = log.particles.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![2, 3]);
    assert_eq!(log.particles[0].position, Vector2::new(2.0, 0.0));
    assert_eq!(log.particles[0].system, handle);
    assert!(log.particles[1].flags.contains(ParticleFlags::DESTRUCTION_LISTENER));
    assert!(log.locked_during_callback);
    drop(log);

    assert!(!world.is_locked());
    assert_eq!(world.particle_system(handle).unwrap().get_particle_count().unwrap(), 1);
}

#[test]
fn test_world_is_locked_during_callbacks() {
    let mut world = still_world();
    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    let (a, b) = {
        let mut system = world.particle_system(handle).unwrap();
        let a = system
            .create_particle_group(&ParticleGroupDef::from_positions(vec![Vector2::zero()]))
            .unwrap();
        let b = system
            .create_particle_group(&ParticleGroupDef::from_positions(vec![Vector2::new(1.0, 0.0)]))
            .unwrap();
        system
            .create_particle(&ParticleDef::at(Vector2::new(5.0, 0.0)))
            .unwrap();
        system.destroy_particle_with_listener(2).unwrap();
        (a, b)
    };
    let log = install_recorder(&mut world, Some((a, b)));

    world.step(1.0 / 60.0).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.particles.len(), 1);
    assert_eq!(
        log.refusals,
        vec![
            ParticleError::InvalidOperationInCallback("create_particle_system"),
            ParticleError::InvalidOperationInCallback("step"),
            ParticleError::InvalidOperationInCallback("create_particle"),
            ParticleError::InvalidOperationInCallback("join_particle_groups"),
        ]
    );
    drop(log);

    // Both groups survived and the lock is released
    let mut system = world.particle_system(handle).unwrap();
    assert_eq!(system.get_particle_group_count().unwrap(), 2);
    system.join_particle_groups(a, b).unwrap();
    assert_eq!(system.get_group_particle_count(a).unwrap(), 2);
}

#[test]
fn test_listener_hears_destroyed_groups() {
    let mut world = still_world();
    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    let group = world
        .particle_system(handle)
        .unwrap()
        .create_particle_group(&ParticleGroupDef::from_positions(vec![
            Vector2::zero(),
            Vector2::new(1.0, 0.0),
        ]))
        .unwrap();
    let log = install_recorder(&mut world, None);

    world.particle_system(handle).unwrap().destroy_particle_group(group).unwrap();
    world.step(1.0 / 60.0).unwrap();

    let log = log.lock().unwrap();
    assert!(log.particles.is_empty());
    assert_eq!(log.groups, vec![group]);
}

#[test]
fn test_listener_can_be_replaced() {
    let mut world = still_world();
    let first = install_recorder(&mut world, None);
    let second = install_recorder(&mut world, None);

    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    spawn_row(&mut world, handle, 1);
    world.particle_system(handle).unwrap().destroy_particle_with_listener(0).unwrap();
    world.step(1.0 / 60.0).unwrap();

    assert!(first.lock().unwrap().particles.is_empty());
    assert_eq!(second.lock().unwrap().particles.len(), 1);
    assert!(world.clear_destruction_listener().is_some());
    assert!(world.clear_destruction_listener().is_none());
}

#[test]
fn test_step_rejects_bad_time_steps() {
    let mut world = still_world();
    assert!(matches!(world.step(-1.0), Err(ParticleError::InvalidParameter(_))));
    assert!(matches!(world.step(f32::NAN), Err(ParticleError::InvalidParameter(_))));
    assert!(world.step(0.0).is_ok());
}

#[test]
fn test_step_clears_events() {
    let mut world = still_world();
    world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    assert_eq!(world.events().len(), 1);

    world.step(1.0 / 60.0).unwrap();
    assert!(world.events().is_empty());
}

#[test]
fn test_events_can_be_drained() {
    let mut world = still_world();
    let handle = world.create_particle_system(&ParticleSystemDef::default()).unwrap();
    world
        .particle_system(handle)
        .unwrap()
        .create_particle_group(&ParticleGroupDef::from_positions(vec![Vector2::zero()]))
        .unwrap();

    let drained: Vec<WorldEventType> = std::iter::from_fn(|| world.events_mut().next_event())
        .map(|event| event.event_type)
        .collect();
    assert_eq!(drained, vec![WorldEventType::SystemCreated, WorldEventType::GroupCreated]);
    assert!(world.events().is_empty());
}

#[test]
fn test_gravity_accessors() {
    let mut world = World::new();
    assert_eq!(world.get_gravity(), Vector2::new(0.0, -10.0));
    world.set_gravity(Vector2::new(1.0, 0.0));
    assert_eq!(world.get_gravity(), Vector2::new(1.0, 0.0));
    assert!(world.get_version_string().starts_with("software particle engine"));
}

#[test]
fn test_shared_world_across_threads() {
    let shared = still_world().into_shared();
    let handle = shared
        .lock()
        .unwrap()
        .create_particle_system(&ParticleSystemDef::default())
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let world = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..25 {
                    let mut world = world.lock().unwrap();
                    world
                        .particle_system(handle)
                        .unwrap()
                        .create_particle(&ParticleDef::at(Vector2::new(t as f32, i as f32)))
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut world = shared.lock().unwrap();
    world.step(1.0 / 60.0).unwrap();
    let mut system = world.particle_system(handle).unwrap();
    assert_eq!(system.get_particle_count().unwrap(), 100);
    assert_eq!(system.position_buffer(true).unwrap().len(), 200);
}
