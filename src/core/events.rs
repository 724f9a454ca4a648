use crate::core::{ParticleGroupHandle, ParticleSystemHandle, World};
use crate::math::Vector2;
use crate::particles::ParticleFlags;
use std::collections::VecDeque;

/// A particle removed during a world step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestroyedParticle {
    /// The system the particle belonged to
    pub system: ParticleSystemHandle,

    /// The particle's buffer index at the moment it was removed. Buffers no
    /// longer contain it once the listener runs.
    pub index: usize,

    /// The particle's flags at removal
    pub flags: ParticleFlags,

    /// The particle's last position
    pub position: Vector2,
}

/// Receives notifications when particles and groups are removed during a step
///
/// The world is locked while these run: creating or joining groups, creating
/// particles, stepping, and creating or destroying systems all fail with
/// `InvalidOperationInCallback`. Buffers and scalar accessors stay readable.
pub trait DestructionListener: Send {
    /// Called for particles flagged `DESTRUCTION_LISTENER` or destroyed through a
    /// `*_with_listener` call
    fn say_goodbye_particle(&mut self, world: &mut World, particle: DestroyedParticle);

    /// Called before a group's handle is invalidated
    fn say_goodbye_group(&mut self, _world: &mut World, _group: ParticleGroupHandle) {}
}

/// Types of world events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEventType {
    /// A particle system has been created
    SystemCreated,

    /// A particle system has been destroyed
    SystemDestroyed,

    /// A particle group has been created
    GroupCreated,

    /// A particle group has absorbed another one; `group` names the absorbed group
    GroupJoined,

    /// A particle group has been destroyed by the engine during a step
    GroupDestroyed,
}

/// An event related to a particle system or one of its groups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldEvent {
    /// The type of event
    pub event_type: WorldEventType,

    /// The system the event refers to
    pub system: ParticleSystemHandle,

    /// The group the event refers to, if any
    pub group: Option<ParticleGroupHandle>,
}

/// A queue of world events, cleared at the start of every step
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WorldEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Adds an event to the queue
    pub fn push(&mut self, event: WorldEvent) {
        self.events.push_back(event);
    }

    /// Gets the next event from the queue
    pub fn next_event(&mut self) -> Option<WorldEvent> {
        self.events.pop_front()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Gets all events of a specific type
    pub fn events_of_type(&self, event_type: WorldEventType) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Gets all events for a specific system
    pub fn events_for_system(&self, system: ParticleSystemHandle) -> Vec<&WorldEvent> {
        self.events
            .iter()
            .filter(|e| e.system == system)
            .collect()
    }
}
