pub mod world;
pub mod config;
pub mod storage;
pub mod events;

pub use self::world::{World, SharedWorld};
pub use self::config::{WorldConfig, ParticleSystemDef};
pub use self::storage::{ArenaHandle, HandleArena, Storage};
pub use self::events::{
    DestroyedParticle, DestructionListener, EventQueue, WorldEvent, WorldEventType,
};

/// The checked identity behind every typed handle
///
/// `world` ties the handle to the world that issued it; `generation` is
/// bumped whenever the slot at `index` is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle {
    pub(crate) world: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// A checked handle to a particle system owned by a [`World`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleSystemHandle(pub(crate) RawHandle);

/// A checked handle to a particle group inside a particle system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleGroupHandle(pub(crate) RawHandle);

impl ArenaHandle for ParticleSystemHandle {
    const KIND: &'static str = "particle system";

    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    fn raw(&self) -> RawHandle {
        self.0
    }
}

impl ArenaHandle for ParticleGroupHandle {
    const KIND: &'static str = "particle group";

    fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    fn raw(&self) -> RawHandle {
        self.0
    }
}
