use std::marker::PhantomData;
use crate::core::RawHandle;
use crate::error::ParticleError;
use crate::Result;

/// Generic storage trait for binding-side objects
pub trait Storage<T, H> {
    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all live handles
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;
}

/// A typed wrapper over [`RawHandle`]
pub trait ArenaHandle: Copy + 'static {
    /// Human readable object kind used in errors
    const KIND: &'static str;

    fn from_raw(raw: RawHandle) -> Self;

    fn raw(&self) -> RawHandle;
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generation-counted arena. A slot's generation is bumped every time it is
/// freed, so a handle outliving its object is detected instead of aliasing
/// whatever reuses the slot.
pub struct HandleArena<T, H> {
    world: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _marker: PhantomData<H>,
}

impl<T, H: ArenaHandle> HandleArena<T, H> {
    /// Creates an empty arena issuing handles for the given world
    pub fn new(world: u32) -> Self {
        Self {
            world,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _marker: PhantomData,
        }
    }

    fn classify(&self, handle: H) -> std::result::Result<usize, ParticleError> {
        let raw = handle.raw();
        let slot = if raw.world == self.world {
            self.slots.get(raw.index as usize)
        } else {
            None
        };

        match slot {
            None => Err(ParticleError::InvalidHandle { kind: H::KIND }),
            Some(slot) if slot.generation == raw.generation && slot.value.is_some() => {
                Ok(raw.index as usize)
            }
            Some(slot) if raw.generation < slot.generation => {
                Err(ParticleError::UseAfterFree { kind: H::KIND })
            }
            Some(_) => Err(ParticleError::InvalidHandle { kind: H::KIND }),
        }
    }

    /// Gets an item by its handle, reporting why a lookup failed
    pub fn lookup(&self, handle: H) -> Result<&T> {
        let index = self.classify(handle)?;
        self.slots[index]
            .value
            .as_ref()
            .ok_or(ParticleError::InvalidHandle { kind: H::KIND })
    }

    /// Gets a mutable item by its handle, reporting why a lookup failed
    pub fn lookup_mut(&mut self, handle: H) -> Result<&mut T> {
        let index = self.classify(handle)?;
        self.slots[index]
            .value
            .as_mut()
            .ok_or(ParticleError::InvalidHandle { kind: H::KIND })
    }

    /// Returns true if the handle refers to a live item
    pub fn contains(&self, handle: H) -> bool {
        self.classify(handle).is_ok()
    }
}

impl<T, H: ArenaHandle> Storage<T, H> for HandleArena<T, H> {
    fn add(&mut self, item: T) -> H {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(item);
                index
            }
            None => {
                self.slots.push(Slot { generation: 0, value: Some(item) });
                (self.slots.len() - 1) as u32
            }
        };
        self.len += 1;

        H::from_raw(RawHandle {
            world: self.world,
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.lookup(handle).ok()
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.lookup_mut(handle).ok()
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        let index = self.classify(handle).ok()?;
        let slot = &mut self.slots[index];
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.len -= 1;
        Some(value)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a {
        let world = self.world;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.value.as_ref().map(|value| {
                let handle = H::from_raw(RawHandle {
                    world,
                    index: index as u32,
                    generation: slot.generation,
                });
                (handle, value)
            })
        })
    }
}
