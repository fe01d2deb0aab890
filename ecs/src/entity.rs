use std::hash::{Hash, Hasher};

/// A 128-bit entity identifier with spawn tick and flag bits.
///
/// Layout: `u32 index` + `u32 flags` + `u64 spawn_tick`.
///
/// - **index**: slot index in the entity allocator. Index 0 is the null
///   entity and is never handed out by [`World::spawn`](crate::World::spawn).
/// - **flags**: per-entity state bits (disabled, inherited-disabled)
/// - **spawn_tick**: generation of the slot. When a slot is reused the new
///   spawn tick differs, so stale handles stop resolving.
///
/// # Identity
///
/// Two entities are equal if they have the same `(index, spawn_tick)`.
/// Flags are mutable state and do **not** affect equality or hashing.
#[derive(Clone, Copy)]
pub struct Entity {
    index: u32,
    flags: u32,
    spawn_tick: u64,
}

impl Entity {
    /// Entity is manually disabled.
    pub const DISABLED: u32 = 1 << 0;
    /// Entity is disabled because an ancestor was disabled (propagated).
    pub const INHERITED_DISABLED: u32 = 1 << 1;

    /// Index of the reserved null slot.
    pub const NULL_INDEX: u32 = 0;

    /// A handle that never refers to a live entity.
    pub const NULL: Entity = Entity {
        index: Self::NULL_INDEX,
        flags: 0,
        spawn_tick: 0,
    };

    pub(crate) fn new(index: u32, spawn_tick: u64) -> Self {
        Self {
            index,
            flags: 0,
            spawn_tick,
        }
    }

    pub(crate) fn with_flags(index: u32, spawn_tick: u64, flags: u32) -> Self {
        Self {
            index,
            flags,
            spawn_tick,
        }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the spawn tick (generation) of this entity.
    pub fn spawn_tick(&self) -> u64 {
        self.spawn_tick
    }

    /// Returns the flags captured when this handle was produced.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Returns `true` if either disable bit was set when this handle was produced.
    pub fn is_disabled(&self) -> bool {
        self.flags & (Self::DISABLED | Self::INHERITED_DISABLED) != 0
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.spawn_tick == other.spawn_tick
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.spawn_tick.hash(state);
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index, self.spawn_tick)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}@{})", self.index, self.spawn_tick)
    }
}

/// Allocates and recycles entity slots.
///
/// Despawned slots go on a LIFO free list. A recycled slot gets a fresh
/// spawn tick so handles to its previous occupant no longer compare alive.
pub(crate) struct EntityAllocator {
    spawn_ticks: Vec<u64>,
    flags: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    count: u32,
    next_tick: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            spawn_ticks: Vec::new(),
            flags: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            count: 0,
            next_tick: 1,
        }
    }

    /// Allocates a new entity, reusing a recycled slot if available.
    pub fn allocate(&mut self) -> Entity {
        let tick = self.next_tick;
        self.next_tick += 1;
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            self.spawn_ticks[idx] = tick;
            self.flags[idx] = 0;
            Entity::new(index, tick)
        } else {
            let index = self.spawn_ticks.len() as u32;
            self.spawn_ticks.push(tick);
            self.flags.push(0);
            self.alive.push(true);
            Entity::new(index, tick)
        }
    }

    /// Deallocates an entity. Returns false if already dead or stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index() as usize;
        self.alive[idx] = false;
        self.flags[idx] = 0;
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        idx < self.alive.len() && self.alive[idx] && self.spawn_ticks[idx] == entity.spawn_tick()
    }

    pub fn is_index_alive(&self, index: u32) -> bool {
        self.alive.get(index as usize).copied().unwrap_or(false)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of slots ever allocated (alive or recycled).
    pub fn slot_count(&self) -> u32 {
        self.alive.len() as u32
    }

    pub fn set_flags(&mut self, index: u32, bits: u32) {
        self.flags[index as usize] |= bits;
    }

    pub fn clear_flags(&mut self, index: u32, bits: u32) {
        self.flags[index as usize] &= !bits;
    }

    pub fn get_flags(&self, index: u32) -> u32 {
        self.flags.get(index as usize).copied().unwrap_or(0)
    }

    /// Returns the alive entity at the given index.
    pub fn entity_at_index(&self, index: u32) -> Option<Entity> {
        let idx = index as usize;
        if self.is_index_alive(index) {
            Some(Entity::with_flags(
                index,
                self.spawn_ticks[idx],
                self.flags[idx],
            ))
        } else {
            None
        }
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::with_flags(idx as u32, self.spawn_ticks[idx], self.flags[idx]))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
