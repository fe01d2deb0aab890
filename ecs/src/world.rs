use std::any::TypeId;
use std::collections::HashMap;

use crate::components::{Children, Parent};
use crate::entity::{Entity, EntityAllocator};
use crate::reference::{EntityReferences, Rint};
use crate::sparse_set::{ComponentStorage, SparseSet};

/// Error returned when a component type has not been registered in the [`World`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNotRegistered {
    /// The name of the unregistered component type.
    pub type_name: &'static str,
}

impl ComponentNotRegistered {
    pub(crate) fn of<T: 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl std::fmt::Display for ComponentNotRegistered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Component type `{}` has never been registered. Call register_component() first.",
            self.type_name
        )
    }
}

impl std::error::Error for ComponentNotRegistered {}

/// A self-contained entity world.
///
/// Components live in one [`SparseSet`] per type. Slot 0 is reserved as the
/// null entity, so a raw index of 0 always means "no entity" (used by parent
/// lookups and reference resolution).
///
/// # Example
///
/// ```
/// use lantern_ecs::World;
///
/// struct Position { x: f32, y: f32 }
///
/// let mut world = World::new();
/// world.register_component::<Position>();
///
/// let entity = world.spawn();
/// world.insert(entity, Position { x: 0.0, y: 1.0 }).unwrap();
///
/// let positions = world.storage::<Position>().unwrap();
/// for (index, pos) in positions.iter() {
///     println!("{index}: ({}, {})", pos.x, pos.y);
/// }
/// ```
pub struct World {
    entities: EntityAllocator,
    components: HashMap<TypeId, ComponentStorage>,
}

impl World {
    /// Creates a new world with the built-in hierarchy and reference
    /// components registered.
    pub fn new() -> Self {
        let mut entities = EntityAllocator::new();
        let null = entities.allocate();
        debug_assert_eq!(null.index(), Entity::NULL_INDEX);

        let mut world = Self {
            entities,
            components: HashMap::new(),
        };
        world.register_component::<Parent>();
        world.register_component::<Children>();
        world.register_component::<EntityReferences>();
        world
    }

    // ---- Entity management ----

    pub fn spawn(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Despawns an entity, removing all its components.
    ///
    /// Children are detached, not despawned; use
    /// [`despawn_recursive`](crate::hierarchy::despawn_recursive) for subtrees.
    /// Returns `false` if the entity was already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if entity.index() == Entity::NULL_INDEX {
            return false;
        }
        if !self.entities.is_alive(entity) {
            return false;
        }
        crate::hierarchy::detach(self, entity);
        self.entities.deallocate(entity);

        let index = entity.index();
        for storage in self.components.values_mut() {
            storage.remove_untyped(index);
        }
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.index() != Entity::NULL_INDEX && self.entities.is_alive(entity)
    }

    /// Returns whether some live entity occupies `index`.
    pub fn contains_index(&self, index: u32) -> bool {
        index != Entity::NULL_INDEX && self.entities.is_index_alive(index)
    }

    /// Returns the current handle for the entity at `index`.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        if index == Entity::NULL_INDEX {
            return None;
        }
        self.entities.entity_at_index(index)
    }

    /// Returns the number of alive entities, excluding the null slot.
    pub fn entity_count(&self) -> u32 {
        self.entities.count() - 1
    }

    /// Highest entity index ever allocated. Dense per-entity arrays sized
    /// `max_entity_index() + 1` can be indexed by any live entity.
    pub fn max_entity_index(&self) -> u32 {
        self.entities.slot_count().saturating_sub(1)
    }

    /// Iterates over all alive entities, in index order.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities
            .iter_alive()
            .filter(|e| e.index() != Entity::NULL_INDEX)
    }

    // ---- Enablement ----

    /// Returns `false` if the entity or any ancestor is disabled.
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.is_index_enabled(entity.index())
    }

    pub fn is_index_enabled(&self, index: u32) -> bool {
        self.entities.get_flags(index) & (Entity::DISABLED | Entity::INHERITED_DISABLED) == 0
    }

    pub(crate) fn flags(&self, index: u32) -> u32 {
        self.entities.get_flags(index)
    }

    pub(crate) fn set_flags(&mut self, index: u32, bits: u32) {
        self.entities.set_flags(index, bits);
    }

    pub(crate) fn clear_flags(&mut self, index: u32, bits: u32) {
        self.entities.clear_flags(index, bits);
    }

    // ---- Component management ----

    /// Registers a component type without inserting any data.
    pub fn register_component<T: Send + Sync + 'static>(&mut self) {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(ComponentStorage::new::<T>);
    }

    pub fn is_component_registered<T: 'static>(&self) -> bool {
        self.components.contains_key(&TypeId::of::<T>())
    }

    /// Inserts a component on an entity, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        assert!(
            self.is_alive(entity),
            "Cannot insert component on dead entity {entity}"
        );
        self.storage_mut::<T>()?.insert(entity.index(), component);
        Ok(())
    }

    /// Inserts `T::default()` on every alive entity in `entities` that does
    /// not have `T` yet. Returns the number of components added.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered.
    pub fn insert_default_batch<T: Default + Send + Sync + 'static>(
        &mut self,
        entities: &[Entity],
    ) -> Result<usize, ComponentNotRegistered> {
        let storage = self
            .components
            .get_mut(&TypeId::of::<T>())
            .and_then(ComponentStorage::typed_mut::<T>)
            .ok_or_else(ComponentNotRegistered::of::<T>)?;
        storage.reserve(entities.len());

        let mut added = 0;
        for entity in entities {
            if !self.entities.is_alive(*entity) || storage.contains(entity.index()) {
                continue;
            }
            storage.insert(entity.index(), T::default());
            added += 1;
        }
        Ok(added)
    }

    /// Removes a component from an entity.
    pub fn remove<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>().ok()?.remove(entity.index())
    }

    pub fn get<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.get_by_index(entity.index())
    }

    pub fn get_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>().ok()?.get_mut(entity.index())
    }

    /// Looks a component up by raw index, without a generation check.
    pub fn get_by_index<T: 'static>(&self, index: u32) -> Option<&T> {
        self.storage::<T>().ok()?.get(index)
    }

    pub fn has<T: 'static>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Returns the storage of `T` for span iteration.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered.
    pub fn storage<T: 'static>(&self) -> Result<&SparseSet<T>, ComponentNotRegistered> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(ComponentStorage::typed::<T>)
            .ok_or_else(ComponentNotRegistered::of::<T>)
    }

    /// Returns the storage of `T` for in-place mutation.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered.
    pub fn storage_mut<T: 'static>(&mut self) -> Result<&mut SparseSet<T>, ComponentNotRegistered> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(ComponentStorage::typed_mut::<T>)
            .ok_or_else(ComponentNotRegistered::of::<T>)
    }

    // ---- Hierarchy and references ----

    /// Returns the parent index of the entity at `index`, or 0 for a root.
    pub fn parent_index(&self, index: u32) -> u32 {
        self.get_by_index::<Parent>(index)
            .map_or(Entity::NULL_INDEX, |p| p.0.index())
    }

    /// Stores `target` in the reference table of `owner` and returns its slot.
    ///
    /// # Panics
    ///
    /// Panics if `owner` is not alive.
    pub fn add_reference(&mut self, owner: Entity, target: Entity) -> Rint {
        assert!(
            self.is_alive(owner),
            "Cannot add a reference on dead entity {owner}"
        );
        if let Some(refs) = self.get_mut::<EntityReferences>(owner) {
            return refs.push(target);
        }
        let mut refs = EntityReferences::default();
        let rint = refs.push(target);
        if let Ok(storage) = self.storage_mut::<EntityReferences>() {
            storage.insert(owner.index(), refs);
        }
        rint
    }

    /// Resolves `rint` against the reference table of the entity at
    /// `owner_index`. Returns 0 when the slot is null, unknown, or points at
    /// an entity that no longer exists.
    pub fn resolve_reference(&self, owner_index: u32, rint: Rint) -> u32 {
        self.get_by_index::<EntityReferences>(owner_index)
            .and_then(|refs| refs.get(rint))
            .filter(|target| self.is_alive(*target))
            .map_or(Entity::NULL_INDEX, |target| target.index())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
