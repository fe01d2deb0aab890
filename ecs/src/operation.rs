use fixedbitset::FixedBitSet;

use crate::world::ComponentNotRegistered;
use crate::{Entity, World};

type AddFn = fn(&mut World, &[Entity]) -> Result<usize, ComponentNotRegistered>;

/// A batched structural edit.
///
/// Collects a selection of entities and a list of component types, then
/// applies every "add default component" to every selected entity in one
/// pass per type. Entities that already carry a component keep their value.
///
/// The component list survives [`perform`](Self::perform), so one
/// `Operation` can be kept by a system and refilled each tick.
///
/// ```
/// use lantern_ecs::{Operation, World};
///
/// #[derive(Default)]
/// struct Marker;
///
/// let mut world = World::new();
/// world.register_component::<Marker>();
/// let a = world.spawn();
///
/// let mut op = Operation::new();
/// op.add_component_type::<Marker>();
/// op.select_entities([a]);
/// assert_eq!(op.perform(&mut world).unwrap(), 1);
/// assert!(world.has::<Marker>(a));
/// ```
#[derive(Default)]
pub struct Operation {
    selected: Vec<Entity>,
    seen: FixedBitSet,
    adds: Vec<AddFn>,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds entities to the selection. Duplicates are ignored.
    pub fn select_entities(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            let index = entity.index() as usize;
            if index >= self.seen.len() {
                self.seen.grow((index + 1).next_power_of_two());
            }
            if !self.seen.put(index) {
                self.selected.push(entity);
            }
        }
    }

    /// Queues `T::default()` to be added to every selected entity.
    pub fn add_component_type<T: Default + Send + Sync + 'static>(&mut self) -> &mut Self {
        self.adds.push(|world, entities| world.insert_default_batch::<T>(entities));
        self
    }

    pub fn selected(&self) -> &[Entity] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Applies the queued component additions and clears the selection.
    ///
    /// Returns the total number of components added across all types.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if a queued type is unknown to
    /// `world`. The selection is kept in that case.
    pub fn perform(&mut self, world: &mut World) -> Result<usize, ComponentNotRegistered> {
        let mut added = 0;
        if !self.selected.is_empty() {
            for add in &self.adds {
                added += add(world, &self.selected)?;
            }
            log::trace!(
                "Operation added {added} components over {} entities",
                self.selected.len()
            );
        }
        self.clear_selection();
        Ok(added)
    }

    /// Clears both the selection and the queued component types.
    pub fn reset(&mut self) {
        self.clear_selection();
        self.adds.clear();
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
        self.seen.clear();
    }
}
