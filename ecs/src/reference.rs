//! Entity-local references.
//!
//! Components never store [`Entity`] handles directly. Instead an entity
//! owns a small reference table, and its components store a [`Rint`] (a
//! 1-based index into that table). Resolving a `Rint` yields the target's
//! absolute index, or 0 once the target has been despawned.

use crate::Entity;

/// Index into an entity's reference table. `Rint::NULL` refers to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rint(pub u32);

impl Rint {
    pub const NULL: Rint = Rint(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The reference table owned by one entity.
///
/// Managed through [`World::add_reference`](crate::World::add_reference)
/// and [`World::resolve_reference`](crate::World::resolve_reference).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityReferences(pub(crate) Vec<Entity>);

impl EntityReferences {
    /// Returns the stored handle for `rint`, if the slot exists.
    pub fn get(&self, rint: Rint) -> Option<Entity> {
        if rint.is_null() {
            return None;
        }
        self.0.get(rint.0 as usize - 1).copied()
    }

    /// Appends a target, reusing its slot when already present.
    pub(crate) fn push(&mut self, target: Entity) -> Rint {
        if let Some(pos) = self.0.iter().position(|&e| e == target) {
            return Rint(pos as u32 + 1);
        }
        self.0.push(target);
        Rint(self.0.len() as u32)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
