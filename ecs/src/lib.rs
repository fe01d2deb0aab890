//! # Lantern ECS
//!
//! A small sparse-set entity world. It is the storage collaborator of the
//! Lantern rendering layer and exposes exactly what that layer consumes:
//!
//! - [`Entity`]: generational identifier; index 0 is the null entity
//! - [`World`]: entities plus one [`SparseSet`] per component type, whose
//!   dense entity/component slices serve as iteration spans
//! - [`hierarchy`]: parents, children, depth, and enable/disable propagation
//! - [`Rint`]: entity-local references resolved through [`World::resolve_reference`]
//! - [`Operation`]: batched "add component to selected entities" edits

pub mod components;
mod entity;
pub mod hierarchy;
mod operation;
mod reference;
mod sparse_set;
mod world;

pub use components::{Children, Parent};
pub use entity::Entity;
pub use operation::Operation;
pub use reference::{EntityReferences, Rint};
pub use sparse_set::SparseSet;
pub use world::{ComponentNotRegistered, World};
