//! Per-tick copy of the rendering components, indexed by entity.
//!
//! Grouping renderers is O(viewports × renderers) and each renderer needs
//! its material, mesh and two shaders. Copying the four component types
//! into one flat array first turns those lookups into plain indexing.

use bitflags::bitflags;
use lantern_ecs::{ComponentNotRegistered, World};

use crate::components::{IsMaterial, IsMesh, IsRenderer, IsShader};

bitflags! {
    /// Which payloads of an [`EntityComponents`] entry are valid.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u8 {
        const RENDERER = 1 << 0;
        const MATERIAL = 1 << 1;
        const SHADER = 1 << 2;
        const MESH = 1 << 3;
    }
}

/// Snapshot of one entity's rendering components.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityComponents {
    pub flags: ComponentFlags,
    pub renderer: IsRenderer,
    pub material: IsMaterial,
    pub shader: IsShader,
    pub mesh: IsMesh,
}

impl EntityComponents {
    pub fn renderer(&self) -> Option<&IsRenderer> {
        self.flags
            .contains(ComponentFlags::RENDERER)
            .then_some(&self.renderer)
    }

    pub fn material(&self) -> Option<&IsMaterial> {
        self.flags
            .contains(ComponentFlags::MATERIAL)
            .then_some(&self.material)
    }

    pub fn shader(&self) -> Option<&IsShader> {
        self.flags
            .contains(ComponentFlags::SHADER)
            .then_some(&self.shader)
    }

    pub fn mesh(&self) -> Option<&IsMesh> {
        self.flags.contains(ComponentFlags::MESH).then_some(&self.mesh)
    }
}

/// Dense array of [`EntityComponents`], rebuilt from scratch every tick.
///
/// The array length is a power of two at least `max_entity_index + 1`. It
/// grows when the world grows and is never shrunk.
#[derive(Debug, Default)]
pub struct ComponentSnapshot {
    entries: Vec<EntityComponents>,
}

impl ComponentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![EntityComponents::default(); capacity.next_power_of_two()],
        }
    }

    /// Clears the snapshot and refills it from `world`.
    ///
    /// Disabled renderers are left out. Materials, shaders and meshes are
    /// collected even when disabled, since enabled renderers may share them.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if one of the four component types
    /// is unknown to `world`.
    pub fn rebuild(&mut self, world: &World) -> Result<(), ComponentNotRegistered> {
        let required = (world.max_entity_index() as usize + 1).next_power_of_two();
        if self.entries.len() < required {
            self.entries.resize(required, EntityComponents::default());
        }
        self.entries.fill(EntityComponents::default());

        let renderers = world.storage::<IsRenderer>()?;
        for (&index, renderer) in renderers.entities().iter().zip(renderers.components()) {
            if !world.is_index_enabled(index) {
                continue;
            }
            let entry = &mut self.entries[index as usize];
            entry.flags |= ComponentFlags::RENDERER;
            entry.renderer = *renderer;
        }

        let materials = world.storage::<IsMaterial>()?;
        for (&index, material) in materials.entities().iter().zip(materials.components()) {
            let entry = &mut self.entries[index as usize];
            entry.flags |= ComponentFlags::MATERIAL;
            entry.material = *material;
        }

        let shaders = world.storage::<IsShader>()?;
        for (&index, shader) in shaders.entities().iter().zip(shaders.components()) {
            let entry = &mut self.entries[index as usize];
            entry.flags |= ComponentFlags::SHADER;
            entry.shader = *shader;
        }

        let meshes = world.storage::<IsMesh>()?;
        for (&index, mesh) in meshes.entities().iter().zip(meshes.components()) {
            let entry = &mut self.entries[index as usize];
            entry.flags |= ComponentFlags::MESH;
            entry.mesh = *mesh;
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for the entity at `index`; index 0 and out-of-range indices
    /// yield `None`.
    pub fn get(&self, index: u32) -> Option<&EntityComponents> {
        if index == 0 {
            return None;
        }
        self.entries.get(index as usize)
    }

    /// Indices of enabled renderers, ascending.
    pub fn renderers(&self) -> impl Iterator<Item = (u32, &IsRenderer)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(index, entry)| entry.renderer().map(|r| (index as u32, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_rendering_components;
    use lantern_ecs::hierarchy::disable;

    fn world() -> World {
        let mut world = World::new();
        register_rendering_components(&mut world);
        world
    }

    #[test]
    fn capacity_is_next_power_of_two() {
        let mut world = world();
        for _ in 0..5 {
            world.spawn();
        }
        let mut snapshot = ComponentSnapshot::new();
        snapshot.rebuild(&world).unwrap();
        assert_eq!(snapshot.len(), 8);

        for _ in 0..10 {
            world.spawn();
        }
        snapshot.rebuild(&world).unwrap();
        assert_eq!(snapshot.len(), 16);
    }

    #[test]
    fn disabled_renderer_is_skipped_but_material_kept() {
        let mut world = world();
        let entity = world.spawn();
        world.insert(entity, IsRenderer::default()).unwrap();
        world.insert(entity, IsMaterial::default()).unwrap();
        disable(&mut world, entity);

        let mut snapshot = ComponentSnapshot::new();
        snapshot.rebuild(&world).unwrap();

        let entry = snapshot.get(entity.index()).unwrap();
        assert!(entry.renderer().is_none());
        assert!(entry.material().is_some());
        assert_eq!(snapshot.renderers().count(), 0);
    }

    #[test]
    fn rebuild_forgets_removed_components() {
        let mut world = world();
        let mesh = world.spawn();
        world.insert(mesh, IsMesh { version: 4 }).unwrap();

        let mut snapshot = ComponentSnapshot::new();
        snapshot.rebuild(&world).unwrap();
        assert_eq!(snapshot.get(mesh.index()).unwrap().mesh(), Some(&IsMesh { version: 4 }));

        world.remove::<IsMesh>(mesh);
        snapshot.rebuild(&world).unwrap();
        assert_eq!(snapshot.get(mesh.index()).unwrap().flags, ComponentFlags::empty());
    }

    #[test]
    fn renderers_are_listed_in_index_order() {
        let mut world = world();
        let entities: Vec<_> = (0..4).map(|_| world.spawn()).collect();
        for e in entities.iter().rev() {
            world.insert(*e, IsRenderer::default()).unwrap();
        }
        let mut snapshot = ComponentSnapshot::with_capacity(2);
        snapshot.rebuild(&world).unwrap();

        let seen: Vec<u32> = snapshot.renderers().map(|(i, _)| i).collect();
        let expected: Vec<u32> = entities.iter().map(|e| e.index()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn unregistered_world_is_an_error() {
        let world = World::new();
        let mut snapshot = ComponentSnapshot::new();
        assert!(snapshot.rebuild(&world).is_err());
    }
}
