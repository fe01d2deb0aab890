//! Batch preprocessing hooks.
//!
//! A plugin sees every non-empty batch right before it reaches the backend,
//! together with the batch's render group and read access to the world. It
//! may reorder or rewrite the entries in place.
//!
//! Plugins come from two places: [`RenderEngine::add_plugin`](crate::RenderEngine::add_plugin)
//! and any entity carrying a [`RenderEnginePlugin`] component. The latter set
//! is collected again every tick.

use lantern_ecs::{ComponentNotRegistered, World};

use crate::render_entity::RenderEntity;

/// Signature of a batch preprocessing hook.
pub type RenderEnginePluginFn = fn(&World, i8, &mut [RenderEntity]);

/// Component declaring a plugin from inside the world.
#[derive(Clone, Copy)]
pub struct RenderEnginePlugin(pub RenderEnginePluginFn);

impl std::fmt::Debug for RenderEnginePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RenderEnginePlugin({:p})", self.0 as *const ())
    }
}

/// Fills `out` with `registered` followed by the world's plugins in entity
/// order. Disabled plugin entities are skipped.
pub(crate) fn collect_plugins(
    world: &World,
    registered: &[RenderEnginePluginFn],
    out: &mut Vec<RenderEnginePluginFn>,
) -> Result<(), ComponentNotRegistered> {
    out.clear();
    out.extend_from_slice(registered);

    // Dense order changes with removals; sort by entity for a stable call order.
    let plugins = world.storage::<RenderEnginePlugin>()?;
    let mut world_plugins: Vec<(u32, RenderEnginePluginFn)> = plugins
        .iter()
        .filter(|(index, _)| world.is_index_enabled(*index))
        .map(|(index, plugin)| (index, plugin.0))
        .collect();
    world_plugins.sort_unstable_by_key(|(index, _)| *index);
    out.extend(world_plugins.into_iter().map(|(_, f)| f));
    Ok(())
}

/// Plugin that orders each batch by material, then mesh, then renderer.
///
/// Keeps draws with the same pipeline and mesh adjacent regardless of the
/// order renderers were discovered in.
pub fn sort_by_combination(_world: &World, _render_group: i8, entities: &mut [RenderEntity]) {
    entities.sort_unstable_by_key(|e| (e.material, e.mesh, e.renderer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_rendering_components;
    use lantern_ecs::hierarchy::disable;

    fn reverse(_: &World, _: i8, entities: &mut [RenderEntity]) {
        entities.reverse();
    }

    fn clear_group(_: &World, _: i8, entities: &mut [RenderEntity]) {
        for e in entities {
            e.mesh_version = 0;
        }
    }

    #[test]
    fn registered_plugins_come_first() {
        let mut world = World::new();
        register_rendering_components(&mut world);
        let a = world.spawn();
        let b = world.spawn();
        world.insert(b, RenderEnginePlugin(clear_group)).unwrap();
        world.insert(a, RenderEnginePlugin(reverse)).unwrap();

        let mut out = Vec::new();
        collect_plugins(&world, &[sort_by_combination as RenderEnginePluginFn], &mut out).unwrap();

        assert_eq!(out.len(), 3);
        assert!(std::ptr::fn_addr_eq(out[0], sort_by_combination as RenderEnginePluginFn));
        assert!(std::ptr::fn_addr_eq(out[1], reverse as RenderEnginePluginFn));
        assert!(std::ptr::fn_addr_eq(out[2], clear_group as RenderEnginePluginFn));
    }

    #[test]
    fn disabled_plugin_entities_are_ignored() {
        let mut world = World::new();
        register_rendering_components(&mut world);
        let a = world.spawn();
        world.insert(a, RenderEnginePlugin(reverse)).unwrap();
        disable(&mut world, a);

        let mut out = vec![reverse as RenderEnginePluginFn];
        collect_plugins(&world, &[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn sort_by_combination_groups_pairs() {
        let world = World::new();
        let entity = |renderer, material, mesh| RenderEntity {
            renderer,
            material,
            mesh,
            ..RenderEntity::default()
        };
        let mut batch = [entity(1, 2, 9), entity(2, 1, 9), entity(3, 2, 3)];
        sort_by_combination(&world, 0, &mut batch);
        let order: Vec<u32> = batch.iter().map(|e| e.renderer).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
