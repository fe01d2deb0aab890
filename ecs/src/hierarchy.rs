//! Parent-child hierarchy and enablement.
//!
//! All operations keep [`Parent`] and [`Children`] consistent and keep the
//! `INHERITED_DISABLED` bit of every descendant in sync with its ancestors.
//!
//! ```ignore
//! set_parent(&mut world, child, parent);
//! disable(&mut world, parent); // child is now disabled too
//! enable(&mut world, parent);
//! remove_parent(&mut world, child);
//! despawn_recursive(&mut world, parent);
//! ```

use crate::components::{Children, Parent};
use crate::{Entity, World};

/// Sets `entity` as a child of `parent`.
///
/// If `entity` already has a different parent it is removed from the old
/// parent's children first.
///
/// # Panics
///
/// Panics if either entity is dead, if `entity == parent`, or if `parent`
/// is a descendant of `entity`.
pub fn set_parent(world: &mut World, entity: Entity, parent: Entity) {
    assert_ne!(
        entity, parent,
        "Cannot set entity as its own parent: {entity}"
    );
    assert!(
        world.is_alive(entity) && world.is_alive(parent),
        "Cannot parent dead entities: {entity} -> {parent}"
    );
    assert!(
        !is_ancestor(world, entity.index(), parent.index()),
        "Parenting {entity} under {parent} would create a cycle"
    );

    if let Some(old_parent) = world.get::<Parent>(entity).map(|p| p.0) {
        if old_parent == parent {
            return;
        }
        if let Some(children) = world.get_mut::<Children>(old_parent) {
            children.0.retain(|&e| e != entity);
        }
    }

    if let Ok(parents) = world.storage_mut::<Parent>() {
        parents.insert(entity.index(), Parent(parent));
    }

    if let Some(children) = world.get_mut::<Children>(parent) {
        if !children.0.contains(&entity) {
            children.0.push(entity);
        }
    } else if let Ok(children) = world.storage_mut::<Children>() {
        children.insert(parent.index(), Children(vec![entity]));
    }

    refresh_inherited(world, entity);
}

/// Removes the parent relationship from `entity`. No-op for roots.
pub fn remove_parent(world: &mut World, entity: Entity) {
    let Some(parent) = world.remove::<Parent>(entity) else {
        return;
    };
    if let Some(children) = world.get_mut::<Children>(parent.0) {
        children.0.retain(|&e| e != entity);
    }
    refresh_inherited(world, entity);
}

/// Despawns an entity and all its descendants.
pub fn despawn_recursive(world: &mut World, entity: Entity) {
    let mut stack = vec![entity];
    let mut subtree = Vec::new();
    while let Some(current) = stack.pop() {
        if let Some(children) = world.get::<Children>(current) {
            stack.extend(children.iter().copied());
        }
        subtree.push(current);
    }
    for e in subtree {
        world.despawn(e);
    }
}

/// Disables `entity`. Its descendants become disabled by inheritance.
pub fn disable(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        return;
    }
    world.set_flags(entity.index(), Entity::DISABLED);
    refresh_inherited(world, entity);
}

/// Re-enables `entity`. Descendants that were disabled on their own stay
/// disabled, as does everything below them.
pub fn enable(world: &mut World, entity: Entity) {
    if !world.is_alive(entity) {
        return;
    }
    world.clear_flags(entity.index(), Entity::DISABLED);
    refresh_inherited(world, entity);
}

/// Number of parent hops from the entity at `index` to its root.
pub fn depth(world: &World, index: u32) -> u32 {
    let mut depth = 0;
    let mut current = world.parent_index(index);
    while current != Entity::NULL_INDEX {
        depth += 1;
        current = world.parent_index(current);
    }
    depth
}

/// Returns whether `ancestor` is `index` or one of its ancestors.
fn is_ancestor(world: &World, ancestor: u32, index: u32) -> bool {
    let mut current = index;
    while current != Entity::NULL_INDEX {
        if current == ancestor {
            return true;
        }
        current = world.parent_index(current);
    }
    false
}

/// Unlinks `entity` from its parent and turns its children into roots.
/// Called by [`World::despawn`] before the components are dropped.
pub(crate) fn detach(world: &mut World, entity: Entity) {
    remove_parent(world, entity);
    let children = world
        .remove::<Children>(entity)
        .map(|c| c.0)
        .unwrap_or_default();
    for child in children {
        world.remove::<Parent>(child);
        refresh_inherited(world, child);
    }
}

/// Recomputes `INHERITED_DISABLED` for `root` and everything below it.
fn refresh_inherited(world: &mut World, root: Entity) {
    let parent = world.parent_index(root.index());
    let inherited = parent != Entity::NULL_INDEX && !world.is_index_enabled(parent);

    let mut stack = vec![(root.index(), inherited)];
    while let Some((index, inherited)) = stack.pop() {
        if inherited {
            world.set_flags(index, Entity::INHERITED_DISABLED);
        } else {
            world.clear_flags(index, Entity::INHERITED_DISABLED);
        }
        let blocked = inherited || world.flags(index) & Entity::DISABLED != 0;
        if let Some(children) = world.get_by_index::<Children>(index) {
            stack.extend(children.iter().map(|c| (c.index(), blocked)));
        }
    }
}
