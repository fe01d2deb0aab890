//! Nested scissor clamping.
//!
//! Every entity with a [`RendererScissor`] gets a [`WorldRendererScissor`]
//! holding its rectangle clamped into the world scissor of its nearest
//! scissor-bearing ancestor. Entities without a scissor in between are
//! skipped over, so a grandchild clamps against its grandparent when the
//! parent has none.

use bytemuck::{Pod, Zeroable};
use fixedbitset::FixedBitSet;
use lantern_ecs::{ComponentNotRegistered, Entity, Operation, World};

use crate::components::{RendererScissor, WorldRendererScissor};
use crate::config::RenderEngineConfig;

/// Axis-aligned rectangle stored as position and size.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ScissorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScissorRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Clamps both corners into `bounds`, one axis at a time.
    ///
    /// A rectangle entirely outside `bounds` collapses onto its edge with a
    /// zero size rather than being rejected. Malformed input (negative
    /// sizes) can come out with a negative size; treat that as empty too.
    pub fn clamp_within(&self, bounds: &ScissorRect) -> ScissorRect {
        let clamp = |value: f32, min: f32, max: f32| value.max(min).min(max);
        let min_x = clamp(self.x, bounds.x, bounds.max_x());
        let min_y = clamp(self.y, bounds.y, bounds.max_y());
        let max_x = clamp(self.max_x(), bounds.x, bounds.max_x());
        let max_y = clamp(self.max_y(), bounds.y, bounds.max_y());
        ScissorRect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Computes [`WorldRendererScissor`] for every scissor-bearing entity.
///
/// # Access
///
/// - Reads: `RendererScissor`, `Parent`
/// - Writes: `WorldRendererScissor` (added in one batched operation to
///   entities that lack it)
///
/// # Notes
///
/// Entities are processed bucketed by hierarchy depth, shallowest first,
/// so an entity's ancestors are final before the entity itself is clamped.
/// Ancestor lookup walks a flat parent table iteratively.
pub struct ClampNestedScissorViews {
    scissors: Vec<ScissorRect>,
    has_scissor: FixedBitSet,
    parents: Vec<u32>,
    depth_buckets: Vec<Vec<u32>>,
    add_outputs: Operation,
}

impl ClampNestedScissorViews {
    pub fn new() -> Self {
        Self::with_config(&RenderEngineConfig::default())
    }

    pub fn with_config(config: &RenderEngineConfig) -> Self {
        let capacity = config.initial_entity_capacity.max(1).next_power_of_two();
        let mut add_outputs = Operation::new();
        add_outputs.add_component_type::<WorldRendererScissor>();
        Self {
            scissors: vec![ScissorRect::default(); capacity],
            has_scissor: FixedBitSet::with_capacity(capacity),
            parents: vec![Entity::NULL_INDEX; capacity],
            depth_buckets: (0..config.initial_depth_buckets).map(|_| Vec::new()).collect(),
            add_outputs,
        }
    }

    /// Runs one clamping pass over `world`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if the scissor components are not
    /// registered.
    pub fn update(&mut self, world: &mut World) -> Result<(), ComponentNotRegistered> {
        self.add_missing_outputs(world)?;
        self.prepare(world);
        self.bucket_by_depth(world)?;
        self.clamp();
        self.write_back(world)
    }

    fn add_missing_outputs(&mut self, world: &mut World) -> Result<(), ComponentNotRegistered> {
        let outputs = world.storage::<WorldRendererScissor>()?;
        let missing: Vec<Entity> = world
            .storage::<RendererScissor>()?
            .entities()
            .iter()
            .filter(|&&index| !outputs.contains(index))
            .filter_map(|&index| world.entity_at(index))
            .collect();
        if !missing.is_empty() {
            self.add_outputs.select_entities(missing);
            self.add_outputs.perform(world)?;
        }
        Ok(())
    }

    fn prepare(&mut self, world: &World) {
        let required = (world.max_entity_index() as usize + 1).next_power_of_two();
        if self.scissors.len() < required {
            self.scissors.resize(required, ScissorRect::default());
            self.parents.resize(required, Entity::NULL_INDEX);
            self.has_scissor.grow(required);
        }
        self.scissors.fill(ScissorRect::default());
        self.parents.fill(Entity::NULL_INDEX);
        self.has_scissor.clear();
        for bucket in &mut self.depth_buckets {
            bucket.clear();
        }

        for entity in world.iter_entities() {
            let index = entity.index();
            self.parents[index as usize] = world.parent_index(index);
        }
    }

    fn bucket_by_depth(&mut self, world: &World) -> Result<(), ComponentNotRegistered> {
        let scissors = world.storage::<RendererScissor>()?;
        for (index, scissor) in scissors.iter() {
            self.scissors[index as usize] = scissor.0;
            self.has_scissor.insert(index as usize);

            let depth = self.depth_of(index);
            if depth >= self.depth_buckets.len() {
                self.depth_buckets.resize_with(depth + 1, Vec::new);
            }
            self.depth_buckets[depth].push(index);
        }
        Ok(())
    }

    fn depth_of(&self, index: u32) -> usize {
        let mut depth = 0;
        let mut current = self.parents[index as usize];
        while current != Entity::NULL_INDEX {
            depth += 1;
            current = self.parents[current as usize];
        }
        depth
    }

    fn nearest_scissor_ancestor(&self, index: u32) -> Option<u32> {
        let mut current = self.parents[index as usize];
        while current != Entity::NULL_INDEX {
            if self.has_scissor.contains(current as usize) {
                return Some(current);
            }
            current = self.parents[current as usize];
        }
        None
    }

    fn clamp(&mut self) {
        for depth in 0..self.depth_buckets.len() {
            for i in 0..self.depth_buckets[depth].len() {
                let index = self.depth_buckets[depth][i];
                if let Some(ancestor) = self.nearest_scissor_ancestor(index) {
                    let bounds = self.scissors[ancestor as usize];
                    let own = &mut self.scissors[index as usize];
                    *own = own.clamp_within(&bounds);
                }
            }
        }
    }

    /// Outputs whose entity lost its `RendererScissor` get the default
    /// (empty) rectangle.
    fn write_back(&self, world: &mut World) -> Result<(), ComponentNotRegistered> {
        let outputs = world.storage_mut::<WorldRendererScissor>()?;
        for (index, output) in outputs.iter_mut() {
            output.0 = self.scissors[index as usize];
        }
        Ok(())
    }

    /// Number of depth levels seen so far (grows, never shrinks).
    pub fn depth_capacity(&self) -> usize {
        self.depth_buckets.len()
    }
}

impl Default for ClampNestedScissorViews {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_rendering_components;
    use lantern_ecs::hierarchy::set_parent;
    use rstest::rstest;

    fn world() -> World {
        let mut world = World::new();
        register_rendering_components(&mut world);
        world
    }

    fn with_scissor(world: &mut World, rect: ScissorRect) -> Entity {
        let entity = world.spawn();
        world.insert(entity, RendererScissor(rect)).unwrap();
        entity
    }

    #[rstest]
    #[case::inside(ScissorRect::new(10.0, 10.0, 20.0, 20.0), ScissorRect::new(10.0, 10.0, 20.0, 20.0))]
    #[case::overhang(ScissorRect::new(50.0, 50.0, 100.0, 100.0), ScissorRect::new(50.0, 50.0, 50.0, 50.0))]
    #[case::below(ScissorRect::new(0.0, 200.0, 100.0, 20.0), ScissorRect::new(0.0, 100.0, 100.0, 0.0))]
    #[case::left(ScissorRect::new(-40.0, 0.0, 20.0, 100.0), ScissorRect::new(0.0, 0.0, 0.0, 100.0))]
    #[case::covering(ScissorRect::new(-10.0, -10.0, 500.0, 500.0), ScissorRect::new(0.0, 0.0, 100.0, 100.0))]
    fn clamp_within_parent(#[case] child: ScissorRect, #[case] expected: ScissorRect) {
        let parent = ScissorRect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(child.clamp_within(&parent), expected);
    }

    #[test]
    fn degenerate_results_are_empty() {
        assert!(ScissorRect::new(0.0, 100.0, 100.0, 0.0).is_empty());
        assert!(ScissorRect::new(0.0, 0.0, -1.0, 5.0).is_empty());
        assert!(!ScissorRect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn outputs_are_added_in_one_pass() {
        let mut world = world();
        let a = with_scissor(&mut world, ScissorRect::new(0.0, 0.0, 10.0, 10.0));
        let b = with_scissor(&mut world, ScissorRect::new(5.0, 5.0, 10.0, 10.0));

        let mut system = ClampNestedScissorViews::new();
        system.update(&mut world).unwrap();

        assert_eq!(world.get::<WorldRendererScissor>(a).unwrap().0, ScissorRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(world.get::<WorldRendererScissor>(b).unwrap().0, ScissorRect::new(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn deep_chain_grows_depth_buckets() {
        let mut world = world();
        let mut previous = with_scissor(&mut world, ScissorRect::new(0.0, 0.0, 100.0, 100.0));
        for i in 1..20 {
            let offset = i as f32;
            let next = with_scissor(&mut world, ScissorRect::new(offset, offset, 100.0, 100.0));
            set_parent(&mut world, next, previous);
            previous = next;
        }

        let mut system = ClampNestedScissorViews::new();
        system.update(&mut world).unwrap();

        assert!(system.depth_capacity() >= 20);
        let leaf = world.get::<WorldRendererScissor>(previous).unwrap().0;
        assert_eq!(leaf, ScissorRect::new(19.0, 19.0, 81.0, 81.0));
    }

    #[test]
    fn unparented_scissors_are_copied_verbatim() {
        let mut world = world();
        let rect = ScissorRect::new(-5.0, 3.0, 7.0, 9.0);
        let entity = with_scissor(&mut world, rect);

        let mut system = ClampNestedScissorViews::new();
        system.update(&mut world).unwrap();
        system.update(&mut world).unwrap();

        assert_eq!(world.get::<WorldRendererScissor>(entity).unwrap().0, rect);
    }
}
