//! Per-destination rendering state.

use lantern_ecs::{Entity, World};

use crate::backend::{InstanceHandle, MachineHandle, RenderingBackend, StatusCode, SurfaceHandle};
use crate::plugin::RenderEnginePluginFn;
use crate::render_entity::RenderEntity;
use crate::viewport_group::ViewportGroup;

/// Binds one destination to the backend that renders it.
///
/// Holds the backend's handles for the destination, whether a surface has
/// been announced yet, and the viewport groups collected this tick. The
/// backend itself is owned by the [`BackendRegistry`](crate::BackendRegistry)
/// and passed in for every call.
#[derive(Debug)]
pub struct RenderingMachine {
    destination: Entity,
    handle: MachineHandle,
    instance: InstanceHandle,
    has_surface: bool,
    viewport_groups: Vec<ViewportGroup>,
    collected: u32,
}

impl RenderingMachine {
    /// Asks `backend` to allocate state for `destination`.
    pub fn create(
        backend: &mut dyn RenderingBackend,
        destination: Entity,
        extensions: &[String],
    ) -> Self {
        let (handle, instance) = backend.create(destination, extensions);
        log::debug!(
            "Created rendering machine {handle:?} for {destination} on `{}`",
            backend.label()
        );
        Self {
            destination,
            handle,
            instance,
            has_surface: false,
            viewport_groups: Vec::new(),
            collected: 0,
        }
    }

    pub fn destination(&self) -> Entity {
        self.destination
    }

    pub fn handle(&self) -> MachineHandle {
        self.handle
    }

    pub fn instance(&self) -> InstanceHandle {
        self.instance
    }

    pub fn has_surface(&self) -> bool {
        self.has_surface
    }

    pub fn viewport_groups(&self) -> &[ViewportGroup] {
        &self.viewport_groups
    }

    /// Group of the viewport at `viewport`, if collected this tick.
    pub fn viewport_group(&self, viewport: u32) -> Option<&ViewportGroup> {
        self.viewport_groups.iter().find(|g| g.viewport() == viewport)
    }

    /// Forwards the surface to the backend the first time only.
    ///
    /// Returns whether the backend was notified.
    pub fn surface_created(
        &mut self,
        backend: &mut dyn RenderingBackend,
        surface: SurfaceHandle,
    ) -> bool {
        if self.has_surface {
            return false;
        }
        self.has_surface = true;
        backend.surface_created(self.handle, surface);
        true
    }

    pub fn begin_render(
        &self,
        backend: &mut dyn RenderingBackend,
        clear_color: [f32; 4],
    ) -> StatusCode {
        backend.begin_render(self.handle, clear_color)
    }

    pub fn render(
        &self,
        backend: &mut dyn RenderingBackend,
        render_group: i8,
        entities: &[RenderEntity],
    ) {
        backend.render(self.handle, render_group, entities);
    }

    pub fn end_render(&self, backend: &mut dyn RenderingBackend) {
        backend.end_render(self.handle);
    }

    /// Releases the backend state. Consumes the machine so it cannot be
    /// disposed twice.
    pub fn dispose(self, backend: &mut dyn RenderingBackend) {
        log::debug!(
            "Disposing rendering machine {:?} of {}",
            self.handle,
            self.destination
        );
        backend.dispose(self.handle, self.instance);
    }

    // ---- Per-tick collection ----

    /// Empties every viewport group and marks them all stale.
    pub(crate) fn begin_collect(&mut self) {
        self.collected = 0;
        for group in &mut self.viewport_groups {
            group.clear();
            group.touched = false;
        }
    }

    /// Returns the group of `viewport`, creating it if needed, and marks it
    /// as collected this tick. Calls must follow discovery order, which is
    /// what ties between equal viewport orders fall back to.
    pub(crate) fn viewport_group_mut(&mut self, viewport: u32, order: i8) -> &mut ViewportGroup {
        let slot = match self
            .viewport_groups
            .iter()
            .position(|g| g.viewport() == viewport)
        {
            Some(slot) => slot,
            None => {
                self.viewport_groups.push(ViewportGroup::new(viewport, order));
                self.viewport_groups.len() - 1
            }
        };
        let group = &mut self.viewport_groups[slot];
        group.set_order(order);
        group.touched = true;
        group.sequence = self.collected;
        self.collected += 1;
        group
    }

    /// Drops groups whose viewport was not seen this tick.
    pub(crate) fn end_collect(&mut self) {
        self.viewport_groups.retain(|g| g.touched);
    }

    /// Renders every viewport group, ordered by viewport order then render
    /// group, running `plugins` over each batch first.
    ///
    /// Must only be called between a successful `begin_render` and
    /// `end_render`.
    pub(crate) fn render_viewports(
        &mut self,
        backend: &mut dyn RenderingBackend,
        world: &World,
        plugins: &[RenderEnginePluginFn],
        viewport_order: &mut Vec<usize>,
        batch_order: &mut Vec<usize>,
    ) {
        viewport_order.clear();
        viewport_order.extend(0..self.viewport_groups.len());
        viewport_order.sort_by_key(|&i| {
            let group = &self.viewport_groups[i];
            (group.order(), group.sequence)
        });

        for &v in viewport_order.iter() {
            let group = &mut self.viewport_groups[v];
            group.sorted_batches(batch_order);
            for &b in batch_order.iter() {
                let batch = &mut group.batches_mut()[b];
                let render_group = batch.render_group();
                for plugin in plugins {
                    plugin(world, render_group, batch.entities_mut());
                }
                backend.render(self.handle, render_group, batch.entities());
            }
        }
    }
}
