//! The per-tick render driver.

use std::collections::HashMap;

use lantern_ecs::{Entity, World};

use crate::backend::RenderingBackend;
use crate::components::{
    DestinationExtensions, IsDestination, IsRenderer, IsViewport, RendererInstanceInUse,
    SurfaceInUse,
};
use crate::config::RenderEngineConfig;
use crate::error::RenderError;
use crate::machine::RenderingMachine;
use crate::plugin::{self, RenderEnginePluginFn};
use crate::registry::BackendRegistry;
use crate::render_entity::{RenderEntity, RendererCombination};
use crate::renderer_groups::RendererGroups;
use crate::snapshot::ComponentSnapshot;

/// Discovers destinations, viewports and renderers in a [`World`] and drives
/// the registered backends through one frame per destination.
///
/// # Access
///
/// - Reads: `IsDestination`, `DestinationExtensions`, `SurfaceInUse`,
///   `IsViewport`, `IsRenderer`, `IsMaterial`, `IsShader`, `IsMesh`,
///   `RenderEnginePlugin`, `EntityReferences`
/// - Writes: `RendererInstanceInUse`
///
/// # Tick order
///
/// 1. Dispose machines of destinations that left the world.
/// 2. Create machines for new destinations.
/// 3. Forward newly available surfaces.
/// 4. Snapshot the rendering components.
/// 5. Rebuild every viewport's batches.
/// 6. Render each destination that has a surface and a non-zero area.
///
/// Destinations whose backend was unregistered are parked: they keep no
/// machine and are skipped until a backend with the same label is
/// registered again.
pub struct RenderEngine {
    config: RenderEngineConfig,
    registry: BackendRegistry,
    known_destinations: Vec<Entity>,
    parked: HashMap<Entity, String>,
    snapshot: ComponentSnapshot,
    renderer_groups: RendererGroups,
    plugins: Vec<RenderEnginePluginFn>,
    frame_plugins: Vec<RenderEnginePluginFn>,
    pending: Vec<Entity>,
    viewport_order: Vec<usize>,
    batch_order: Vec<usize>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::with_config(RenderEngineConfig::default())
    }

    pub fn with_config(config: RenderEngineConfig) -> Self {
        let snapshot = ComponentSnapshot::with_capacity(config.initial_entity_capacity.max(1));
        Self {
            config,
            registry: BackendRegistry::new(),
            known_destinations: Vec::new(),
            parked: HashMap::new(),
            snapshot,
            renderer_groups: RendererGroups::new(),
            plugins: Vec::new(),
            frame_plugins: Vec::new(),
            pending: Vec::new(),
            viewport_order: Vec::new(),
            batch_order: Vec::new(),
        }
    }

    pub fn config(&self) -> &RenderEngineConfig {
        &self.config
    }

    // ---- Backends ----

    /// Registers `backend` and calls its `start` hook.
    ///
    /// Destinations parked under the same label get a new machine on the
    /// next tick.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DuplicateLabel`] if the label is taken.
    pub fn register_backend<B: RenderingBackend + 'static>(
        &mut self,
        backend: B,
    ) -> Result<(), RenderError> {
        self.register_boxed_backend(Box::new(backend))
    }

    pub fn register_boxed_backend(
        &mut self,
        backend: Box<dyn RenderingBackend>,
    ) -> Result<(), RenderError> {
        let label = backend.label().to_owned();
        self.registry.register(backend)?;
        self.parked.retain(|_, parked| *parked != label);
        Ok(())
    }

    /// Disposes the machines of `label`, calls `finish`, and returns the
    /// backend. Affected destinations are parked.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::BackendNotFound`] if `label` is not registered.
    pub fn unregister_backend(
        &mut self,
        label: &str,
    ) -> Result<Box<dyn RenderingBackend>, RenderError> {
        let (backend, disposed) = self.registry.unregister(label)?;
        self.known_destinations.retain(|d| !disposed.contains(d));
        for destination in disposed {
            self.parked.insert(destination, label.to_owned());
        }
        Ok(backend)
    }

    /// Unregisters every backend, disposing all machines.
    ///
    /// Called automatically on drop. `RendererInstanceInUse` tags are left
    /// on the destinations since the world is not reachable from here.
    pub fn shutdown(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let disposed = self.registry.shutdown();
        log::info!(
            "Render engine shut down ({} machines disposed)",
            disposed.len()
        );
        self.known_destinations.clear();
        self.parked.clear();
    }

    /// Adds a batch preprocessing hook. Hooks added here run before any
    /// declared through [`RenderEnginePlugin`](crate::RenderEnginePlugin)
    /// components, in the order they were added.
    pub fn add_plugin(&mut self, plugin: RenderEnginePluginFn) {
        self.plugins.push(plugin);
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn machine(&self, destination: Entity) -> Option<&RenderingMachine> {
        self.registry.machine(destination)
    }

    pub fn has_machine(&self, destination: Entity) -> bool {
        self.registry.has_machine(destination)
    }

    pub fn machine_count(&self) -> usize {
        self.registry.machine_count()
    }

    pub fn is_parked(&self, destination: Entity) -> bool {
        self.parked.contains_key(&destination)
    }

    /// Combination table built by the last tick.
    pub fn renderer_groups(&self) -> &RendererGroups {
        &self.renderer_groups
    }

    pub fn snapshot(&self) -> &ComponentSnapshot {
        &self.snapshot
    }

    // ---- Tick ----

    /// Runs one tick.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownBackendLabel`] if a new destination
    /// names a label with no registered backend, and
    /// [`RenderError::Component`] if the rendering components were never
    /// registered. Frames that a backend refuses to begin are skipped and
    /// logged, not reported.
    pub fn update(&mut self, world: &mut World) -> Result<(), RenderError> {
        self.destroy_stale(world);
        self.create_new(world)?;
        self.assign_surfaces(world);
        plugin::collect_plugins(world, &self.plugins, &mut self.frame_plugins)?;
        self.snapshot.rebuild(world)?;
        self.collect_renderers(world)?;
        self.render(world);
        Ok(())
    }

    fn destroy_stale(&mut self, world: &mut World) {
        let registry = &mut self.registry;
        self.known_destinations.retain(|&destination| {
            if is_destination(world, destination) {
                return true;
            }
            registry.dispose_machine(destination);
            world.remove::<RendererInstanceInUse>(destination);
            log::debug!("Destination {destination} left the world");
            false
        });

        self.parked.retain(|&destination, _| {
            world.remove::<RendererInstanceInUse>(destination);
            is_destination(world, destination)
        });
    }

    fn create_new(&mut self, world: &mut World) -> Result<(), RenderError> {
        self.pending.clear();
        for (index, destination) in world.storage::<IsDestination>()?.iter() {
            let Some(entity) = world.entity_at(index) else {
                continue;
            };
            if self.registry.has_machine(entity) {
                continue;
            }
            let still_parked = self
                .parked
                .get(&entity)
                .is_some_and(|label| *label == destination.label);
            if !still_parked {
                self.pending.push(entity);
            }
        }

        for i in 0..self.pending.len() {
            let entity = self.pending[i];
            self.parked.remove(&entity);

            let instance = {
                let Some(destination) = world.get::<IsDestination>(entity) else {
                    continue;
                };
                let extensions = world
                    .get::<DestinationExtensions>(entity)
                    .map_or(&[][..], |e| e.0.as_slice());
                self.registry
                    .create_machine(entity, &destination.label, extensions)?
            };
            world.insert(entity, RendererInstanceInUse(instance))?;
            self.known_destinations.push(entity);
        }
        Ok(())
    }

    fn assign_surfaces(&mut self, world: &World) {
        for &destination in &self.known_destinations {
            let Some(surface) = world.get::<SurfaceInUse>(destination) else {
                continue;
            };
            let Some((backend, machine)) = self.registry.machine_mut(destination) else {
                continue;
            };
            if machine.surface_created(backend, surface.0) {
                log::debug!("Surface {:?} assigned to {destination}", surface.0);
            }
        }
    }

    fn collect_renderers(&mut self, world: &World) -> Result<(), RenderError> {
        self.renderer_groups.clear();
        for (index, renderer) in self.snapshot.renderers() {
            if let Some(combination) = resolve_combination(world, &self.snapshot, index, renderer) {
                self.renderer_groups.add(combination, index);
            }
        }

        for machine in self.registry.machines_mut() {
            machine.begin_collect();
        }

        for (viewport_index, viewport) in world.storage::<IsViewport>()?.iter() {
            if !world.is_index_enabled(viewport_index) {
                continue;
            }
            let destination_index = world.resolve_reference(viewport_index, viewport.destination);
            let machine = match world.entity_at(destination_index) {
                Some(destination) => self.registry.machine_mut(destination),
                None => None,
            };
            let Some((_, machine)) = machine else {
                if self.config.log_skipped_viewports {
                    log::debug!(
                        "Viewport {viewport_index} skipped: destination {destination_index} has no rendering machine"
                    );
                }
                continue;
            };

            let group = machine.viewport_group_mut(viewport_index, viewport.order);
            for (combination, renderers) in self.renderer_groups.iter() {
                let Some((render_group, template)) = batch_template(&self.snapshot, combination)
                else {
                    continue;
                };
                for &renderer in renderers {
                    let visible = self
                        .snapshot
                        .get(renderer)
                        .and_then(|entry| entry.renderer())
                        .is_some_and(|r| r.render_mask.intersects(viewport.render_mask));
                    if visible {
                        group.push(
                            render_group,
                            RenderEntity {
                                renderer,
                                ..template
                            },
                        );
                    }
                }
            }
        }

        for machine in self.registry.machines_mut() {
            machine.end_collect();
        }
        Ok(())
    }

    fn render(&mut self, world: &World) {
        for &destination in &self.known_destinations {
            let Some(target) = world.get::<IsDestination>(destination) else {
                continue;
            };
            if target.area() == 0 || !world.has::<SurfaceInUse>(destination) {
                continue;
            }
            let Some((backend, machine)) = self.registry.machine_mut(destination) else {
                continue;
            };
            if !machine.has_surface() {
                continue;
            }

            let status = machine.begin_render(backend, target.clear_color);
            if !status.is_continue() {
                log::warn!("Frame for {destination} skipped: begin_render returned {status}");
                continue;
            }
            machine.render_viewports(
                backend,
                world,
                &self.frame_plugins,
                &mut self.viewport_order,
                &mut self.batch_order,
            );
            machine.end_render(backend);
        }
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("registry", &self.registry)
            .field("destinations", &self.known_destinations.len())
            .field("parked", &self.parked.len())
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

fn is_destination(world: &World, entity: Entity) -> bool {
    world.is_alive(entity) && world.has::<IsDestination>(entity)
}

/// Follows renderer → material/mesh and material → shaders. `None` if any
/// link is broken or points at an entity lacking the expected component.
fn resolve_combination(
    world: &World,
    snapshot: &ComponentSnapshot,
    renderer_index: u32,
    renderer: &IsRenderer,
) -> Option<RendererCombination> {
    let material = world.resolve_reference(renderer_index, renderer.material);
    let mesh = world.resolve_reference(renderer_index, renderer.mesh);
    let material_data = snapshot.get(material)?.material()?;
    snapshot.get(mesh)?.mesh()?;

    let vertex_shader = world.resolve_reference(material, material_data.vertex_shader);
    let fragment_shader = world.resolve_reference(material, material_data.fragment_shader);
    snapshot.get(vertex_shader)?.shader()?;
    snapshot.get(fragment_shader)?.shader()?;

    Some(RendererCombination {
        material,
        mesh,
        vertex_shader,
        fragment_shader,
    })
}

/// Render group and a [`RenderEntity`] with everything but the renderer id
/// filled in from the snapshot.
fn batch_template(
    snapshot: &ComponentSnapshot,
    combination: &RendererCombination,
) -> Option<(i8, RenderEntity)> {
    let material = snapshot.get(combination.material)?.material()?;
    let mesh = snapshot.get(combination.mesh)?.mesh()?;
    let vertex_shader = snapshot.get(combination.vertex_shader)?.shader()?;
    let fragment_shader = snapshot.get(combination.fragment_shader)?.shader()?;
    Some((
        material.render_group,
        RenderEntity {
            renderer: Entity::NULL_INDEX,
            mesh: combination.mesh,
            material: combination.material,
            vertex_shader: combination.vertex_shader,
            fragment_shader: combination.fragment_shader,
            mesh_version: mesh.version,
            vertex_shader_version: vertex_shader.version,
            fragment_shader_version: fragment_shader.version,
        },
    ))
}
