//! Shared fixtures for the rendering integration tests.
//!
//! [`RecordingBackend`] logs every protocol call into a [`Recording`] that
//! stays reachable through an `Arc` after the backend has been moved into
//! the engine.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lantern_ecs::{Entity, World};
use lantern_rendering::{
    InstanceHandle, IsDestination, IsMaterial, IsMesh, IsRenderer, IsShader, IsViewport,
    LayerMask, MachineHandle, RenderEntity, RenderingBackend, StatusCode, SurfaceHandle,
    SurfaceInUse, register_rendering_components,
};
use parking_lot::Mutex;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Recording backend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start,
    Finish,
    Create {
        destination: Entity,
        extensions: Vec<String>,
    },
    Dispose(Entity),
    Surface(Entity, SurfaceHandle),
    Begin(Entity),
    Render {
        destination: Entity,
        render_group: i8,
        entities: Vec<RenderEntity>,
    },
    End(Entity),
}

#[derive(Debug, Default)]
pub struct Recording {
    pub calls: Vec<Call>,
    /// Clear color of every `begin_render`, in call order.
    pub clear_colors: Vec<(Entity, [f32; 4])>,
    /// Destinations whose `begin_render` should fail.
    pub failing: HashSet<Entity>,
}

impl Recording {
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    /// Render calls issued for `destination` since its last `Begin`.
    pub fn last_frame(&self, destination: Entity) -> Vec<(i8, Vec<RenderEntity>)> {
        let start = self
            .calls
            .iter()
            .rposition(|c| *c == Call::Begin(destination))
            .map_or(0, |i| i + 1);
        self.calls[start..]
            .iter()
            .filter_map(|c| match c {
                Call::Render {
                    destination: d,
                    render_group,
                    entities,
                } if *d == destination => Some((*render_group, entities.clone())),
                _ => None,
            })
            .collect()
    }

    /// Renderer ids of [`last_frame`](Self::last_frame), flattened in call order.
    pub fn last_frame_renderers(&self, destination: Entity) -> Vec<u32> {
        self.last_frame(destination)
            .into_iter()
            .flat_map(|(_, entities)| entities.into_iter().map(|e| e.renderer))
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

pub struct RecordingBackend {
    label: String,
    next_handle: u64,
    machines: HashMap<MachineHandle, Entity>,
    recording: Arc<Mutex<Recording>>,
}

impl RecordingBackend {
    pub fn new(label: &str) -> (Self, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording::default()));
        let backend = Self {
            label: label.to_owned(),
            next_handle: 100,
            machines: HashMap::new(),
            recording: Arc::clone(&recording),
        };
        (backend, recording)
    }

    fn destination(&self, machine: MachineHandle) -> Entity {
        self.machines.get(&machine).copied().unwrap_or(Entity::NULL)
    }

    fn record(&self, call: Call) {
        self.recording.lock().calls.push(call);
    }
}

impl RenderingBackend for RecordingBackend {
    fn label(&self) -> &str {
        &self.label
    }

    fn start(&mut self) {
        self.record(Call::Start);
    }

    fn finish(&mut self) {
        self.record(Call::Finish);
    }

    fn create(
        &mut self,
        destination: Entity,
        extensions: &[String],
    ) -> (MachineHandle, InstanceHandle) {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.machines.insert(MachineHandle(handle), destination);
        self.record(Call::Create {
            destination,
            extensions: extensions.to_vec(),
        });
        (MachineHandle(handle), InstanceHandle(handle + 1000))
    }

    fn dispose(&mut self, machine: MachineHandle, _instance: InstanceHandle) {
        let destination = self.destination(machine);
        self.machines.remove(&machine);
        self.record(Call::Dispose(destination));
    }

    fn surface_created(&mut self, machine: MachineHandle, surface: SurfaceHandle) {
        self.record(Call::Surface(self.destination(machine), surface));
    }

    fn begin_render(&mut self, machine: MachineHandle, clear_color: [f32; 4]) -> StatusCode {
        let destination = self.destination(machine);
        let mut recording = self.recording.lock();
        recording.calls.push(Call::Begin(destination));
        recording.clear_colors.push((destination, clear_color));
        if recording.failing.contains(&destination) {
            StatusCode::Failed
        } else {
            StatusCode::Continue
        }
    }

    fn render(&mut self, machine: MachineHandle, render_group: i8, entities: &[RenderEntity]) {
        self.record(Call::Render {
            destination: self.destination(machine),
            render_group,
            entities: entities.to_vec(),
        });
    }

    fn end_render(&mut self, machine: MachineHandle) {
        self.record(Call::End(self.destination(machine)));
    }
}

// ============================================================================
// Scene building
// ============================================================================

pub fn world() -> World {
    let mut world = World::new();
    register_rendering_components(&mut world);
    world
}

/// Destination of `width`×`height` that already exposes a surface.
pub fn spawn_destination(world: &mut World, label: &str, width: u32, height: u32) -> Entity {
    let destination = spawn_destination_without_surface(world, label, width, height);
    world
        .insert(destination, SurfaceInUse(SurfaceHandle(destination.index() as u64)))
        .unwrap();
    destination
}

pub fn spawn_destination_without_surface(
    world: &mut World,
    label: &str,
    width: u32,
    height: u32,
) -> Entity {
    let destination = world.spawn();
    world
        .insert(destination, IsDestination::new(label, width, height))
        .unwrap();
    destination
}

pub fn spawn_viewport(
    world: &mut World,
    destination: Entity,
    render_mask: LayerMask,
    order: i8,
) -> Entity {
    let viewport = world.spawn();
    let rint = world.add_reference(viewport, destination);
    world
        .insert(
            viewport,
            IsViewport {
                destination: rint,
                render_mask,
                order,
            },
        )
        .unwrap();
    viewport
}

pub fn spawn_shader(world: &mut World, version: u32) -> Entity {
    let shader = world.spawn();
    world.insert(shader, IsShader { version }).unwrap();
    shader
}

pub fn spawn_mesh(world: &mut World, version: u32) -> Entity {
    let mesh = world.spawn();
    world.insert(mesh, IsMesh { version }).unwrap();
    mesh
}

pub fn spawn_material(
    world: &mut World,
    render_group: i8,
    vertex_shader: Entity,
    fragment_shader: Entity,
) -> Entity {
    let material = world.spawn();
    let vs = world.add_reference(material, vertex_shader);
    let fs = world.add_reference(material, fragment_shader);
    world
        .insert(
            material,
            IsMaterial {
                render_group,
                vertex_shader: vs,
                fragment_shader: fs,
            },
        )
        .unwrap();
    material
}

pub fn spawn_renderer(
    world: &mut World,
    render_mask: LayerMask,
    material: Entity,
    mesh: Entity,
) -> Entity {
    let renderer = world.spawn();
    let material = world.add_reference(renderer, material);
    let mesh = world.add_reference(renderer, mesh);
    world
        .insert(
            renderer,
            IsRenderer {
                render_mask,
                material,
                mesh,
            },
        )
        .unwrap();
    renderer
}

/// A material with its own pair of shaders, plus a mesh.
#[derive(Debug, Clone, Copy)]
pub struct Assets {
    pub material: Entity,
    pub mesh: Entity,
    pub vertex_shader: Entity,
    pub fragment_shader: Entity,
}

pub fn spawn_assets(world: &mut World, render_group: i8) -> Assets {
    let vertex_shader = spawn_shader(world, 1);
    let fragment_shader = spawn_shader(world, 2);
    let material = spawn_material(world, render_group, vertex_shader, fragment_shader);
    let mesh = spawn_mesh(world, 7);
    Assets {
        material,
        mesh,
        vertex_shader,
        fragment_shader,
    }
}
