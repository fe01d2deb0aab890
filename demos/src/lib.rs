//! # Lantern Demos
//!
//! Scene builders and configuration for the headless demo binaries.
//!
//! ## Available Demos
//!
//! - `headless_frames` - Runs the render engine against the headless
//!   backend for a fixed number of frames and reports what was drawn

use std::path::Path;

use lantern_ecs::hierarchy::{disable, enable, set_parent};
use lantern_ecs::{ComponentNotRegistered, Entity, World};
use lantern_rendering::{
    DestinationExtensions, HeadlessBackend, IsDestination, IsMaterial, IsMesh, IsRenderer,
    IsShader, IsViewport, LayerMask, RenderEngineConfig, RendererScissor, ScissorRect,
    SurfaceHandle, SurfaceInUse, register_rendering_components,
};
use serde::Deserialize;

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level demo configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of ticks to run.
    pub frames: u64,
    /// Renderers spawned into the scene.
    pub renderers: usize,
    pub materials: usize,
    pub meshes: usize,
    /// Viewports on the destination; viewport `i` sees layer `i`.
    pub viewports: usize,
    /// Every this many frames a quarter of the renderers is toggled.
    /// Zero disables toggling.
    pub toggle_interval: u64,
    /// Depth of the nested scissor chain hung below the first viewport.
    pub scissor_depth: usize,
    /// Sort each batch by material and mesh before it reaches the backend.
    pub sort_batches: bool,
    pub destination: DestinationConfig,
    pub engine: RenderEngineConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            renderers: 2_000,
            materials: 8,
            meshes: 4,
            viewports: 2,
            toggle_interval: 30,
            scissor_depth: 4,
            sort_batches: false,
            destination: DestinationConfig::default(),
            engine: RenderEngineConfig::default(),
        }
    }
}

/// The single render target of the demo scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub extensions: Vec<String>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            label: HeadlessBackend::LABEL.into(),
            width: 1280,
            height: 720,
            clear_color: [0.1, 0.1, 0.12, 1.0],
            extensions: Vec::new(),
        }
    }
}

/// Load a demo config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_config(path: &Path) -> Result<DemoConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_config(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

pub fn parse_config(content: &str) -> Result<DemoConfig, toml::de::Error> {
    toml::from_str(content)
}

// ============================================================================
// Scene
// ============================================================================

/// Handles to the entities [`build_scene`] spawned.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub destination: Entity,
    pub viewports: Vec<Entity>,
    pub renderers: Vec<Entity>,
    pub scissors: Vec<Entity>,
}

/// Populates `world` with one destination, its viewports, a material and
/// mesh library, renderers spread across both, and a scissor chain.
pub fn build_scene(
    world: &mut World,
    config: &DemoConfig,
) -> Result<DemoScene, ComponentNotRegistered> {
    register_rendering_components(world);

    let target = &config.destination;
    let destination = world.spawn();
    world.insert(
        destination,
        IsDestination::new(target.label.clone(), target.width, target.height)
            .with_clear_color(target.clear_color),
    )?;
    if !target.extensions.is_empty() {
        world.insert(destination, DestinationExtensions(target.extensions.clone()))?;
    }
    world.insert(destination, SurfaceInUse(SurfaceHandle(1)))?;

    let mut viewports = Vec::with_capacity(config.viewports.max(1));
    for i in 0..config.viewports.max(1) {
        let viewport = world.spawn();
        let rint = world.add_reference(viewport, destination);
        world.insert(
            viewport,
            IsViewport {
                destination: rint,
                render_mask: LayerMask::layer((i % 64) as u32),
                order: (i % 128) as i8,
            },
        )?;
        viewports.push(viewport);
    }

    let vertex_shader = spawn_shader(world, 1)?;
    let fragment_shader = spawn_shader(world, 1)?;
    let mut materials = Vec::with_capacity(config.materials.max(1));
    for i in 0..config.materials.max(1) {
        let material = world.spawn();
        let vs = world.add_reference(material, vertex_shader);
        let fs = world.add_reference(material, fragment_shader);
        world.insert(
            material,
            IsMaterial {
                render_group: (i % 4) as i8 - 1,
                vertex_shader: vs,
                fragment_shader: fs,
            },
        )?;
        materials.push(material);
    }
    let mut meshes = Vec::with_capacity(config.meshes.max(1));
    for i in 0..config.meshes.max(1) {
        let mesh = world.spawn();
        world.insert(mesh, IsMesh { version: i as u32 })?;
        meshes.push(mesh);
    }

    let layers = viewports.len();
    let mut renderers = Vec::with_capacity(config.renderers);
    for i in 0..config.renderers {
        let renderer = world.spawn();
        let material = world.add_reference(renderer, materials[i % materials.len()]);
        let mesh = world.add_reference(renderer, meshes[i % meshes.len()]);
        world.insert(
            renderer,
            IsRenderer {
                render_mask: LayerMask::layer(((i % layers) % 64) as u32),
                material,
                mesh,
            },
        )?;
        renderers.push(renderer);
    }

    let scissors = build_scissor_chain(world, viewports[0], config.scissor_depth, target)?;

    Ok(DemoScene {
        destination,
        viewports,
        renderers,
        scissors,
    })
}

fn spawn_shader(world: &mut World, version: u32) -> Result<Entity, ComponentNotRegistered> {
    let shader = world.spawn();
    world.insert(shader, IsShader { version })?;
    Ok(shader)
}

/// Chain of nested panels, each one inset by a quarter and shifted so it
/// overhangs its parent.
fn build_scissor_chain(
    world: &mut World,
    root: Entity,
    depth: usize,
    target: &DestinationConfig,
) -> Result<Vec<Entity>, ComponentNotRegistered> {
    let mut chain = Vec::with_capacity(depth);
    let mut parent = root;
    let mut rect = ScissorRect::new(0.0, 0.0, target.width as f32, target.height as f32);
    for _ in 0..depth {
        let panel = world.spawn();
        world.insert(panel, RendererScissor(rect))?;
        set_parent(world, panel, parent);
        chain.push(panel);

        parent = panel;
        rect = ScissorRect::new(
            rect.x + rect.width * 0.25,
            rect.y + rect.height * 0.25,
            rect.width,
            rect.height * 0.5,
        );
    }
    Ok(chain)
}

/// Disables every fourth renderer on odd toggles and re-enables them on
/// even ones. Returns how many renderers changed state.
pub fn toggle_renderers(world: &mut World, scene: &DemoScene, toggle: u64) -> usize {
    let targets = scene.renderers.iter().step_by(4);
    let mut changed = 0;
    for &renderer in targets {
        if toggle % 2 == 1 {
            disable(world, renderer);
        } else {
            enable(world, renderer);
        }
        changed += 1;
    }
    changed
}
