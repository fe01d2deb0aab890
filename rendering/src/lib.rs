//! # Lantern Rendering
//!
//! Frame orchestration over a [`lantern_ecs::World`]. Each tick the
//! [`RenderEngine`] keeps one [`RenderingMachine`] per destination entity,
//! groups renderers by the material/mesh/shader combination they draw with,
//! sorts them into per-viewport batches and drives a [`RenderingBackend`]
//! through `begin_render`, `render` per batch, and `end_render`.
//!
//! [`ClampNestedScissorViews`] is an independent pass that clamps scissor
//! rectangles down the entity hierarchy. [`RenderingSystems`] runs both.
//!
//! ```
//! use lantern_ecs::World;
//! use lantern_rendering::{
//!     HeadlessBackend, IsDestination, RenderEngine, register_rendering_components,
//! };
//!
//! let mut world = World::new();
//! register_rendering_components(&mut world);
//! let window = world.spawn();
//! world
//!     .insert(window, IsDestination::new(HeadlessBackend::LABEL, 800, 600))
//!     .unwrap();
//!
//! let mut engine = RenderEngine::new();
//! engine.register_backend(HeadlessBackend::default()).unwrap();
//! engine.update(&mut world).unwrap();
//! assert!(engine.has_machine(window));
//! ```

pub mod backend;
pub mod components;
mod config;
mod engine;
mod error;
mod machine;
pub mod plugin;
mod registry;
mod render_entity;
mod renderer_groups;
pub mod scissor;
pub mod snapshot;
mod systems;
mod viewport_group;

pub use backend::headless::{HeadlessBackend, HeadlessStats};
pub use backend::{InstanceHandle, MachineHandle, RenderingBackend, StatusCode, SurfaceHandle};
pub use components::{
    DestinationExtensions, IsDestination, IsMaterial, IsMesh, IsRenderer, IsShader, IsViewport,
    LayerMask, RendererInstanceInUse, RendererScissor, SurfaceInUse, WorldRendererScissor,
    register_rendering_components,
};
pub use config::RenderEngineConfig;
pub use engine::RenderEngine;
pub use error::RenderError;
pub use machine::RenderingMachine;
pub use plugin::{RenderEnginePlugin, RenderEnginePluginFn, sort_by_combination};
pub use registry::BackendRegistry;
pub use render_entity::{RenderEntity, RendererCombination, RendererKey, as_bytes};
pub use renderer_groups::RendererGroups;
pub use scissor::{ClampNestedScissorViews, ScissorRect};
pub use snapshot::{ComponentFlags, ComponentSnapshot, EntityComponents};
pub use systems::RenderingSystems;
pub use viewport_group::{RenderBatch, ViewportGroup};
