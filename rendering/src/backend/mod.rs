//! Rendering backend abstraction.
//!
//! A backend wraps a graphics API. The orchestrator only ever talks to it
//! through the [`RenderingBackend`] trait, following a fixed protocol:
//!
//! - `start` once at registration, `finish` once at unregistration
//! - `create` once per destination, balanced by `dispose`
//! - `surface_created` at most once per machine
//! - per frame: `begin_render`, then zero or more `render` calls, then
//!   `end_render` only if `begin_render` returned [`StatusCode::Continue`]
//!
//! # Available Backends
//!
//! - [`headless`]: records nothing and draws nothing, logs every call at
//!   trace level. Used by demos, benches, and tests that don't need a
//!   recording.

pub mod headless;

use lantern_ecs::Entity;

use crate::render_entity::RenderEntity;

/// Backend-side state for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineHandle(pub u64);

/// Native instance the backend allocated for one destination.
///
/// Published on the destination entity as
/// [`RendererInstanceInUse`](crate::components::RendererInstanceInUse).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// Native surface supplied by whoever owns the destination (e.g. a window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Result of [`RenderingBackend::begin_render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// The frame was started; render calls may follow.
    Continue,
    /// Nothing to draw into this frame (e.g. swapchain out of date).
    Skip,
    /// The backend could not start the frame.
    Failed,
}

impl StatusCode {
    pub fn is_continue(self) -> bool {
        matches!(self, Self::Continue)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Skip => write!(f, "skip"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A pluggable graphics backend.
///
/// Every method is called synchronously on the thread running the frame
/// update. A backend may queue work internally but must be ready for the
/// next protocol call when it returns.
pub trait RenderingBackend {
    /// Unique label destinations use to select this backend.
    fn label(&self) -> &str;

    /// Called once when the backend is registered.
    fn start(&mut self) {}

    /// Called once when the backend is unregistered, after all of its
    /// machines have been disposed.
    fn finish(&mut self) {}

    /// Allocates the state for a newly discovered destination.
    fn create(&mut self, destination: Entity, extensions: &[String])
    -> (MachineHandle, InstanceHandle);

    /// Releases what [`create`](Self::create) allocated.
    fn dispose(&mut self, machine: MachineHandle, instance: InstanceHandle);

    /// The destination now exposes a surface to present into.
    fn surface_created(&mut self, machine: MachineHandle, surface: SurfaceHandle);

    /// Starts a frame, clearing to `clear_color`.
    fn begin_render(&mut self, machine: MachineHandle, clear_color: [f32; 4]) -> StatusCode;

    /// Draws one render-group batch.
    ///
    /// A batch may mix materials that share `render_group`; split on
    /// [`RenderEntity::material`] when pipeline state differs.
    fn render(&mut self, machine: MachineHandle, render_group: i8, entities: &[RenderEntity]);

    /// Finishes the frame started by a successful [`begin_render`](Self::begin_render).
    fn end_render(&mut self, machine: MachineHandle);
}
