//! The combined per-tick rendering entry point.

use lantern_ecs::World;

use crate::backend::RenderingBackend;
use crate::config::RenderEngineConfig;
use crate::engine::RenderEngine;
use crate::error::RenderError;
use crate::plugin::RenderEnginePluginFn;
use crate::scissor::ClampNestedScissorViews;

/// Both per-tick rendering passes behind one `update` call.
///
/// # Access
///
/// - Reads: everything [`RenderEngine`] and [`ClampNestedScissorViews`] read
/// - Writes: `WorldRendererScissor`, `RendererInstanceInUse`
///
/// # Notes
///
/// - The scissor pass runs first. The two passes touch disjoint outputs,
///   so the order is only fixed to keep logs deterministic.
/// - A scissor failure aborts the tick before any backend call is made.
pub struct RenderingSystems {
    scissors: ClampNestedScissorViews,
    engine: RenderEngine,
}

impl RenderingSystems {
    pub fn new() -> Self {
        Self::with_config(RenderEngineConfig::default())
    }

    pub fn with_config(config: RenderEngineConfig) -> Self {
        Self {
            scissors: ClampNestedScissorViews::with_config(&config),
            engine: RenderEngine::with_config(config),
        }
    }

    pub fn register_backend<B: RenderingBackend + 'static>(
        &mut self,
        backend: B,
    ) -> Result<(), RenderError> {
        self.engine.register_backend(backend)
    }

    pub fn unregister_backend(
        &mut self,
        label: &str,
    ) -> Result<Box<dyn RenderingBackend>, RenderError> {
        self.engine.unregister_backend(label)
    }

    pub fn add_plugin(&mut self, plugin: RenderEnginePluginFn) {
        self.engine.add_plugin(plugin);
    }

    pub fn update(&mut self, world: &mut World) -> Result<(), RenderError> {
        self.scissors.update(world)?;
        self.engine.update(world)
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn scissors(&self) -> &ClampNestedScissorViews {
        &self.scissors
    }
}

impl Default for RenderingSystems {
    fn default() -> Self {
        Self::new()
    }
}
