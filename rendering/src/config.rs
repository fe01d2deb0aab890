//! Engine tuning loaded from TOML.

use serde::Deserialize;

/// Tuning knobs for [`RenderEngine`](crate::RenderEngine) and
/// [`ClampNestedScissorViews`](crate::ClampNestedScissorViews).
///
/// Every field has a default, so an empty TOML table is a valid config:
///
/// ```toml
/// [engine]
/// initial_entity_capacity = 4096
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderEngineConfig {
    /// Initial length of the per-entity scratch arrays. Rounded up to a
    /// power of two; the arrays still grow when the world outgrows them.
    pub initial_entity_capacity: usize,
    /// Initial number of depth buckets in the scissor clamper.
    pub initial_depth_buckets: usize,
    /// Log viewports skipped because their destination has no machine.
    pub log_skipped_viewports: bool,
}

impl Default for RenderEngineConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 1024,
            initial_depth_buckets: 8,
            log_skipped_viewports: true,
        }
    }
}
