//! Components the rendering layer reads from and writes to the world.
//!
//! Cross-entity links (viewport → destination, renderer → material/mesh,
//! material → shaders) are [`Rint`] references resolved through the owning
//! entity's reference table, so despawning a target silently breaks the
//! link instead of leaving a dangling id.

use lantern_ecs::{Rint, World};

use crate::backend::{InstanceHandle, SurfaceHandle};
use crate::plugin::RenderEnginePlugin;
use crate::scissor::ScissorRect;

/// Bitset of render layers.
///
/// A viewport only collects renderers whose mask shares at least one bit
/// with its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u64);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u64::MAX);

    /// Mask with only `layer` set. Layers past 63 do not exist and give
    /// an empty mask.
    pub const fn layer(layer: u32) -> Self {
        match 1u64.checked_shl(layer) {
            Some(bit) => Self(bit),
            None => Self::NONE,
        }
    }

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn with(self, layer: u32) -> Self {
        Self(self.0 | Self::layer(layer).0)
    }
}

/// A render target such as a window.
#[derive(Debug, Clone, PartialEq)]
pub struct IsDestination {
    /// Label of the backend that renders this destination.
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
}

impl IsDestination {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Pixel area; frames are skipped while this is zero.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Backend extension names a destination asks for at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationExtensions(pub Vec<String>);

/// Surface the destination's owner has made available for presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInUse(pub SurfaceHandle);

/// Native instance the backend created for this destination.
///
/// Added by the render engine; not meant to be inserted by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererInstanceInUse(pub InstanceHandle);

/// A camera-like view into a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsViewport {
    pub destination: Rint,
    pub render_mask: LayerMask,
    /// Viewports of one destination render in ascending order.
    pub order: i8,
}

/// Something to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsRenderer {
    pub render_mask: LayerMask,
    pub material: Rint,
    pub mesh: Rint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsMaterial {
    /// Batches of one viewport render in ascending render-group order.
    pub render_group: i8,
    pub vertex_shader: Rint,
    pub fragment_shader: Rint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsShader {
    pub version: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsMesh {
    pub version: u32,
}

/// Local clip rectangle of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RendererScissor(pub ScissorRect);

/// [`RendererScissor`] clamped into the nearest scissor-bearing ancestor.
///
/// Added and kept up to date by
/// [`ClampNestedScissorViews`](crate::scissor::ClampNestedScissorViews).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldRendererScissor(pub ScissorRect);

/// Registers every component type this crate reads or writes.
pub fn register_rendering_components(world: &mut World) {
    world.register_component::<IsDestination>();
    world.register_component::<DestinationExtensions>();
    world.register_component::<SurfaceInUse>();
    world.register_component::<RendererInstanceInUse>();
    world.register_component::<IsViewport>();
    world.register_component::<IsRenderer>();
    world.register_component::<IsMaterial>();
    world.register_component::<IsShader>();
    world.register_component::<IsMesh>();
    world.register_component::<RendererScissor>();
    world.register_component::<WorldRendererScissor>();
    world.register_component::<RenderEnginePlugin>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_masks_intersect_on_shared_bits() {
        let ui = LayerMask::layer(3);
        let world = LayerMask::layer(0).with(1);

        assert!(!ui.intersects(world));
        assert!(LayerMask::ALL.intersects(ui));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
        assert!(world.intersects(LayerMask::layer(1)));
    }

    #[test]
    fn out_of_range_layers_are_ignored() {
        assert_eq!(LayerMask::layer(63), LayerMask(1 << 63));
        assert_eq!(LayerMask::layer(64), LayerMask::NONE);
        assert_eq!(LayerMask::layer(200), LayerMask::NONE);
        assert_eq!(LayerMask::layer(2).with(64), LayerMask::layer(2));
    }

    #[test]
    fn area_multiplies_without_overflow() {
        let destination = IsDestination::new("headless", u32::MAX, 2);
        assert_eq!(destination.area(), u32::MAX as u64 * 2);
        assert_eq!(IsDestination::new("headless", 0, 600).area(), 0);
    }

    #[test]
    fn registration_covers_all_types() {
        let mut world = World::new();
        register_rendering_components(&mut world);
        assert!(world.is_component_registered::<IsViewport>());
        assert!(world.is_component_registered::<WorldRendererScissor>());
        assert!(world.is_component_registered::<RenderEnginePlugin>());
    }
}
