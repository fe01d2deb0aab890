//! Per-entity draw records and combination keys.

use bytemuck::{Pod, Zeroable};

/// One resolved renderer, as handed to a backend.
///
/// Ids are raw entity indices. Versions are the mesh and shader versions
/// observed when the record was built; a backend compares them against its
/// cached GPU resources to decide what to refresh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct RenderEntity {
    pub renderer: u32,
    pub mesh: u32,
    pub material: u32,
    pub vertex_shader: u32,
    pub fragment_shader: u32,
    pub mesh_version: u32,
    pub vertex_shader_version: u32,
    pub fragment_shader_version: u32,
}

impl RenderEntity {
    /// The material/mesh/shader combination this renderer draws with.
    pub fn combination(&self) -> RendererCombination {
        RendererCombination {
            material: self.material,
            mesh: self.mesh,
            vertex_shader: self.vertex_shader,
            fragment_shader: self.fragment_shader,
        }
    }

    /// Packed material/mesh key.
    pub fn key(&self) -> RendererKey {
        RendererKey::new(self.material, self.mesh)
    }
}

/// Reinterprets a batch as raw bytes, ready for a GPU upload.
pub fn as_bytes(entities: &[RenderEntity]) -> &[u8] {
    bytemuck::cast_slice(entities)
}

/// The full set of entities a renderer's draw state depends on.
///
/// Renderers that share a combination can be drawn with the same pipeline
/// and mesh binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererCombination {
    pub material: u32,
    pub mesh: u32,
    pub vertex_shader: u32,
    pub fragment_shader: u32,
}

impl RendererCombination {
    pub fn key(&self) -> RendererKey {
        RendererKey::new(self.material, self.mesh)
    }
}

/// Material and mesh ids packed into one `u64`: material in the high 32
/// bits, mesh in the low 32 bits.
///
/// Shader ids are not part of the key, so two combinations differing only
/// in shaders share a `RendererKey`. Batching uses [`RendererCombination`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererKey(pub u64);

impl RendererKey {
    pub fn new(material: u32, mesh: u32) -> Self {
        Self(((material as u64) << 32) | mesh as u64)
    }

    pub fn material(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn mesh(self) -> u32 {
        self.0 as u32
    }
}

impl From<RendererCombination> for RendererKey {
    fn from(combination: RendererCombination) -> Self {
        combination.key()
    }
}
