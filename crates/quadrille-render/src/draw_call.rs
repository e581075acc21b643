//! Draw call descriptors and texture unit groups.
//!
//! Both types are pool-allocated by the renderer and reused across flushes.

use std::sync::Arc;

use crate::blend::BlendMode;
use crate::gpu::Topology;
use crate::texture::TextureHandle;

/// The set of textures one draw call samples from, with their unit slots.
///
/// Holds at most `max_texture_units` entries; filled by the assigner while
/// walking buffered primitives and closed once full or exhausted.
#[derive(Default)]
pub struct TextureBatchGroup {
    textures: Vec<TextureHandle>,
    units: Vec<u32>,
}

impl TextureBatchGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.units.clear();
    }

    /// Append a texture with a not-yet-assigned unit.
    pub(crate) fn push(&mut self, texture: TextureHandle) {
        self.textures.push(texture);
        self.units.push(0);
    }

    pub(crate) fn set_unit(&mut self, index: usize, unit: u32) {
        self.units[index] = unit;
    }

    pub fn count(&self) -> usize {
        self.textures.len()
    }

    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    /// Unit slot per texture, parallel to [`textures`](Self::textures).
    pub fn units(&self) -> &[u32] {
        &self.units
    }
}

/// Extra payload attached to a draw call.
///
/// The hot path only touches the common fields; specialized renderers that
/// need per-call uniforms carry them in the variant instead of subclassing.
#[derive(Clone, Debug, Default)]
pub enum DrawCallData {
    /// Default pipeline, no extra uniforms.
    #[default]
    Standard,
    /// Per-call uniform payload for specialized batch renderers.
    Uniforms(Arc<[f32]>),
}

/// One GPU draw call: a contiguous index range with fixed textures and blend.
#[derive(Clone, Debug)]
pub struct DrawCall {
    /// Index into the renderer's texture group pool.
    pub group: usize,
    pub blend: BlendMode,
    pub topology: Topology,
    /// Offset into the shared index buffer, in indices.
    pub start: u32,
    /// Number of indices to draw.
    pub size: u32,
    pub data: DrawCallData,
}

impl DrawCall {
    /// An empty descriptor for pool preallocation.
    pub(crate) fn empty() -> Self {
        Self {
            group: 0,
            blend: BlendMode::Normal,
            topology: Topology::Triangles,
            start: 0,
            size: 0,
            data: DrawCallData::Standard,
        }
    }
}
