//! Drawable primitives submitted to the batch renderer.
//!
//! The scene graph produces these with vertices already transformed to
//! world/view space; the batcher treats them as immutable for the frame.
//! Payloads are `Arc` slices so buffering a primitive is a cheap clone.

use std::sync::Arc;

use glam::Vec2;

use crate::blend::BlendMode;
use crate::gpu::Topology;
use crate::texture::TextureHandle;

/// One drawable unit: a textured, tinted, indexed set of triangles or lines.
#[derive(Clone, Debug)]
pub struct Primitive {
    vertices: Arc<[f32]>,
    uvs: Arc<[f32]>,
    indices: Arc<[u16]>,
    pub texture: TextureHandle,
    pub blend_mode: BlendMode,
    /// Tint as 0xRRGGBB.
    pub tint: u32,
    /// World alpha in `[0, 1]`, combined with the tint into one packed color.
    pub alpha: f32,
    pub topology: Topology,
}

impl Primitive {
    /// Create a triangle-list primitive.
    ///
    /// `vertices` and `uvs` are flat (x, y) / (u, v) pair sequences of equal
    /// length; `indices` reference the local vertex list.
    ///
    /// # Panics
    ///
    /// Panics on malformed geometry: odd pair counts, mismatched UV length,
    /// an index count that is not a multiple of 3, or an out-of-range index.
    /// These indicate a bug in the traversal layer, not a runtime condition.
    pub fn new(
        vertices: impl Into<Arc<[f32]>>,
        uvs: impl Into<Arc<[f32]>>,
        indices: impl Into<Arc<[u16]>>,
        texture: TextureHandle,
    ) -> Self {
        Self::with_topology(vertices, uvs, indices, texture, Topology::Triangles)
    }

    /// Create a primitive with an explicit topology (lines use index pairs).
    pub fn with_topology(
        vertices: impl Into<Arc<[f32]>>,
        uvs: impl Into<Arc<[f32]>>,
        indices: impl Into<Arc<[u16]>>,
        texture: TextureHandle,
        topology: Topology,
    ) -> Self {
        let vertices = vertices.into();
        let uvs = uvs.into();
        let indices = indices.into();

        assert!(
            !vertices.is_empty() && vertices.len() % 2 == 0,
            "vertex data must be a non-empty sequence of (x, y) pairs"
        );
        assert_eq!(
            uvs.len(),
            vertices.len(),
            "uv count must match vertex count"
        );
        assert!(
            indices.len() % topology.indices_per_primitive() == 0,
            "index count {} is not a multiple of {}",
            indices.len(),
            topology.indices_per_primitive()
        );
        let vertex_count = vertices.len() / 2;
        for &index in indices.iter() {
            assert!(
                (index as usize) < vertex_count,
                "index {index} out of range for {vertex_count} vertices"
            );
        }

        Self {
            vertices,
            uvs,
            indices,
            texture,
            blend_mode: BlendMode::Normal,
            tint: 0xFFFFFF,
            alpha: 1.0,
            topology,
        }
    }

    /// An axis-aligned textured quad covering `min..max` with full UVs.
    pub fn quad(min: Vec2, max: Vec2, texture: TextureHandle) -> Self {
        Self::new(
            vec![min.x, min.y, max.x, min.y, max.x, max.y, min.x, max.y],
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![0u16, 1, 2, 0, 2, 3],
            texture,
        )
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_tint(mut self, tint: u32) -> Self {
        self.tint = tint & 0xFFFFFF;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}
