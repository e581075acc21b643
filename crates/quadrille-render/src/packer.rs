//! Interleaved geometry packing into the shared batch buffers.
//!
//! Per-vertex layout, fixed stride of 6 elements (24 bytes):
//!
//! | offset | field        | type          |
//! |--------|--------------|---------------|
//! | 0      | position     | 2 x f32       |
//! | 2      | uv           | 2 x f32       |
//! | 4      | color        | u32 (RGBA8)   |
//! | 5      | texture unit | f32           |
//!
//! The color is written through the u32 alias view of the attribute buffer;
//! the unit id is stored as a float so the shader can consume it as a
//! regular vertex attribute.

use static_assertions::const_assert_eq;

use crate::primitive::Primitive;
use crate::viewable::ViewableBuffer;

/// Default stride in 4-byte elements.
pub const DEFAULT_VERTEX_STRIDE: usize = 6;

const_assert_eq!(DEFAULT_VERTEX_STRIDE * 4, 24);

/// Pack a 0xRRGGBB tint and an alpha into one RGBA8 color (little-endian
/// byte order: R, G, B, A).
///
/// When `premultiply` is set the RGB channels are pre-scaled by alpha,
/// matching textures whose pixel data is stored premultiplied.
pub fn pack_color(tint: u32, alpha: f32, premultiply: bool) -> u32 {
    let alpha = alpha.clamp(0.0, 1.0);
    let a = (alpha * 255.0).round() as u32;
    let mut r = (tint >> 16) & 0xFF;
    let mut g = (tint >> 8) & 0xFF;
    let mut b = tint & 0xFF;

    if premultiply && alpha < 1.0 {
        r = (r as f32 * alpha + 0.5) as u32;
        g = (g as f32 * alpha + 0.5) as u32;
        b = (b as f32 * alpha + 0.5) as u32;
    }

    (a << 24) | (b << 16) | (g << 8) | r
}

/// Writes one primitive's vertex attributes and rebased indices into the
/// shared buffers at running offsets.
pub struct GeometryPacker {
    stride: usize,
}

impl GeometryPacker {
    pub fn new() -> Self {
        Self {
            stride: DEFAULT_VERTEX_STRIDE,
        }
    }

    /// A packer with a custom stride for specialized attribute layouts.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is smaller than the default layout.
    pub fn with_stride(stride: usize) -> Self {
        assert!(
            stride >= DEFAULT_VERTEX_STRIDE,
            "stride {stride} cannot hold the base attribute layout"
        );
        Self { stride }
    }

    /// Stride in 4-byte elements.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pack `primitive` at the running offsets.
    ///
    /// `attribute_index` advances in 4-byte elements, `index_index` in
    /// indices. Written indices are rebased so they point into the shared
    /// buffer, not the primitive's local vertex list.
    pub fn pack(
        &self,
        primitive: &Primitive,
        texture_unit: u32,
        attributes: &mut ViewableBuffer,
        indices: &mut [u16],
        attribute_index: &mut usize,
        index_index: &mut usize,
    ) {
        let premultiply = primitive.texture.alpha_mode().premultiplies_tint();
        let packed_color = pack_color(primitive.tint, primitive.alpha, premultiply);
        let unit = texture_unit as f32;

        let base_vertex = *attribute_index / self.stride;
        let vertices = primitive.vertices();
        let uvs = primitive.uvs();

        for v in 0..primitive.vertex_count() {
            let o = *attribute_index;
            attributes.set_f32(o, vertices[v * 2]);
            attributes.set_f32(o + 1, vertices[v * 2 + 1]);
            attributes.set_f32(o + 2, uvs[v * 2]);
            attributes.set_f32(o + 3, uvs[v * 2 + 1]);
            attributes.set_u32(o + 4, packed_color);
            attributes.set_f32(o + 5, unit);
            *attribute_index += self.stride;
        }

        for &index in primitive.indices() {
            debug_assert!(base_vertex + (index as usize) <= u16::MAX as usize);
            indices[*index_index] = base_vertex as u16 + index;
            *index_index += 1;
        }
    }
}

impl Default for GeometryPacker {
    fn default() -> Self {
        Self::new()
    }
}

/// Vertex buffer layout of the default packing, for pipeline construction.
pub fn default_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Unorm8x4,  // color
        3 => Float32,   // texture unit
    ];

    wgpu::VertexBufferLayout {
        array_stride: (DEFAULT_VERTEX_STRIDE * 4) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: ATTRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{AlphaMode, TextureHandle};
    use glam::Vec2;

    #[test]
    fn test_pack_color_opaque() {
        // Full alpha: channels pass through regardless of premultiplication.
        assert_eq!(pack_color(0xFF8040, 1.0, true), 0xFF4080FF);
        assert_eq!(pack_color(0xFF8040, 1.0, false), 0xFF4080FF);
    }

    #[test]
    fn test_pack_color_premultiplied() {
        let packed = pack_color(0xFFFFFF, 0.5, true);
        let a = packed >> 24;
        let r = packed & 0xFF;
        assert_eq!(a, 128);
        assert_eq!(r, 128);
    }

    #[test]
    fn test_pack_color_straight() {
        let packed = pack_color(0xFFFFFF, 0.5, false);
        assert_eq!(packed >> 24, 128);
        assert_eq!(packed & 0xFF, 255);
    }

    #[test]
    fn test_round_trip_positions_and_uvs() {
        let tex = TextureHandle::loaded(AlphaMode::Premultiplied);
        let quad = Primitive::quad(Vec2::new(1.0, 2.0), Vec2::new(3.0, 5.0), tex)
            .with_tint(0x336699)
            .with_alpha(0.25);

        let packer = GeometryPacker::new();
        let mut attributes = ViewableBuffer::new(4 * DEFAULT_VERTEX_STRIDE * 4);
        let mut indices = vec![0u16; 6];
        let (mut a, mut i) = (0, 0);
        packer.pack(&quad, 3, &mut attributes, &mut indices, &mut a, &mut i);

        assert_eq!(a, 4 * DEFAULT_VERTEX_STRIDE);
        assert_eq!(i, 6);

        let floats = attributes.float32();
        for v in 0..4 {
            let o = v * DEFAULT_VERTEX_STRIDE;
            assert_eq!(floats[o], quad.vertices()[v * 2]);
            assert_eq!(floats[o + 1], quad.vertices()[v * 2 + 1]);
            assert_eq!(floats[o + 2], quad.uvs()[v * 2]);
            assert_eq!(floats[o + 3], quad.uvs()[v * 2 + 1]);
            assert_eq!(floats[o + 5], 3.0);
        }

        let color = attributes.uint32()[4];
        assert_eq!(color >> 24, 64); // 0.25 alpha
    }

    #[test]
    fn test_indices_rebased_to_shared_buffer() {
        let tex = TextureHandle::loaded(AlphaMode::Premultiplied);
        let quad = Primitive::quad(Vec2::ZERO, Vec2::ONE, tex);

        let packer = GeometryPacker::new();
        let mut attributes = ViewableBuffer::new(8 * DEFAULT_VERTEX_STRIDE * 4);
        let mut indices = vec![0u16; 12];
        let (mut a, mut i) = (0, 0);
        packer.pack(&quad, 0, &mut attributes, &mut indices, &mut a, &mut i);
        packer.pack(&quad, 0, &mut attributes, &mut indices, &mut a, &mut i);

        assert_eq!(&indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&indices[6..], &[4, 5, 6, 4, 6, 7]);
    }
}
