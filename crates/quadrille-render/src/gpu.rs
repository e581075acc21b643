//! The GPU context seam.
//!
//! The batching engine never talks to a device directly; it issues
//! bind/upload/draw commands through [`GpuContext`]. The trait is
//! object-safe and takes `&self` so implementations can be shared behind an
//! `Arc` and mocks can record calls via interior mutability.

use crate::blend::BlendMode;
use crate::texture::TextureHandle;

bitflags::bitflags! {
    /// Device behavior flags that change how the batcher drives the context.
    ///
    /// Always injected configuration, never sniffed at runtime, so both code
    /// paths stay deterministically testable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityFlags: u32 {
        /// The device tolerates re-uploading into the same buffer object
        /// several times per frame. Constrained devices that stall on this
        /// leave the flag unset, and the renderer rotates through a pool of
        /// buffer objects instead.
        const SAME_BUFFER_REUPLOAD = 1 << 0;
    }
}

/// Capabilities of the device a batch renderer is driving.
///
/// Fixed for the session; re-created from scratch on context loss/restore,
/// which is an external event (the pipeline must be regenerated for the new
/// unit count before batching resumes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextCapabilities {
    /// Texture units one draw call can sample from.
    pub max_texture_units: u32,
    pub flags: CapabilityFlags,
}

impl ContextCapabilities {
    /// Capabilities with the given unit count and no flags set.
    ///
    /// # Panics
    ///
    /// Panics if `max_texture_units` is zero.
    pub fn new(max_texture_units: u32) -> Self {
        assert!(max_texture_units >= 1, "at least one texture unit required");
        Self {
            max_texture_units,
            flags: CapabilityFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: CapabilityFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn can_reupload_same_buffer(&self) -> bool {
        self.flags.contains(CapabilityFlags::SAME_BUFFER_REUPLOAD)
    }
}

impl Default for ContextCapabilities {
    fn default() -> Self {
        Self::new(16).with_flags(CapabilityFlags::SAME_BUFFER_REUPLOAD)
    }
}

/// Opaque handle to a GPU-side buffer object owned by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBufferId(pub u64);

/// Primitive topology of one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    #[default]
    Triangles,
    Lines,
}

impl Topology {
    /// Indices per primitive for validation.
    pub fn indices_per_primitive(self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Lines => 2,
        }
    }

    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// Abstraction over the immediate-mode drawing API the batcher targets.
///
/// Methods take `&self` and return owned ids; implementations use interior
/// mutability where they need to track state. All calls are issued from the
/// single render thread, in order.
pub trait GpuContext: Send + Sync {
    /// Create a GPU-side vertex buffer object.
    fn create_vertex_buffer(&self) -> GpuBufferId;

    /// Create a GPU-side index buffer object.
    fn create_index_buffer(&self) -> GpuBufferId;

    /// Upload `bytes` into the given buffer object, replacing its contents.
    fn upload_buffer(&self, buffer: GpuBufferId, bytes: &[u8]);

    /// Bind a vertex/index buffer pair as the source for subsequent draws.
    fn bind_buffers(&self, vertex: GpuBufferId, index: GpuBufferId);

    /// Bind the shared batch pipeline compiled for `max_texture_units`.
    fn bind_pipeline(&self, max_texture_units: u32);

    /// Bind a texture to a unit slot.
    fn bind_texture(&self, texture: &TextureHandle, unit: u32);

    /// Set the blend mode for subsequent draws.
    fn set_blend_mode(&self, mode: BlendMode);

    /// Rasterize `index_count` indices starting at `start_index` in the
    /// currently bound index buffer.
    fn draw_indexed(&self, topology: Topology, index_count: u32, start_index: u32);
}
