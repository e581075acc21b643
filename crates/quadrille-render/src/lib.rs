//! Batched 2D rendering for the quadrille engine.
//!
//! Primitives submitted over a frame are accumulated by a [`BatchRenderer`],
//! which groups them by texture-unit availability, splits draw calls at
//! blend-mode and topology boundaries, packs all geometry into shared
//! interleaved buffers, and issues the minimal ordered set of draw calls.
//! A [`BatchSystem`] dispatches between renderers so heterogeneous content
//! still batches well.
//!
//! The GPU is reached exclusively through the [`GpuContext`] trait, which
//! keeps the batching logic backend-agnostic and testable.

pub mod assigner;
pub mod blend;
pub mod buffer_pool;
pub mod draw_call;
pub mod gpu;
pub mod packer;
pub mod primitive;
pub mod renderer;
pub mod system;
pub mod texture;
pub mod viewable;

pub use assigner::TextureUnitAssigner;
pub use blend::BlendMode;
pub use buffer_pool::BatchBufferPool;
pub use draw_call::{DrawCall, DrawCallData, TextureBatchGroup};
pub use gpu::{CapabilityFlags, ContextCapabilities, GpuBufferId, GpuContext, Topology};
pub use packer::{GeometryPacker, default_vertex_layout, pack_color};
pub use primitive::Primitive;
pub use renderer::{BatchRenderer, BatchRendererDescriptor, BatchStats};
pub use system::{BatchSystem, ObjectRenderer, RendererId};
pub use texture::{AlphaMode, TextureHandle, TextureSource};
pub use viewable::ViewableBuffer;
