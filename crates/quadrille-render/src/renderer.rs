//! The batch renderer: buffers primitives and turns them into draw calls.
//!
//! Primitives accumulate across `render()` calls; `flush()` groups their
//! textures into unit-bounded sets, splits further at blend-mode and
//! topology boundaries, packs all geometry into shared buffers, uploads
//! them, and issues the draw calls in buffered order. Everything on the
//! flush path is pool-allocated and reused.

use std::sync::Arc;

use quadrille_core::profiling::profile_function;

use crate::assigner::TextureUnitAssigner;
use crate::buffer_pool::BatchBufferPool;
use crate::draw_call::{DrawCall, DrawCallData, TextureBatchGroup};
use crate::gpu::{ContextCapabilities, GpuBufferId, GpuContext};
use crate::packer::{DEFAULT_VERTEX_STRIDE, GeometryPacker};
use crate::primitive::Primitive;
use crate::system::ObjectRenderer;
use crate::texture::TextureHandle;

/// Hard ceiling on batched vertices so rebased u16 indices cannot overflow.
const MAX_VERTEX_CEILING: usize = u16::MAX as usize + 1;

/// Default batch capacity: 4096 quads.
const DEFAULT_MAX_BATCH_VERTICES: usize = 4096 * 4;

/// Configuration for a [`BatchRenderer`].
#[derive(Debug, Clone)]
pub struct BatchRendererDescriptor {
    pub capabilities: ContextCapabilities,
    /// Vertices buffered before an implicit flush. Clamped to 65536.
    pub max_batch_vertices: usize,
    /// Attribute stride in 4-byte elements.
    pub vertex_stride: usize,
}

impl BatchRendererDescriptor {
    pub fn new(capabilities: ContextCapabilities) -> Self {
        Self {
            capabilities,
            max_batch_vertices: DEFAULT_MAX_BATCH_VERTICES,
            vertex_stride: DEFAULT_VERTEX_STRIDE,
        }
    }

    pub fn with_max_batch_vertices(mut self, vertices: usize) -> Self {
        self.max_batch_vertices = vertices;
        self
    }
}

impl Default for BatchRendererDescriptor {
    fn default() -> Self {
        Self::new(ContextCapabilities::default())
    }
}

/// Statistics accumulated since the last pre-render reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub flushes: u32,
    pub draw_calls: u32,
    pub texture_binds: u32,
}

/// Accumulates primitives and emits the minimal set of draw calls.
pub struct BatchRenderer {
    context: Arc<dyn GpuContext>,
    capabilities: ContextCapabilities,
    max_batch_vertices: usize,

    packer: GeometryPacker,
    pool: BatchBufferPool,
    assigner: TextureUnitAssigner,

    // Buffered state, cleared on flush.
    elements: Vec<Primitive>,
    element_textures: Vec<TextureHandle>,
    vertex_count: usize,
    index_count: usize,

    // Pools reused across flushes.
    draw_calls: Vec<DrawCall>,
    groups: Vec<TextureBatchGroup>,
    splits: Vec<usize>,
    element_units: Vec<u32>,

    // GPU buffer objects; rotated when same-buffer re-upload is unsafe.
    buffer_pairs: Vec<(GpuBufferId, GpuBufferId)>,
    flush_id: usize,

    current_blend: Option<crate::blend::BlendMode>,
    flushing: bool,
    stats: BatchStats,
}

impl BatchRenderer {
    pub fn new(context: Arc<dyn GpuContext>, descriptor: BatchRendererDescriptor) -> Self {
        let max_batch_vertices = descriptor.max_batch_vertices.min(MAX_VERTEX_CEILING);
        assert!(
            max_batch_vertices >= 4,
            "batch capacity below a single quad"
        );

        // Worst case: every element is a quad with its own draw call.
        let draw_call_pool = max_batch_vertices / 4;
        let group_pool =
            draw_call_pool / descriptor.capabilities.max_texture_units as usize + 1;

        let buffer_pairs = vec![(context.create_vertex_buffer(), context.create_index_buffer())];

        tracing::debug!(
            max_batch_vertices,
            max_texture_units = descriptor.capabilities.max_texture_units,
            "creating batch renderer"
        );

        Self {
            context,
            capabilities: descriptor.capabilities,
            max_batch_vertices,
            packer: GeometryPacker::with_stride(descriptor.vertex_stride),
            pool: BatchBufferPool::new(descriptor.vertex_stride),
            assigner: TextureUnitAssigner::new(),
            elements: Vec::with_capacity(draw_call_pool),
            element_textures: Vec::with_capacity(draw_call_pool),
            vertex_count: 0,
            index_count: 0,
            draw_calls: (0..draw_call_pool).map(|_| DrawCall::empty()).collect(),
            groups: (0..group_pool).map(|_| TextureBatchGroup::new()).collect(),
            splits: Vec::new(),
            element_units: Vec::new(),
            buffer_pairs,
            flush_id: 0,
            current_blend: None,
            flushing: false,
            stats: BatchStats::default(),
        }
    }

    /// Buffer one primitive for the current batch.
    ///
    /// A primitive with a not-yet-valid texture is silently skipped: assets
    /// load asynchronously and referencing an incomplete GPU resource in a
    /// draw call is worse than dropping the sprite for a frame. If buffering
    /// would exceed the batch capacity, the current batch is flushed first;
    /// a primitive is never split across flushes.
    pub fn render(&mut self, primitive: &Primitive) {
        assert!(!self.flushing, "render() called during flush");

        if !primitive.texture.is_valid() {
            tracing::trace!(
                uid = primitive.texture.uid(),
                "skipping primitive with invalid texture"
            );
            return;
        }

        let vertices = primitive.vertex_count();
        assert!(
            vertices <= self.max_batch_vertices,
            "primitive with {vertices} vertices exceeds batch capacity {}",
            self.max_batch_vertices
        );

        if self.vertex_count + vertices > self.max_batch_vertices {
            self.flush();
        }

        self.vertex_count += vertices;
        self.index_count += primitive.index_count();
        self.element_textures.push(primitive.texture.clone());
        self.elements.push(primitive.clone());
    }

    /// Finalize all buffered primitives into draw calls and issue them.
    pub fn flush(&mut self) {
        profile_function!();

        if self.elements.is_empty() {
            return;
        }
        assert!(!self.flushing, "reentrant flush");
        self.flushing = true;

        let group_count = self.assigner.build_groups(
            &self.element_textures,
            self.capabilities.max_texture_units as usize,
            &mut self.groups,
            &mut self.splits,
            &mut self.element_units,
        );

        let draw_call_count = self.build_draw_calls();
        self.pack_geometry();
        self.upload();
        self.issue_draw_calls(draw_call_count);

        tracing::trace!(
            elements = self.elements.len(),
            groups = group_count,
            draw_calls = draw_call_count,
            "flushed batch"
        );

        self.elements.clear();
        self.element_textures.clear();
        self.vertex_count = 0;
        self.index_count = 0;
        self.stats.flushes += 1;
        self.flushing = false;
    }

    /// Split the buffered element sequence into draw calls at texture-group,
    /// blend-mode and topology boundaries. Splits partition, never reorder.
    fn build_draw_calls(&mut self) -> usize {
        let mut used = 0usize;
        let mut group = 0usize;
        let mut running_index = 0u32;

        for (e, element) in self.elements.iter().enumerate() {
            let mut boundary = e == 0;
            if group < self.splits.len() && e == self.splits[group] {
                group += 1;
                boundary = true;
            }

            if !boundary {
                let current = &self.draw_calls[used - 1];
                boundary =
                    current.blend != element.blend_mode || current.topology != element.topology;
            }

            if boundary {
                if used == self.draw_calls.len() {
                    self.draw_calls.push(DrawCall::empty());
                }
                let call = &mut self.draw_calls[used];
                call.group = group;
                call.blend = element.blend_mode;
                call.topology = element.topology;
                call.start = running_index;
                call.size = 0;
                call.data = DrawCallData::Standard;
                used += 1;
            }

            let indices = element.index_count() as u32;
            self.draw_calls[used - 1].size += indices;
            running_index += indices;
        }

        used
    }

    /// Pack every buffered primitive into the pooled shared buffers, in
    /// buffered order, at running offsets.
    fn pack_geometry(&mut self) {
        let (attributes, indices) = self.pool.get_buffers(self.vertex_count, self.index_count);
        let mut attribute_index = 0usize;
        let mut index_index = 0usize;

        for (e, element) in self.elements.iter().enumerate() {
            self.packer.pack(
                element,
                self.element_units[e],
                attributes,
                indices,
                &mut attribute_index,
                &mut index_index,
            );
        }
    }

    /// Upload the packed buffers into a GPU buffer pair. Devices that stall
    /// on same-buffer re-upload get a fresh pair from a growing rotation.
    fn upload(&mut self) {
        let pair = if self.capabilities.can_reupload_same_buffer() {
            self.buffer_pairs[0]
        } else {
            // Rotation starts at pair 0 each frame, so the pair created at
            // construction is never idle.
            if self.flush_id >= self.buffer_pairs.len() {
                self.buffer_pairs.push((
                    self.context.create_vertex_buffer(),
                    self.context.create_index_buffer(),
                ));
            }
            let pair = self.buffer_pairs[self.flush_id];
            self.flush_id += 1;
            pair
        };

        let attribute_bytes = self.vertex_count * self.packer.stride() * 4;
        let (attributes, indices) = self.pool.get_buffers(self.vertex_count, self.index_count);
        let (vertex_buffer, index_buffer) = pair;

        self.context
            .upload_buffer(vertex_buffer, &attributes.bytes()[..attribute_bytes]);
        self.context
            .upload_buffer(index_buffer, bytemuck::cast_slice(&indices[..self.index_count]));
        self.context.bind_buffers(vertex_buffer, index_buffer);
    }

    /// Bind textures per group and issue the draw calls in order, setting
    /// the blend mode only when it changes.
    fn issue_draw_calls(&mut self, draw_call_count: usize) {
        let mut bound_group = usize::MAX;

        for call in &self.draw_calls[..draw_call_count] {
            if call.group != bound_group {
                let group = &self.groups[call.group];
                for (texture, &unit) in group.textures().iter().zip(group.units()) {
                    self.context.bind_texture(texture, unit);
                    self.stats.texture_binds += 1;
                }
                bound_group = call.group;
            }

            if self.current_blend != Some(call.blend) {
                self.context.set_blend_mode(call.blend);
                self.current_blend = Some(call.blend);
            }

            self.context.draw_indexed(call.topology, call.size, call.start);
            self.stats.draw_calls += 1;
        }
    }

    /// Called when this renderer becomes the active one: binds the shared
    /// pipeline and, when re-upload is safe, the fixed buffer pair so
    /// subsequent packing writes into consistent storage.
    pub fn start(&mut self) {
        self.context
            .bind_pipeline(self.capabilities.max_texture_units);
        if self.capabilities.can_reupload_same_buffer() {
            let (vertex_buffer, index_buffer) = self.buffer_pairs[0];
            self.context.bind_buffers(vertex_buffer, index_buffer);
        }
        self.current_blend = None;
    }

    /// Called when control transfers to a different renderer.
    pub fn stop(&mut self) {
        self.flush();
    }

    /// Frame-boundary reset of the buffer rotation and statistics.
    pub fn on_pre_render(&mut self) {
        self.flush_id = 0;
        self.stats = BatchStats::default();
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Vertices currently buffered, for capacity assertions in callers.
    pub fn buffered_vertices(&self) -> usize {
        self.vertex_count
    }

    pub fn capabilities(&self) -> ContextCapabilities {
        self.capabilities
    }
}

impl ObjectRenderer for BatchRenderer {
    fn start(&mut self) {
        BatchRenderer::start(self);
    }

    fn stop(&mut self) {
        BatchRenderer::stop(self);
    }

    fn flush(&mut self) {
        BatchRenderer::flush(self);
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
