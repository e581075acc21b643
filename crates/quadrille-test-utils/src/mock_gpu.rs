//! Mock implementation of `GpuContext` for testing.
//!
//! Records every operation the batcher issues without touching a GPU.
//! Methods take `&self`, so recording uses interior mutability; a
//! `parking_lot::Mutex` keeps the context `Send + Sync` as the trait
//! requires.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use quadrille_render::blend::BlendMode;
use quadrille_render::gpu::{GpuBufferId, GpuContext, Topology};
use quadrille_render::texture::TextureHandle;

/// One recorded GPU operation, for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateVertexBuffer { id: GpuBufferId },
    CreateIndexBuffer { id: GpuBufferId },
    UploadBuffer { id: GpuBufferId, bytes: Vec<u8> },
    BindBuffers { vertex: GpuBufferId, index: GpuBufferId },
    BindPipeline { max_texture_units: u32 },
    BindTexture { uid: u64, unit: u32 },
    SetBlendMode { mode: BlendMode },
    DrawIndexed { topology: Topology, index_count: u32, start_index: u32 },
}

/// A `GpuContext` that records calls instead of issuing them.
#[derive(Default)]
pub struct MockGpuContext {
    calls: Mutex<Vec<GpuCall>>,
    next_buffer_id: AtomicU64,
}

impl MockGpuContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every recorded call, in issue order.
    pub fn calls(&self) -> Vec<GpuCall> {
        self.calls.lock().clone()
    }

    /// Discard recorded calls, keeping allocated buffer ids.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn count_draw_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, GpuCall::DrawIndexed { .. }))
            .count()
    }

    pub fn count_texture_binds(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, GpuCall::BindTexture { .. }))
            .count()
    }

    pub fn count_uploads(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, GpuCall::UploadBuffer { .. }))
            .count()
    }

    /// The recorded draw calls as `(topology, index_count, start_index)`.
    pub fn draw_calls(&self) -> Vec<(Topology, u32, u32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GpuCall::DrawIndexed { topology, index_count, start_index } => {
                    Some((*topology, *index_count, *start_index))
                }
                _ => None,
            })
            .collect()
    }

    /// The recorded texture binds as `(texture uid, unit)`.
    pub fn texture_binds(&self) -> Vec<(u64, u32)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GpuCall::BindTexture { uid, unit } => Some((*uid, *unit)),
                _ => None,
            })
            .collect()
    }

    /// The payload of the most recent upload into `buffer`, if any.
    pub fn last_upload(&self, buffer: GpuBufferId) -> Option<Vec<u8>> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find_map(|call| match call {
                GpuCall::UploadBuffer { id, bytes } if *id == buffer => Some(bytes.clone()),
                _ => None,
            })
    }

    /// Buffer ids that have received at least one upload, in first-upload
    /// order, deduplicated.
    pub fn uploaded_buffers(&self) -> Vec<GpuBufferId> {
        let mut seen = Vec::new();
        for call in self.calls.lock().iter() {
            if let GpuCall::UploadBuffer { id, .. } = call {
                if !seen.contains(id) {
                    seen.push(*id);
                }
            }
        }
        seen
    }

    fn record(&self, call: GpuCall) {
        self.calls.lock().push(call);
    }

    fn next_id(&self) -> GpuBufferId {
        GpuBufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl GpuContext for MockGpuContext {
    fn create_vertex_buffer(&self) -> GpuBufferId {
        let id = self.next_id();
        self.record(GpuCall::CreateVertexBuffer { id });
        id
    }

    fn create_index_buffer(&self) -> GpuBufferId {
        let id = self.next_id();
        self.record(GpuCall::CreateIndexBuffer { id });
        id
    }

    fn upload_buffer(&self, buffer: GpuBufferId, bytes: &[u8]) {
        self.record(GpuCall::UploadBuffer {
            id: buffer,
            bytes: bytes.to_vec(),
        });
    }

    fn bind_buffers(&self, vertex: GpuBufferId, index: GpuBufferId) {
        self.record(GpuCall::BindBuffers { vertex, index });
    }

    fn bind_pipeline(&self, max_texture_units: u32) {
        self.record(GpuCall::BindPipeline { max_texture_units });
    }

    fn bind_texture(&self, texture: &TextureHandle, unit: u32) {
        self.record(GpuCall::BindTexture {
            uid: texture.uid(),
            unit,
        });
    }

    fn set_blend_mode(&self, mode: BlendMode) {
        self.record(GpuCall::SetBlendMode { mode });
    }

    fn draw_indexed(&self, topology: Topology, index_count: u32, start_index: u32) {
        self.record(GpuCall::DrawIndexed {
            topology,
            index_count,
            start_index,
        });
    }
}
