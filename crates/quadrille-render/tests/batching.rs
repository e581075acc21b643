//! End-to-end batching tests against the mock GPU context.

use std::sync::Arc;

use glam::Vec2;
use quadrille_render::{
    BatchRenderer, BatchRendererDescriptor, BatchSystem, BlendMode, CapabilityFlags,
    ContextCapabilities, GpuBufferId, Primitive, Topology,
    texture::{AlphaMode, TextureHandle},
};
use quadrille_test_utils::{GpuCall, MockGpuContext};

fn tex() -> TextureHandle {
    TextureHandle::loaded(AlphaMode::Premultiplied)
}

fn quad(texture: &TextureHandle) -> Primitive {
    Primitive::quad(Vec2::ZERO, Vec2::ONE, texture.clone())
}

fn renderer_with(
    capabilities: ContextCapabilities,
) -> (Arc<MockGpuContext>, BatchRenderer) {
    let mock = Arc::new(MockGpuContext::new());
    let renderer = BatchRenderer::new(
        mock.clone(),
        BatchRendererDescriptor::new(capabilities),
    );
    (mock, renderer)
}

#[test]
fn blend_change_splits_draw_calls_but_textures_share_group() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let (a, b) = (tex(), tex());

    renderer.render(&quad(&a));
    renderer.render(&quad(&a).with_blend_mode(BlendMode::Add));
    renderer.render(&quad(&b).with_blend_mode(BlendMode::Add));
    renderer.flush();

    // Both textures fit one group, so the only boundary is the blend change.
    let draws = mock.draw_calls();
    assert_eq!(
        draws,
        vec![(Topology::Triangles, 6, 0), (Topology::Triangles, 12, 6)]
    );
    assert_eq!(mock.count_texture_binds(), 2);

    let blends: Vec<BlendMode> = mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GpuCall::SetBlendMode { mode } => Some(mode),
            _ => None,
        })
        .collect();
    assert_eq!(blends, vec![BlendMode::Normal, BlendMode::Add]);
}

#[test]
fn topology_change_splits_draw_calls() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let a = tex();

    let line = Primitive::with_topology(
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
        vec![0u16, 1],
        a.clone(),
        Topology::Lines,
    );

    renderer.render(&quad(&a));
    renderer.render(&line);
    renderer.flush();

    assert_eq!(
        mock.draw_calls(),
        vec![(Topology::Triangles, 6, 0), (Topology::Lines, 2, 6)]
    );
}

#[test]
fn exceeding_capacity_flushes_implicitly() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let descriptor = BatchRendererDescriptor::new(ContextCapabilities::default())
        .with_max_batch_vertices(8);
    let mock2 = Arc::new(MockGpuContext::new());
    let mut renderer2 = BatchRenderer::new(mock2.clone(), descriptor);
    // Sanity: the unconstrained renderer would not have flushed yet.
    let a = tex();
    for _ in 0..3 {
        renderer.render(&quad(&a));
        renderer2.render(&quad(&a));
    }

    assert_eq!(mock.count_draw_calls(), 0);
    // Two quads filled the batch; the third forced a flush and is buffered.
    assert_eq!(mock2.count_draw_calls(), 1);
    assert_eq!(renderer2.buffered_vertices(), 4);
    assert_eq!(renderer2.stats().flushes, 1);

    renderer2.flush();
    assert_eq!(mock2.draw_calls(), vec![
        (Topology::Triangles, 12, 0),
        (Topology::Triangles, 6, 0),
    ]);
}

#[test]
fn packed_indices_stay_inside_packed_vertex_range() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let (a, b) = (tex(), tex());

    renderer.render(&quad(&a));
    renderer.render(&quad(&b));
    renderer.render(&quad(&a));
    renderer.flush();

    // Uploads happen in vertex, index order within a flush.
    let uploads: Vec<Vec<u8>> = mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GpuCall::UploadBuffer { bytes, .. } => Some(bytes),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 2);

    let indices: Vec<u16> = uploads[1]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(indices.len(), 18);
    assert!(indices.iter().all(|&i| i < 12));
    assert_eq!(indices.iter().max(), Some(&11));
}

#[test]
fn large_scene_splits_into_two_flushes() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let a = tex();

    // Default capacity is 16384 vertices = 4096 quads.
    for _ in 0..5000 {
        renderer.render(&quad(&a));
    }
    assert_eq!(renderer.stats().flushes, 1);
    renderer.flush();

    assert_eq!(renderer.stats().flushes, 2);
    assert_eq!(mock.draw_calls(), vec![
        (Topology::Triangles, 4096 * 6, 0),
        (Topology::Triangles, 904 * 6, 0),
    ]);
    // One texture bind per flush, never per quad.
    assert_eq!(mock.count_texture_binds(), 2);
}

#[test]
fn more_textures_than_units_splits_groups_without_reissuing_blend() {
    let capabilities = ContextCapabilities::new(1)
        .with_flags(CapabilityFlags::SAME_BUFFER_REUPLOAD);
    let (mock, mut renderer) = renderer_with(capabilities);

    renderer.render(&quad(&tex()));
    renderer.render(&quad(&tex()));
    renderer.flush();

    assert_eq!(mock.draw_calls(), vec![
        (Topology::Triangles, 6, 0),
        (Topology::Triangles, 6, 6),
    ]);
    // Same blend across both calls: set exactly once.
    let blend_sets = mock
        .calls()
        .iter()
        .filter(|call| matches!(call, GpuCall::SetBlendMode { .. }))
        .count();
    assert_eq!(blend_sets, 1);
}

#[test]
fn same_buffer_reupload_reuses_one_pair() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let a = tex();

    renderer.render(&quad(&a));
    renderer.flush();
    renderer.render(&quad(&a));
    renderer.flush();

    assert_eq!(mock.count_uploads(), 4);
    assert_eq!(mock.uploaded_buffers().len(), 2);
}

#[test]
fn constrained_device_rotates_buffer_pairs() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::new(16));
    let a = tex();

    renderer.render(&quad(&a));
    renderer.flush();
    renderer.render(&quad(&a));
    renderer.flush();

    // Each flush targets a fresh pair, starting with the pair created at
    // construction (mock ids are deterministic from 0).
    assert_eq!(
        mock.uploaded_buffers(),
        vec![GpuBufferId(0), GpuBufferId(1), GpuBufferId(2), GpuBufferId(3)]
    );

    // The rotation rewinds at the frame boundary.
    renderer.on_pre_render();
    renderer.render(&quad(&a));
    renderer.flush();
    assert_eq!(mock.uploaded_buffers().len(), 4);
}

#[test]
fn invalid_texture_is_skipped() {
    let (mock, mut renderer) = renderer_with(ContextCapabilities::default());
    let pending = TextureHandle::pending(AlphaMode::Premultiplied);

    renderer.render(&quad(&pending));
    renderer.flush();
    assert_eq!(mock.count_draw_calls(), 0);
    assert_eq!(renderer.stats().flushes, 0);

    // Once the loader marks it valid the same handle renders normally.
    pending.set_valid(true);
    renderer.render(&quad(&pending));
    renderer.flush();
    assert_eq!(mock.count_draw_calls(), 1);
}

#[test]
fn stats_reset_at_frame_boundary() {
    let (_, mut renderer) = renderer_with(ContextCapabilities::default());
    let a = tex();

    renderer.render(&quad(&a));
    renderer.flush();
    assert_eq!(renderer.stats().draw_calls, 1);

    renderer.on_pre_render();
    assert_eq!(renderer.stats(), Default::default());
}

#[test]
fn batch_system_starts_and_stops_batch_renderer() {
    let mock = Arc::new(MockGpuContext::new());
    let renderer = BatchRenderer::new(mock.clone(), BatchRendererDescriptor::default());

    let mut system = BatchSystem::new();
    let id = system.register(Box::new(renderer));

    system.set_object_renderer(id);
    assert!(mock
        .calls()
        .iter()
        .any(|call| matches!(call, GpuCall::BindPipeline { max_texture_units: 16 })));

    let batch = system.renderer_mut::<BatchRenderer>(id).unwrap();
    batch.render(&quad(&tex()));

    // Switching away stops the renderer, which flushes its buffered quad.
    system.reset();
    assert_eq!(mock.count_draw_calls(), 1);
}
