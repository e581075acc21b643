//! Pooled CPU-side batch buffers, bucketed by power-of-two capacity.
//!
//! Buffers are allocated once per size class and reused for the lifetime of
//! the renderer; the pool only ever grows. Trading a bounded amount of
//! memory for zero per-frame allocation keeps flush latency flat.
//!
//! Both pools key by log2 bucket index into a dense vector: attribute
//! buffers in units of 8 vertices (one quad's worth of position floats),
//! index buffers in units of 12 indices (two quads' worth of triangles).

use crate::viewable::ViewableBuffer;

/// Vertices per attribute size-class unit.
const ATTRIBUTE_UNIT: usize = 8;
/// Indices per index size-class unit.
const INDEX_UNIT: usize = 12;

/// Pools of attribute and index buffers shared by a renderer's flushes.
pub struct BatchBufferPool {
    attribute_buffers: Vec<Option<ViewableBuffer>>,
    index_buffers: Vec<Option<Vec<u16>>>,
    vertex_stride: usize,
}

impl BatchBufferPool {
    /// Create a pool for attribute buffers of `vertex_stride` 4-byte
    /// elements per vertex.
    pub fn new(vertex_stride: usize) -> Self {
        assert!(vertex_stride > 0, "vertex stride must be non-zero");
        Self {
            attribute_buffers: Vec::new(),
            index_buffers: Vec::new(),
            vertex_stride,
        }
    }

    /// The smallest pooled attribute buffer holding at least `vertices`
    /// vertices. The same size class always returns the same buffer.
    pub fn get_attribute_buffer(&mut self, vertices: usize) -> &mut ViewableBuffer {
        attribute_slot(&mut self.attribute_buffers, self.vertex_stride, vertices)
    }

    /// The smallest pooled index buffer holding at least `indices` entries.
    pub fn get_index_buffer(&mut self, indices: usize) -> &mut Vec<u16> {
        index_slot(&mut self.index_buffers, indices)
    }

    /// Both buffers for one flush, borrowed simultaneously.
    pub fn get_buffers(
        &mut self,
        vertices: usize,
        indices: usize,
    ) -> (&mut ViewableBuffer, &mut Vec<u16>) {
        let Self {
            attribute_buffers,
            index_buffers,
            vertex_stride,
        } = self;
        (
            attribute_slot(attribute_buffers, *vertex_stride, vertices),
            index_slot(index_buffers, indices),
        )
    }
}

/// Round `request` up to a power of two of `unit` and return the bucket
/// index (log2 of the unit multiple) and rounded capacity.
fn bucket_for(request: usize, unit: usize) -> (usize, usize) {
    assert!(request > 0, "zero-size buffer request");
    let units = request.div_ceil(unit).next_power_of_two();
    (units.trailing_zeros() as usize, units * unit)
}

fn attribute_slot(
    buffers: &mut Vec<Option<ViewableBuffer>>,
    vertex_stride: usize,
    vertices: usize,
) -> &mut ViewableBuffer {
    let (bucket, capacity) = bucket_for(vertices, ATTRIBUTE_UNIT);
    if buffers.len() <= bucket {
        buffers.resize_with(bucket + 1, || None);
    }
    buffers[bucket].get_or_insert_with(|| {
        tracing::trace!(capacity, bucket, "allocating attribute buffer");
        ViewableBuffer::new(capacity * vertex_stride * 4)
    })
}

fn index_slot(buffers: &mut Vec<Option<Vec<u16>>>, indices: usize) -> &mut Vec<u16> {
    let (bucket, capacity) = bucket_for(indices, INDEX_UNIT);
    if buffers.len() <= bucket {
        buffers.resize_with(bucket + 1, || None);
    }
    buffers[bucket].get_or_insert_with(|| {
        tracing::trace!(capacity, bucket, "allocating index buffer");
        vec![0u16; capacity]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::DEFAULT_VERTEX_STRIDE;

    #[test]
    fn test_attribute_capacity_rounding() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        // 10 vertices round to 2 units = 16 vertices.
        let buffer = pool.get_attribute_buffer(10);
        assert_eq!(buffer.len_bytes(), 16 * DEFAULT_VERTEX_STRIDE * 4);
        // 17 vertices round to 4 units = 32 vertices.
        let buffer = pool.get_attribute_buffer(17);
        assert_eq!(buffer.len_bytes(), 32 * DEFAULT_VERTEX_STRIDE * 4);
    }

    #[test]
    fn test_index_capacity_rounding() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        assert_eq!(pool.get_index_buffer(6).len(), 12);
        assert_eq!(pool.get_index_buffer(13).len(), 24);
        assert_eq!(pool.get_index_buffer(25).len(), 48);
    }

    #[test]
    fn test_same_size_class_reuses_instance() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        let first = pool.get_attribute_buffer(100).float32().as_ptr();
        let second = pool.get_attribute_buffer(100).float32().as_ptr();
        let third = pool.get_attribute_buffer(70).float32().as_ptr();
        // 100 and 70 both round to 128 vertices.
        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_growth_is_monotonic() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        let small = pool.get_attribute_buffer(10).len_bytes();
        let large = pool.get_attribute_buffer(1000).len_bytes();
        assert!(large > small);
        // The small size class survives the larger request untouched.
        assert_eq!(pool.get_attribute_buffer(10).len_bytes(), small);
    }

    #[test]
    fn test_simultaneous_borrow() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        let (attributes, indices) = pool.get_buffers(4, 6);
        attributes.set_f32(0, 1.0);
        indices[0] = 3;
        assert_eq!(attributes.float32()[0], 1.0);
    }

    #[test]
    #[should_panic(expected = "zero-size buffer request")]
    fn test_zero_request_panics() {
        let mut pool = BatchBufferPool::new(DEFAULT_VERTEX_STRIDE);
        let _ = pool.get_attribute_buffer(0);
    }
}
