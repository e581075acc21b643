//! A raw byte buffer viewable as both f32 and u32 elements.
//!
//! Interleaved vertex attributes mix float fields (position, UV, texture
//! unit) with a packed u32 color. Rather than allocating per field, the
//! packer writes through typed views over one shared allocation.

/// A resizable byte buffer exposing f32 and u32 views over the same storage.
///
/// Buffers are long-lived and pooled; see [`BatchBufferPool`](crate::BatchBufferPool).
/// The caller is responsible for sizing the buffer before writing.
pub struct ViewableBuffer {
    data: Vec<u32>,
}

impl ViewableBuffer {
    /// Create a buffer of `size_bytes` zeroed bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size_bytes` is zero or not a multiple of 4.
    pub fn new(size_bytes: usize) -> Self {
        assert!(size_bytes > 0, "ViewableBuffer size must be non-zero");
        assert!(
            size_bytes % 4 == 0,
            "ViewableBuffer size {size_bytes} is not 4-byte aligned"
        );
        Self {
            data: vec![0u32; size_bytes / 4],
        }
    }

    /// Size of the buffer in bytes.
    pub fn len_bytes(&self) -> usize {
        self.data.len() * 4
    }

    /// Number of 4-byte elements in the buffer.
    pub fn len_elements(&self) -> usize {
        self.data.len()
    }

    /// The buffer viewed as f32 elements.
    pub fn float32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data)
    }

    /// The buffer viewed as mutable f32 elements.
    pub fn float32_mut(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// The buffer viewed as u32 elements.
    pub fn uint32(&self) -> &[u32] {
        &self.data
    }

    /// The buffer viewed as mutable u32 elements.
    pub fn uint32_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// The raw bytes of the buffer, for GPU upload.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Write an f32 at element offset `index`.
    #[inline]
    pub fn set_f32(&mut self, index: usize, value: f32) {
        self.data[index] = value.to_bits();
    }

    /// Write a u32 at element offset `index`.
    #[inline]
    pub fn set_u32(&mut self, index: usize, value: u32) {
        self.data[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views_share_storage() {
        let mut buffer = ViewableBuffer::new(16);
        buffer.set_f32(0, 1.5);
        buffer.set_u32(1, 0xFFAA33CC);

        assert_eq!(buffer.float32()[0], 1.5);
        assert_eq!(buffer.uint32()[0], 1.5f32.to_bits());
        assert_eq!(buffer.uint32()[1], 0xFFAA33CC);
        assert_eq!(buffer.len_bytes(), 16);
        assert_eq!(buffer.len_elements(), 4);
    }

    #[test]
    fn test_bytes_little_endian_layout() {
        let mut buffer = ViewableBuffer::new(4);
        buffer.set_u32(0, 0x04030201);
        assert_eq!(buffer.bytes(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    #[should_panic(expected = "not 4-byte aligned")]
    fn test_unaligned_size_panics() {
        let _ = ViewableBuffer::new(10);
    }
}
