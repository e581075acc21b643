//! Test utilities for the quadrille engine.
//!
//! The main component is [`MockGpuContext`] (behind the `mock` feature): an
//! implementation of `GpuContext` that records every operation instead of
//! touching a GPU, so batching behavior can be asserted on exactly.

#[cfg(feature = "mock")]
pub mod mock_gpu;

#[cfg(feature = "mock")]
pub use mock_gpu::*;
