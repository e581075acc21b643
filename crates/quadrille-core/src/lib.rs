//! Quadrille Core
//!
//! This crate contains the shared utilities for the Quadrille renderer.

pub mod logging;
pub mod profiling;
