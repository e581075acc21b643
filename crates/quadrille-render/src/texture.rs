//! Texture resource handles as seen by the batching engine.
//!
//! Loading and GPU upload happen elsewhere; the batcher only needs a stable
//! identity, the alpha-mode flag propagated from the asset pipeline, and a
//! validity bit flipped once the resource is usable. Batching metadata
//! (generation tag, unit slot) deliberately does NOT live here — it is kept
//! in a side table owned by [`TextureUnitAssigner`](crate::TextureUnitAssigner)
//! so renderer-internal state never pollutes the texture's public type.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// How a texture's pixel data encodes alpha.
///
/// Must match the convention of the texture upload path: the packed vertex
/// color is premultiplied iff the texture itself stores premultiplied data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaMode {
    /// RGB channels are independent of alpha.
    Straight,
    /// RGB channels are pre-scaled by alpha; tint must be premultiplied to match.
    #[default]
    Premultiplied,
}

impl AlphaMode {
    /// Whether vertex tint colors must be premultiplied by alpha for this mode.
    pub fn premultiplies_tint(self) -> bool {
        matches!(self, AlphaMode::Premultiplied)
    }
}

/// A texture resource with a process-unique identity.
pub struct TextureSource {
    uid: u64,
    alpha_mode: AlphaMode,
    /// False until the (external) loader has uploaded pixel data.
    valid: AtomicBool,
}

impl TextureSource {
    fn new(alpha_mode: AlphaMode, valid: bool) -> Self {
        Self {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            alpha_mode,
            valid: AtomicBool::new(valid),
        }
    }

    /// Stable identity, unique for the lifetime of the process.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Whether the texture is usable in a draw call.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Relaxed)
    }

    /// Flip the validity bit. Called by the loader when pixel data lands.
    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::Relaxed);
    }
}

/// A shared, cheaply clonable reference to a [`TextureSource`].
///
/// Handles compare equal when they reference the same source.
#[derive(Clone)]
pub struct TextureHandle(Arc<TextureSource>);

impl TextureHandle {
    /// A handle to an already-loaded texture.
    pub fn loaded(alpha_mode: AlphaMode) -> Self {
        Self(Arc::new(TextureSource::new(alpha_mode, true)))
    }

    /// A handle to a texture whose pixel data has not arrived yet.
    pub fn pending(alpha_mode: AlphaMode) -> Self {
        Self(Arc::new(TextureSource::new(alpha_mode, false)))
    }

    pub fn source(&self) -> &TextureSource {
        &self.0
    }
}

impl std::ops::Deref for TextureHandle {
    type Target = TextureSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.uid == other.0.uid
    }
}

impl Eq for TextureHandle {}

impl std::hash::Hash for TextureHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.uid.hash(state);
    }
}

impl std::fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureHandle")
            .field("uid", &self.0.uid)
            .field("alpha_mode", &self.0.alpha_mode)
            .field("valid", &self.0.is_valid())
            .finish()
    }
}
