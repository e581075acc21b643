//! Blend mode presets for batched draw calls.
//!
//! A blend mode change is a draw-call boundary: two buffered primitives can
//! only share a call when their modes match.

/// Blend modes a batched draw call can use.
///
/// All formulas assume premultiplied-alpha source colors, which is what the
/// default packing path produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// No blending, source replaces destination.
    None,
    /// Standard compositing: `src.rgb + dst.rgb * (1 - src.a)`.
    #[default]
    Normal,
    /// Additive: `src.rgb + dst.rgb`. Glow, particles, light.
    Add,
    /// Multiplicative: `src.rgb * dst.rgb`. Shadows, tinting.
    Multiply,
    /// Screen: `src.rgb + dst.rgb * (1 - src.rgb)`.
    Screen,
}

impl BlendMode {
    /// Convert to a wgpu blend state, `None` when blending is disabled.
    pub fn to_blend_state(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::None => None,
            BlendMode::Normal => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            BlendMode::Add => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::DstAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            BlendMode::Screen => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrc,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        }
    }

    /// Create a color target state with this blend mode.
    pub fn to_color_target_state(self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.to_blend_state(),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}

impl From<BlendMode> for Option<wgpu::BlendState> {
    fn from(mode: BlendMode) -> Self {
        mode.to_blend_state()
    }
}
