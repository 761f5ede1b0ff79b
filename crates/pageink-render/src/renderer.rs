//! Renderer trait abstraction.

use pageink_core::DrawOp;
use thiserror::Error;
use tiny_skia::Pixmap;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Page content unavailable: {0}")]
    ContentUnavailable(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for drawing one annotation layer.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Drawing commands in page raster units, bottom to top.
    pub ops: &'a [DrawOp],
    /// Pixels per page raster unit.
    pub scale_factor: f64,
}

impl<'a> RenderContext<'a> {
    /// Create a render context at 1:1 scale.
    pub fn new(ops: &'a [DrawOp]) -> Self {
        Self { ops, scale_factor: 1.0 }
    }

    /// Set the scale factor for HiDPI surfaces.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }
}

/// Trait for rendering backends.
///
/// A renderer draws on top of whatever the target already holds; clearing
/// the layer is the surface's job.
pub trait Renderer: Send + Sync {
    /// Draw every operation of the context onto `target`.
    fn render(&mut self, target: &mut Pixmap, ctx: &RenderContext) -> RenderResult<()>;
}
