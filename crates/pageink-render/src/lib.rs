//! PageInk Render Library
//!
//! Per-page drawing surfaces (a static content layer and a redrawable
//! annotation layer), a CPU rasterizer built on tiny-skia, and flatten/export
//! of annotated pages to PNG.

mod content;
pub mod export;
mod raster;
mod renderer;
mod surface;
mod text;

pub use content::{PageContentSource, PageImages, render_content};
pub use export::{ExportError, FlattenedPage, export_document, flatten_page};
pub use raster::RasterRenderer;
pub use renderer::{RenderContext, Renderer, RendererError, RenderResult};
pub use surface::{PageSurface, SurfaceSet};
