//! Flatten annotated pages into PNG images for download.
//!
//! Export renders committed annotations (grid overlays included, drafts not)
//! on fresh layers; the engine and any on-screen surfaces are left untouched.

use crate::content::{PageContentSource, render_content};
use crate::raster::RasterRenderer;
use crate::renderer::{RenderContext, Renderer, RendererError};
use pageink_core::{AnnotationEngine, DrawOp, Page, PageId, shapes};
use thiserror::Error;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Export errors. Any failure aborts the export only.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to render page {page_id}: {source}")]
    Render {
        page_id: PageId,
        #[source]
        source: RendererError,
    },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Unknown page: {0}")]
    UnknownPage(PageId),
}

/// One flattened page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedPage {
    pub page_id: PageId,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded RGBA image.
    pub png: Vec<u8>,
}

/// Committed drawing commands of a page: grid first, then annotations in order.
fn committed_ops(engine: &AnnotationEngine, page_id: &str) -> Vec<DrawOp> {
    let mut ops = Vec::new();
    if let Some(grid) = engine.grid(page_id) {
        ops.extend(shapes::draw(grid));
    }
    for annotation in engine.annotations(page_id) {
        ops.extend(shapes::draw(annotation));
    }
    ops
}

/// Flatten one page: its annotation layer composited onto its content.
pub fn flatten_page(
    engine: &AnnotationEngine,
    page: &Page,
    source: Option<&dyn PageContentSource>,
) -> Result<FlattenedPage, ExportError> {
    let render_err = |e: RendererError| ExportError::Render {
        page_id: page.id.clone(),
        source: e,
    };
    let mut flat = render_content(page, source).map_err(render_err)?;
    let mut layer = Pixmap::new(page.width, page.height)
        .ok_or_else(|| render_err(RendererError::Surface(format!("invalid page size {}x{}", page.width, page.height))))?;
    let ops = committed_ops(engine, &page.id);
    RasterRenderer::new()
        .render(&mut layer, &RenderContext::new(&ops))
        .map_err(render_err)?;
    flat.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);

    let png = encode_png(&flat)?;
    log::debug!("flattened page {} ({} bytes)", page.id, png.len());
    Ok(FlattenedPage {
        page_id: page.id.clone(),
        width: page.width,
        height: page.height,
        png,
    })
}

/// Flatten the listed pages, or every page of the document when `pages` is empty.
pub fn export_document(
    engine: &AnnotationEngine,
    source: Option<&dyn PageContentSource>,
    pages: &[&str],
) -> Result<Vec<FlattenedPage>, ExportError> {
    let document = engine.document();
    let selected: Vec<&Page> = if pages.is_empty() {
        document.pages.iter().collect()
    } else {
        pages
            .iter()
            .map(|id| document.page(id).ok_or_else(|| ExportError::UnknownPage(id.to_string())))
            .collect::<Result<_, _>>()?
    };
    let flattened = selected
        .into_iter()
        .map(|page| flatten_page(engine, page, source))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("exported {} page(s) of {}", flattened.len(), document.id);
    Ok(flattened)
}

/// Encode a pixmap as straight-alpha RGBA PNG.
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(format!("Failed to write PNG header: {e}")))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| ExportError::Encode(format!("Failed to write PNG data: {e}")))?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PageImages;
    use image::RgbaImage;
    use pageink_core::{Annotation, AnnotationPoint, Document, EngineConfig, InkColor, PageKind, ToolKind};

    fn decode(png_bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(png_bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    fn rgba_at(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    fn disk() -> Annotation {
        Annotation::new(
            ToolKind::Disk,
            InkColor::new(255, 0, 0),
            2.0,
            1.0,
            vec![AnnotationPoint::new(50.0, 50.0), AnnotationPoint::new(70.0, 50.0)],
        )
    }

    fn engine() -> AnnotationEngine {
        let mut document = Document::new("worksheet");
        document.push_page(Page::new("1", PageKind::Blank, 100, 100));
        AnnotationEngine::new(document, EngineConfig::default())
    }

    #[test]
    fn test_flatten_composites_annotations() {
        let mut engine = engine();
        engine.commit("1", disk());
        let pages = export_document(&engine, None, &[]).unwrap();
        assert_eq!(pages.len(), 1);
        let (w, h, data) = decode(&pages[0].png);
        assert_eq!((w, h), (100, 100));
        assert_eq!(rgba_at(&data, w, 50, 50), [255, 0, 0, 255]);
        assert_eq!(rgba_at(&data, w, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_export_leaves_engine_untouched() {
        let mut engine = engine();
        engine.commit("1", disk());
        let live = engine.live().clone();
        let (revision, dirty, index) = (engine.revision(), engine.is_dirty(), engine.history_index());
        export_document(&engine, None, &["1"]).unwrap();
        assert_eq!(engine.live(), &live);
        assert_eq!((engine.revision(), engine.is_dirty(), engine.history_index()), (revision, dirty, index));
    }

    #[test]
    fn test_export_over_source_content() {
        let document = Document::from_source_pages("scan", &[(20, 20)]);
        let engine = AnnotationEngine::new(document, EngineConfig::default());
        let source = PageImages::new(vec![RgbaImage::from_pixel(20, 20, image::Rgba([10, 20, 30, 255]))]);
        let pages = export_document(&engine, Some(&source), &[]).unwrap();
        let (w, _, data) = decode(&pages[0].png);
        assert_eq!(rgba_at(&data, w, 10, 10), [10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_content_fails_export_only() {
        let document = Document::from_source_pages("scan", &[(20, 20)]);
        let mut engine = AnnotationEngine::new(document, EngineConfig::default());
        engine.commit("1", disk());
        let result = export_document(&engine, None, &[]);
        assert!(matches!(result, Err(ExportError::Render { ref page_id, .. }) if page_id == "1"));
        assert_eq!(engine.annotations("1").len(), 1);
        assert!(engine.is_dirty());
    }

    #[test]
    fn test_unknown_page() {
        let engine = engine();
        assert!(matches!(
            export_document(&engine, None, &["9"]),
            Err(ExportError::UnknownPage(_))
        ));
    }
}
