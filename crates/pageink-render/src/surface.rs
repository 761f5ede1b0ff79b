//! Per-page drawing surfaces.
//!
//! Each page owns two layers: the static content, rendered once, and the
//! annotation layer, cleared and redrawn in full from the engine's draw list
//! whenever the page is invalidated.

use crate::content::{PageContentSource, render_content};
use crate::raster::RasterRenderer;
use crate::renderer::{RenderContext, Renderer, RendererError, RenderResult};
use pageink_core::{AnnotationEngine, DrawOp, Page, PageId};
use std::collections::BTreeMap;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

/// The two layers of one page.
pub struct PageSurface {
    page_id: PageId,
    content: Pixmap,
    annotations: Pixmap,
    interactive: bool,
}

impl PageSurface {
    /// Create a surface over already-rendered content.
    pub fn new(page: &Page, content: Pixmap) -> RenderResult<Self> {
        if (content.width(), content.height()) != (page.width, page.height) {
            return Err(RendererError::Surface(format!(
                "content is {}x{}, page {} is {}x{}",
                content.width(),
                content.height(),
                page.id,
                page.width,
                page.height
            )));
        }
        let annotations = Pixmap::new(page.width, page.height)
            .ok_or_else(|| RendererError::Surface(format!("invalid page size {}x{}", page.width, page.height)))?;
        Ok(Self {
            page_id: page.id.clone(),
            content,
            annotations,
            interactive: false,
        })
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn content(&self) -> &Pixmap {
        &self.content
    }

    pub fn annotations(&self) -> &Pixmap {
        &self.annotations
    }

    /// Whether the annotation layer receives pointer input (otherwise it is inert).
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Clear the annotation layer and draw `ops` onto it.
    pub fn redraw(&mut self, renderer: &mut dyn Renderer, ops: &[DrawOp]) -> RenderResult<()> {
        self.annotations.fill(Color::TRANSPARENT);
        renderer.render(&mut self.annotations, &RenderContext::new(ops))
    }

    /// Annotation layer composited over the content.
    pub fn composite(&self) -> Pixmap {
        let mut out = self.content.clone();
        out.draw_pixmap(
            0,
            0,
            self.annotations.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        out
    }
}

/// Surfaces of every page shown so far, kept in step with an engine.
pub struct SurfaceSet<R: Renderer = RasterRenderer> {
    renderer: R,
    source: Option<Box<dyn PageContentSource>>,
    surfaces: BTreeMap<PageId, PageSurface>,
}

impl SurfaceSet<RasterRenderer> {
    /// Surfaces drawn with the CPU rasterizer.
    pub fn new() -> Self {
        Self::with_renderer(RasterRenderer::new())
    }
}

impl Default for SurfaceSet<RasterRenderer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Renderer> SurfaceSet<R> {
    pub fn with_renderer(renderer: R) -> Self {
        Self {
            renderer,
            source: None,
            surfaces: BTreeMap::new(),
        }
    }

    /// Set the rasterizer of source pages.
    pub fn with_source(mut self, source: Box<dyn PageContentSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn surface(&self, page_id: &str) -> Option<&PageSurface> {
        self.surfaces.get(page_id)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Redraw one page's annotation layer from the engine, creating its
    /// surface (and rendering its content) on first use.
    pub fn redraw_page(&mut self, engine: &AnnotationEngine, page_id: &str) -> RenderResult<()> {
        let page = engine
            .document()
            .page(page_id)
            .ok_or_else(|| RendererError::Surface(format!("unknown page {page_id}")))?;
        if !self.surfaces.contains_key(page_id) {
            let content = render_content(page, self.source.as_deref())?;
            let mut surface = PageSurface::new(page, content)?;
            surface.set_interactive(engine.layers_interactive());
            self.surfaces.insert(page.id.clone(), surface);
        }
        let surface = self
            .surfaces
            .get_mut(page_id)
            .ok_or_else(|| RendererError::Surface(format!("no surface for page {page_id}")))?;
        surface.redraw(&mut self.renderer, &engine.draw_ops(page_id))
    }

    /// Apply the engine's pending redraw requests. Returns the number of
    /// pages redrawn.
    ///
    /// Surfaces of removed pages are dropped. A page whose content cannot be
    /// rendered is skipped with a warning; the others still redraw.
    pub fn sync(&mut self, engine: &mut AnnotationEngine) -> usize {
        let document = engine.document();
        self.surfaces.retain(|id, _| document.page(id).is_some());

        let interactive = engine.layers_interactive();
        for surface in self.surfaces.values_mut() {
            surface.set_interactive(interactive);
        }

        let mut redrawn = 0;
        for page_id in engine.take_redraw_requests() {
            if engine.document().page(&page_id).is_none() {
                continue;
            }
            match self.redraw_page(engine, &page_id) {
                Ok(()) => redrawn += 1,
                Err(e) => log::warn!("failed to redraw page {page_id}: {e}"),
            }
        }
        redrawn
    }
}
