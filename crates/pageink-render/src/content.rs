//! Static page content: source raster, blank paper or a graph sheet.

use crate::raster::{paint, to_skia_path};
use crate::renderer::{RendererError, RenderResult};
use image::RgbaImage;
use kurbo::{BezPath, Point};
use pageink_core::{InkColor, Page, PageKind};
use tiny_skia::{Color, ColorU8, FilterQuality, Pixmap, PixmapPaint, Stroke, Transform};

/// Supplies rasterized pages of the underlying source document.
pub trait PageContentSource: Send + Sync {
    /// Raster of source page `index` (0-based). Images of a different size
    /// are scaled to the page.
    fn render_page(&self, index: usize, width: u32, height: u32) -> RenderResult<RgbaImage>;
}

/// Source pages already decoded into memory.
#[derive(Debug, Default, Clone)]
pub struct PageImages {
    pages: Vec<RgbaImage>,
}

impl PageImages {
    pub fn new(pages: Vec<RgbaImage>) -> Self {
        Self { pages }
    }

    /// Decode one encoded image (PNG) per page.
    pub fn from_encoded(pages: &[Vec<u8>]) -> RenderResult<Self> {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                image::load_from_memory(bytes)
                    .map(|decoded| decoded.to_rgba8())
                    .map_err(|e| RendererError::ContentUnavailable(format!("page {index}: {e}")))
            })
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Self { pages })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageContentSource for PageImages {
    fn render_page(&self, index: usize, _width: u32, _height: u32) -> RenderResult<RgbaImage> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| RendererError::ContentUnavailable(format!("no source page {index}")))
    }
}

const GRAPH_LINE: InkColor = InkColor::new(200, 210, 225);
const GRAPH_AXIS: InkColor = InkColor::new(60, 60, 60);
/// Upper bound on graph lines per direction.
const MAX_GRAPH_LINES: f64 = 50.0;

/// Render the static content layer of a page.
///
/// Source pages need a `source`; without one, or when it fails, the page's
/// content is unavailable.
pub fn render_content(page: &Page, source: Option<&dyn PageContentSource>) -> RenderResult<Pixmap> {
    let mut pixmap = Pixmap::new(page.width, page.height)
        .ok_or_else(|| RendererError::Surface(format!("invalid page size {}x{}", page.width, page.height)))?;
    pixmap.fill(Color::WHITE);
    match page.kind {
        PageKind::Blank => {}
        PageKind::Graph {
            x_min,
            x_max,
            y_min,
            y_max,
        } => draw_graph(&mut pixmap, x_min, x_max, y_min, y_max),
        PageKind::Source { index } => {
            let source = source
                .ok_or_else(|| RendererError::ContentUnavailable(format!("no source for page {}", page.id)))?;
            let image = source.render_page(index, page.width, page.height)?;
            let raster = image_to_pixmap(&image)?;
            let sx = page.width as f32 / raster.width() as f32;
            let sy = page.height as f32 / raster.height() as f32;
            let quality = if raster.width() == page.width && raster.height() == page.height {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            };
            let paint = PixmapPaint {
                quality,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(0, 0, raster.as_ref(), &paint, Transform::from_scale(sx, sy), None);
        }
    }
    log::debug!("rendered content for page {}", page.id);
    Ok(pixmap)
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
pub(crate) fn image_to_pixmap(image: &RgbaImage) -> RenderResult<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RendererError::Surface(format!("invalid image size {width}x{height}")))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Spacing between graph lines, in graph units: 1, 2 or 5 times a power of ten.
fn graph_step(span: f64) -> f64 {
    let raw = span / MAX_GRAPH_LINES;
    if raw <= 1.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

fn draw_graph(pixmap: &mut Pixmap, x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let (w, h) = (pixmap.width() as f64, pixmap.height() as f64);
    if !(x_max > x_min && y_max > y_min) {
        log::warn!("degenerate graph bounds x {x_min}..{x_max}, y {y_min}..{y_max}");
        return;
    }
    let to_px = |x: f64| (x - x_min) / (x_max - x_min) * w;
    let to_py = |y: f64| (y_max - y) / (y_max - y_min) * h;

    let mut grid = BezPath::new();
    let step = graph_step(x_max - x_min);
    let mut x = (x_min / step).ceil() * step;
    while x <= x_max {
        grid.move_to(Point::new(to_px(x), 0.0));
        grid.line_to(Point::new(to_px(x), h));
        x += step;
    }
    let step = graph_step(y_max - y_min);
    let mut y = (y_min / step).ceil() * step;
    while y <= y_max {
        grid.move_to(Point::new(0.0, to_py(y)));
        grid.line_to(Point::new(w, to_py(y)));
        y += step;
    }
    stroke(pixmap, &grid, GRAPH_LINE, 1.0);

    let mut axes = BezPath::new();
    if (x_min..=x_max).contains(&0.0) {
        axes.move_to(Point::new(to_px(0.0), 0.0));
        axes.line_to(Point::new(to_px(0.0), h));
    }
    if (y_min..=y_max).contains(&0.0) {
        axes.move_to(Point::new(0.0, to_py(0.0)));
        axes.line_to(Point::new(w, to_py(0.0)));
    }
    stroke(pixmap, &axes, GRAPH_AXIS, 2.0);
}

fn stroke(pixmap: &mut Pixmap, path: &BezPath, color: InkColor, width: f32) {
    if let Some(path) = to_skia_path(path) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(color, 1.0), &stroke, Transform::identity(), None);
    }
}
