//! Pages of an annotated document.

use crate::annotation::PageId;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a page displays underneath its annotation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageKind {
    /// A page rasterized from the source document.
    Source { index: usize },
    /// An inserted white page.
    Blank,
    /// An inserted graph page with numeric axis bounds.
    Graph {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },
}

/// One page of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub kind: PageKind,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl Page {
    pub fn new(id: impl Into<PageId>, kind: PageKind, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size())
    }

    /// Whether a point lies inside the page raster.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width as f64 && point.y <= self.height as f64
    }
}

/// An ordered collection of pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier used by the persistence endpoints.
    pub id: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pages: Vec::new(),
        }
    }

    /// Build a document from rasterized source pages, ids `"1"`, `"2"`, ...
    pub fn from_source_pages(id: impl Into<String>, sizes: &[(u32, u32)]) -> Self {
        let pages = sizes
            .iter()
            .enumerate()
            .map(|(index, &(w, h))| Page::new((index + 1).to_string(), PageKind::Source { index }, w, h))
            .collect();
        Self { id: id.into(), pages }
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_ids(&self) -> impl Iterator<Item = &PageId> {
        self.pages.iter().map(|p| &p.id)
    }

    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Insert a blank or graph page after `after` (or at the front when `None`).
    ///
    /// The new id is a composite of the preceding page id and a random suffix,
    /// so it never collides with ids already stored on the server.
    /// Returns the new page id, or `None` if `after` is unknown.
    pub fn insert_page_after(&mut self, after: Option<&str>, kind: PageKind, width: u32, height: u32) -> Option<PageId> {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        let (position, id) = match after {
            Some(after) => {
                let pos = self.pages.iter().position(|p| p.id == after)?;
                (pos + 1, format!("{after}~{suffix}"))
            }
            None => (0, format!("0~{suffix}")),
        };
        self.pages.insert(position, Page::new(id.clone(), kind, width, height));
        Some(id)
    }

    /// Remove a page. Returns the removed page.
    pub fn remove_page(&mut self, id: &str) -> Option<Page> {
        let pos = self.pages.iter().position(|p| p.id == id)?;
        Some(self.pages.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
