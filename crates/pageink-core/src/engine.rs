//! The annotation engine: one value owning document, live state, history,
//! tool session and dirty tracking.

use crate::annotation::{Annotation, AnnotationPoint, AnnotationSet, PageId, ToolKind};
use crate::config::EngineConfig;
use crate::document::{Document, PageKind};
use crate::eraser::Eraser;
use crate::history::History;
use crate::input::{DeviceClass, PointerEvent, PointerPhase, Routing, route};
use crate::shapes::{self, DrawOp};
use crate::tools::{Preview, SessionOutput, ToolSession, ToolSettings};
use kurbo::Point;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Instant;

/// Single-writer annotation state for one open document.
#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    config: EngineConfig,
    document: Document,
    /// Live annotations per page (grid overlays excluded).
    live: AnnotationSet,
    /// Grid overlays, tracked outside history.
    grids: BTreeMap<PageId, Annotation>,
    history: History,
    session: ToolSession,
    eraser: Eraser,
    dirty: bool,
    /// Bumped on every dirtying mutation.
    revision: u64,
    layers_interactive: bool,
    redraw: BTreeSet<PageId>,
    queue: VecDeque<PointerEvent>,
}

impl AnnotationEngine {
    pub fn new(document: Document, config: EngineConfig) -> Self {
        Self {
            session: ToolSession::new(&config),
            eraser: Eraser::new(&config),
            config,
            document,
            live: AnnotationSet::new(),
            grids: BTreeMap::new(),
            history: History::new(),
            dirty: false,
            revision: 0,
            layers_interactive: false,
            redraw: BTreeSet::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn session(&self) -> &ToolSession {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// History cursor; −1 when nothing is applied.
    pub fn history_index(&self) -> isize {
        self.history.index()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether annotation layers accept pointer input (set on first stylus contact).
    pub fn layers_interactive(&self) -> bool {
        self.layers_interactive
    }

    // --- Tools ---

    pub fn tool(&self) -> Option<ToolKind> {
        self.session.tool()
    }

    /// Select a tool, or `None` for view mode. Any draft is discarded.
    pub fn set_tool(&mut self, tool: Option<ToolKind>) {
        if let Some(page) = self.session.set_tool(tool) {
            self.redraw.insert(page);
        }
    }

    pub fn settings(&self) -> ToolSettings {
        self.session.settings
    }

    pub fn set_settings(&mut self, settings: ToolSettings) {
        self.session.settings = settings;
    }

    /// On-screen eraser cursor radius for the current size.
    pub fn eraser_cursor_radius(&self) -> f64 {
        self.eraser.cursor_radius(self.session.settings.size)
    }

    // --- Input ---

    /// Route and handle one pointer event.
    pub fn handle_event(&mut self, event: &PointerEvent) -> Routing {
        let routing = route(event.device, &self.session);
        if routing == Routing::FallThrough {
            return routing;
        }
        if event.device == DeviceClass::Stylus && event.phase == PointerPhase::Down && !self.layers_interactive {
            log::debug!("first stylus contact, annotation layers interactive");
            self.layers_interactive = true;
        }

        let point = AnnotationPoint::with_pressure(event.position.x, event.position.y, event.pressure);
        let output = match event.phase {
            PointerPhase::Down | PointerPhase::Move => {
                let Some(page) = self.document.page(&event.page) else {
                    log::trace!("event for unknown page {}", event.page);
                    return routing;
                };
                if event.phase == PointerPhase::Down {
                    self.session.press(page, point, event.timestamp)
                } else {
                    self.session.move_to(page, point, event.timestamp)
                }
            }
            PointerPhase::Up => self.session.release(),
            PointerPhase::Cancel => self.session.cancel(),
        };
        self.apply(output);
        routing
    }

    /// Queue an event for [`process_events`](Self::process_events).
    pub fn enqueue(&mut self, event: PointerEvent) {
        self.queue.push_back(event);
    }

    /// Drain the event queue in order. Returns the routing of each event.
    pub fn process_events(&mut self) -> Vec<Routing> {
        let mut routings = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop_front() {
            routings.push(self.handle_event(&event));
        }
        routings
    }

    /// Drive time-based transitions (dwell confirmation).
    pub fn tick(&mut self, now: Instant) {
        let output = self.session.tick(now);
        self.apply(output);
    }

    fn apply(&mut self, output: SessionOutput) {
        match output {
            SessionOutput::None => {}
            SessionOutput::Changed(page) => {
                self.redraw.insert(page);
            }
            SessionOutput::Commit { page, annotation } => self.commit(&page, annotation),
            SessionOutput::ToggleGrid(page) => self.toggle_grid(&page),
            SessionOutput::Erase { page, center } => {
                self.erase_at(&page, center);
            }
        }
    }

    // --- Mutations ---

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    /// Append a finished annotation to history and live state.
    pub fn commit(&mut self, page: &str, annotation: Annotation) {
        log::debug!("commit {} ({} points) on page {page}", annotation.tool, annotation.points.len());
        self.history.append(page, annotation.clone());
        self.live.entry(page.to_string()).or_default().push(annotation);
        self.mark_dirty();
        self.redraw.insert(page.to_string());
    }

    /// Regenerate live state from the applied history prefix.
    fn rebuild(&mut self) {
        let previous: BTreeSet<PageId> = self.live.keys().cloned().collect();
        self.live = self.history.replay();
        log::debug!("rebuilt {} page(s) from {} applied entries", self.live.len(), self.history.index() + 1);
        self.redraw.extend(previous);
        self.redraw.extend(self.live.keys().cloned());
    }

    /// Undo the last applied addition. Returns false when nothing is applied.
    pub fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.rebuild();
        self.mark_dirty();
        true
    }

    /// Re-apply the next addition. Returns false at the end of the log.
    pub fn redo(&mut self) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.rebuild();
        self.mark_dirty();
        true
    }

    /// Remove every annotation of a page and its log entries.
    ///
    /// Not undoable; the grid overlay of the page is kept.
    pub fn clear_page(&mut self, page: &str) {
        let removed = self.history.clear_page(page);
        self.live.remove(page);
        self.rebuild();
        self.mark_dirty();
        self.redraw.insert(page.to_string());
        log::debug!("cleared page {page} ({removed} log entries)");
    }

    /// Apply the eraser brush at `center` with the current tool size.
    ///
    /// Erasures are not recorded in history, so undo cannot restore them.
    /// Returns whether anything was erased.
    pub fn erase_at(&mut self, page: &str, center: Point) -> bool {
        let size = self.session.settings.size;
        let Some(annotations) = self.live.get_mut(page) else {
            return false;
        };
        if !self.eraser.erase_page(annotations, center, size) {
            return false;
        }
        if annotations.is_empty() {
            self.live.remove(page);
        }
        self.mark_dirty();
        self.redraw.insert(page.to_string());
        true
    }

    /// Add the page's grid overlay if absent, remove it if present.
    pub fn toggle_grid(&mut self, page: &str) {
        if self.grids.remove(page).is_none() {
            let Some((width, height)) = self.document.page(page).map(|p| (p.width, p.height)) else {
                return;
            };
            let settings = self.session.settings;
            self.grids
                .insert(page.to_string(), Annotation::grid(settings.color, 1.0, width, height));
        }
        self.redraw.insert(page.to_string());
    }

    // --- Pages ---

    /// Insert a blank or graph page after `after` (front when `None`).
    pub fn insert_page(&mut self, after: Option<&str>, kind: PageKind, width: u32, height: u32) -> Option<PageId> {
        let id = self.document.insert_page_after(after, kind, width, height)?;
        self.redraw.insert(id.clone());
        Some(id)
    }

    /// Delete a page together with its annotations, grid and log entries.
    pub fn remove_page(&mut self, page: &str) -> bool {
        if self.document.remove_page(page).is_none() {
            return false;
        }
        if self.session.state().page().is_some_and(|p| p == page) {
            self.session.reset();
        }
        self.grids.remove(page);
        self.redraw.remove(page);
        let had_annotations = self.live.remove(page).is_some();
        if self.history.clear_page(page) > 0 || had_annotations {
            self.rebuild();
            self.mark_dirty();
        }
        true
    }

    // --- Queries ---

    /// Live annotations of a page in drawing order.
    pub fn annotations(&self, page: &str) -> &[Annotation] {
        self.live.get(page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn live(&self) -> &AnnotationSet {
        &self.live
    }

    pub fn grid(&self, page: &str) -> Option<&Annotation> {
        self.grids.get(page)
    }

    pub fn preview(&self) -> Option<Preview> {
        self.session.preview()
    }

    /// Everything the annotation layer of a page shows: grid, committed
    /// annotations, then the live draft.
    pub fn draw_ops(&self, page: &str) -> Vec<DrawOp> {
        let mut ops = Vec::new();
        if let Some(grid) = self.grids.get(page) {
            ops.extend(shapes::draw(grid));
        }
        for annotation in self.annotations(page) {
            ops.extend(shapes::draw(annotation));
        }
        if let Some(preview) = self.preview().filter(|p| p.page == page) {
            ops.extend(preview.ops);
        }
        ops
    }

    /// Pages whose annotation layer must be redrawn since the last call.
    pub fn take_redraw_requests(&mut self) -> Vec<PageId> {
        std::mem::take(&mut self.redraw).into_iter().collect()
    }

    pub fn request_redraw(&mut self, page: &str) {
        self.redraw.insert(page.to_string());
    }

    // --- Persistence hooks ---

    /// Replace live state with loaded annotations.
    ///
    /// Grid annotations become overlays; everything else is replayed into a
    /// fresh log with the cursor at the end. Clears the dirty flag.
    pub fn load_annotations(&mut self, mut set: AnnotationSet) {
        self.session.reset();
        self.grids.clear();
        for (page, annotations) in set.iter_mut() {
            if let Some(pos) = annotations.iter().rposition(Annotation::is_grid) {
                self.grids.insert(page.clone(), annotations[pos].clone());
            }
            annotations.retain(|a| !a.is_grid());
        }
        set.retain(|_, annotations| !annotations.is_empty());
        self.history.rebuild_from(&set);
        self.live = set;
        self.dirty = false;
        self.redraw.extend(self.document.page_ids().cloned());
        log::info!(
            "loaded {} annotation(s) on {} page(s)",
            self.history.len(),
            self.live.len()
        );
    }

    /// Snapshot of everything to persist, with the revision it reflects.
    pub fn save_snapshot(&self) -> (u64, AnnotationSet) {
        (self.revision, self.live.clone())
    }

    /// Acknowledge a successful save of `revision`.
    ///
    /// The dirty flag is cleared only if nothing changed since the snapshot.
    pub fn mark_saved(&mut self, revision: u64) {
        if revision == self.revision {
            self.dirty = false;
        } else {
            log::debug!("saved revision {revision}, engine at {}; staying dirty", self.revision);
        }
    }
}
