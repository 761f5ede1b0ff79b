//! Tool session state machine.
//!
//! Single-stroke tools go `Idle → SingleStroke → Idle`. Angle and arc go
//! `Idle → TwoStepAwaitingConfirm → TwoStepActive → Idle`, confirming the
//! first segment after the pointer dwells. The grid tool toggles on press and
//! the eraser only reports brush positions; neither enters the drawing flow.

pub mod validate;

use crate::annotation::{Annotation, AnnotationPoint, InkColor, PageId, ToolKind};
use crate::config::EngineConfig;
use crate::document::Page;
use crate::geometry;
use crate::shapes::{self, DrawOp};
use kurbo::Point;
use std::time::{Duration, Instant};
use validate::check_point;

/// Style applied to new annotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub color: InkColor,
    pub size: f64,
    pub opacity: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: InkColor::black(),
            size: 2.0,
            opacity: 1.0,
        }
    }
}

/// Dwell deadline for confirming the first segment of a two-step tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellTimer {
    /// Position the stationary check is measured from.
    pub origin: Point,
    pub deadline: Instant,
}

/// Current state of the tool session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    /// A stroke is being drawn; `draft` holds every accepted point.
    SingleStroke { page: PageId, draft: Annotation },
    /// First segment of an angle/arc; persists across pointer-up.
    TwoStepAwaitingConfirm {
        page: PageId,
        anchor: AnnotationPoint,
        first_end: AnnotationPoint,
        dwell: DwellTimer,
    },
    /// First segment confirmed; tracking the second end.
    TwoStepActive {
        page: PageId,
        anchor: AnnotationPoint,
        first_end: AnnotationPoint,
        second_end: Option<AnnotationPoint>,
    },
}

impl SessionState {
    /// Page the session is drawing on, if any.
    pub fn page(&self) -> Option<&PageId> {
        match self {
            SessionState::Idle => None,
            SessionState::SingleStroke { page, .. }
            | SessionState::TwoStepAwaitingConfirm { page, .. }
            | SessionState::TwoStepActive { page, .. } => Some(page),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// What the engine must do after a session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    None,
    /// The draft on this page changed; its preview needs redrawing.
    Changed(PageId),
    /// A finished annotation to append to history.
    Commit { page: PageId, annotation: Annotation },
    /// Toggle the grid overlay of a page.
    ToggleGrid(PageId),
    /// Eraser brush applied at a point.
    Erase { page: PageId, center: Point },
}

/// Live drawing commands for the session's draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub page: PageId,
    pub ops: Vec<DrawOp>,
}

/// The interactive state of the selected tool.
#[derive(Debug, Clone)]
pub struct ToolSession {
    /// Selected tool; `None` is view mode.
    tool: Option<ToolKind>,
    pub settings: ToolSettings,
    state: SessionState,
    pointer_down: bool,
    dwell: Duration,
    motion_threshold: f64,
    max_point_jump: f64,
}

impl Default for ToolSession {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ToolSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tool: None,
            settings: ToolSettings::default(),
            state: SessionState::Idle,
            pointer_down: false,
            dwell: config.dwell(),
            motion_threshold: config.motion_threshold,
            max_point_jump: config.max_point_jump,
        }
    }

    pub fn tool(&self) -> Option<ToolKind> {
        self.tool
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    /// Select a tool (or view mode), discarding any draft.
    ///
    /// Returns the page whose draft was discarded.
    pub fn set_tool(&mut self, tool: Option<ToolKind>) -> Option<PageId> {
        self.tool = tool;
        self.pointer_down = false;
        self.reset()
    }

    /// Drop the draft and return to idle. Returns the page it was on.
    pub fn reset(&mut self) -> Option<PageId> {
        match std::mem::take(&mut self.state) {
            SessionState::Idle => None,
            SessionState::SingleStroke { page, .. }
            | SessionState::TwoStepAwaitingConfirm { page, .. }
            | SessionState::TwoStepActive { page, .. } => Some(page),
        }
    }

    fn new_annotation(&self, tool: ToolKind, points: Vec<AnnotationPoint>) -> Annotation {
        Annotation::new(tool, self.settings.color, self.settings.size, self.settings.opacity, points)
    }

    /// Pointer pressed on `page`.
    pub fn press(&mut self, page: &Page, point: AnnotationPoint, now: Instant) -> SessionOutput {
        let Some(tool) = self.tool else {
            return SessionOutput::None;
        };
        self.pointer_down = true;

        match tool {
            ToolKind::Grid => return SessionOutput::ToggleGrid(page.id.clone()),
            ToolKind::Eraser => {
                return SessionOutput::Erase {
                    page: page.id.clone(),
                    center: point.pos(),
                };
            }
            _ => {}
        }

        // A session on another page restarts here.
        if self.state.page().is_some_and(|p| *p != page.id) {
            self.state = SessionState::Idle;
        }

        if check_point(page, None, point.pos(), self.max_point_jump).is_err() {
            log::trace!("press outside page {} dropped", page.id);
            return SessionOutput::None;
        }

        if tool.is_single_stroke() {
            self.state = SessionState::SingleStroke {
                page: page.id.clone(),
                draft: self.new_annotation(tool, vec![point]),
            };
            return SessionOutput::Changed(page.id.clone());
        }

        // A press starts a new drag, so only the bounds check above applies.
        let dwell = self.dwell;
        match &mut self.state {
            // Pressing again before confirmation continues the first segment.
            SessionState::TwoStepAwaitingConfirm { first_end, dwell: timer, .. } => {
                *first_end = point;
                *timer = DwellTimer {
                    origin: point.pos(),
                    deadline: now + dwell,
                };
            }
            SessionState::TwoStepActive { second_end, .. } => {
                *second_end = Some(point);
            }
            _ => {
                self.state = SessionState::TwoStepAwaitingConfirm {
                    page: page.id.clone(),
                    anchor: point,
                    first_end: point,
                    dwell: DwellTimer {
                        origin: point.pos(),
                        deadline: now + dwell,
                    },
                };
            }
        }
        SessionOutput::Changed(page.id.clone())
    }

    /// Pointer moved on `page`.
    pub fn move_to(&mut self, page: &Page, point: AnnotationPoint, now: Instant) -> SessionOutput {
        if !self.pointer_down {
            return SessionOutput::None;
        }
        if self.tool == Some(ToolKind::Eraser) {
            return SessionOutput::Erase {
                page: page.id.clone(),
                center: point.pos(),
            };
        }
        if self.state.page() != Some(&page.id) {
            return SessionOutput::None;
        }

        let max_jump = self.max_point_jump;
        let threshold = self.motion_threshold;
        let dwell = self.dwell;
        let mut confirm = false;

        match &mut self.state {
            SessionState::SingleStroke { draft, .. } => {
                let previous = draft.last_pos();
                if let Err(reason) = check_point(page, previous, point.pos(), max_jump) {
                    log::trace!("point dropped: {reason:?}");
                    return SessionOutput::None;
                }
                draft.points.push(point);
            }
            SessionState::TwoStepAwaitingConfirm {
                anchor,
                first_end,
                dwell: timer,
                ..
            } => {
                if let Err(reason) = check_point(page, Some(first_end.pos()), point.pos(), max_jump) {
                    log::trace!("point dropped: {reason:?}");
                    return SessionOutput::None;
                }
                *first_end = point;
                if point.pos().distance(timer.origin) >= threshold {
                    *timer = DwellTimer {
                        origin: point.pos(),
                        deadline: now + dwell,
                    };
                } else {
                    confirm = now >= timer.deadline && anchor.pos().distance(first_end.pos()) >= threshold;
                }
            }
            SessionState::TwoStepActive { first_end, second_end, .. } => {
                // Confirmation happens mid-drag; the last accepted point is the first end.
                let previous = second_end.unwrap_or(*first_end).pos();
                if let Err(reason) = check_point(page, Some(previous), point.pos(), max_jump) {
                    log::trace!("point dropped: {reason:?}");
                    return SessionOutput::None;
                }
                *second_end = Some(point);
            }
            SessionState::Idle => return SessionOutput::None,
        }

        if confirm {
            self.confirm_first_segment();
        }
        SessionOutput::Changed(page.id.clone())
    }

    /// Pointer released (or cancelled).
    pub fn release(&mut self) -> SessionOutput {
        if !std::mem::replace(&mut self.pointer_down, false) {
            return SessionOutput::None;
        }
        match std::mem::take(&mut self.state) {
            SessionState::SingleStroke { page, draft } => {
                let committed = shapes::shape_for(draft.tool).and_then(|s| s.commit_shape(draft.points.clone()));
                match committed {
                    Some(points) => SessionOutput::Commit {
                        page,
                        annotation: draft.with_points(points),
                    },
                    None => {
                        log::trace!("{} draft with {} point(s) discarded", draft.tool, draft.points.len());
                        SessionOutput::Changed(page)
                    }
                }
            }
            SessionState::TwoStepActive {
                page,
                anchor,
                first_end,
                second_end: Some(second_end),
            } => {
                let Some(tool) = self.tool else {
                    return SessionOutput::Changed(page);
                };
                let points = vec![anchor, first_end, second_end];
                match shapes::shape_for(tool).and_then(|s| s.commit_shape(points)) {
                    Some(points) => SessionOutput::Commit {
                        annotation: self.new_annotation(tool, points),
                        page,
                    },
                    None => SessionOutput::Changed(page),
                }
            }
            // Two-step sessions survive pointer-up until they commit.
            other => {
                self.state = other;
                SessionOutput::None
            }
        }
    }

    /// Pointer cancelled; ends the stroke like a release.
    pub fn cancel(&mut self) -> SessionOutput {
        self.release()
    }

    /// Advance the dwell timer without pointer movement.
    pub fn tick(&mut self, now: Instant) -> SessionOutput {
        let SessionState::TwoStepAwaitingConfirm {
            page,
            anchor,
            first_end,
            dwell,
        } = &self.state
        else {
            return SessionOutput::None;
        };
        if now < dwell.deadline || anchor.pos().distance(first_end.pos()) < self.motion_threshold {
            return SessionOutput::None;
        }
        let page = page.clone();
        self.confirm_first_segment();
        SessionOutput::Changed(page)
    }

    fn confirm_first_segment(&mut self) {
        if let SessionState::TwoStepAwaitingConfirm {
            page,
            anchor,
            first_end,
            ..
        } = std::mem::take(&mut self.state)
        {
            log::debug!("first segment confirmed on page {page}");
            self.state = SessionState::TwoStepActive {
                page,
                anchor,
                first_end,
                second_end: None,
            };
        }
    }

    /// Next instant at which `tick` may change state.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            SessionState::TwoStepAwaitingConfirm { dwell, .. } => Some(dwell.deadline),
            _ => None,
        }
    }

    /// Drawing commands for the in-progress draft.
    pub fn preview(&self) -> Option<Preview> {
        let tool = self.tool?;
        let shape = shapes::shape_for(tool)?;
        let (page, ops) = match &self.state {
            SessionState::Idle => return None,
            SessionState::SingleStroke { page, draft } => (page, shape.draw(draft)),
            SessionState::TwoStepAwaitingConfirm {
                page, anchor, first_end, ..
            } => (page, shape.draw(&self.new_annotation(tool, vec![*anchor, *first_end]))),
            SessionState::TwoStepActive {
                page,
                anchor,
                first_end,
                second_end,
            } => {
                let first = self.new_annotation(tool, vec![*anchor, *first_end]);
                let mut ops = shape.draw(&first);
                if let Some(second_end) = second_end {
                    ops.extend(self.second_step_guides(&first, *anchor, *first_end, *second_end));
                }
                (page, ops)
            }
        };
        Some(Preview { page: page.clone(), ops })
    }

    /// Dashed guide and measurement label for the second step.
    fn second_step_guides(
        &self,
        style: &Annotation,
        anchor: AnnotationPoint,
        first_end: AnnotationPoint,
        second_end: AnnotationPoint,
    ) -> Vec<DrawOp> {
        let (a, f, s) = (anchor.pos(), first_end.pos(), second_end.pos());
        match style.tool {
            ToolKind::Arc => {
                let radius = a.distance(f);
                let start = (f - a).atan2();
                let sweep = geometry::signed_sweep(a, f, s);
                vec![
                    DrawOp::guide(style, geometry::arc_path(a, radius, start, sweep)),
                    DrawOp::guide(style, geometry::line_path(a, s)),
                    DrawOp::label(style, s, shapes::sweep_label(a, f, s)),
                ]
            }
            _ => vec![
                DrawOp::guide(style, geometry::line_path(a, s)),
                DrawOp::label(style, s, shapes::angle_label(a, f, s)),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageKind;

    fn page() -> Page {
        Page::new("1", PageKind::Blank, 1000, 1000)
    }

    fn pt(x: f64, y: f64) -> AnnotationPoint {
        AnnotationPoint::new(x, y)
    }

    fn session(tool: ToolKind) -> ToolSession {
        let mut session = ToolSession::default();
        session.set_tool(Some(tool));
        session
    }

    #[test]
    fn test_view_mode_ignores_input() {
        let mut session = ToolSession::default();
        assert_eq!(session.press(&page(), pt(1.0, 1.0), Instant::now()), SessionOutput::None);
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_pen_stroke_commits_all_points() {
        let page = page();
        let now = Instant::now();
        let mut session = session(ToolKind::Pen);
        session.press(&page, pt(10.0, 10.0), now);
        for i in 1..5 {
            session.move_to(&page, pt(10.0 + i as f64 * 5.0, 10.0), now);
        }
        match session.release() {
            SessionOutput::Commit { page, annotation } => {
                assert_eq!(page, "1");
                assert_eq!(annotation.points.len(), 5);
                assert_eq!(annotation.tool, ToolKind::Pen);
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_single_point_discarded() {
        let page = page();
        let mut session = session(ToolKind::Compass);
        session.press(&page, pt(10.0, 10.0), Instant::now());
        assert_eq!(session.release(), SessionOutput::Changed("1".into()));
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_geometric_tool_commits_endpoints() {
        let page = page();
        let now = Instant::now();
        let mut session = session(ToolKind::Disk);
        session.press(&page, pt(100.0, 100.0), now);
        session.move_to(&page, pt(110.0, 100.0), now);
        session.move_to(&page, pt(120.0, 100.0), now);
        let SessionOutput::Commit { annotation, .. } = session.cancel() else {
            panic!("cancel should commit like release");
        };
        assert_eq!(annotation.points, vec![pt(100.0, 100.0), pt(120.0, 100.0)]);
    }

    #[test]
    fn test_jump_dropped() {
        let page = page();
        let now = Instant::now();
        let mut session = session(ToolKind::Pen);
        session.press(&page, pt(10.0, 10.0), now);
        session.move_to(&page, pt(20.0, 10.0), now);
        assert_eq!(session.move_to(&page, pt(520.0, 10.0), now), SessionOutput::None);
        let SessionState::SingleStroke { draft, .. } = session.state() else {
            panic!("expected active stroke");
        };
        assert_eq!(draft.points.last(), Some(&pt(20.0, 10.0)));
    }

    #[test]
    fn test_angle_dwell_and_commit() {
        let page = page();
        let t0 = Instant::now();
        let mut session = session(ToolKind::Angle);
        session.press(&page, pt(0.0, 0.0), t0);
        session.move_to(&page, pt(25.0, 0.0), t0);
        session.move_to(&page, pt(50.0, 0.0), t0);
        // Not yet confirmed; release keeps the first segment alive.
        assert_eq!(session.release(), SessionOutput::None);
        assert!(matches!(session.state(), SessionState::TwoStepAwaitingConfirm { .. }));

        assert_eq!(session.tick(t0 + Duration::from_millis(499)), SessionOutput::None);
        assert_eq!(session.tick(t0 + Duration::from_millis(500)), SessionOutput::Changed("1".into()));
        assert!(matches!(session.state(), SessionState::TwoStepActive { .. }));

        let t1 = t0 + Duration::from_millis(600);
        session.press(&page, pt(0.0, 40.0), t1);
        session.move_to(&page, pt(0.0, 50.0), t1);
        let preview = session.preview().unwrap();
        assert!(preview.ops.iter().any(|op| matches!(op, DrawOp::Stroke { dashed: true, .. })));

        match session.release() {
            SessionOutput::Commit { annotation, .. } => {
                assert_eq!(annotation.points, vec![pt(0.0, 0.0), pt(50.0, 0.0), pt(0.0, 50.0)]);
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_long_first_ray_continues_into_second() {
        let page = page();
        let t0 = Instant::now();
        let mut session = session(ToolKind::Angle);
        session.press(&page, pt(100.0, 100.0), t0);
        for i in 1..=6 {
            session.move_to(&page, pt(100.0 + i as f64 * 50.0, 100.0), t0);
        }
        session.move_to(&page, pt(401.0, 100.0), t0 + Duration::from_millis(600));
        assert!(matches!(session.state(), SessionState::TwoStepActive { .. }));

        let t1 = t0 + Duration::from_millis(650);
        for y in [130.0, 160.0, 190.0, 220.0] {
            assert_eq!(session.move_to(&page, pt(401.0, y), t1), SessionOutput::Changed("1".into()));
        }
        match session.release() {
            SessionOutput::Commit { annotation, .. } => {
                assert_eq!(
                    annotation.points,
                    vec![pt(100.0, 100.0), pt(401.0, 100.0), pt(401.0, 220.0)]
                );
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn test_second_step_press_only_bounds_checked() {
        let page = page();
        let t0 = Instant::now();
        let mut session = session(ToolKind::Arc);
        session.press(&page, pt(0.0, 0.0), t0);
        session.move_to(&page, pt(40.0, 0.0), t0);
        session.release();
        session.tick(t0 + Duration::from_millis(500));
        // Far from both the anchor and the first end: a fresh drag.
        session.press(&page, pt(700.0, 700.0), t0 + Duration::from_millis(600));
        let SessionState::TwoStepActive { second_end, .. } = session.state() else {
            panic!("expected second step");
        };
        assert_eq!(*second_end, Some(pt(700.0, 700.0)));
        assert_eq!(session.press(&page, pt(1200.0, 10.0), t0), SessionOutput::None);
    }

    #[test]
    fn test_motion_resets_dwell() {
        let page = page();
        let t0 = Instant::now();
        let mut session = session(ToolKind::Arc);
        session.press(&page, pt(0.0, 0.0), t0);
        session.move_to(&page, pt(30.0, 0.0), t0 + Duration::from_millis(400));
        // Deadline moved to 900ms
        assert_eq!(session.tick(t0 + Duration::from_millis(600)), SessionOutput::None);
        // Small jitter keeps the timer running and confirms once elapsed
        session.move_to(&page, pt(32.0, 0.0), t0 + Duration::from_millis(950));
        assert!(matches!(session.state(), SessionState::TwoStepActive { .. }));
    }

    #[test]
    fn test_dwell_needs_real_segment() {
        let page = page();
        let t0 = Instant::now();
        let mut session = session(ToolKind::Angle);
        session.press(&page, pt(10.0, 10.0), t0);
        assert_eq!(session.tick(t0 + Duration::from_secs(2)), SessionOutput::None);
        assert!(matches!(session.state(), SessionState::TwoStepAwaitingConfirm { .. }));
    }

    #[test]
    fn test_grid_and_eraser_outputs() {
        let page = page();
        let mut grid = session(ToolKind::Grid);
        assert_eq!(grid.press(&page, pt(5.0, 5.0), Instant::now()), SessionOutput::ToggleGrid("1".into()));
        assert!(grid.state().is_idle());

        let mut eraser = session(ToolKind::Eraser);
        let now = Instant::now();
        assert!(matches!(eraser.press(&page, pt(5.0, 5.0), now), SessionOutput::Erase { .. }));
        assert!(matches!(eraser.move_to(&page, pt(6.0, 5.0), now), SessionOutput::Erase { .. }));
        eraser.release();
        assert_eq!(eraser.move_to(&page, pt(7.0, 5.0), now), SessionOutput::None);
    }

    #[test]
    fn test_set_tool_discards_draft() {
        let page = page();
        let mut session = session(ToolKind::Pen);
        session.press(&page, pt(1.0, 1.0), Instant::now());
        assert_eq!(session.set_tool(Some(ToolKind::Ruler)), Some("1".to_string()));
        assert!(session.state().is_idle());
    }

    #[test]
    fn test_press_on_other_page_restarts() {
        let first = page();
        let second = Page::new("2", PageKind::Blank, 1000, 1000);
        let now = Instant::now();
        let mut session = session(ToolKind::Angle);
        session.press(&first, pt(0.0, 0.0), now);
        session.move_to(&first, pt(40.0, 0.0), now);
        session.release();
        session.press(&second, pt(5.0, 5.0), now);
        assert_eq!(session.state().page().map(String::as_str), Some("2"));
    }
}
