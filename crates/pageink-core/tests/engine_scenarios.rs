//! End-to-end engine scenarios driven through pointer events.

use kurbo::Point;
use pageink_core::storage::MemoryStorage;
use pageink_core::{
    AnnotationEngine, DeviceClass, Document, EngineConfig, PersistenceController, PointerEvent, PointerPhase,
    Routing, SessionState, ToolKind, ToolSettings,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn engine() -> AnnotationEngine {
    let document = Document::from_source_pages("worksheet-12", &[(1200, 1600), (1200, 1600)]);
    AnnotationEngine::new(document, EngineConfig::default())
}

fn event(phase: PointerPhase, x: f64, y: f64, at: Instant) -> PointerEvent {
    PointerEvent::new(DeviceClass::Stylus, phase, "1", Point::new(x, y)).at(at)
}

fn stroke(engine: &mut AnnotationEngine, points: &[(f64, f64)]) {
    let now = Instant::now();
    let (first, rest) = points.split_first().expect("stroke needs points");
    engine.enqueue(event(PointerPhase::Down, first.0, first.1, now));
    for &(x, y) in rest {
        engine.enqueue(event(PointerPhase::Move, x, y, now));
    }
    let last = points[points.len() - 1];
    engine.enqueue(event(PointerPhase::Up, last.0, last.1, now));
    engine.process_events();
}

#[test]
fn test_load_draw_undo_redo() {
    let mut engine = engine();
    let mut controller = PersistenceController::new(Arc::new(MemoryStorage::new()), "worksheet-12", Duration::from_secs(5));
    assert_eq!(pollster::block_on(controller.load(&mut engine)), 0);

    engine.set_tool(Some(ToolKind::Pen));
    stroke(&mut engine, &[(10.0, 10.0), (20.0, 12.0), (30.0, 15.0), (40.0, 15.0), (50.0, 14.0)]);
    assert_eq!(engine.history_index(), 0);
    assert_eq!(engine.annotations("1").len(), 1);
    let original = engine.annotations("1")[0].clone();
    assert_eq!(original.points.len(), 5);

    assert!(engine.undo());
    assert_eq!(engine.history_index(), -1);
    assert!(engine.annotations("1").is_empty());

    assert!(engine.redo());
    assert_eq!(engine.annotations("1"), &[original]);
}

#[test]
fn test_undo_all_redo_all_restores_state() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Ruler));
    for i in 0..6 {
        let y = 100.0 + i as f64 * 40.0;
        stroke(&mut engine, &[(100.0, y), (150.0, y), (200.0, y)]);
    }
    let after = engine.live().clone();
    while engine.undo() {}
    assert!(engine.live().is_empty());
    while engine.redo() {}
    assert_eq!(engine.live(), &after);
}

#[test]
fn test_branch_discards_redo() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Arrow));
    stroke(&mut engine, &[(10.0, 10.0), (60.0, 10.0)]);
    stroke(&mut engine, &[(10.0, 50.0), (60.0, 50.0)]);
    assert!(engine.undo());
    stroke(&mut engine, &[(10.0, 90.0), (60.0, 90.0)]);
    assert!(!engine.redo());
    let ys: Vec<f64> = engine.annotations("1").iter().map(|a| a.points[0].y).collect();
    assert_eq!(ys, vec![10.0, 90.0]);
}

#[test]
fn test_eraser_removes_touched_disk_only() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Disk));
    stroke(&mut engine, &[(100.0, 100.0), (110.0, 100.0), (120.0, 100.0)]);
    assert_eq!(engine.annotations("1").len(), 1);

    engine.set_tool(Some(ToolKind::Eraser));
    // size 1 → brush radius 5
    engine.set_settings(ToolSettings { size: 1.0, ..engine.settings() });
    stroke(&mut engine, &[(200.0, 200.0)]);
    assert_eq!(engine.annotations("1").len(), 1);
    stroke(&mut engine, &[(100.0, 100.0)]);
    assert!(engine.annotations("1").is_empty());
}

#[test]
fn test_dwell_confirmed_angle() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Angle));
    let t0 = Instant::now();
    engine.enqueue(event(PointerPhase::Down, 0.0, 0.0, t0));
    engine.enqueue(event(PointerPhase::Move, 20.0, 0.0, t0 + Duration::from_millis(50)));
    engine.enqueue(event(PointerPhase::Move, 50.0, 0.0, t0 + Duration::from_millis(100)));
    engine.enqueue(event(PointerPhase::Move, 51.0, 0.0, t0 + Duration::from_millis(650)));
    engine.process_events();
    assert!(matches!(engine.session().state(), SessionState::TwoStepActive { .. }));

    engine.enqueue(event(PointerPhase::Move, 20.0, 30.0, t0 + Duration::from_millis(700)));
    engine.enqueue(event(PointerPhase::Move, 0.0, 50.0, t0 + Duration::from_millis(750)));
    engine.enqueue(event(PointerPhase::Up, 0.0, 50.0, t0 + Duration::from_millis(760)));
    engine.process_events();

    let committed = engine.annotations("1");
    assert_eq!(committed.len(), 1);
    assert_eq!(
        committed[0].positions(),
        vec![Point::new(0.0, 0.0), Point::new(51.0, 0.0), Point::new(0.0, 50.0)]
    );
}

#[test]
fn test_long_arc_in_one_drag() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Arc));
    let t0 = Instant::now();
    engine.enqueue(event(PointerPhase::Down, 100.0, 800.0, t0));
    for i in 1..=10 {
        let x = 100.0 + i as f64 * 60.0;
        engine.enqueue(event(PointerPhase::Move, x, 800.0, t0 + Duration::from_millis(10 * i)));
    }
    engine.enqueue(event(PointerPhase::Move, 701.0, 800.0, t0 + Duration::from_millis(700)));
    for (i, y) in [750.0, 700.0, 650.0, 600.0, 550.0, 500.0].into_iter().enumerate() {
        engine.enqueue(event(PointerPhase::Move, 701.0, y, t0 + Duration::from_millis(750 + 10 * i as u64)));
    }
    engine.enqueue(event(PointerPhase::Up, 701.0, 500.0, t0 + Duration::from_millis(900)));
    engine.process_events();

    let committed = engine.annotations("1");
    assert_eq!(committed.len(), 1);
    assert_eq!(
        committed[0].positions(),
        vec![Point::new(100.0, 800.0), Point::new(701.0, 800.0), Point::new(701.0, 500.0)]
    );
}

#[test]
fn test_far_point_dropped() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Pen));
    let now = Instant::now();
    engine.enqueue(event(PointerPhase::Down, 100.0, 100.0, now));
    engine.enqueue(event(PointerPhase::Move, 110.0, 100.0, now));
    engine.enqueue(event(PointerPhase::Move, 610.0, 100.0, now));
    engine.process_events();
    let SessionState::SingleStroke { draft, .. } = engine.session().state() else {
        panic!("stroke should still be active");
    };
    assert_eq!(draft.last_pos(), Some(Point::new(110.0, 100.0)));
}

#[test]
fn test_touch_pans_while_pen_selected() {
    let mut engine = engine();
    engine.set_tool(Some(ToolKind::Pen));
    let touch = PointerEvent::new(DeviceClass::Touch, PointerPhase::Down, "1", Point::new(5.0, 5.0));
    engine.enqueue(touch);
    assert_eq!(engine.process_events(), vec![Routing::FallThrough]);
    assert!(engine.session().state().is_idle());
}
