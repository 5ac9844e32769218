//! End-to-end scenarios against the headless host.
//!
//! Each test builds a small control tree, drives it through the public API
//! and checks both the control state and what reached the host boxes.
//!
//! Run with logs: RUST_LOG=spark_controls=trace cargo test --test display_scenarios -- --nocapture

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use spark_controls::state::input::convert_event;
use spark_controls::{
    Anchors, AutoKeyword, AutoValue, Bounds, ControlId, ControlKind, Display, DisplayConfig,
    EventKind, FlowLayout, HeadlessHost, StyleKey, StyleValue, ViewportValue,
};
use taffy::geometry::Rect;
use tracing_subscriber::EnvFilter;

// =============================================================================
// HELPERS
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn display(width: f32, height: f32) -> Display<HeadlessHost> {
    init_tracing();
    Display::new(HeadlessHost::new(), DisplayConfig::default().with_size(width, height))
}

/// Run frames until nothing is pending. Bounded so a scheduling loop fails
/// the test instead of hanging it.
fn flush(display: &mut Display<HeadlessHost>) -> usize {
    let mut frames = 0;
    while display.frame_pending() {
        display.frame();
        frames += 1;
        assert!(frames < 32, "render queue never settled");
    }
    frames
}

fn sized(display: &mut Display<HeadlessHost>, owner: ControlId, name: &str, width: f32, height: f32) -> ControlId {
    let id = display.create_in(owner, ControlKind::Control, Some(name)).unwrap();
    display.set_bounds(id, Bounds::new(0.0, 0.0, width, height)).unwrap();
    id
}

fn rect(display: &Display<HeadlessHost>, id: ControlId) -> (f32, f32, f32, f32) {
    let r = display.host().absolute_rect(id).expect("box in document");
    (r.left, r.top, r.right - r.left, r.bottom - r.top)
}

// =============================================================================
// LAYOUT
// =============================================================================

#[test]
fn wrap_layout_reaches_the_host() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let panel = display.create_in(root, ControlKind::Panel, Some("toolbar")).unwrap();
    display.set_bounds(panel, Bounds::new(20.0, 30.0, 100.0, 200.0)).unwrap();

    let a = sized(&mut display, panel, "a", 40.0, 20.0);
    let b = sized(&mut display, panel, "b", 40.0, 25.0);
    let c = sized(&mut display, panel, "c", 40.0, 10.0);

    display.batch(|d| {
        d.set_layout(panel, FlowLayout::Horizontal).unwrap();
        d.set_wrap(panel, true).unwrap();
        d.set_split_x(panel, 10.0).unwrap();
        d.set_split_y(panel, 5.0).unwrap();
        d.set_sequence(panel, ["a", "b", "c"]).unwrap();
    });
    flush(&mut display);

    assert_eq!(rect(&display, a), (20.0, 30.0, 40.0, 20.0));
    assert_eq!(rect(&display, b), (70.0, 30.0, 40.0, 25.0));
    assert_eq!(rect(&display, c), (20.0, 60.0, 40.0, 10.0));
}

#[test]
fn panel_built_detached_lays_out_on_attach() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let group = display.create(ControlKind::Container, Some("group")).unwrap();
    let panel = display.create_in(group, ControlKind::Panel, Some("p")).unwrap();
    display.set_bounds(panel, Bounds::new(0.0, 0.0, 100.0, 200.0)).unwrap();

    let items: Vec<ControlId> = ["a", "b", "c"]
        .iter()
        .map(|name| sized(&mut display, panel, name, 40.0, 20.0))
        .collect();
    display.set_layout(panel, FlowLayout::Horizontal).unwrap();
    display.set_wrap(panel, true).unwrap();
    display.set_split_x(panel, 10.0).unwrap();
    display.set_sequence(panel, ["a", "b", "c"]).unwrap();

    // Sleeping panels do not lay out
    assert_eq!(display.control(items[1]).unwrap().x(), 0.0);

    display.attach(root, group).unwrap();
    flush(&mut display);

    let xs: Vec<f32> = items.iter().map(|id| display.control(*id).unwrap().x()).collect();
    let ys: Vec<f32> = items.iter().map(|id| display.control(*id).unwrap().y()).collect();
    assert_eq!(xs, vec![0.0, 50.0, 0.0]);
    assert_eq!(ys, vec![0.0, 0.0, 20.0]);
    assert_eq!(rect(&display, items[2]), (0.0, 20.0, 40.0, 20.0));
}

#[test]
fn shell_insets_shift_children() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let panel = display.create_in(root, ControlKind::Panel, Some("framed")).unwrap();
    display.set_bounds(panel, Bounds::new(0.0, 0.0, 120.0, 80.0)).unwrap();
    let child = sized(&mut display, panel, "fill", 120.0, 10.0);
    display.set_anchors(child, Anchors::LEFT | Anchors::RIGHT | Anchors::TOP).unwrap();
    flush(&mut display);
    assert_eq!(display.control(child).unwrap().width(), 120.0);

    // The host reports a 10px frame; the next recalculation picks it up
    display.host_mut().set_shell(panel, Rect { left: 10.0, right: 10.0, top: 5.0, bottom: 5.0 });
    display.invalidate(panel);
    flush(&mut display);

    assert_eq!(display.control(child).unwrap().width(), 100.0);
    assert_eq!(rect(&display, child), (10.0, 5.0, 100.0, 10.0));
}

#[test]
fn detached_sequence_member_is_dropped() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let panel = display.create_in(root, ControlKind::Panel, Some("column")).unwrap();
    display.set_bounds(panel, Bounds::new(0.0, 0.0, 100.0, 300.0)).unwrap();
    display.set_layout(panel, FlowLayout::Vertical).unwrap();
    let first = sized(&mut display, panel, "first", 50.0, 30.0);
    let middle = sized(&mut display, panel, "middle", 50.0, 30.0);
    let last = sized(&mut display, panel, "last", 50.0, 30.0);
    display.set_split_y(panel, 4.0).unwrap();
    display.set_sequence(panel, ["first", "middle", "last"]).unwrap();
    assert_eq!(display.control(last).unwrap().y(), 68.0);

    display.destroy(middle).unwrap();
    assert_eq!(display.sequence(panel).unwrap(), vec!["first", "last"]);
    assert_eq!(display.control(first).unwrap().y(), 0.0);
    assert_eq!(display.control(last).unwrap().y(), 34.0);
}

// =============================================================================
// GEOMETRY
// =============================================================================

#[test]
fn fractional_width_is_relative_to_owner() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let owner = display.create_in(root, ControlKind::Container, Some("owner")).unwrap();
    display.set_bounds(owner, Bounds::new(0.0, 0.0, 200.0, 100.0)).unwrap();
    let half = sized(&mut display, owner, "half", 10.0, 10.0);
    display.set_auto_width(half, Some(AutoValue::Number(0.5))).unwrap();
    assert_eq!(display.control(half).unwrap().width(), 100.0);

    // Still a fraction on a tiny owner
    display.set_width(owner, 2.0).unwrap();
    assert_eq!(display.control(half).unwrap().width(), 1.0);
}

#[test]
fn anchors_follow_owner_resize() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let owner = display.create_in(root, ControlKind::Container, Some("owner")).unwrap();
    display.set_bounds(owner, Bounds::new(0.0, 0.0, 300.0, 200.0)).unwrap();

    let stretch = display.create_in(owner, ControlKind::Control, Some("stretch")).unwrap();
    display.set_bounds(stretch, Bounds::new(10.0, 10.0, 100.0, 20.0)).unwrap();
    display.set_anchors(stretch, Anchors::LEFT | Anchors::RIGHT | Anchors::TOP).unwrap();

    let pinned = display.create_in(owner, ControlKind::Control, Some("pinned")).unwrap();
    display.set_bounds(pinned, Bounds::new(250.0, 170.0, 40.0, 20.0)).unwrap();
    display.set_anchors(pinned, Anchors::RIGHT | Anchors::BOTTOM).unwrap();

    display.set_bounds(owner, Bounds::new(0.0, 0.0, 350.0, 180.0)).unwrap();

    let s = display.control(stretch).unwrap().bounds();
    assert_eq!((s.x, s.width, s.y, s.height), (10.0, 150.0, 10.0, 20.0));
    let p = display.control(pinned).unwrap().bounds();
    assert_eq!((p.x, p.y, p.width), (300.0, 150.0, 40.0));
}

#[test]
fn viewport_rules_follow_breakpoints() {
    let mut display = display(1200.0, 800.0);
    let root = display.root();
    let sidebar = display.create_in(root, ControlKind::Container, Some("sidebar")).unwrap();
    let rule = ViewportValue::new()
        .with("xl", 0.25_f32)
        .with("xs", 0.75_f32)
        .with_default(0.5_f32);
    display.set_auto_width(sidebar, Some(rule.into())).unwrap();
    display.set_auto_x(sidebar, Some(AutoKeyword::Right.into())).unwrap();
    assert_eq!(display.viewport_name(), "xl");
    assert_eq!(display.control(sidebar).unwrap().width(), 300.0);
    assert_eq!(display.control(sidebar).unwrap().x(), 900.0);

    display.resize(800.0, 600.0);
    assert_eq!(display.viewport_name(), "md");
    assert_eq!(display.control(sidebar).unwrap().width(), 400.0);
    assert_eq!(display.control(sidebar).unwrap().x(), 400.0);

    display.resize(400.0, 600.0);
    assert_eq!(display.viewport_name(), "xs");
    assert_eq!(display.control(sidebar).unwrap().width(), 300.0);
    assert_eq!(display.control(sidebar).unwrap().x(), 100.0);
}

#[test]
fn anchor_shift_survives_a_failed_viewport_rule() {
    let mut display = display(1024.0, 768.0);
    let root = display.root();
    let owner = display.create_in(root, ControlKind::Container, Some("owner")).unwrap();
    display.set_bounds(owner, Bounds::new(0.0, 0.0, 200.0, 100.0)).unwrap();
    let badge = display.create_in(owner, ControlKind::Control, Some("badge")).unwrap();
    display.set_bounds(badge, Bounds::new(150.0, 10.0, 40.0, 20.0)).unwrap();
    display.set_anchors(badge, Anchors::RIGHT | Anchors::TOP).unwrap();
    display
        .set_auto_width(badge, Some(ViewportValue::new().with("lg", 40.0_f32).into()))
        .unwrap();

    display.resize(640.0, 480.0);
    display.set_width(owner, 250.0).unwrap();
    assert_eq!(display.control(badge).unwrap().x(), 150.0);

    display.resize(1024.0, 768.0);
    assert_eq!(display.viewport_name(), "lg");
    assert_eq!(
        display.control(badge).unwrap().bounds(),
        Bounds::new(200.0, 10.0, 40.0, 20.0)
    );
}

// =============================================================================
// SCHEDULING
// =============================================================================

#[test]
fn invalidations_coalesce_per_frame() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let label = sized(&mut display, root, "label", 50.0, 10.0);
    flush(&mut display);
    let frames_before = display.render_queue().frames();

    for i in 0..10 {
        display.set_width(label, 50.0 + i as f32).unwrap();
        display.invalidate(label);
        display.set_content(label, Some("hello")).unwrap();
    }
    assert_eq!(display.render_queue().pending(), &[label]);

    flush(&mut display);
    assert_eq!(display.render_queue().frames(), frames_before + 1);

    let host_box = display.host().get(label).unwrap();
    assert_eq!(host_box.style().get(StyleKey::Width), Some(StyleValue::Px(59.0)));
    assert_eq!(host_box.content(), "hello");
    assert!(host_box.class_name().contains("control"));
}

#[test]
fn batch_defers_until_closed() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let owner = display.create_in(root, ControlKind::Container, Some("owner")).unwrap();
    display.set_bounds(owner, Bounds::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    let child = sized(&mut display, owner, "child", 10.0, 10.0);
    display.set_auto_width(child, Some(AutoValue::Number(0.5))).unwrap();
    flush(&mut display);

    display.batch(|d| {
        d.set_width(owner, 300.0).unwrap();
        // Nothing propagates inside the window
        assert_eq!(d.control(child).unwrap().width(), 50.0);
        assert!(!d.frame_pending());
    });
    assert_eq!(display.control(child).unwrap().width(), 150.0);
    assert!(display.frame_pending());
}

// =============================================================================
// FOCUS AND INPUT
// =============================================================================

#[test]
fn tab_order_follows_tab_index() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let form = display.create_in(root, ControlKind::Container, Some("form")).unwrap();
    display.set_tabs_loop(form, false).unwrap();

    let fields: Vec<ControlId> = [("a", 2), ("b", 0), ("c", 1)]
        .into_iter()
        .map(|(name, tab_index)| {
            let id = display.create_in(form, ControlKind::Control, Some(name)).unwrap();
            display.set_can_focus(id, true).unwrap();
            display.set_tab_index(id, tab_index).unwrap();
            id
        })
        .collect();

    assert_eq!(display.calculate_tabs(form), Some(vec![fields[1], fields[2], fields[0]]));
    assert_eq!(display.next_tab(form, false), Some(fields[1]));

    // Tab walks the order and stops at the end
    let mut visited = Vec::new();
    for _ in 0..5 {
        display.focus_next();
        visited.push(display.current_control().unwrap());
    }
    assert_eq!(visited, vec![fields[1], fields[2], fields[0], fields[0], fields[0]]);
}

#[test]
fn crossterm_input_drives_focus_and_hits() {
    let mut display = display(800.0, 600.0);
    let root = display.root();
    let ok = sized(&mut display, root, "ok", 80.0, 20.0);
    display.set_x(ok, 10.0).unwrap();
    display.set_can_focus(ok, true).unwrap();
    let cancel = sized(&mut display, root, "cancel", 80.0, 20.0);
    display.set_x(cancel, 100.0).unwrap();
    display.set_can_focus(cancel, true).unwrap();
    display.set_default_control(root, Some(ok)).unwrap();
    flush(&mut display);

    let log = Rc::new(RefCell::new(Vec::new()));
    for (id, kind) in [(ok, EventKind::DefaultAction), (cancel, EventKind::Hit), (cancel, EventKind::DoubleHit)] {
        let log = log.clone();
        display
            .on(id, kind, move |event| {
                log.borrow_mut().push((event.target, event.kind));
                true
            })
            .unwrap();
    }

    let key = |code| CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::empty()));
    let click = |kind| {
        CrosstermEvent::Mouse(MouseEvent {
            kind,
            column: 120,
            row: 5,
            modifiers: KeyModifiers::empty(),
        })
    };
    let ms = Duration::from_millis;

    assert!(display.route_event(convert_event(key(KeyCode::Tab), ms(0))));
    assert_eq!(display.current_control(), Some(ok));
    assert!(display.route_event(convert_event(key(KeyCode::BackTab), ms(10))));
    assert_eq!(display.current_control(), Some(cancel));

    display.route_event(convert_event(key(KeyCode::Enter), ms(20)));
    display.route_event(convert_event(click(MouseEventKind::Down(MouseButton::Left)), ms(100)));
    display.route_event(convert_event(click(MouseEventKind::Up(MouseButton::Left)), ms(150)));
    display.route_event(convert_event(click(MouseEventKind::Down(MouseButton::Left)), ms(300)));

    assert_eq!(
        *log.borrow(),
        vec![
            (ok, EventKind::DefaultAction),
            (cancel, EventKind::Hit),
            (cancel, EventKind::DoubleHit),
        ]
    );
    assert_eq!(display.host().focused(), Some(cancel));
}
