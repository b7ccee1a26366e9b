use crate::*;
use glam::{DVec2, IVec2};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

/// A solid rectangle, the simplest drawable kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub(crate) bounds: Bounds,
    /// Whether `on_event` reports events as handled
    pub(crate) consumes: bool,
}

impl Block {
    pub(crate) fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            bounds: Bounds::from_edges(x1, y1, x2, y2),
            consumes: false,
        }
    }
}

impl CanvasItem for Block {
    fn draw(&self, painter: &mut dyn Painter, ctx: &DrawContext<'_>, _region: &Region) {
        painter.fill_rect(PixelRect::covering(&ctx.pixel_bounds), Rgba::BLACK);
    }

    fn translate(&mut self, delta: DVec2) {
        self.bounds = self.bounds.translate(delta);
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn on_event(&mut self, _event: &CanvasEvent) -> bool {
        self.consumes
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPainter {
    pub(crate) backgrounds: usize,
    pub(crate) fills: Vec<(PixelRect, Rgba)>,
    pub(crate) strokes: Vec<(PixelRect, Rgba, f64)>,
}

impl Painter for RecordingPainter {
    fn draw_background(&mut self, _region: &Region) {
        self.backgrounds += 1;
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        self.fills.push((rect, color));
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba, width: f64) {
        self.strokes.push((rect, color, width));
    }
}

/// A 100x100 canvas that is mapped and has run its first pass.
pub(crate) fn mapped_canvas() -> (Canvas, RecordingHost) {
    let host = RecordingHost::new();
    let mut canvas = Canvas::new(host.clone());
    canvas.size_allocate(100, 100);
    canvas.map();
    canvas.run_idle();
    (canvas, host)
}

pub(crate) type EventLog = Rc<RefCell<Vec<(ItemId, EventKind)>>>;

/// Records every event delivered to `items` without handling it.
pub(crate) fn event_log(canvas: &mut Canvas, items: &[ItemId]) -> EventLog {
    let log = EventLog::default();
    for &id in items {
        let log = log.clone();
        canvas
            .connect_event(id, move |_, item, event| {
                log.borrow_mut().push((item, event.kind));
                false
            })
            .unwrap();
    }
    log
}

fn all_items(canvas: &Canvas) -> Vec<ItemId> {
    let mut items = vec![canvas.root()];
    let mut i = 0;
    while i < items.len() {
        items.extend_from_slice(canvas.children(items[i]).unwrap());
        i += 1;
    }
    items
}

#[test]
fn test_raise_scenario() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let a = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let b = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let c = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();

    assert_eq!(canvas.raise(a, 1), Ok(true));
    assert_eq!(canvas.children(root).unwrap(), &[b, a, c]);

    assert_eq!(canvas.raise_to_top(b), Ok(true));
    assert_eq!(canvas.children(root).unwrap(), &[a, c, b]);
}

#[test]
fn test_zero_step_restack_schedules_nothing() {
    let (mut canvas, host) = mapped_canvas();
    let root = canvas.root();
    let a = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.run_idle();
    canvas.draw(
        &mut RecordingPainter::default(),
        &Clip::rect(PixelRect::new(0, 0, 100, 100)),
    );
    host.reset();

    assert_eq!(canvas.raise(a, 0), Ok(false));
    assert_eq!(canvas.lower(a, 0), Ok(false));
    assert_eq!(host.log().repaints_queued, 0);
    assert!(canvas.pending_damage().is_empty());
}

#[test]
fn test_reparent_rejects_cycles() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let x = canvas.create_group(root, DVec2::ZERO).unwrap();
    let g2 = canvas.create_group(x, DVec2::ZERO).unwrap();

    assert_eq!(
        canvas.reparent(x, g2),
        Err(SceneError::WouldCycle { item: x, group: g2 })
    );
    assert_eq!(
        canvas.reparent(x, x),
        Err(SceneError::WouldCycle { item: x, group: x })
    );
    assert_eq!(
        canvas.reparent(root, x),
        Err(SceneError::WouldCycle { item: root, group: x })
    );
    assert_eq!(canvas.children(root).unwrap(), &[x]);
    assert_eq!(canvas.children(x).unwrap(), &[g2]);
    assert_eq!(canvas.parent(g2).unwrap(), Some(x));
}

#[test]
fn test_reparent_keeps_local_coordinates() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let left = canvas.create_group(root, DVec2::new(0.0, 0.0)).unwrap();
    let right = canvas.create_group(root, DVec2::new(50.0, 0.0)).unwrap();
    let leaf = canvas.create_item(left, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let other = canvas.create_item(right, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    canvas.run_idle();

    canvas.reparent(leaf, right).unwrap();
    assert_eq!(canvas.children(right).unwrap(), &[other, leaf]);
    assert!(canvas.children(left).unwrap().is_empty());
    assert!(canvas.is_item_mapped(leaf).unwrap());

    canvas.run_idle();
    assert_eq!(
        canvas.pixel_bounds(leaf).unwrap(),
        Bounds::from_edges(50.0, 0.0, 60.0, 10.0)
    );
}

#[test]
fn test_grab_scenario() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let x = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    let y = canvas.create_item(root, Block::new(20.0, 0.0, 30.0, 10.0)).unwrap();

    canvas.grab(x, EventMask::BUTTON_PRESS, None, 0).unwrap();
    assert_eq!(
        canvas.grab(y, EventMask::BUTTON_PRESS, None, 0),
        Err(GrabError::AlreadyGrabbed)
    );
    assert_eq!(canvas.current_item(), Some(x));

    canvas.ungrab(x, 0);
    canvas.grab(y, EventMask::BUTTON_PRESS, None, 0).unwrap();
    assert_eq!(canvas.grabbed_item(), Some(y));
}

#[test]
fn test_scroll_region_schedules_one_deep_update() {
    let (mut canvas, host) = mapped_canvas();
    host.reset();

    canvas.set_scroll_region(Bounds::from_edges(-50.0, -50.0, 250.0, 250.0));
    assert_eq!(host.log().updates_scheduled, 1);
    let root = canvas.root();
    assert!(canvas.flags(root).unwrap().contains(ItemFlags::NEED_DEEP_UPDATE));

    canvas.run_idle();
    assert!(!canvas.needs_update(root).unwrap());
    for p in [DVec2::new(-50.0, -50.0), DVec2::new(0.0, 0.0), DVec2::new(120.0, 249.0)] {
        let pixel = canvas.world_to_canvas_pixel(p);
        assert_eq!(canvas.canvas_pixel_to_world(pixel), p);
    }
}

#[test]
fn test_handled_event_stops_at_ancestor() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let group = canvas.create_group(root, DVec2::ZERO).unwrap();
    let leaf = canvas.create_item(group, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.run_idle();

    let log = event_log(&mut canvas, &[leaf]);
    let seen = log.clone();
    canvas
        .connect_event(group, move |_, item, event| {
            seen.borrow_mut().push((item, event.kind));
            event.kind == EventKind::ButtonPress
        })
        .unwrap();
    let root_calls = Rc::new(RefCell::new(0));
    let counter = root_calls.clone();
    canvas
        .connect_event(root, move |_, _, _| {
            *counter.borrow_mut() += 1;
            false
        })
        .unwrap();

    let handled = canvas.handle_button(&CanvasEvent::button_press(
        DVec2::new(5.0, 5.0),
        1,
        ModifierState::empty(),
    ));

    assert!(handled);
    assert_eq!(
        *log.borrow(),
        vec![
            (leaf, EventKind::Enter),
            (group, EventKind::Enter),
            (leaf, EventKind::ButtonPress),
            (group, EventKind::ButtonPress),
        ]
    );
    // Only the unhandled enter reached the root
    assert_eq!(*root_calls.borrow(), 1);
}

#[test]
fn test_item_kind_handles_after_connected_handlers() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let mut block = Block::new(0.0, 0.0, 10.0, 10.0);
    block.consumes = true;
    let leaf = canvas.create_item(root, block).unwrap();
    canvas.run_idle();
    let log = event_log(&mut canvas, &[leaf, root]);

    canvas.handle_motion(&CanvasEvent::motion(DVec2::new(5.0, 5.0), ModifierState::empty()));
    assert_eq!(
        *log.borrow(),
        vec![(leaf, EventKind::Enter), (leaf, EventKind::Motion)]
    );
}

#[test]
fn test_events_arrive_in_world_coordinates() {
    let (mut canvas, _host) = mapped_canvas();
    canvas.set_scroll_region(Bounds::from_edges(100.0, 100.0, 300.0, 300.0));
    let root = canvas.root();
    let leaf = canvas.create_item(root, Block::new(100.0, 100.0, 110.0, 110.0)).unwrap();
    canvas.run_idle();

    let positions = Rc::new(RefCell::new(Vec::new()));
    let seen = positions.clone();
    canvas
        .connect_event(leaf, move |_, _, event| {
            seen.borrow_mut().push(event.position);
            false
        })
        .unwrap();

    canvas.handle_motion(&CanvasEvent::motion(DVec2::new(4.0, 6.0), ModifierState::empty()));
    assert_eq!(
        *positions.borrow(),
        vec![DVec2::new(104.0, 106.0), DVec2::new(104.0, 106.0)]
    );
}

#[test]
fn test_no_item_needs_update_after_pass() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let outer = canvas.create_group(root, DVec2::new(5.0, 5.0)).unwrap();
    let inner = canvas.create_group(outer, DVec2::new(5.0, 5.0)).unwrap();
    let a = canvas.create_item(inner, Block::new(0.0, 0.0, 4.0, 4.0)).unwrap();
    let b = canvas.create_item(outer, Block::new(0.0, 0.0, 4.0, 4.0)).unwrap();
    canvas.run_idle();

    canvas.move_item(inner, DVec2::new(1.0, 0.0)).unwrap();
    canvas
        .set_properties::<Block, _>(b, |block| {
            block.bounds = Bounds::from_edges(0.0, 0.0, 8.0, 8.0)
        })
        .unwrap();
    canvas.hide(a).unwrap();
    canvas.show(a).unwrap();
    canvas.run_idle();

    for id in all_items(&canvas) {
        let flags = canvas.flags(id).unwrap();
        assert!(
            !flags.intersects(ItemFlags::NEED_UPDATE | ItemFlags::NEED_DEEP_UPDATE),
            "item {id} still flagged: {flags:?}"
        );
    }
    assert_eq!(
        canvas.pixel_bounds(b).unwrap(),
        Bounds::from_edges(5.0, 5.0, 13.0, 13.0)
    );
    assert_eq!(canvas.item::<Block>(b).unwrap().bounds.width(), 8.0);
}

#[test]
fn test_set_properties_checks_kind() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    assert_eq!(
        canvas.set_properties::<Block, _>(root, |_| ()),
        Err(SceneError::KindMismatch(root))
    );
}

#[test]
fn test_destroy_clears_pick_grab_and_focus() {
    let (mut canvas, host) = mapped_canvas();
    let root = canvas.root();
    let group = canvas.create_group(root, DVec2::ZERO).unwrap();
    let leaf = canvas.create_item(group, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.run_idle();

    canvas.handle_motion(&CanvasEvent::motion(DVec2::new(5.0, 5.0), ModifierState::empty()));
    assert_eq!(canvas.current_item(), Some(leaf));
    canvas.grab(leaf, EventMask::all(), None, 0).unwrap();
    canvas.grab_focus(leaf).unwrap();

    canvas.destroy(group).unwrap();
    assert_eq!(canvas.current_item(), None);
    assert_eq!(canvas.grabbed_item(), None);
    assert_eq!(canvas.focused_item(), None);
    assert_eq!(host.log().pointer_ungrabs, 1);
    assert_eq!(canvas.item_count(), 1);

    canvas.run_idle();
    assert_eq!(canvas.current_item(), None);
}

#[test]
fn test_handler_may_destroy_its_item() {
    let (mut canvas, _host) = mapped_canvas();
    let root = canvas.root();
    let leaf = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.run_idle();

    let root_calls = Rc::new(RefCell::new(0));
    let counter = root_calls.clone();
    canvas
        .connect_event(leaf, |canvas, item, event| {
            if event.kind == EventKind::ButtonPress {
                canvas.destroy(item).unwrap();
            }
            false
        })
        .unwrap();
    canvas
        .connect_event(root, move |_, _, event| {
            if event.kind == EventKind::ButtonPress {
                *counter.borrow_mut() += 1;
            }
            false
        })
        .unwrap();

    canvas.handle_button(&CanvasEvent::button_press(
        DVec2::new(5.0, 5.0),
        1,
        ModifierState::empty(),
    ));
    assert!(!canvas.contains(leaf));
    assert_eq!(*root_calls.borrow(), 0);
}

#[test]
fn test_items_map_when_canvas_maps() {
    let host = RecordingHost::new();
    let mut canvas = Canvas::new(host.clone());
    let root = canvas.root();
    let group = canvas.create_group(root, DVec2::ZERO).unwrap();
    let leaf = canvas.create_item(group, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    let hidden = canvas.create_item(group, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    canvas.hide(hidden).unwrap();
    assert!(!canvas.is_item_realized(leaf).unwrap());

    canvas.map();
    assert!(canvas.is_item_mapped(leaf).unwrap());
    assert!(canvas.is_item_mapped(group).unwrap());
    assert!(!canvas.is_item_mapped(hidden).unwrap());
    assert_eq!(host.log().updates_scheduled, 1);

    canvas.unmap();
    assert!(!canvas.is_item_mapped(leaf).unwrap());
    assert!(canvas.is_item_realized(leaf).unwrap());
    assert_eq!(host.log().updates_cancelled, 1);

    canvas.unrealize();
    assert!(!canvas.is_item_realized(leaf).unwrap());
    assert!(!canvas.is_item_realized(root).unwrap());
}

#[test]
fn test_drop_cancels_pending_pass_and_grab() {
    let (mut canvas, host) = mapped_canvas();
    let root = canvas.root();
    let leaf = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
    canvas.grab(leaf, EventMask::all(), None, 0).unwrap();
    host.reset();

    drop(canvas);
    assert_eq!(host.log().updates_cancelled, 1);
    assert_eq!(host.log().pointer_ungrabs, 1);
}

#[test]
fn test_config_sets_up_viewport() {
    let config = CanvasConfig {
        pixels_per_unit: 2.0,
        close_enough: 2,
        ..CanvasConfig::default()
    };
    let canvas = Canvas::with_config(config, RecordingHost::new()).unwrap();
    assert_eq!(canvas.pixels_per_unit(), 2.0);
    assert_eq!(canvas.close_enough(), 2);
    assert_eq!(canvas.world_to_canvas_pixel(DVec2::new(3.0, 4.0)), IVec2::new(6, 8));

    let bad = CanvasConfig {
        pixels_per_unit: -1.0,
        ..CanvasConfig::default()
    };
    assert!(Canvas::with_config(bad, RecordingHost::new()).is_err());
}

proptest! {
    #[test]
    fn prop_world_item_round_trip(
        offsets in prop::collection::vec((-1e4f64..1e4, -1e4f64..1e4), 1..6),
        x in -1e5f64..1e5,
        y in -1e5f64..1e5,
    ) {
        let mut canvas = Canvas::new(RecordingHost::new());
        let mut parent = canvas.root();
        for (dx, dy) in offsets {
            parent = canvas.create_group(parent, DVec2::new(dx, dy)).unwrap();
        }
        let leaf = canvas.create_item(parent, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        let p = DVec2::new(x, y);
        let back = canvas.world_to_item(leaf, canvas.item_to_world(leaf, p).unwrap()).unwrap();
        prop_assert!((back - p).length() < 1e-6);
    }

    #[test]
    fn prop_scroll_region_pixel_round_trip(
        x1 in -500i32..500,
        y1 in -500i32..500,
        w in 1i32..1000,
        h in 1i32..1000,
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
    ) {
        let (mut canvas, _host) = mapped_canvas();
        let region = Bounds::from_edges(x1 as f64, y1 as f64, (x1 + w) as f64, (y1 + h) as f64);
        canvas.set_scroll_region(region);
        canvas.run_idle();

        let p = DVec2::new(
            (x1 as f64 + fx * w as f64).floor(),
            (y1 as f64 + fy * h as f64).floor(),
        );
        let pixel = canvas.world_to_canvas_pixel(p);
        prop_assert_eq!(canvas.canvas_pixel_to_world(pixel), p);
    }
}
