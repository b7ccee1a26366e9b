//! Picking, event routing, pointer grabs and keyboard focus.

use crate::canvas::ItemBody;
use crate::{
    Canvas, CanvasEvent, EventKind, EventMask, GrabError, GrabStatus, ItemFlags, ItemId,
    ModifierState, SceneError,
};
use glam::{DVec2, IVec2};

/// Distance reported when nothing is under the point.
const NO_HIT: f64 = 1e18;

impl Canvas {
    /// The item under the pointer.
    pub fn current_item(&self) -> Option<ItemId> {
        self.pick.current_item
    }

    pub fn grabbed_item(&self) -> Option<ItemId> {
        self.pick.grabbed_item
    }

    pub fn focused_item(&self) -> Option<ItemId> {
        self.pick.focused_item
    }

    /// The topmost mapped item within the pick tolerance of `world`.
    pub fn item_at(&self, world: DVec2) -> Option<ItemId> {
        let pixel = self.viewport.world_to_canvas_pixel(world);
        let (dist, item) = self.invoke_point(self.root, world, pixel);
        self.within_tolerance(dist).then_some(item).flatten()
    }

    fn within_tolerance(&self, dist: f64) -> bool {
        (dist * self.viewport.pixels_per_unit() + 0.5) as i32 <= self.close_enough
    }

    /// Hit-tests `id` at `point`, given in the coordinates of `id`'s parent.
    ///
    /// `pixel` is the same point in canvas pixels, used to skip children
    /// whose pixel bounding box is outside the tolerance square.
    fn invoke_point(&self, id: ItemId, point: DVec2, pixel: IVec2) -> (f64, Option<ItemId>) {
        let Some(node) = self.items.get(id) else {
            return (NO_HIT, None);
        };
        let group = match &node.body {
            ItemBody::Leaf(kind) => {
                return (kind.point(point, self.viewport.pixels_per_unit()), Some(id));
            }
            ItemBody::Group(group) => group,
        };

        let slack = self.close_enough;
        let (bx1, by1) = (pixel.x - slack, pixel.y - slack);
        let (bx2, by2) = (pixel.x + slack, pixel.y + slack);
        let local = point - group.offset;

        for &child in group.children.iter().rev() {
            let Some(child_node) = self.items.get(child) else {
                continue;
            };
            let b = child_node.pixel_bounds;
            if b.min.x > bx2 as f64
                || b.min.y > by2 as f64
                || b.max.x < bx1 as f64
                || b.max.y < by1 as f64
            {
                continue;
            }
            if !child_node.is(ItemFlags::MAPPED) {
                continue;
            }

            let (dist, hit) = self.invoke_point(child, local, pixel);
            if let Some(hit) = hit {
                if self.within_tolerance(dist) {
                    return (dist, Some(hit));
                }
            }
        }
        (0.0, None)
    }

    /// Replays the stored pick event after the tree changed under the pointer.
    pub(crate) fn repick(&mut self) {
        let event = self.pick.pick_event.clone();
        self.pick_current_item(&event, true);
    }

    /// Works out which item is under the pointer and synthesizes crossings.
    ///
    /// While a button is held the pointer may leave the current item but no
    /// other item becomes current until every button is released.
    fn pick_current_item(&mut self, event: &CanvasEvent, replaying: bool) -> bool {
        let button_down = self.pick.state.any_button();
        if !button_down {
            self.pick.left_grabbed_item = false;
        }

        if !replaying {
            self.pick.pick_event = match event.kind {
                EventKind::Motion | EventKind::ButtonRelease => event.as_kind(EventKind::Enter),
                _ => event.clone(),
            };
        }

        if self.pick.in_repick {
            return false;
        }

        self.pick.new_current_item = if self.pick.pick_event.kind == EventKind::Leave {
            None
        } else {
            let window = self.pick.pick_event.position;
            let pixel = IVec2::new((window.x + 0.5) as i32, (window.y + 0.5) as i32);
            let world = self.viewport.canvas_pixel_to_world(pixel);
            if self.has_flags(self.root, ItemFlags::MAPPED) {
                self.invoke_point(self.root, world, pixel).1
            } else {
                None
            }
        };

        let left_grabbed = self.pick.left_grabbed_item;
        if self.pick.new_current_item == self.pick.current_item && !left_grabbed {
            return false;
        }

        let mut handled = false;
        if self.pick.new_current_item != self.pick.current_item
            && self.pick.current_item.is_some()
            && !left_grabbed
        {
            log::trace!("pointer left item {:?}", self.pick.current_item);
            let leave = self.pick.pick_event.as_kind(EventKind::Leave);
            self.pick.in_repick = true;
            handled = self.emit_event(&leave);
            self.pick.in_repick = false;
        }

        // A leave handler may have destroyed the new item
        if self.pick.new_current_item != self.pick.current_item && button_down {
            self.pick.left_grabbed_item = true;
            return handled;
        }

        self.pick.left_grabbed_item = false;
        self.pick.current_item = self.pick.new_current_item;

        if let Some(current) = self.pick.current_item {
            log::trace!("pointer entered item {current}");
            let enter = self.pick.pick_event.as_kind(EventKind::Enter);
            handled = self.emit_event(&enter);
        }
        handled
    }

    /// Delivers `event` to the current item, or the focused item for keyboard
    /// events, and bubbles it towards the root.
    ///
    /// Returns `true` if some handler consumed it.
    pub fn emit_event(&mut self, event: &CanvasEvent) -> bool {
        if !self.realized {
            return false;
        }

        if let Some(grabbed) = self.pick.grabbed_item {
            let inside_grab = self
                .pick
                .current_item
                .is_some_and(|current| self.is_descendant(current, grabbed));
            if !inside_grab || !event.kind.mask().intersects(self.pick.grab_mask) {
                return false;
            }
        }

        let mut event = event.clone();
        if event.kind.has_position() {
            event.position = self.viewport.window_to_world(event.position);
        }

        let mut target = self.pick.current_item;
        if event.kind.is_keyboard() && self.pick.focused_item.is_some() {
            target = self.pick.focused_item;
        }

        while let Some(id) = target {
            if self.dispatch(id, &event) {
                return true;
            }
            target = self.items.get(id).and_then(|node| node.parent);
        }
        false
    }

    /// Runs the item's handlers, then its kind's own `on_event`.
    fn dispatch(&mut self, id: ItemId, event: &CanvasEvent) -> bool {
        let Some(node) = self.items.get(id) else {
            return false;
        };
        log::trace!("dispatching {} to item {id}", event.kind);

        // Handlers stay connected while they run so nested events still reach them
        let handlers = node.handlers.clone();
        for handler in &handlers {
            if handler(self, id, event) {
                return true;
            }
        }

        let Some(node) = self.items.get_mut(id) else {
            return false;
        };
        match &mut node.body {
            ItemBody::Leaf(kind) => kind.on_event(event),
            ItemBody::Group(_) => false,
        }
    }

    /// Grabs the pointer for `id`. Until [`Canvas::ungrab`], only events in
    /// `mask` are delivered, and only to `id` and its descendants.
    pub fn grab(
        &mut self,
        id: ItemId,
        mask: EventMask,
        cursor: Option<&str>,
        time: u32,
    ) -> Result<(), GrabError> {
        if !self.mapped {
            return Err(GrabError::NotViewable);
        }
        if self.pick.grabbed_item.is_some() {
            return Err(GrabError::AlreadyGrabbed);
        }
        if !self.has_flags(id, ItemFlags::MAPPED) {
            return Err(GrabError::NotViewable);
        }

        match self.host.grab_pointer(mask, cursor, time) {
            GrabStatus::Success => {}
            status => {
                log::warn!("host refused pointer grab for item {id}: {status}");
                return Err(GrabError::Refused(status));
            }
        }

        log::debug!("item {id} grabbed the pointer");
        self.pick.grabbed_item = Some(id);
        self.pick.grab_mask = mask;
        self.pick.current_item = Some(id);
        Ok(())
    }

    /// Releases the pointer grab if `id` holds it.
    pub fn ungrab(&mut self, id: ItemId, time: u32) {
        if self.pick.grabbed_item != Some(id) {
            return;
        }
        log::debug!("item {id} released the pointer");
        self.pick.grabbed_item = None;
        self.host.ungrab_pointer(time);
    }

    /// Gives `id` the keyboard focus.
    ///
    /// The previous holder gets a focus-out event. A focus-in event follows
    /// only when focus moved from another item.
    pub fn grab_focus(&mut self, id: ItemId) -> Result<(), SceneError> {
        self.node(id)?;
        let previous = self.pick.focused_item;

        if previous.is_some() {
            self.emit_event(&CanvasEvent::focus(false));
        }

        self.pick.focused_item = Some(id);
        self.host.grab_focus();

        if previous.is_some() {
            self.emit_event(&CanvasEvent::focus(true));
        }
        Ok(())
    }

    /// Host entry point for button presses and releases.
    pub fn handle_button(&mut self, event: &CanvasEvent) -> bool {
        if event.button > 5 {
            return false;
        }
        let mask = ModifierState::for_button(event.button);

        match event.kind {
            EventKind::ButtonPress
            | EventKind::DoubleButtonPress
            | EventKind::TripleButtonPress => {
                // Pick as if the button were not yet down
                self.pick.state = event.state;
                self.pick_current_item(event, false);
                self.pick.state ^= mask;
                self.emit_event(event)
            }
            EventKind::ButtonRelease => {
                // Deliver as if still pressed, then repick as released
                self.pick.state = event.state;
                let handled = self.emit_event(event);
                let released = CanvasEvent {
                    state: event.state ^ mask,
                    ..event.clone()
                };
                self.pick.state = released.state;
                self.pick_current_item(&released, false);
                handled
            }
            _ => false,
        }
    }

    pub fn handle_motion(&mut self, event: &CanvasEvent) -> bool {
        self.pick.state = event.state;
        self.pick_current_item(event, false);
        self.emit_event(event)
    }

    pub fn handle_key(&mut self, event: &CanvasEvent) -> bool {
        self.emit_event(event)
    }

    /// The pointer entered or left the canvas window.
    pub fn handle_crossing(&mut self, event: &CanvasEvent) -> bool {
        self.pick.state = event.state;
        self.pick_current_item(event, false)
    }

    pub fn handle_focus_in(&mut self) -> bool {
        self.emit_focus_change(true)
    }

    pub fn handle_focus_out(&mut self) -> bool {
        self.emit_focus_change(false)
    }

    fn emit_focus_change(&mut self, focus_in: bool) -> bool {
        if self.pick.focused_item.is_none() {
            return false;
        }
        self.emit_event(&CanvasEvent::focus(focus_in))
    }
}
