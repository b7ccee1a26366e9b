//! The canvas: item storage, host lifecycle and shared state.

use crate::{
    CanvasConfig, CanvasEvent, CanvasItem, EventMask, Host, ItemFlags, ItemId, ModifierState,
    SceneError,
};
use canvas_core::{Bounds, Region, Viewport};
use glam::{DVec2, IVec2};
use slotmap::SlotMap;
use std::rc::Rc;

/// An application callback attached to an item.
///
/// Returns `true` when the event is handled, which stops bubbling. A handler
/// may be re-entered when it triggers another event on the same item, so any
/// state it keeps lives behind a `Cell` or `RefCell`.
pub type EventHandler = Rc<dyn Fn(&mut Canvas, ItemId, &CanvasEvent) -> bool>;

pub(crate) struct ItemNode {
    pub(crate) parent: Option<ItemId>,
    pub(crate) flags: ItemFlags,
    /// Bounding box in canvas pixels as of the last update
    pub(crate) pixel_bounds: Bounds,
    pub(crate) body: ItemBody,
    pub(crate) handlers: Vec<EventHandler>,
}

pub(crate) enum ItemBody {
    Group(Group),
    Leaf(Box<dyn CanvasItem>),
}

#[derive(Default)]
pub(crate) struct Group {
    /// Back to front
    pub(crate) children: Vec<ItemId>,
    pub(crate) offset: DVec2,
}

impl ItemNode {
    pub(crate) fn new(parent: Option<ItemId>, body: ItemBody) -> Self {
        Self {
            parent,
            flags: ItemFlags::default(),
            pixel_bounds: Bounds::zero(),
            body,
            handlers: Vec::new(),
        }
    }

    pub(crate) fn group(&self) -> Option<&Group> {
        match &self.body {
            ItemBody::Group(group) => Some(group),
            ItemBody::Leaf(_) => None,
        }
    }

    pub(crate) fn is(&self, flags: ItemFlags) -> bool {
        self.flags.contains(flags)
    }
}

/// Pick, grab and focus bookkeeping. Holds ids only.
pub(crate) struct PickState {
    pub(crate) current_item: Option<ItemId>,
    pub(crate) new_current_item: Option<ItemId>,
    pub(crate) grabbed_item: Option<ItemId>,
    pub(crate) grab_mask: EventMask,
    pub(crate) focused_item: Option<ItemId>,
    /// Last event used for picking, replayed on repick
    pub(crate) pick_event: CanvasEvent,
    /// Modifier and button state as of the last input event
    pub(crate) state: ModifierState,
    /// The pointer left the current item while a button was held
    pub(crate) left_grabbed_item: bool,
    pub(crate) in_repick: bool,
}

impl Default for PickState {
    fn default() -> Self {
        Self {
            current_item: None,
            new_current_item: None,
            grabbed_item: None,
            grab_mask: EventMask::empty(),
            focused_item: None,
            pick_event: CanvasEvent::leave(DVec2::ZERO),
            state: ModifierState::empty(),
            left_grabbed_item: false,
            in_repick: false,
        }
    }
}

/// A retained-mode canvas.
///
/// Owns the item tree, the viewport and the scheduler state. The root
/// group exists for the canvas's whole lifetime.
pub struct Canvas {
    pub(crate) items: SlotMap<ItemId, ItemNode>,
    pub(crate) root: ItemId,
    pub(crate) viewport: Viewport,
    pub(crate) host: Box<dyn Host>,
    /// Pick tolerance in canvas pixels
    pub(crate) close_enough: i32,

    pub(crate) realized: bool,
    pub(crate) mapped: bool,

    pub(crate) need_update: bool,
    pub(crate) doing_update: bool,
    pub(crate) idle_pending: bool,
    pub(crate) need_repick: bool,

    pub(crate) damage: Region,
    pub(crate) repaint_queued: bool,

    pub(crate) pick: PickState,
}

impl Canvas {
    pub fn new(host: impl Host + 'static) -> Self {
        Self::build(CanvasConfig::default(), Box::new(host))
    }

    pub fn with_config(
        config: CanvasConfig,
        host: impl Host + 'static,
    ) -> Result<Self, SceneError> {
        config.validate()?;
        Ok(Self::build(config, Box::new(host)))
    }

    fn build(config: CanvasConfig, host: Box<dyn Host>) -> Self {
        let mut viewport = Viewport::new(config.scroll_region, config.pixels_per_unit);
        viewport.set_center_scroll_region(config.center_scroll_region);

        let mut items = SlotMap::with_key();
        let root = items.insert(ItemNode::new(None, ItemBody::Group(Group::default())));

        Self {
            items,
            root,
            viewport,
            host,
            close_enough: config.close_enough,
            realized: false,
            mapped: false,
            need_update: false,
            doing_update: false,
            idle_pending: false,
            need_repick: true,
            damage: Region::new(),
            repaint_queued: false,
            pick: PickState::default(),
        }
    }

    /// The root group.
    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn close_enough(&self) -> i32 {
        self.close_enough
    }

    pub fn set_close_enough(&mut self, pixels: i32) {
        self.close_enough = pixels;
        self.need_repick = true;
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub(crate) fn node(&self, id: ItemId) -> Result<&ItemNode, SceneError> {
        self.items.get(id).ok_or(SceneError::StaleItem(id))
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> Result<&mut ItemNode, SceneError> {
        self.items.get_mut(id).ok_or(SceneError::StaleItem(id))
    }

    pub(crate) fn has_flags(&self, id: ItemId, flags: ItemFlags) -> bool {
        self.items.get(id).is_some_and(|node| node.is(flags))
    }

    pub(crate) fn set_flags(&mut self, id: ItemId, flags: ItemFlags, on: bool) {
        if let Some(node) = self.items.get_mut(id) {
            node.flags.set(flags, on);
        }
    }

    pub(crate) fn children_of(&self, id: ItemId) -> Vec<ItemId> {
        self.items
            .get(id)
            .and_then(ItemNode::group)
            .map(|group| group.children.clone())
            .unwrap_or_default()
    }

    /// Typed access to a leaf's kind.
    pub fn item<T: CanvasItem>(&self, id: ItemId) -> Option<&T> {
        match &self.items.get(id)?.body {
            ItemBody::Leaf(kind) => (**kind).as_any().downcast_ref::<T>(),
            ItemBody::Group(_) => None,
        }
    }

    /// Changes a leaf's attributes in place.
    ///
    /// The item is scheduled for an update and the canvas for a repick.
    pub fn set_properties<T: CanvasItem, R>(
        &mut self,
        id: ItemId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, SceneError> {
        let kind = match &mut self.node_mut(id)?.body {
            ItemBody::Leaf(kind) => (**kind)
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or(SceneError::KindMismatch(id))?,
            ItemBody::Group(_) => return Err(SceneError::KindMismatch(id)),
        };
        let result = f(kind);
        self.request_update(id)?;
        self.need_repick = true;
        Ok(result)
    }

    /// Attaches an application event handler. Handlers run in the order they
    /// were added, before the item kind's own `on_event`.
    pub fn connect_event(
        &mut self,
        id: ItemId,
        handler: impl Fn(&mut Canvas, ItemId, &CanvasEvent) -> bool + 'static,
    ) -> Result<(), SceneError> {
        self.node_mut(id)?.handlers.push(Rc::new(handler));
        Ok(())
    }

    /// The hosting widget was realized.
    pub fn realize(&mut self) {
        if self.realized {
            return;
        }
        log::debug!("canvas realized");
        self.realized = true;
        if !self.has_flags(self.root, ItemFlags::REALIZED) {
            self.realize_item(self.root);
        }
    }

    /// The hosting widget is being unrealized.
    pub fn unrealize(&mut self) {
        if !self.realized {
            return;
        }
        log::debug!("canvas unrealized");
        self.shutdown_transients();
        if self.has_flags(self.root, ItemFlags::REALIZED) {
            self.unrealize_item(self.root);
        }
        self.realized = false;
        self.mapped = false;
    }

    /// The hosting widget was mapped on screen.
    pub fn map(&mut self) {
        if self.mapped {
            return;
        }
        self.realize();
        log::debug!("canvas mapped");
        self.mapped = true;
        let root = self.root;
        if self.has_flags(root, ItemFlags::VISIBLE) && !self.has_flags(root, ItemFlags::MAPPED) {
            self.map_item(root);
        }
    }

    /// The hosting widget was unmapped.
    pub fn unmap(&mut self) {
        if !self.mapped {
            return;
        }
        log::debug!("canvas unmapped");
        self.shutdown_transients();
        if self.has_flags(self.root, ItemFlags::MAPPED) {
            self.unmap_item(self.root);
        }
        self.mapped = false;
    }

    /// The hosting widget got a new size.
    pub fn size_allocate(&mut self, width: i32, height: i32) {
        let outcome = self.viewport.set_allocation(IVec2::new(width, height));
        self.apply_scroll_outcome(outcome);
    }

    /// Drops damage, releases the pointer grab and cancels the deferred pass.
    ///
    /// A pending update stays pending; it runs when the canvas is shown again.
    pub(crate) fn shutdown_transients(&mut self) {
        self.damage.clear();
        self.repaint_queued = false;
        if let Some(grabbed) = self.pick.grabbed_item {
            self.ungrab(grabbed, 0);
        }
        self.remove_idle();
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        let root = self.root;
        if self.has_flags(root, ItemFlags::MAPPED) {
            self.unmap_item(root);
        }
        if self.has_flags(root, ItemFlags::REALIZED) {
            self.unrealize_item(root);
        }
        self.shutdown_transients();
    }
}
