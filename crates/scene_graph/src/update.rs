//! Coalesced update requests and the update pass.

use crate::canvas::ItemBody;
use crate::{contract_violation, Canvas, ItemFlags, ItemId, SceneError, UpdateContext, UpdateFlags};
use canvas_core::{Bounds, PixelRect};
use glam::DVec2;

impl Canvas {
    /// Asks for the item to be updated in the next pass.
    ///
    /// Requests coalesce: the item and its ancestors are flagged and the
    /// host is asked for at most one deferred pass.
    pub fn request_update(&mut self, id: ItemId) -> Result<(), SceneError> {
        self.node(id)?;
        self.schedule_item_update(id);
        Ok(())
    }

    pub(crate) fn schedule_item_update(&mut self, id: ItemId) {
        if self.doing_update {
            contract_violation!("item {id} requested an update during the update pass");
            return;
        }

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.items.get_mut(current) else {
                return;
            };
            if node.is(ItemFlags::NEED_UPDATE) {
                return;
            }
            node.flags.insert(ItemFlags::NEED_UPDATE);
            cursor = node.parent;
        }
        self.request_canvas_update();
    }

    /// Marks the whole canvas as needing an update pass.
    pub(crate) fn request_canvas_update(&mut self) {
        self.need_update = true;
        self.schedule_idle();
    }

    fn schedule_idle(&mut self) {
        if !self.idle_pending {
            self.idle_pending = true;
            self.host.schedule_update();
        }
    }

    pub(crate) fn remove_idle(&mut self) {
        if self.idle_pending {
            self.host.cancel_update();
            self.idle_pending = false;
        }
    }

    /// Runs the deferred pass the host scheduled.
    pub fn run_idle(&mut self) {
        self.do_update();
        self.idle_pending = false;
    }

    /// Forces pending updates to run immediately.
    ///
    /// Does nothing when there is neither a pending update nor pending damage.
    pub fn update_now(&mut self) {
        if !self.need_update && self.damage.is_empty() {
            return;
        }
        self.remove_idle();
        self.do_update();
    }

    /// Runs the update pass and repicks until both settle.
    ///
    /// Handlers run during a repick may request updates again.
    pub(crate) fn do_update(&mut self) {
        loop {
            if self.need_update {
                self.run_update_pass();
            }

            while self.need_repick {
                self.need_repick = false;
                self.repick();
            }

            if !self.need_update {
                break;
            }
        }
    }

    pub(crate) fn run_update_pass(&mut self) {
        if self.doing_update {
            contract_violation!("update pass entered recursively");
            return;
        }
        log::trace!("update pass over {} items", self.items.len());

        self.doing_update = true;
        self.invoke_update(self.root, DVec2::ZERO, UpdateFlags::empty());
        self.doing_update = false;
        self.need_update = false;
    }

    fn invoke_update(&mut self, id: ItemId, item_to_world: DVec2, flags: UpdateFlags) {
        let Some(node) = self.items.get(id) else {
            return;
        };

        let mut child_flags = flags - UpdateFlags::REQUESTED;
        if node.is(ItemFlags::NEED_UPDATE) {
            child_flags |= UpdateFlags::REQUESTED;
        }
        if node.is(ItemFlags::NEED_DEEP_UPDATE) {
            child_flags |= UpdateFlags::DEEP;
        }

        if !child_flags.is_empty() {
            self.update_item(id, item_to_world, child_flags);
        }

        if self.has_flags(id, ItemFlags::NEED_UPDATE) {
            contract_violation!("item {id} still needs an update after the update pass");
        }
    }

    fn update_item(&mut self, id: ItemId, item_to_world: DVec2, flags: UpdateFlags) {
        let Some(node) = self.items.get_mut(id) else {
            return;
        };
        node.flags.remove(ItemFlags::NEED_UPDATE | ItemFlags::NEED_DEEP_UPDATE);

        if let Some(group) = node.group() {
            let child_to_world = item_to_world + group.offset;
            let children = group.children.clone();
            for &child in &children {
                self.invoke_update(child, child_to_world, flags);
            }

            let pixel_bounds = Bounds::union_all(
                children
                    .iter()
                    .filter_map(|&child| self.items.get(child))
                    .filter(|child| child.is(ItemFlags::MAPPED))
                    .map(|child| child.pixel_bounds),
            )
            .unwrap_or_else(Bounds::zero);
            if let Some(node) = self.items.get_mut(id) {
                node.pixel_bounds = pixel_bounds;
            }
            return;
        }

        let ItemBody::Leaf(kind) = &mut node.body else {
            return;
        };
        let ctx = UpdateContext {
            item_to_world,
            flags,
            viewport: &self.viewport,
        };
        let new_bounds = kind.update(&ctx);
        let old_bounds = std::mem::replace(&mut node.pixel_bounds, new_bounds);

        let moved = old_bounds != new_bounds;
        if node.is(ItemFlags::MAPPED) && (moved || flags.contains(UpdateFlags::REQUESTED)) {
            self.request_redraw_rect(PixelRect::covering(&old_bounds));
            if moved {
                self.request_redraw_rect(PixelRect::covering(&new_bounds));
            }
        }
    }
}
