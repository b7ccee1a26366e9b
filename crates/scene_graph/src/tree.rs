//! Building and restructuring the item tree.

use crate::canvas::{Group, ItemBody, ItemNode};
use crate::{Canvas, CanvasItem, ItemFlags, ItemId, SceneError};
use canvas_core::Bounds;
use glam::DVec2;

impl Canvas {
    /// Creates an empty group on top of `parent`'s children.
    pub fn create_group(&mut self, parent: ItemId, offset: DVec2) -> Result<ItemId, SceneError> {
        self.construct(
            parent,
            ItemBody::Group(Group {
                children: Vec::new(),
                offset,
            }),
        )
    }

    /// Creates a leaf item on top of `parent`'s children.
    pub fn create_item(
        &mut self,
        parent: ItemId,
        kind: impl CanvasItem,
    ) -> Result<ItemId, SceneError> {
        self.construct(parent, ItemBody::Leaf(Box::new(kind)))
    }

    fn construct(&mut self, parent: ItemId, body: ItemBody) -> Result<ItemId, SceneError> {
        if self.node(parent)?.group().is_none() {
            return Err(SceneError::NotAGroup(parent));
        }
        let id = self.items.insert(ItemNode::new(Some(parent), body));
        log::trace!("created item {id} in group {parent}");
        self.group_add(parent, id);
        self.redraw_and_repick_if_mapped(id);
        Ok(id)
    }

    /// Appends `item` to `group` and brings it in line with the group's state.
    fn group_add(&mut self, group: ItemId, item: ItemId) {
        if let Some(ItemBody::Group(g)) = self.items.get_mut(group).map(|n| &mut n.body) {
            g.children.push(item);
        }

        let visible = self.has_flags(item, ItemFlags::VISIBLE);
        if visible && self.has_flags(group, ItemFlags::MAPPED) {
            if !self.has_flags(item, ItemFlags::REALIZED) {
                self.realize_item(item);
            }
            if !self.has_flags(item, ItemFlags::MAPPED) {
                self.map_item(item);
            }
        }
        if visible {
            self.queue_resize();
        }
    }

    /// Detaches `item` from `group`, unmapping and unrealizing it first.
    fn group_remove(&mut self, group: ItemId, item: ItemId) {
        if self.has_flags(item, ItemFlags::MAPPED) {
            self.unmap_item(item);
        }
        if self.has_flags(item, ItemFlags::REALIZED) {
            self.unrealize_item(item);
        }
        if self.has_flags(item, ItemFlags::VISIBLE) {
            self.queue_resize();
        }
        if let Some(node) = self.items.get_mut(item) {
            node.parent = None;
        }
        if let Some(ItemBody::Group(g)) = self.items.get_mut(group).map(|n| &mut n.body) {
            g.children.retain(|&child| child != item);
        }
    }

    pub(crate) fn realize_item(&mut self, id: ItemId) {
        let Some(node) = self.items.get_mut(id) else {
            return;
        };
        if let ItemBody::Leaf(kind) = &mut node.body {
            kind.realize();
        }
        let parent = node.parent;
        if let Some(parent) = parent {
            if !self.has_flags(parent, ItemFlags::REALIZED) {
                self.realize_item(parent);
            }
        }
        self.set_flags(id, ItemFlags::REALIZED, true);
        self.schedule_item_update(id);
    }

    pub(crate) fn unrealize_item(&mut self, id: ItemId) {
        if self.has_flags(id, ItemFlags::MAPPED) {
            self.unmap_item(id);
        }
        // Groups unmap before their children unrealize
        for child in self.children_of(id) {
            if self.has_flags(child, ItemFlags::REALIZED) {
                self.unrealize_item(child);
            }
        }
        if let Some(node) = self.items.get_mut(id) {
            if let ItemBody::Leaf(kind) = &mut node.body {
                kind.unrealize();
            }
            node.flags.remove(ItemFlags::REALIZED);
        }
    }

    pub(crate) fn map_item(&mut self, id: ItemId) {
        for child in self.children_of(id) {
            if self.has_flags(child, ItemFlags::VISIBLE)
                && !self.has_flags(child, ItemFlags::MAPPED)
            {
                if !self.has_flags(child, ItemFlags::REALIZED) {
                    self.realize_item(child);
                }
                self.map_item(child);
            }
        }
        if let Some(node) = self.items.get_mut(id) {
            if let ItemBody::Leaf(kind) = &mut node.body {
                kind.map();
            }
            node.flags.insert(ItemFlags::MAPPED);
        }
    }

    pub(crate) fn unmap_item(&mut self, id: ItemId) {
        for child in self.children_of(id) {
            if self.has_flags(child, ItemFlags::MAPPED) {
                self.unmap_item(child);
            }
        }
        if let Some(node) = self.items.get_mut(id) {
            if let ItemBody::Leaf(kind) = &mut node.body {
                kind.unmap();
            }
            node.flags.remove(ItemFlags::MAPPED);
        }
    }

    pub(crate) fn redraw_and_repick_if_mapped(&mut self, id: ItemId) {
        if self.has_flags(id, ItemFlags::MAPPED) {
            self.request_redraw(id);
            self.need_repick = true;
        }
    }

    pub(crate) fn queue_resize(&mut self) {
        if self.mapped {
            self.host.queue_resize();
        }
    }

    /// Makes the item visible, realizing and mapping it if its parent is mapped.
    pub fn show(&mut self, id: ItemId) -> Result<(), SceneError> {
        let node = self.node(id)?;
        if node.is(ItemFlags::VISIBLE) {
            return Ok(());
        }
        let parent = node.parent;
        self.set_flags(id, ItemFlags::VISIBLE, true);

        if !self.has_flags(id, ItemFlags::REALIZED) {
            self.realize_item(id);
        }
        let parent_mapped = match parent {
            Some(parent) => self.has_flags(parent, ItemFlags::MAPPED),
            None => self.mapped,
        };
        if parent_mapped && !self.has_flags(id, ItemFlags::MAPPED) {
            self.map_item(id);
        }

        self.redraw_and_repick_if_mapped(id);
        self.queue_resize();
        Ok(())
    }

    /// Hides the item. Hidden items are unmapped but stay realized.
    pub fn hide(&mut self, id: ItemId) -> Result<(), SceneError> {
        if !self.node(id)?.is(ItemFlags::VISIBLE) {
            return Ok(());
        }
        self.set_flags(id, ItemFlags::VISIBLE, false);

        self.redraw_and_repick_if_mapped(id);
        if self.has_flags(id, ItemFlags::MAPPED) {
            self.unmap_item(id);
        }
        self.queue_resize();
        Ok(())
    }

    /// Translates the item by `delta` in its parent's coordinates.
    pub fn move_item(&mut self, id: ItemId, delta: DVec2) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        match &mut node.body {
            ItemBody::Group(group) => group.offset += delta,
            ItemBody::Leaf(kind) => kind.translate(delta),
        }
        if node.is(ItemFlags::MAPPED) {
            self.need_repick = true;
        }
        self.mark_deep_update(id)
    }

    /// Sets a group's offset relative to its parent.
    pub fn set_group_offset(&mut self, group: ItemId, offset: DVec2) -> Result<(), SceneError> {
        let moved = match &mut self.node_mut(group)?.body {
            ItemBody::Group(g) => {
                let moved = g.offset != offset;
                g.offset = offset;
                moved
            }
            ItemBody::Leaf(_) => return Err(SceneError::NotAGroup(group)),
        };
        self.need_repick = true;
        if moved {
            self.mark_deep_update(group)?;
        }
        Ok(())
    }

    pub fn group_offset(&self, group: ItemId) -> Result<DVec2, SceneError> {
        self.node(group)?
            .group()
            .map(|g| g.offset)
            .ok_or(SceneError::NotAGroup(group))
    }

    /// Flags the item's subtree for recomputation and asks its parent for an update.
    pub(crate) fn mark_deep_update(&mut self, id: ItemId) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        if node.is(ItemFlags::NEED_DEEP_UPDATE) {
            return Ok(());
        }
        node.flags.insert(ItemFlags::NEED_DEEP_UPDATE);
        match node.parent {
            Some(parent) => self.request_update(parent),
            None => {
                self.request_canvas_update();
                Ok(())
            }
        }
    }

    /// Moves `item` to the top of `new_group`, keeping its local coordinates.
    pub fn reparent(&mut self, item: ItemId, new_group: ItemId) -> Result<(), SceneError> {
        self.node(item)?;
        if self.node(new_group)?.group().is_none() {
            return Err(SceneError::NotAGroup(new_group));
        }
        if self.is_descendant(new_group, item) {
            return Err(SceneError::WouldCycle {
                item,
                group: new_group,
            });
        }
        let Some(old_group) = self.node(item)?.parent else {
            return Err(SceneError::RootItem("reparented"));
        };
        log::debug!("reparenting item {item} from group {old_group} to {new_group}");

        self.request_redraw(item);
        self.group_remove(old_group, item);
        self.node_mut(item)?.parent = Some(new_group);
        self.group_add(new_group, item);
        self.redraw_and_repick_if_mapped(item);
        self.mark_deep_update(item)
    }

    /// Destroys an item and everything below it.
    pub fn destroy(&mut self, id: ItemId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootItem("destroyed"));
        }
        self.node(id)?;
        log::debug!("destroying item {id}");
        self.destroy_item(id);
        Ok(())
    }

    fn destroy_item(&mut self, id: ItemId) {
        self.request_redraw(id);

        if self.pick.current_item == Some(id) {
            self.pick.current_item = None;
            self.need_repick = true;
        }
        if self.pick.new_current_item == Some(id) {
            self.pick.new_current_item = None;
            self.need_repick = true;
        }
        self.ungrab(id, 0);
        if self.pick.focused_item == Some(id) {
            self.pick.focused_item = None;
        }

        if self.has_flags(id, ItemFlags::MAPPED) {
            self.unmap_item(id);
        }
        if self.has_flags(id, ItemFlags::REALIZED) {
            self.unrealize_item(id);
        }
        if let Some(parent) = self.items.get(id).and_then(|node| node.parent) {
            self.group_remove(parent, id);
        }

        for child in self.children_of(id) {
            self.destroy_item(child);
        }
        self.items.remove(id);
    }

    /// True if `item` is `ancestor` or lies below it.
    pub fn is_descendant(&self, item: ItemId, ancestor: ItemId) -> bool {
        let mut cursor = Some(item);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.items.get(id).and_then(|node| node.parent);
        }
        false
    }

    /// Sum of the offsets of every group above `id`.
    pub(crate) fn item_to_world_offset(&self, id: ItemId) -> DVec2 {
        let mut offset = DVec2::ZERO;
        let mut cursor = self.items.get(id).and_then(|node| node.parent);
        while let Some(group) = cursor {
            let Some(node) = self.items.get(group) else {
                break;
            };
            if let Some(g) = node.group() {
                offset += g.offset;
            }
            cursor = node.parent;
        }
        offset
    }

    /// Converts a point from `id`'s item coordinates to world coordinates.
    pub fn item_to_world(&self, id: ItemId, point: DVec2) -> Result<DVec2, SceneError> {
        self.node(id)?;
        Ok(point + self.item_to_world_offset(id))
    }

    /// Converts a point from world coordinates to `id`'s item coordinates.
    pub fn world_to_item(&self, id: ItemId, point: DVec2) -> Result<DVec2, SceneError> {
        self.node(id)?;
        Ok(point - self.item_to_world_offset(id))
    }

    /// The item's bounding box in its parent's coordinate system.
    ///
    /// A group reports the union of its mapped children, or an empty box when
    /// none are mapped.
    pub fn get_bounds(&self, id: ItemId) -> Result<Bounds, SceneError> {
        let node = self.node(id)?;
        match &node.body {
            ItemBody::Leaf(kind) => Ok(kind.bounds()),
            ItemBody::Group(group) => {
                let mapped = group
                    .children
                    .iter()
                    .filter(|&&child| self.has_flags(child, ItemFlags::MAPPED))
                    .filter_map(|&child| self.get_bounds(child).ok());
                let Some(bounds) = Bounds::union_all(mapped) else {
                    return Ok(Bounds::zero());
                };
                // The root has no parent to be relative to
                Ok(match node.parent {
                    Some(_) => bounds.translate(group.offset),
                    None => bounds,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::scene_graph_test::{mapped_canvas, Block};
    use crate::{ItemFlags, SceneError};
    use canvas_core::Bounds;
    use glam::DVec2;

    #[test]
    fn test_construct_maps_under_mapped_parent() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let id = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();

        assert!(canvas.flags(id).unwrap().contains(ItemFlags::REALIZED | ItemFlags::MAPPED));
        assert!(canvas.needs_update(id).unwrap());
        assert_eq!(canvas.children(root).unwrap(), &[id]);
    }

    #[test]
    fn test_construct_requires_group_parent() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let leaf = canvas.create_item(root, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        assert_eq!(
            canvas.create_item(leaf, Block::new(0.0, 0.0, 1.0, 1.0)),
            Err(SceneError::NotAGroup(leaf))
        );
    }

    #[test]
    fn test_hide_keeps_item_realized() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let id = canvas.create_item(root, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();

        canvas.hide(id).unwrap();
        let flags = canvas.flags(id).unwrap();
        assert!(!flags.contains(ItemFlags::MAPPED));
        assert!(!flags.contains(ItemFlags::VISIBLE));
        assert!(flags.contains(ItemFlags::REALIZED));

        canvas.show(id).unwrap();
        assert!(canvas.flags(id).unwrap().contains(ItemFlags::MAPPED | ItemFlags::VISIBLE));
    }

    #[test]
    fn test_group_bounds_union_of_mapped_children() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let group = canvas.create_group(root, DVec2::new(100.0, 0.0)).unwrap();

        // No mapped children yields an empty box
        assert_eq!(canvas.get_bounds(group).unwrap(), Bounds::zero());

        canvas.create_item(group, Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let hidden = canvas.create_item(group, Block::new(50.0, 50.0, 60.0, 60.0)).unwrap();
        canvas.create_item(group, Block::new(-5.0, 2.0, 5.0, 20.0)).unwrap();
        canvas.hide(hidden).unwrap();

        assert_eq!(
            canvas.get_bounds(group).unwrap(),
            Bounds::from_edges(95.0, 0.0, 110.0, 20.0)
        );
    }

    #[test]
    fn test_world_item_round_trip_through_nested_groups() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let outer = canvas.create_group(root, DVec2::new(10.0, 20.0)).unwrap();
        let inner = canvas.create_group(outer, DVec2::new(-3.0, 4.5)).unwrap();
        let leaf = canvas.create_item(inner, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        let world = canvas.item_to_world(leaf, DVec2::new(1.0, 1.0)).unwrap();
        assert_eq!(world, DVec2::new(8.0, 25.5));
        assert_eq!(canvas.world_to_item(leaf, world).unwrap(), DVec2::new(1.0, 1.0));
    }

    #[test]
    fn test_move_marks_deep_update() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let group = canvas.create_group(root, DVec2::ZERO).unwrap();
        canvas.run_idle();

        canvas.move_item(group, DVec2::new(5.0, 5.0)).unwrap();
        assert_eq!(canvas.group_offset(group).unwrap(), DVec2::new(5.0, 5.0));
        assert!(canvas.flags(group).unwrap().contains(ItemFlags::NEED_DEEP_UPDATE));
        assert!(canvas.needs_update(root).unwrap());
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let (mut canvas, _host) = mapped_canvas();
        let root = canvas.root();
        let group = canvas.create_group(root, DVec2::ZERO).unwrap();
        let leaf = canvas.create_item(group, Block::new(0.0, 0.0, 1.0, 1.0)).unwrap();

        canvas.destroy(group).unwrap();
        assert!(!canvas.contains(group));
        assert!(!canvas.contains(leaf));
        assert!(canvas.children(root).unwrap().is_empty());
        assert_eq!(canvas.destroy(root), Err(SceneError::RootItem("destroyed")));
        assert_eq!(canvas.destroy(leaf), Err(SceneError::StaleItem(leaf)));
    }
}
