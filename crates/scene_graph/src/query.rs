//! Read-only inspection of items, for accessibility bridges and tooling.

use crate::{Canvas, ItemFlags, ItemId, SceneError};
use canvas_core::{Bounds, PixelRect};

impl Canvas {
    pub fn flags(&self, id: ItemId) -> Result<ItemFlags, SceneError> {
        Ok(self.node(id)?.flags)
    }

    pub fn parent(&self, id: ItemId) -> Result<Option<ItemId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    /// Children back to front. Leaves have none.
    pub fn children(&self, id: ItemId) -> Result<&[ItemId], SceneError> {
        Ok(self
            .node(id)?
            .group()
            .map(|group| group.children.as_slice())
            .unwrap_or_default())
    }

    pub fn is_group(&self, id: ItemId) -> Result<bool, SceneError> {
        Ok(self.node(id)?.group().is_some())
    }

    pub fn is_visible(&self, id: ItemId) -> Result<bool, SceneError> {
        Ok(self.node(id)?.is(ItemFlags::VISIBLE))
    }

    pub fn is_item_mapped(&self, id: ItemId) -> Result<bool, SceneError> {
        Ok(self.node(id)?.is(ItemFlags::MAPPED))
    }

    pub fn is_item_realized(&self, id: ItemId) -> Result<bool, SceneError> {
        Ok(self.node(id)?.is(ItemFlags::REALIZED))
    }

    pub fn needs_update(&self, id: ItemId) -> Result<bool, SceneError> {
        Ok(self.node(id)?.is(ItemFlags::NEED_UPDATE))
    }

    pub fn is_focused(&self, id: ItemId) -> bool {
        self.pick.focused_item == Some(id)
    }

    /// Position among the item's siblings, 0 being the bottom. The root is 0.
    pub fn z_index(&self, id: ItemId) -> Result<usize, SceneError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(0);
        };
        self.children(parent)?
            .iter()
            .position(|&child| child == id)
            .ok_or(SceneError::StaleItem(id))
    }

    /// Bounding box in canvas pixels as of the last update pass.
    pub fn pixel_bounds(&self, id: ItemId) -> Result<Bounds, SceneError> {
        Ok(self.node(id)?.pixel_bounds)
    }

    /// The item's bounds on screen, relative to the visible area.
    pub fn item_extents(&self, id: ItemId) -> Result<PixelRect, SceneError> {
        let mut bounds = self.get_bounds(id)?;
        if id == self.root {
            // Root bounds are reported without its own offset
            bounds = bounds.translate(self.group_offset(id)?);
        }
        let world = bounds.translate(self.item_to_world_offset(id));
        let canvas = self.viewport.world_to_canvas_bounds(&world);
        let scroll = self.viewport.scroll_offsets();

        let round = |v: f64| (v + 0.5).floor() as i32;
        Ok(PixelRect::new(
            round(canvas.min.x),
            round(canvas.min.y),
            round(canvas.max.x),
            round(canvas.max.y),
        )
        .translate(-scroll.x, -scroll.y))
    }

    /// Whether any part of the item's extents lies inside the allocation.
    pub fn is_item_on_screen(&self, id: ItemId) -> Result<bool, SceneError> {
        let rect = self.item_extents(id)?;
        let allocation = self.viewport.allocation();
        Ok(!(rect.x2 < 0 || rect.y2 < 0 || rect.x1 > allocation.x || rect.y1 > allocation.y))
    }
}
