//! Damage accumulation and repainting.

use crate::canvas::ItemBody;
use crate::{Canvas, DrawContext, ItemFlags, ItemId, Painter};
use canvas_core::{PixelRect, Region};
use glam::DVec2;

/// The area a host asks to have repainted.
#[derive(Clone, Debug, PartialEq)]
pub enum Clip {
    Rects(Vec<PixelRect>),
    /// The host's clip can't be expressed as rectangles; repaint its extents.
    Unrepresentable { extents: PixelRect },
}

impl Clip {
    pub fn rect(rect: PixelRect) -> Self {
        Clip::Rects(vec![rect])
    }

    fn to_region(&self) -> Region {
        match self {
            Clip::Rects(rects) => Region::from_rects(rects.iter().copied()),
            Clip::Unrepresentable { extents } => {
                log::debug!("clip is not rectangular, repainting its extents {extents:?}");
                Region::from_rect(*extents)
            }
        }
    }
}

impl Canvas {
    /// Adds `rect`, in canvas pixels, to the pending damage.
    ///
    /// Ignored while the canvas is not mapped. The host is asked for at most
    /// one repaint until the next [`Canvas::draw`].
    pub fn request_redraw_rect(&mut self, rect: PixelRect) {
        if !self.mapped || rect.is_empty() {
            return;
        }
        self.damage.union_rect(rect);
        if !self.repaint_queued {
            self.repaint_queued = true;
            self.host.queue_repaint();
        }
    }

    /// Damages the area a mapped item covered at its last update.
    pub(crate) fn request_redraw(&mut self, id: ItemId) {
        let Some(node) = self.items.get(id) else {
            return;
        };
        if node.is(ItemFlags::MAPPED) {
            let rect = PixelRect::covering(&node.pixel_bounds);
            self.request_redraw_rect(rect);
        }
    }

    /// Damage waiting for the next repaint.
    pub fn pending_damage(&self) -> &Region {
        &self.damage
    }

    /// Repaints the canvas inside `clip`.
    ///
    /// Pending updates run first so items draw with fresh geometry. The
    /// painted area is the pending damage within the clip, or the whole clip
    /// when nothing is damaged.
    pub fn draw(&mut self, painter: &mut dyn Painter, clip: &Clip) {
        let clip = clip.to_region();
        if clip.is_empty() {
            return;
        }

        self.remove_idle();
        if self.need_update {
            self.run_update_pass();
        }

        let region = if self.damage.is_empty() {
            clip
        } else {
            self.damage.intersect(&clip)
        };

        painter.draw_background(&region);
        if self.has_flags(self.root, ItemFlags::MAPPED) {
            self.draw_item(self.root, painter, DVec2::ZERO, &region);
        }

        self.damage.clear();
        self.repaint_queued = false;
    }

    fn draw_item(
        &self,
        id: ItemId,
        painter: &mut dyn Painter,
        item_to_world: DVec2,
        region: &Region,
    ) {
        let Some(node) = self.items.get(id) else {
            return;
        };
        match &node.body {
            ItemBody::Group(group) => {
                let child_to_world = item_to_world + group.offset;
                for &child in &group.children {
                    let Some(child_node) = self.items.get(child) else {
                        continue;
                    };
                    if child_node.is(ItemFlags::MAPPED)
                        && region.overlaps(&PixelRect::covering(&child_node.pixel_bounds))
                    {
                        self.draw_item(child, painter, child_to_world, region);
                    }
                }
            }
            ItemBody::Leaf(kind) => {
                let ctx = DrawContext {
                    item_to_world,
                    pixel_bounds: node.pixel_bounds,
                    viewport: &self.viewport,
                };
                kind.draw(painter, &ctx, region);
            }
        }
    }
}
