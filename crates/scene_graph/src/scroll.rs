//! Scrolling, zooming and coordinate conversion.

use crate::{Canvas, ItemFlags, SceneError};
use canvas_core::viewport::{ScrollOutcome, MIN_PIXELS_PER_UNIT};
use canvas_core::{Bounds, PixelRect};
use glam::{DVec2, IVec2};

impl Canvas {
    /// Reacts to a viewport change.
    ///
    /// New centring offsets move every item on screen, so the whole tree is
    /// updated and the visible area repainted.
    pub(crate) fn apply_scroll_outcome(&mut self, outcome: ScrollOutcome) {
        if outcome.zoom_offset_changed {
            log::debug!("zoom offset now {}", self.viewport.zoom_offset());
            self.mark_root_deep_update();
        }
        if outcome.zoom_offset_changed || outcome.scroll_changed {
            self.redraw_visible_area();
        }
    }

    fn mark_root_deep_update(&mut self) {
        let root = self.root;
        if !self.has_flags(root, ItemFlags::NEED_DEEP_UPDATE) {
            self.set_flags(root, ItemFlags::NEED_DEEP_UPDATE, true);
            self.request_canvas_update();
        }
    }

    fn redraw_visible_area(&mut self) {
        let origin = self.viewport.scroll_offsets();
        let size = self.viewport.allocation();
        self.request_redraw_rect(PixelRect::from_origin_size(origin.x, origin.y, size.x, size.y));
    }

    /// Scrolls so canvas pixel `(cx, cy)` is at the top-left of the view.
    pub fn scroll_to(&mut self, cx: i32, cy: i32) {
        let outcome = self.viewport.scroll_to(IVec2::new(cx, cy));
        self.apply_scroll_outcome(outcome);
    }

    pub fn scroll_offsets(&self) -> IVec2 {
        self.viewport.scroll_offsets()
    }

    pub fn scroll_region(&self) -> Bounds {
        self.viewport.scroll_region()
    }

    /// Replaces the scrollable world area, keeping the visible contents in
    /// place where possible.
    pub fn set_scroll_region(&mut self, region: Bounds) {
        let Some(outcome) = self.viewport.set_scroll_region(region) else {
            return;
        };
        log::debug!("scroll region now {:?}", region);
        self.apply_scroll_outcome(outcome);
        self.need_repick = true;
        self.mark_root_deep_update();
    }

    pub fn set_center_scroll_region(&mut self, center: bool) {
        let outcome = self.viewport.set_center_scroll_region(center);
        self.apply_scroll_outcome(outcome);
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.viewport.pixels_per_unit()
    }

    /// Sets the zoom factor, keeping the centre of the view fixed.
    pub fn set_pixels_per_unit(&mut self, n: f64) -> Result<(), SceneError> {
        if n.is_nan() || n <= MIN_PIXELS_PER_UNIT {
            return Err(SceneError::InvalidZoom(n));
        }
        log::debug!("zoom {} -> {n}", self.viewport.pixels_per_unit());

        self.mark_root_deep_update();
        let outcome = self.viewport.set_pixels_per_unit(n);
        self.apply_scroll_outcome(outcome);
        self.need_repick = true;
        Ok(())
    }

    pub fn world_to_canvas_pixel(&self, world: DVec2) -> IVec2 {
        self.viewport.world_to_canvas_pixel(world)
    }

    pub fn world_to_canvas(&self, world: DVec2) -> DVec2 {
        self.viewport.world_to_canvas(world)
    }

    pub fn canvas_pixel_to_world(&self, pixel: IVec2) -> DVec2 {
        self.viewport.canvas_pixel_to_world(pixel)
    }

    pub fn window_to_world(&self, window: DVec2) -> DVec2 {
        self.viewport.window_to_world(window)
    }

    pub fn world_to_window(&self, world: DVec2) -> DVec2 {
        self.viewport.world_to_window(world)
    }
}

#[cfg(test)]
mod tests {
    use crate::scene_graph_test::mapped_canvas;
    use crate::{Bounds, ItemFlags, SceneError};
    use glam::{DVec2, IVec2};

    #[test]
    fn test_zoom_rejects_tiny_factors() {
        let (mut canvas, _host) = mapped_canvas();
        assert_eq!(canvas.set_pixels_per_unit(0.0), Err(SceneError::InvalidZoom(0.0)));
        assert_eq!(canvas.pixels_per_unit(), 1.0);

        canvas.set_pixels_per_unit(2.0).unwrap();
        assert_eq!(canvas.pixels_per_unit(), 2.0);
        let root = canvas.root();
        assert!(canvas.flags(root).unwrap().contains(ItemFlags::NEED_DEEP_UPDATE));
        canvas.run_idle();
        assert!(!canvas.flags(root).unwrap().contains(ItemFlags::NEED_DEEP_UPDATE));
    }

    #[test]
    fn test_scroll_to_clamps_to_region() {
        let (mut canvas, host) = mapped_canvas();
        canvas.set_scroll_region(Bounds::from_edges(0.0, 0.0, 1000.0, 1000.0));
        canvas.run_idle();
        host.reset();

        canvas.scroll_to(250, 5000);
        assert_eq!(canvas.scroll_offsets(), IVec2::new(250, 900));
        assert_eq!(host.log().repaints_queued, 1);

        canvas.scroll_to(-10, 0);
        assert_eq!(canvas.scroll_offsets(), IVec2::ZERO);
    }

    #[test]
    fn test_centred_region_moves_items() {
        let (mut canvas, _host) = mapped_canvas();
        canvas.set_scroll_region(Bounds::from_edges(0.0, 0.0, 50.0, 50.0));
        canvas.set_center_scroll_region(true);

        assert_eq!(canvas.viewport().zoom_offset(), IVec2::new(25, 25));
        assert_eq!(canvas.world_to_canvas_pixel(DVec2::ZERO), IVec2::new(25, 25));
        assert_eq!(canvas.window_to_world(DVec2::new(25.0, 25.0)), DVec2::ZERO);
    }
}
