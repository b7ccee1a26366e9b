//! World ↔ canvas-pixel mapping
//!
//! A [`Viewport`] owns the scroll region (the world rectangle that can be
//! scrolled over), the zoom factor, the scroll position of the host's
//! adjustments and the centring offsets used when the scroll region is
//! smaller than the allocation.
//!
//! Canvas pixels and window coordinates coincide: the host scrolls a
//! window that is as large as the whole scroll region, so a window
//! position is already a canvas-pixel position.

use crate::Bounds;
use glam::{DVec2, IVec2};

/// Smallest accepted pixels-per-unit factor.
pub const MIN_PIXELS_PER_UNIT: f64 = 1e-10;

/// What a call to [`Viewport::scroll_to`] changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// The centring offsets moved; every item's pixel position is stale.
    pub zoom_offset_changed: bool,
    /// The scroll position moved.
    pub scroll_changed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    scroll_region: Bounds,
    pixels_per_unit: f64,
    center_scroll_region: bool,
    /// Scroll position of the horizontal and vertical adjustments
    scroll: IVec2,
    /// Centring offsets applied when the region is narrower than the allocation
    zoom_offset: IVec2,
    allocation: IVec2,
    /// Size of the scrollable window in pixels
    layout_size: IVec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Bounds::from_edges(0.0, 0.0, 100.0, 100.0), 1.0)
    }
}

impl Viewport {
    pub fn new(scroll_region: Bounds, pixels_per_unit: f64) -> Self {
        let layout_size = IVec2::new(
            scroll_region.width().round() as i32,
            scroll_region.height().round() as i32,
        );
        Self {
            scroll_region,
            pixels_per_unit,
            center_scroll_region: false,
            scroll: IVec2::ZERO,
            zoom_offset: IVec2::ZERO,
            allocation: IVec2::ZERO,
            layout_size,
        }
    }

    pub fn scroll_region(&self) -> Bounds {
        self.scroll_region
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    pub fn center_scroll_region(&self) -> bool {
        self.center_scroll_region
    }

    pub fn scroll_offsets(&self) -> IVec2 {
        self.scroll
    }

    pub fn zoom_offset(&self) -> IVec2 {
        self.zoom_offset
    }

    pub fn allocation(&self) -> IVec2 {
        self.allocation
    }

    pub fn layout_size(&self) -> IVec2 {
        self.layout_size
    }

    /// World point to the nearest canvas pixel.
    pub fn world_to_canvas_pixel(&self, world: DVec2) -> IVec2 {
        let p = self.world_to_canvas(world);
        IVec2::new((p.x + 0.5).floor() as i32, (p.y + 0.5).floor() as i32)
    }

    /// World point to fractional canvas pixels.
    pub fn world_to_canvas(&self, world: DVec2) -> DVec2 {
        (world - self.scroll_region.min) * self.pixels_per_unit + self.zoom_offset.as_dvec2()
    }

    /// World rectangle to fractional canvas pixels.
    pub fn world_to_canvas_bounds(&self, world: &Bounds) -> Bounds {
        world.map_corners(|p| self.world_to_canvas(p))
    }

    pub fn canvas_pixel_to_world(&self, pixel: IVec2) -> DVec2 {
        self.canvas_to_world(pixel.as_dvec2())
    }

    pub fn canvas_to_world(&self, canvas: DVec2) -> DVec2 {
        (canvas - self.zoom_offset.as_dvec2()) / self.pixels_per_unit + self.scroll_region.min
    }

    pub fn window_to_world(&self, window: DVec2) -> DVec2 {
        self.canvas_to_world(window)
    }

    pub fn world_to_window(&self, world: DVec2) -> DVec2 {
        self.world_to_canvas(world)
    }

    /// Scrolls so that canvas pixel `target` is at the top-left of the
    /// allocation, clamping to the scroll region.
    ///
    /// When the region is smaller than the allocation along an axis the
    /// scroll position on that axis is pinned to zero and, if centring is on,
    /// the region is centred with the zoom offset.
    pub fn scroll_to(&mut self, target: IVec2) -> ScrollOutcome {
        let scroll_size = IVec2::new(
            (self.scroll_region.width() * self.pixels_per_unit + 0.5).floor() as i32,
            (self.scroll_region.height() * self.pixels_per_unit + 0.5).floor() as i32,
        );
        let old_zoom_offset = self.zoom_offset;

        let (x, zoom_x, layout_w) = clamp_axis(
            target.x,
            scroll_size.x,
            self.allocation.x,
            self.center_scroll_region,
        );
        let (y, zoom_y, layout_h) = clamp_axis(
            target.y,
            scroll_size.y,
            self.allocation.y,
            self.center_scroll_region,
        );

        self.zoom_offset = IVec2::new(zoom_x, zoom_y);
        let scroll = IVec2::new(x, y);
        let scroll_changed = scroll != self.scroll;
        self.scroll = scroll;
        self.layout_size = IVec2::new(layout_w, layout_h);

        ScrollOutcome {
            zoom_offset_changed: self.zoom_offset != old_zoom_offset,
            scroll_changed,
        }
    }

    /// Records a new allocation and re-clamps the current scroll position.
    pub fn set_allocation(&mut self, allocation: IVec2) -> ScrollOutcome {
        self.allocation = allocation;
        self.scroll_to(self.scroll)
    }

    pub fn set_center_scroll_region(&mut self, center: bool) -> ScrollOutcome {
        self.center_scroll_region = center;
        self.scroll_to(self.scroll)
    }

    /// Replaces the scroll region, keeping the world point at the top-left of
    /// the view where it was.
    ///
    /// Returns `None` when the region is unchanged.
    pub fn set_scroll_region(&mut self, region: Bounds) -> Option<ScrollOutcome> {
        if region == self.scroll_region {
            return None;
        }
        let anchor = self.canvas_pixel_to_world(self.scroll + self.zoom_offset);
        self.scroll_region = region;
        let target = self.world_to_canvas_pixel(anchor);
        Some(self.scroll_to(target))
    }

    /// Changes the zoom factor, keeping the world point under the centre of
    /// the allocation fixed.
    ///
    /// Factors at or below [`MIN_PIXELS_PER_UNIT`] must be rejected by the caller.
    pub fn set_pixels_per_unit(&mut self, n: f64) -> ScrollOutcome {
        let center = self.allocation / 2;
        let region_min = self.scroll_region.min;
        // The centring offset is added in pixels, not units; existing views rely on it.
        let world_center = (self.scroll + center).as_dvec2() / self.pixels_per_unit
            + region_min
            + self.zoom_offset.as_dvec2();
        let target = (world_center - region_min) * n - center.as_dvec2() + 0.5;

        self.pixels_per_unit = n;
        self.scroll_to(IVec2::new(target.x as i32, target.y as i32))
    }
}

/// Clamps one axis, returning `(scroll, zoom_offset, layout_extent)`.
fn clamp_axis(target: i32, scroll_size: i32, allocation: i32, center: bool) -> (i32, i32, i32) {
    let limit = scroll_size - allocation;
    if limit < 0 {
        if center {
            (0, (allocation - scroll_size) / 2, allocation)
        } else {
            (0, 0, scroll_size)
        }
    } else {
        (target.clamp(0, limit), 0, scroll_size)
    }
}
