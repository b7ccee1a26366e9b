//! A filled and outlined rectangle, the one item kind scripts can create.

use canvas_core::{Bounds, PixelRect, Region};
use glam::DVec2;
use scene_graph::{CanvasItem, DrawContext, Painter, Rgba, UpdateContext};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    /// Corners in the parent group's coordinates.
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Rgba>,
    /// Outline width in canvas pixels, independent of zoom.
    #[serde(default = "default_outline_width")]
    pub outline_width: f64,
}

fn default_outline_width() -> f64 {
    1.0
}

impl RectShape {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            fill: None,
            outline: None,
            outline_width: default_outline_width(),
        }
    }

    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_outline(mut self, outline: Rgba, width: f64) -> Self {
        self.outline = Some(outline);
        self.outline_width = width;
        self
    }

    fn half_outline(&self) -> f64 {
        if self.outline.is_some() {
            self.outline_width / 2.0
        } else {
            0.0
        }
    }
}

impl CanvasItem for RectShape {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> Bounds {
        ctx.to_canvas_pixels(&self.bounds).expand(self.half_outline())
    }

    fn draw(&self, painter: &mut dyn Painter, ctx: &DrawContext<'_>, region: &Region) {
        if !region.overlaps(&PixelRect::covering(&ctx.pixel_bounds)) {
            return;
        }
        let rect = PixelRect::covering(&ctx.to_canvas_pixels(&self.bounds));
        if let Some(fill) = self.fill {
            painter.fill_rect(rect, fill);
        }
        if let Some(outline) = self.outline {
            painter.stroke_rect(rect, outline, self.outline_width);
        }
    }

    /// Filled rectangles are hit anywhere inside. Hollow ones only on the
    /// outline, and further inside counts as distance to the outline.
    fn point(&self, point: DVec2, pixels_per_unit: f64) -> f64 {
        let half = self.half_outline() / pixels_per_unit;
        let outer = self.bounds.expand(half);
        if !outer.contains_point(point) {
            return outer.distance_to_point(point);
        }
        if self.fill.is_some() {
            return 0.0;
        }

        let inner = self.bounds.expand(-half);
        if inner.is_empty() || !inner.contains_point(point) {
            return 0.0;
        }
        let to_edges = (point - inner.min).min(inner.max - point);
        to_edges.x.min(to_edges.y)
    }

    fn translate(&mut self, delta: DVec2) {
        self.bounds = self.bounds.translate(delta);
    }

    fn bounds(&self) -> Bounds {
        self.bounds.expand(self.half_outline())
    }
}
