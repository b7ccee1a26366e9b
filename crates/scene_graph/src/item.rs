//! The interface implemented by drawable item kinds.

use crate::{Region, UpdateFlags};
use canvas_core::{Bounds, PixelRect, Viewport};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Lets the canvas hand typed access back to callers.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A drawable leaf in the item tree.
///
/// Geometry is expressed in item coordinates, which are the coordinates of
/// the parent group's children. The canvas keeps the status flags itself:
/// implementations only react to the lifecycle hooks and report geometry.
pub trait CanvasItem: AsAny {
    fn realize(&mut self) {}

    fn unrealize(&mut self) {}

    fn map(&mut self) {}

    fn unmap(&mut self) {}

    /// Recomputes derived state and returns the new bounding box in canvas pixels.
    fn update(&mut self, ctx: &UpdateContext<'_>) -> Bounds {
        ctx.to_canvas_pixels(&self.bounds())
    }

    fn draw(&self, painter: &mut dyn Painter, ctx: &DrawContext<'_>, region: &Region);

    /// Distance in world units from `point` (item coordinates) to the item.
    fn point(&self, point: DVec2, _pixels_per_unit: f64) -> f64 {
        self.bounds().distance_to_point(point)
    }

    fn translate(&mut self, delta: DVec2);

    /// Bounding box in item coordinates.
    fn bounds(&self) -> Bounds;

    /// Handles an event bubbling through this item. Returns `true` to stop bubbling.
    fn on_event(&mut self, _event: &crate::CanvasEvent) -> bool {
        false
    }
}

/// What an item needs to know during an update pass.
pub struct UpdateContext<'a> {
    /// Offset from item coordinates to world coordinates.
    pub item_to_world: DVec2,
    pub flags: UpdateFlags,
    pub viewport: &'a Viewport,
}

impl UpdateContext<'_> {
    /// Item-coordinate box to canvas pixels.
    pub fn to_canvas_pixels(&self, bounds: &Bounds) -> Bounds {
        self.viewport
            .world_to_canvas_bounds(&bounds.translate(self.item_to_world))
    }
}

/// What an item needs to know while drawing.
pub struct DrawContext<'a> {
    pub item_to_world: DVec2,
    /// The item's bounding box from the last update, in canvas pixels.
    pub pixel_bounds: Bounds,
    pub viewport: &'a Viewport,
}

impl DrawContext<'_> {
    pub fn to_canvas_pixels(&self, bounds: &Bounds) -> Bounds {
        self.viewport
            .world_to_canvas_bounds(&bounds.translate(self.item_to_world))
    }
}

/// Drawing operations the host provides for one repaint.
pub trait Painter {
    /// Paints the canvas background under `region`.
    fn draw_background(&mut self, region: &Region);

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba);

    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba, width: f64);
}

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`, with or without the `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom("color must be #RRGGBB or #RRGGBBAA"))
    }
}
