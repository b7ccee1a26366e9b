//! Canvas-pixel rectangles and the damage regions built from them.
//!
//! Rectangles are half-open: `(x1, y1)` is inside, `(x2, y2)` is not.
//! A [`Region`] is a loose cover of rectangles. It may over-approximate the
//! exact union but never loses area.

use crate::Bounds;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Past this many rectangles a region collapses to its extents.
const MAX_RECTS: usize = 32;

/// A half-open integer rectangle in canvas pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Covers an inclusive pixel bounding box, as kept on items.
    ///
    /// The far edge is pushed out by one pixel so the last row and column
    /// of the box are inside the rectangle.
    pub fn covering(bounds: &Bounds) -> Self {
        Self::new(
            bounds.min.x as i32,
            bounds.min.y as i32,
            bounds.max.x as i32 + 1,
            bounds.max.y as i32 + 1,
        )
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// A rectangle with no area never contributes to a region.
    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn contains(&self, other: &Self) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.x1 < other.x2 && other.x1 < self.x2 && self.y1 < other.y2 && other.y1 < self.y2
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let rect = Self::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        );
        (!rect.is_empty()).then_some(rect)
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.x1.min(other.x1),
            self.y1.min(other.y1),
            self.x2.max(other.x2),
            self.y2.max(other.y2),
        )
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    pub fn to_bounds(&self) -> Bounds {
        Bounds::new(
            DVec2::new(self.x1 as f64, self.y1 as f64),
            DVec2::new(self.x2 as f64, self.y2 as f64),
        )
    }
}

/// A set of canvas-pixel rectangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    rects: SmallVec<[PixelRect; 4]>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: PixelRect) -> Self {
        let mut region = Self::new();
        region.union_rect(rect);
        region
    }

    pub fn from_rects(rects: impl IntoIterator<Item = PixelRect>) -> Self {
        let mut region = Self::new();
        for rect in rects {
            region.union_rect(rect);
        }
        region
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[PixelRect] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Adds `rect` to the region.
    ///
    /// Empty rectangles are ignored, as are rectangles already covered by a
    /// single member. Members covered by `rect` are dropped.
    pub fn union_rect(&mut self, rect: PixelRect) {
        if rect.is_empty() {
            return;
        }
        if self.rects.iter().any(|r| r.contains(&rect)) {
            return;
        }
        self.rects.retain(|r| !rect.contains(r));
        self.rects.push(rect);

        if self.rects.len() > MAX_RECTS {
            if let Some(extents) = self.extents() {
                log::trace!("damage region collapsed to {extents:?}");
                self.rects.clear();
                self.rects.push(extents);
            }
        }
    }

    pub fn union(&mut self, other: &Region) {
        for rect in other.rects.iter() {
            self.union_rect(*rect);
        }
    }

    /// The smallest rectangle covering every member, or `None` when empty.
    pub fn extents(&self) -> Option<PixelRect> {
        let mut it = self.rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(&r)))
    }

    pub fn intersect_rect(&self, rect: &PixelRect) -> Region {
        Region::from_rects(self.rects.iter().filter_map(|r| r.intersection(rect)))
    }

    pub fn intersect(&self, other: &Region) -> Region {
        Region::from_rects(
            self.rects
                .iter()
                .flat_map(|a| other.rects.iter().filter_map(move |b| a.intersection(b))),
        )
    }

    /// True if any member shares area with `rect`.
    pub fn overlaps(&self, rect: &PixelRect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }
}
