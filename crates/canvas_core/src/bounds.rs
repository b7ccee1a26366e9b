//! Axis-aligned bounding boxes in world or item coordinates
//!
//! Canvas items only ever translate, so every box stays axis-aligned and a
//! min/max pair is enough to describe an item's extent.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box represented by minimum and maximum points
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// The minimum point (top-left in canvas coordinates)
    pub min: DVec2,
    /// The maximum point (bottom-right in canvas coordinates)
    pub max: DVec2,
}

impl Bounds {
    /// Creates a new bounds from minimum and maximum points
    ///
    /// Note: This doesn't validate that min is actually less than max.
    /// Use `from_corners` if you need automatic ordering.
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Creates bounds from an origin point and size
    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    /// Creates bounds from two corner points, automatically ordering them
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates bounds from raw edge coordinates
    pub fn from_edges(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: DVec2::new(x1, y1),
            max: DVec2::new(x2, y2),
        }
    }

    /// Creates an empty bounds at the origin
    pub fn zero() -> Self {
        Self {
            min: DVec2::ZERO,
            max: DVec2::ZERO,
        }
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Checks if the bounds are empty (zero size)
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Tests if this bounds intersects with another
    ///
    /// Two bounds intersect if they overlap in both X and Y axes
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Computes the intersection of two bounds
    ///
    /// Returns None if the bounds don't intersect
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if min.x <= max.x && min.y <= max.y {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Computes the union of two bounds
    ///
    /// The union is the smallest bounds that contains both input bounds
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Folds a sequence of bounds into their union, or `None` for an empty sequence
    pub fn union_all(bounds: impl IntoIterator<Item = Bounds>) -> Option<Self> {
        let mut it = bounds.into_iter();
        let first = it.next()?;
        Some(it.fold(first, |acc, b| acc.union(&b)))
    }

    /// Tests if a point is contained within the bounds
    ///
    /// Points on the boundary are considered contained
    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Expands the bounds by a given amount in all directions
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min: self.min - DVec2::splat(amount),
            max: self.max + DVec2::splat(amount),
        }
    }

    /// Translates the bounds by a given offset
    pub fn translate(&self, offset: DVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Maps both corners through `f`, reordering them afterwards
    pub fn map_corners(&self, mut f: impl FnMut(DVec2) -> DVec2) -> Self {
        Self::from_corners(f(self.min), f(self.max))
    }

    /// Clamps a point to be within the bounds
    pub fn clamp_point(&self, point: DVec2) -> DVec2 {
        point.clamp(self.min, self.max)
    }

    /// Computes the distance from a point to the bounds
    ///
    /// Returns 0 if the point is inside the bounds
    pub fn distance_to_point(&self, point: DVec2) -> f64 {
        let clamped = self.clamp_point(point);
        (point - clamped).length()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::zero()
    }
}
