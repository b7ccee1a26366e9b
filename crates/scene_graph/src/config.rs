use crate::SceneError;
use canvas_core::viewport::MIN_PIXELS_PER_UNIT;
use canvas_core::Bounds;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Initial settings for a [`Canvas`](crate::Canvas).
///
/// Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Zoom factor: canvas pixels per world unit.
    pub pixels_per_unit: f64,
    /// World rectangle that can be scrolled over.
    pub scroll_region: Bounds,
    /// Centre the scroll region when it is smaller than the allocation.
    pub center_scroll_region: bool,
    /// Pick tolerance in canvas pixels.
    pub close_enough: i32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 1.0,
            scroll_region: Bounds::from_origin_size(DVec2::ZERO, DVec2::new(100.0, 100.0)),
            center_scroll_region: false,
            close_enough: 0,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.pixels_per_unit.is_nan() || self.pixels_per_unit <= MIN_PIXELS_PER_UNIT {
            return Err(SceneError::InvalidZoom(self.pixels_per_unit));
        }
        Ok(())
    }
}
