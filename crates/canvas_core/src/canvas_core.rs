//! # Geometry shared by the canvas crates
//!
//! World-space bounding boxes, canvas-pixel rectangles and regions, and the
//! viewport that maps between world, canvas-pixel and window coordinates.

pub mod bounds;
pub mod region;
pub mod viewport;

pub use bounds::Bounds;
pub use region::{PixelRect, Region};
pub use viewport::{ScrollOutcome, Viewport};
