//! # Canvas Scene Graph
//!
//! A retained-mode tree of canvas items. Groups own ordered children and a
//! translation offset; leaves are [`CanvasItem`] trait objects supplied by
//! the application.
//!
//! ## Key Concepts
//!
//! - **Items**: nodes stored in a slot map and addressed by [`ItemId`].
//!   Stale ids resolve to `None`, so pick, grab and focus state never dangle.
//! - **Update pass**: property changes mark items as needing an update. The
//!   requests coalesce into one deferred pass that recomputes pixel bounding
//!   boxes top-down.
//! - **Damage**: redraw requests merge into one pending [`Region`] and one
//!   host repaint request per frame.
//! - **Picking**: pointer events pick the topmost item under the cursor and
//!   synthesize enter/leave crossings. Events bubble from the target to the
//!   root, with grab and focus overrides.
//!
//! The canvas is single-threaded. All deferred work runs when the host calls
//! [`Canvas::run_idle`] or [`Canvas::draw`].

mod canvas;
mod config;
mod damage;
mod error;
mod event;
mod flags;
mod host;
mod item;
mod pick;
mod query;
mod scroll;
mod tree;
mod update;
mod zorder;

#[cfg(test)]
mod scene_graph_test;

pub use canvas::{Canvas, EventHandler};
pub use canvas_core::{Bounds, PixelRect, Region, Viewport};
pub use config::CanvasConfig;
pub use damage::Clip;
pub use error::{GrabError, SceneError};
pub use event::{CanvasEvent, EventKind, EventMask, ModifierState};
pub use flags::{ItemFlags, UpdateFlags};
pub use host::{GrabStatus, Host, HostLog, RecordingHost};
pub use item::{CanvasItem, DrawContext, Painter, Rgba, UpdateContext};

use slotmap::KeyData;
use std::fmt::{self, Display};

slotmap::new_key_type! {
    /// Identifies an item within one canvas.
    pub struct ItemId;
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(KeyData::from_ffi(value))
    }
}

impl ItemId {
    /// Converts this item id to a [u64]
    pub fn as_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u64())
    }
}

/// Reports a broken internal invariant.
///
/// Panics in debug builds; logs and carries on in release builds.
macro_rules! contract_violation {
    ($($arg:tt)+) => {
        if cfg!(debug_assertions) {
            panic!($($arg)+);
        } else {
            log::error!($($arg)+);
        }
    };
}
pub(crate) use contract_violation;
