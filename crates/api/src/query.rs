//! Canvas queries - read-only access to canvas state.
//!
//! Queries inspect the tree, the viewport and what the canvas told its
//! host, without modifying anything.

use crate::Target;
use canvas_core::{Bounds, PixelRect};
use glam::{DVec2, IVec2};
use scene_graph::{EventKind, Rgba};
use serde::{Deserialize, Serialize};

/// A query for canvas state (read-only).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// The whole item tree.
    GetTree,

    /// Items matching a target.
    GetItems { target: Target },

    /// The topmost item at a world point.
    GetItemAt { x: f64, y: f64 },

    /// On-screen pixel extents of the target items.
    GetExtents { target: Target },

    GetViewport,

    /// Current, grabbed and focused items.
    GetPick,

    /// Events delivered to item handlers so far.
    GetEvents,

    /// Damage waiting for the next draw.
    GetDamage,

    /// Drawing operations of the last draw.
    GetFrame,

    /// Requests the canvas made of its host.
    GetHost,

    GetItemCount,
}

/// Response to a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryResult {
    Tree { root: TreeNode },

    Items { items: Vec<ItemInfo> },

    Item { name: Option<String> },

    Extents { extents: Vec<ExtentsInfo> },

    Viewport(ViewportInfo),

    Pick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grabbed: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focused: Option<String>,
    },

    Events { events: Vec<EventRecord> },

    Damage { rects: Vec<PixelRect> },

    Frame { ops: Vec<DrawOp> },

    Host(HostInfo),

    Count { count: usize },

    Error { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Group,
    Rect,
    Other,
}

/// Serializable item information.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub z_index: usize,
    pub visible: bool,
    pub realized: bool,
    pub mapped: bool,
    /// Bounds in the parent's coordinates.
    pub bounds: Bounds,
    /// Bounds in canvas pixels as of the last update pass.
    pub pixel_bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<DVec2>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub info: ItemInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtentsInfo {
    pub name: String,
    pub rect: PixelRect,
    pub on_screen: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    pub scroll_region: Bounds,
    pub pixels_per_unit: f64,
    pub center_scroll_region: bool,
    pub scroll_offsets: IVec2,
    pub zoom_offset: IVec2,
    pub allocation: IVec2,
}

/// One event as a handler saw it. Positions are in world coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub item: String,
    pub kind: EventKind,
    pub position: DVec2,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub button: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub key: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A recorded painter call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Background { rects: Vec<PixelRect> },
    Fill { rect: PixelRect, color: Rgba },
    Stroke { rect: PixelRect, color: Rgba, width: f64 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub updates_scheduled: usize,
    pub updates_cancelled: usize,
    pub repaints_queued: usize,
    pub resizes_queued: usize,
    pub pointer_grabs: usize,
    pub pointer_ungrabs: usize,
    pub focus_grabs: usize,
}
