//! Canvas commands - all operations that modify canvas state.
//!
//! Commands play the role of the application and the hosting widget at
//! once: they build and edit the item tree, move the viewport, and feed
//! synthetic input through the picker.

use crate::Target;
use canvas_core::{Bounds, PixelRect};
use glam::DVec2;
use scene_graph::{EventKind, Rgba};
use serde::{Deserialize, Serialize};

/// A command that modifies canvas state.
///
/// Commands are serializable for:
/// - Scripted scenarios
/// - Recording input sessions
/// - Tool and LLM generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // === Item Creation ===
    /// Create an empty group.
    CreateGroup {
        name: String,
        #[serde(default)]
        parent: Target,
        #[serde(default)]
        offset: DVec2,
        /// Event kinds the group's handler consumes, stopping bubbling.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        consumes: Vec<EventKind>,
    },

    /// Create a rectangle.
    CreateRect {
        name: String,
        #[serde(default)]
        parent: Target,
        position: DVec2,
        size: DVec2,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Rgba>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline: Option<Rgba>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline_width: Option<f64>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        consumes: Vec<EventKind>,
    },

    /// Destroy items and their descendants.
    Destroy { target: Target },

    // === Properties ===
    /// Change a rectangle's colors. Omitted fields are kept.
    SetStyle {
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Rgba>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline: Option<Rgba>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline_width: Option<f64>,
    },

    /// Move items by a delta in their parent's coordinates.
    Move { target: Target, delta: DVec2 },

    /// Set a group's translation.
    SetOffset { target: Target, offset: DVec2 },

    Show { target: Target },

    Hide { target: Target },

    // === Hierarchy ===
    /// Move an item into another group, keeping its local coordinates.
    Reparent { target: Target, group: Target },

    // === Stacking ===
    Raise {
        target: Target,
        #[serde(default = "default_positions")]
        positions: usize,
    },

    Lower {
        target: Target,
        #[serde(default = "default_positions")]
        positions: usize,
    },

    RaiseToTop { target: Target },

    LowerToBottom { target: Target },

    /// Restack directly below `behind`, or at the top when it is omitted.
    SendBehind {
        target: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        behind: Option<Target>,
    },

    // === Grabs ===
    /// Grab the pointer for an item.
    Grab {
        target: Target,
        /// Event kinds delivered while the grab is held.
        #[serde(default = "default_grab_events")]
        events: Vec<EventKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor: Option<String>,
        #[serde(default)]
        time: u32,
    },

    Ungrab {
        target: Target,
        #[serde(default)]
        time: u32,
    },

    /// Give an item the keyboard focus.
    Focus { target: Target },

    // === Window ===
    /// Show the canvas window.
    MapWindow,

    /// Hide the canvas window, dropping damage and the pointer grab.
    UnmapWindow,

    // === Viewport ===
    /// Resize the canvas window.
    Resize { width: i32, height: i32 },

    SetScrollRegion { region: Bounds },

    ScrollTo { x: i32, y: i32 },

    SetPixelsPerUnit { pixels_per_unit: f64 },

    SetCenterScrollRegion { center: bool },

    /// Set the pick tolerance in canvas pixels.
    SetCloseEnough { pixels: i32 },

    // === Scheduling ===
    /// Run the deferred update pass the host would run when idle.
    RunIdle,

    /// Run any pending update pass immediately.
    UpdateNow,

    /// Repaint the damaged area within `clip` (canvas pixels), or within
    /// the visible area when no clip is given.
    Draw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        clip: Option<Vec<PixelRect>>,
    },

    // === Input ===
    /// Pointer moved to a window position.
    Motion {
        x: f64,
        y: f64,
        #[serde(default)]
        time: u32,
    },

    ButtonPress {
        x: f64,
        y: f64,
        #[serde(default = "default_button")]
        button: u32,
        #[serde(default)]
        time: u32,
    },

    ButtonRelease {
        x: f64,
        y: f64,
        #[serde(default = "default_button")]
        button: u32,
        #[serde(default)]
        time: u32,
    },

    KeyPress {
        key: u32,
        #[serde(default)]
        time: u32,
    },

    KeyRelease {
        key: u32,
        #[serde(default)]
        time: u32,
    },

    /// Pointer entered the canvas window.
    PointerEnter { x: f64, y: f64 },

    /// Pointer left the canvas window.
    PointerLeave { x: f64, y: f64 },

    /// The canvas window gained keyboard focus.
    WindowFocusIn,

    WindowFocusOut,

    // === Batch ===
    /// Run several commands, stopping at the first failure.
    Batch { commands: Vec<Command> },
}

fn default_positions() -> usize {
    1
}

fn default_button() -> u32 {
    1
}

fn default_grab_events() -> Vec<EventKind> {
    vec![
        EventKind::Motion,
        EventKind::ButtonPress,
        EventKind::ButtonRelease,
        EventKind::Enter,
        EventKind::Leave,
    ]
}

/// Result of executing a command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandResult {
    Success {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        created: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modified: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        deleted: Vec<String>,
        /// For input, whether some handler consumed the event.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        handled: Option<bool>,
    },
    Error {
        message: String,
    },
}

impl CommandResult {
    pub fn success() -> Self {
        Self::Success {
            created: vec![],
            modified: vec![],
            deleted: vec![],
            handled: None,
        }
    }

    pub fn created(names: Vec<String>) -> Self {
        Self::Success {
            created: names,
            modified: vec![],
            deleted: vec![],
            handled: None,
        }
    }

    pub fn modified(names: Vec<String>) -> Self {
        Self::Success {
            created: vec![],
            modified: names,
            deleted: vec![],
            handled: None,
        }
    }

    pub fn deleted(names: Vec<String>) -> Self {
        Self::Success {
            created: vec![],
            modified: vec![],
            deleted: names,
            handled: None,
        }
    }

    pub fn handled(handled: bool) -> Self {
        Self::Success {
            created: vec![],
            modified: vec![],
            deleted: vec![],
            handled: Some(handled),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
