//! Input events as seen by canvas items.

use bitflags::bitflags;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The kind of an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ButtonPress,
    DoubleButtonPress,
    TripleButtonPress,
    ButtonRelease,
    Motion,
    KeyPress,
    KeyRelease,
    Enter,
    Leave,
    FocusIn,
    FocusOut,
}

impl EventKind {
    /// The grab mask bit this kind is filtered by. Focus changes have none,
    /// so they never pass a grab.
    pub fn mask(self) -> EventMask {
        match self {
            EventKind::Enter => EventMask::ENTER,
            EventKind::Leave => EventMask::LEAVE,
            EventKind::Motion => EventMask::POINTER_MOTION,
            EventKind::ButtonPress
            | EventKind::DoubleButtonPress
            | EventKind::TripleButtonPress => EventMask::BUTTON_PRESS,
            EventKind::ButtonRelease => EventMask::BUTTON_RELEASE,
            EventKind::KeyPress => EventMask::KEY_PRESS,
            EventKind::KeyRelease => EventMask::KEY_RELEASE,
            EventKind::FocusIn | EventKind::FocusOut => EventMask::empty(),
        }
    }

    pub fn is_button_press(self) -> bool {
        matches!(
            self,
            EventKind::ButtonPress | EventKind::DoubleButtonPress | EventKind::TripleButtonPress
        )
    }

    /// Kinds routed to the focused item when there is one.
    pub fn is_keyboard(self) -> bool {
        matches!(
            self,
            EventKind::KeyPress | EventKind::KeyRelease | EventKind::FocusIn | EventKind::FocusOut
        )
    }

    /// Kinds that carry a pointer position.
    pub fn has_position(self) -> bool {
        matches!(
            self,
            EventKind::ButtonPress
                | EventKind::DoubleButtonPress
                | EventKind::TripleButtonPress
                | EventKind::ButtonRelease
                | EventKind::Motion
                | EventKind::Enter
                | EventKind::Leave
        )
    }
}

bitflags! {
    /// Event kinds an item wants while it holds the pointer grab.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u16 {
        const ENTER          = 1 << 0;
        const LEAVE          = 1 << 1;
        const POINTER_MOTION = 1 << 2;
        const BUTTON_PRESS   = 1 << 3;
        const BUTTON_RELEASE = 1 << 4;
        const KEY_PRESS      = 1 << 5;
        const KEY_RELEASE    = 1 << 6;
    }
}

bitflags! {
    /// Keyboard modifiers and held pointer buttons.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierState: u16 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 2;
        const ALT     = 1 << 3;
        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;
        const BUTTON4 = 1 << 11;
        const BUTTON5 = 1 << 12;

        const BUTTONS = Self::BUTTON1.bits()
            | Self::BUTTON2.bits()
            | Self::BUTTON3.bits()
            | Self::BUTTON4.bits()
            | Self::BUTTON5.bits();
    }
}

impl ModifierState {
    /// The state bit for pointer button `button` (1 to 5).
    pub fn for_button(button: u32) -> ModifierState {
        match button {
            1 => ModifierState::BUTTON1,
            2 => ModifierState::BUTTON2,
            3 => ModifierState::BUTTON3,
            4 => ModifierState::BUTTON4,
            5 => ModifierState::BUTTON5,
            _ => ModifierState::empty(),
        }
    }

    pub fn any_button(self) -> bool {
        self.intersects(ModifierState::BUTTONS)
    }
}

/// An input event.
///
/// Hosts deliver positions in window coordinates. Handlers receive a copy
/// whose position has been converted to world coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasEvent {
    pub kind: EventKind,
    pub position: DVec2,
    /// Modifier and button state just before the event.
    pub state: ModifierState,
    /// Pointer button for button events, 0 otherwise.
    pub button: u32,
    /// Key code for key events, 0 otherwise.
    pub key: u32,
    pub time: u32,
}

impl CanvasEvent {
    pub fn new(kind: EventKind, position: DVec2) -> Self {
        Self {
            kind,
            position,
            state: ModifierState::empty(),
            button: 0,
            key: 0,
            time: 0,
        }
    }

    pub fn button_press(position: DVec2, button: u32, state: ModifierState) -> Self {
        Self {
            button,
            state,
            ..Self::new(EventKind::ButtonPress, position)
        }
    }

    pub fn button_release(position: DVec2, button: u32, state: ModifierState) -> Self {
        Self {
            button,
            state,
            ..Self::new(EventKind::ButtonRelease, position)
        }
    }

    pub fn motion(position: DVec2, state: ModifierState) -> Self {
        Self {
            state,
            ..Self::new(EventKind::Motion, position)
        }
    }

    pub fn key_press(key: u32, state: ModifierState) -> Self {
        Self {
            key,
            state,
            ..Self::new(EventKind::KeyPress, DVec2::ZERO)
        }
    }

    pub fn key_release(key: u32, state: ModifierState) -> Self {
        Self {
            key,
            state,
            ..Self::new(EventKind::KeyRelease, DVec2::ZERO)
        }
    }

    pub fn enter(position: DVec2) -> Self {
        Self::new(EventKind::Enter, position)
    }

    pub fn leave(position: DVec2) -> Self {
        Self::new(EventKind::Leave, position)
    }

    pub fn focus(focus_in: bool) -> Self {
        let kind = if focus_in {
            EventKind::FocusIn
        } else {
            EventKind::FocusOut
        };
        Self::new(kind, DVec2::ZERO)
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    /// Same event with a different kind, keeping position and state.
    pub(crate) fn as_kind(&self, kind: EventKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_button_state_bits() {
        assert_eq!(ModifierState::for_button(3), ModifierState::BUTTON3);
        assert_eq!(ModifierState::for_button(9), ModifierState::empty());
        assert!((ModifierState::SHIFT | ModifierState::BUTTON5).any_button());
        assert!(!(ModifierState::SHIFT | ModifierState::CONTROL).any_button());
    }

    #[test]
    fn test_grab_masks() {
        assert_eq!(EventKind::TripleButtonPress.mask(), EventMask::BUTTON_PRESS);
        assert!(EventKind::FocusIn.mask().is_empty());
        assert!(EventKind::KeyRelease.is_keyboard());
        assert!(!EventKind::KeyRelease.has_position());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EventKind::ButtonPress.to_string(), "button_press");
        assert_eq!(EventKind::from_str("focus_out").unwrap(), EventKind::FocusOut);
    }
}
