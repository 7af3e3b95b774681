//! Logical gamepad controls
//!
//! Every backend reports buttons and axes in its own layout. This module holds
//! the closed set of logical controls that windows receive, plus the canonical
//! mapping-database token name for each of them.
//!
//! # Layout
//!
//! Buttons follow the Xbox naming convention by position:
//!
//! ```text
//!       [Y/North]
//!   [X/West] [B/East]
//!       [A/South]
//! ```
//!
//! Anything a backend reports that has no place in this set resolves to
//! `Unknown` and is dropped by the manager before it reaches a window.

use std::fmt;

/// Logical gamepad button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    Guide,
    LeftStick,
    RightStick,
    DpadUp,
    DpadRight,
    DpadDown,
    DpadLeft,
    /// Sentinel for backend codes outside this set
    Unknown,
}

/// Logical gamepad axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
    /// Sentinel for backend codes outside this set
    Unknown,
}

/// Number of known (non-`Unknown`) buttons
pub const BUTTON_COUNT: usize = 15;

/// Number of known (non-`Unknown`) axes
pub const AXIS_COUNT: usize = 6;

impl GamepadButton {
    /// All known buttons, in layout order
    pub const ALL: [GamepadButton; BUTTON_COUNT] = [
        GamepadButton::A,
        GamepadButton::B,
        GamepadButton::X,
        GamepadButton::Y,
        GamepadButton::LeftBumper,
        GamepadButton::RightBumper,
        GamepadButton::Back,
        GamepadButton::Start,
        GamepadButton::Guide,
        GamepadButton::LeftStick,
        GamepadButton::RightStick,
        GamepadButton::DpadUp,
        GamepadButton::DpadRight,
        GamepadButton::DpadDown,
        GamepadButton::DpadLeft,
    ];

    /// Position in [`GamepadButton::ALL`], `None` for `Unknown`
    pub fn index(self) -> Option<usize> {
        Self::ALL.iter().position(|b| *b == self)
    }

    /// Button at a layout position, `Unknown` when out of range
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(GamepadButton::Unknown)
    }

    /// Mapping-database token for this button
    pub fn token(self) -> Option<&'static str> {
        let name = match self {
            GamepadButton::A => "a",
            GamepadButton::B => "b",
            GamepadButton::X => "x",
            GamepadButton::Y => "y",
            GamepadButton::LeftBumper => "leftshoulder",
            GamepadButton::RightBumper => "rightshoulder",
            GamepadButton::Back => "back",
            GamepadButton::Start => "start",
            GamepadButton::Guide => "guide",
            GamepadButton::LeftStick => "leftstick",
            GamepadButton::RightStick => "rightstick",
            GamepadButton::DpadUp => "dpup",
            GamepadButton::DpadRight => "dpright",
            GamepadButton::DpadDown => "dpdown",
            GamepadButton::DpadLeft => "dpleft",
            GamepadButton::Unknown => return None,
        };
        Some(name)
    }
}

impl GamepadAxis {
    /// All known axes, in layout order
    pub const ALL: [GamepadAxis; AXIS_COUNT] = [
        GamepadAxis::LeftX,
        GamepadAxis::LeftY,
        GamepadAxis::RightX,
        GamepadAxis::RightY,
        GamepadAxis::LeftTrigger,
        GamepadAxis::RightTrigger,
    ];

    /// Position in [`GamepadAxis::ALL`], `None` for `Unknown`
    pub fn index(self) -> Option<usize> {
        Self::ALL.iter().position(|a| *a == self)
    }

    /// Axis at a layout position, `Unknown` when out of range
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(GamepadAxis::Unknown)
    }

    /// Mapping-database token for this axis
    pub fn token(self) -> Option<&'static str> {
        let name = match self {
            GamepadAxis::LeftX => "leftx",
            GamepadAxis::LeftY => "lefty",
            GamepadAxis::RightX => "rightx",
            GamepadAxis::RightY => "righty",
            GamepadAxis::LeftTrigger => "lefttrigger",
            GamepadAxis::RightTrigger => "righttrigger",
            GamepadAxis::Unknown => return None,
        };
        Some(name)
    }

    pub fn is_trigger(self) -> bool {
        matches!(self, GamepadAxis::LeftTrigger | GamepadAxis::RightTrigger)
    }
}

impl fmt::Display for GamepadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token().unwrap_or("unknown"))
    }
}

impl fmt::Display for GamepadAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token().unwrap_or("unknown"))
    }
}

/// Logical control named by a mapping-database token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Button(GamepadButton),
    Axis(GamepadAxis),
    /// Recognized token with no logical counterpart (paddles, misc, touchpad)
    Extra(&'static str),
}

/// Tokens the mapping format defines but this crate does not route
const EXTRA_TOKENS: [&str; 11] = [
    "misc1", "misc2", "misc3", "misc4", "misc5", "misc6", "paddle1", "paddle2", "paddle3",
    "paddle4", "touchpad",
];

impl Control {
    /// Resolve a mapping-database token
    ///
    /// Returns `None` for tokens the format does not define.
    pub fn from_token(token: &str) -> Option<Self> {
        if let Some(button) = GamepadButton::ALL.iter().find(|b| b.token() == Some(token)) {
            return Some(Control::Button(*button));
        }
        if let Some(axis) = GamepadAxis::ALL.iter().find(|a| a.token() == Some(token)) {
            return Some(Control::Axis(*axis));
        }
        EXTRA_TOKENS
            .iter()
            .find(|t| **t == token)
            .copied()
            .map(Control::Extra)
    }

    pub fn token(self) -> &'static str {
        match self {
            Control::Button(b) => b.token().unwrap_or("unknown"),
            Control::Axis(a) => a.token().unwrap_or("unknown"),
            Control::Extra(t) => t,
        }
    }
}
