//! Window collaborator
//!
//! The manager never owns rendering or platform windows. It talks to anything
//! implementing [`GamepadWindow`].

use std::fmt;

use super::buttons::{GamepadAxis, GamepadButton};
use super::slot::UserId;

/// Identifier the manager assigns when a window is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window{}", self.0)
    }
}

/// Receiver of gamepad callbacks
pub trait GamepadWindow {
    fn on_gamepad_state(&mut self, user: UserId, connected: bool);
    fn on_gamepad_button(&mut self, user: UserId, button: GamepadButton, pressed: bool);
    fn on_gamepad_axis(&mut self, user: UserId, axis: GamepadAxis, value: f32);
}

/// Standardized gamepad event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GamepadEvent {
    /// Device connected or disconnected
    Connection { user: UserId, connected: bool },
    /// Button press/release
    Button {
        user: UserId,
        button: GamepadButton,
        pressed: bool,
    },
    /// Axis value, sent every poll
    Axis {
        user: UserId,
        axis: GamepadAxis,
        value: f32,
    },
}

impl fmt::Display for GamepadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GamepadEvent::Connection { user, connected } => {
                write!(f, "{} {}", user, if connected { "connected" } else { "disconnected" })
            }
            GamepadEvent::Button {
                user,
                button,
                pressed,
            } => write!(f, "{}.btn.{} {}", user, button, if pressed { "down" } else { "up" }),
            GamepadEvent::Axis { user, axis, value } => {
                write!(f, "{}.axis.{} {:.3}", user, axis, value)
            }
        }
    }
}

/// Callback type for gamepad events
pub type EventCallback = Box<dyn FnMut(GamepadEvent)>;

/// Window that forwards every gamepad callback to a closure
pub struct GameWindow {
    title: String,
    callback: Option<EventCallback>,
}

impl GameWindow {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            callback: None,
        }
    }

    /// Set the event callback, replacing any previous one
    pub fn on_event(mut self, callback: impl FnMut(GamepadEvent) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn emit(&mut self, event: GamepadEvent) {
        if let Some(callback) = self.callback.as_mut() {
            callback(event);
        }
    }
}

impl fmt::Debug for GameWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameWindow")
            .field("title", &self.title)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl GamepadWindow for GameWindow {
    fn on_gamepad_state(&mut self, user: UserId, connected: bool) {
        self.emit(GamepadEvent::Connection { user, connected });
    }

    fn on_gamepad_button(&mut self, user: UserId, button: GamepadButton, pressed: bool) {
        self.emit(GamepadEvent::Button {
            user,
            button,
            pressed,
        });
    }

    fn on_gamepad_axis(&mut self, user: UserId, axis: GamepadAxis, value: f32) {
        self.emit(GamepadEvent::Axis { user, axis, value });
    }
}
