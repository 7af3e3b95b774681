//! Joystick backends
//!
//! A backend owns the physical devices. The manager only ever holds a
//! [`DeviceHandle`] into it and asks for capability counts and per-frame state
//! through the [`Backend`] trait.

pub mod virtual_backend;

#[cfg(feature = "gilrs")]
pub mod gilrs;

use std::fmt;

use super::axis::TriggerRange;
use super::buttons::{GamepadAxis, GamepadButton};

pub use virtual_backend::{VirtualBackend, VirtualJoystick};

#[cfg(feature = "gilrs")]
pub use self::gilrs::GilrsBackend;

/// Backend-owned device index
///
/// Stable for the lifetime of the device; may be reused by the backend after
/// the device is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub usize);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hot-plug notification queued by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Added(DeviceHandle),
    Removed(DeviceHandle),
}

/// Identity and capability counts reported for a device
///
/// Counts the backend cannot determine are reported as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub guid: String,
    pub axes: usize,
    pub buttons: usize,
    pub hats: usize,
    /// Whether the backend already has a gamepad layout for this device
    pub is_gamepad: bool,
}

/// One frame of button and axis state, in backend-native order
///
/// Index `i` of `buttons` resolves through [`Backend::button_id`], index `i` of
/// `axes` through [`Backend::axis_id`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPadState {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
}

/// Platform joystick library as seen by the manager
pub trait Backend {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Take every connect/disconnect notification queued since the last call
    fn drain_notifications(&mut self) -> Vec<Notification>;

    /// Devices currently visible to the backend
    fn enumerate(&self) -> Vec<DeviceHandle>;

    /// Identity and capabilities, `None` if the device is gone
    fn describe(&self, handle: DeviceHandle) -> Option<DeviceInfo>;

    /// Whether the device currently has a gamepad layout
    fn is_gamepad(&self, handle: DeviceHandle) -> bool;

    /// Current gamepad state, `None` for absent or unmapped devices
    fn read_state(&mut self, handle: DeviceHandle) -> Option<RawPadState>;

    /// Logical button for a native button index
    fn button_id(&self, index: usize) -> GamepadButton;

    /// Logical axis for a native axis index
    fn axis_id(&self, index: usize) -> GamepadAxis;

    /// Range the backend reports trigger axes in
    fn trigger_range(&self) -> TriggerRange;

    /// Register mapping-database text with the backend
    ///
    /// # Returns
    /// Number of mappings the backend accepted
    fn update_mappings(&mut self, text: &str) -> usize;
}
