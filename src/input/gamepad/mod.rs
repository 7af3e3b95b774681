//! Gamepad input support
//!
//! Discovers joysticks through a [`Backend`], assigns compact user IDs, loads
//! and synthesizes SDL mappings, and routes connect/button/axis callbacks to
//! windows through the [`JoystickManager`].

pub mod axis;
pub mod backend;
pub mod buttons;
pub mod diagnostics;
pub mod error;
pub mod focus;
pub mod manager;
pub mod mapping;
pub mod mapping_db;
pub mod slot;
pub mod synth;
pub mod window;

pub use axis::TriggerRange;
pub use backend::{Backend, DeviceHandle, DeviceInfo, Notification, RawPadState};
pub use backend::{VirtualBackend, VirtualJoystick};
pub use buttons::{GamepadAxis, GamepadButton};
pub use diagnostics::print_device_diagnostics;
pub use error::{BackendError, ErrorHandler, LogErrorHandler, ParseError};
pub use manager::{JoystickManager, ManagerConfig};
pub use mapping::{Mapping, Platform};
pub use mapping_db::{LoadReport, MappingDatabase};
pub use slot::{DeviceSlot, DeviceStatus, UserId};
pub use window::{GameWindow, GamepadEvent, GamepadWindow, WindowId};

#[cfg(feature = "gilrs")]
pub use backend::GilrsBackend;
