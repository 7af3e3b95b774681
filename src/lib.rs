//! Focus-routed gamepad support for game windows
//!
//! ```no_run
//! use gamewindow_pad::{GameWindow, JoystickManager, ManagerConfig, VirtualBackend};
//!
//! let mut manager = JoystickManager::new(VirtualBackend::default(), ManagerConfig::default());
//! manager.init();
//!
//! let window = GameWindow::new("main").on_event(|event| println!("{}", event));
//! let id = manager.add_window(Box::new(window));
//! manager.on_window_focused(id, true);
//!
//! loop {
//!     manager.poll_events();
//!     manager.update(id);
//! #   break;
//! }
//! ```

pub mod config;
pub mod input;
pub mod paths;

pub use input::gamepad::{
    Backend, DeviceHandle, GameWindow, GamepadAxis, GamepadButton, GamepadEvent, GamepadWindow,
    JoystickManager, LoadReport, ManagerConfig, Mapping, TriggerRange, UserId, VirtualBackend,
    VirtualJoystick, WindowId,
};

#[cfg(feature = "gilrs")]
pub use input::gamepad::GilrsBackend;
