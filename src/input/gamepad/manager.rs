//! Joystick manager
//!
//! Owns the device registry, the live windows and the focus router, and drives
//! them from backend notifications and per-frame window ticks:
//!
//! - Connect/disconnect is broadcast to every window.
//! - Buttons and axes go only to the focused window, and only when that window
//!   calls [`JoystickManager::update`].
//! - Buttons are edge-triggered against the previous poll; axes are sent every
//!   poll.
//!
//! Devices that appear before the first window exists are only registered if
//! the backend already knows them as gamepads. Everything else waits for the
//! scan that runs when the first window is added, so mapping files loaded in
//! between take effect without spurious warnings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use super::axis::{forward_axis_value, TriggerRange};
use super::backend::{Backend, DeviceHandle, Notification};
use super::buttons::{GamepadAxis, GamepadButton};
use super::error::{ErrorHandler, LogErrorHandler};
use super::focus::FocusRouter;
use super::mapping::Platform;
use super::mapping_db::{read_mapping_file, LoadReport, MappingDatabase};
use super::slot::{DeviceSlot, DeviceStatus, SlotManager, UserId};
use super::synth::synthesize_mapping;
use super::window::{GamepadWindow, WindowId};
use crate::paths;

/// Component name for mapping-database reports
const DB_COMPONENT: &str = "MappingDatabase";

/// Manager settings
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Extra mapping files loaded by [`JoystickManager::init`]
    pub mapping_files: Vec<PathBuf>,
    /// Generate mappings for unknown joysticks
    pub synthesize_missing_mappings: bool,
    /// Override for the backend's native trigger range
    pub trigger_range: Option<TriggerRange>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mapping_files: Vec::new(),
            synthesize_missing_mappings: true,
            trigger_range: None,
        }
    }
}

/// Gamepad state machine shared by all windows of the application
pub struct JoystickManager<B: Backend> {
    backend: B,
    config: ManagerConfig,
    registry: SlotManager,
    mappings: MappingDatabase,
    windows: HashMap<WindowId, Box<dyn GamepadWindow>>,
    focus: FocusRouter,
    next_window_id: u64,
    /// Set once the first window is added; never cleared
    had_window: bool,
    errors: Box<dyn ErrorHandler>,
}

/// Register `text` with the database and forward accepted lines to the backend
fn install_mappings<B: Backend>(
    mappings: &mut MappingDatabase,
    backend: &mut B,
    text: &str,
) -> LoadReport {
    let report = mappings.load_str(text);
    if report.added() > 0 {
        let installed = backend.update_mappings(&report.accepted_text());
        debug!(
            "{} mapping(s) accepted, {} installed in {} backend",
            report.added(),
            installed,
            backend.name()
        );
    }
    report
}

impl<B: Backend> JoystickManager<B> {
    pub fn new(backend: B, config: ManagerConfig) -> Self {
        Self {
            backend,
            config,
            registry: SlotManager::new(),
            mappings: MappingDatabase::default(),
            windows: HashMap::new(),
            focus: FocusRouter::new(),
            next_window_id: 1,
            had_window: false,
            errors: Box::new(LogErrorHandler),
        }
    }

    /// Parse mapping lines for `platform` instead of the host platform
    pub fn with_mapping_platform(mut self, platform: Platform) -> Self {
        self.mappings = MappingDatabase::new(platform);
        self
    }

    /// Replace the error reporter (default: log at warn level)
    pub fn set_error_handler(&mut self, handler: impl ErrorHandler + 'static) {
        self.errors = Box::new(handler);
    }

    /// Load the discovered mapping database and the configured mapping files
    ///
    /// Missing files are skipped silently.
    ///
    /// # Returns
    /// Combined report over every file loaded
    pub fn init(&mut self) -> LoadReport {
        let mut files = paths::mapping_db_candidates();
        files.extend(self.config.mapping_files.iter().cloned());

        let mut total = LoadReport::default();
        for file in files {
            total.merge(self.add_mapping_file(&file));
        }
        info!(
            "Joystick manager ready ({} backend, {} mapping(s))",
            self.backend.name(),
            self.mappings.len()
        );
        total
    }

    /// Load a mapping-database file; a missing file is a no-op
    pub fn add_mapping_file(&mut self, path: &Path) -> LoadReport {
        match read_mapping_file(path) {
            Some(text) => {
                info!("Loading mappings from {}", path.display());
                self.add_mappings(&text)
            }
            None => LoadReport::default(),
        }
    }

    /// Load mapping lines from memory
    ///
    /// Rejected lines are reported to the error handler. Devices already
    /// registered are re-checked against the backend afterwards.
    pub fn add_mappings(&mut self, text: &str) -> LoadReport {
        let report = install_mappings(&mut self.mappings, &mut self.backend, text);
        for rejected in &report.errors {
            let message = format!("line {}: {}", rejected.line, rejected.error);
            self.errors.on_error(DB_COMPONENT, &message);
        }
        self.refresh_statuses();
        report
    }

    /// Re-derive every registered device's status, replacing changed records
    fn refresh_statuses(&mut self) {
        let updates: Vec<(UserId, DeviceStatus)> = self
            .registry
            .iter()
            .filter_map(|(id, slot)| {
                let status = if self.backend.is_gamepad(slot.handle) {
                    DeviceStatus::Mapped
                } else {
                    DeviceStatus::Inert
                };
                (status != slot.status).then_some((id, status))
            })
            .collect();

        for (id, status) in updates {
            if let Some(slot) = self.registry.get(id).cloned() {
                info!("{} is now {:?}", id, status);
                self.registry.replace(id, slot.with_status(status));
            }
        }
    }

    /// Handle queued backend hot-plug notifications
    ///
    /// Independent of focus; call once per frame before [`Self::update`].
    pub fn poll_events(&mut self) {
        for notification in self.backend.drain_notifications() {
            match notification {
                Notification::Added(handle) => self.device_added(handle),
                Notification::Removed(handle) => self.device_removed(handle),
            }
        }
    }

    fn device_added(&mut self, handle: DeviceHandle) {
        if self.registry.user_id_of(handle).is_some() {
            trace!("Duplicate connect for {}", handle);
            return;
        }
        let Some(info) = self.backend.describe(handle) else {
            debug!("Device {} vanished before it could be described", handle);
            return;
        };
        if !info.is_gamepad && !self.had_window {
            debug!("Deferring \"{}\" until the first window exists", info.name);
            return;
        }

        let mut status = if info.is_gamepad {
            DeviceStatus::Mapped
        } else {
            DeviceStatus::Inert
        };

        if !info.is_gamepad {
            let enabled = self.had_window && self.config.synthesize_missing_mappings;
            let mappings = &mut self.mappings;
            let backend = &mut self.backend;
            let installed = synthesize_mapping(
                &info,
                enabled,
                |text| {
                    install_mappings(mappings, backend, text);
                    backend.is_gamepad(handle)
                },
                &mut *self.errors,
            );
            if installed {
                status = DeviceStatus::Mapped;
                // Other pads with the same GUID pick up the new mapping too
                self.refresh_statuses();
            }
        }

        let slot = DeviceSlot::new(handle, info.name, info.guid, status);
        if let Some(id) = self.registry.register(slot) {
            for window in self.windows.values_mut() {
                window.on_gamepad_state(id, true);
            }
        }
    }

    fn device_removed(&mut self, handle: DeviceHandle) {
        let Some(id) = self.registry.unregister(handle) else {
            trace!("Disconnect for unknown device {}", handle);
            return;
        };
        for window in self.windows.values_mut() {
            window.on_gamepad_state(id, false);
        }
    }

    /// Add a window
    ///
    /// The first window ever added triggers a scan of every device the backend
    /// can see. Later windows only get connect callbacks for devices already
    /// registered.
    pub fn add_window(&mut self, mut window: Box<dyn GamepadWindow>) -> WindowId {
        let id = WindowId(self.next_window_id);
        self.next_window_id += 1;

        for (user, _) in self.registry.iter() {
            window.on_gamepad_state(user, true);
        }
        self.windows.insert(id, window);
        debug!("Added {} ({} live)", id, self.windows.len());

        if !self.had_window {
            self.had_window = true;
            for handle in self.backend.enumerate() {
                self.device_added(handle);
            }
        }
        id
    }

    /// Remove a window, clearing focus if it held it
    pub fn remove_window(&mut self, id: WindowId) -> Option<Box<dyn GamepadWindow>> {
        self.focus.on_window_removed(id);
        let window = self.windows.remove(&id);
        if window.is_some() {
            debug!("Removed {} ({} live)", id, self.windows.len());
        }
        window
    }

    /// Window focus change; unknown windows are ignored
    pub fn on_window_focused(&mut self, id: WindowId, focused: bool) {
        if self.windows.contains_key(&id) {
            self.focus.on_focus_changed(id, focused);
        }
    }

    /// Per-frame tick from `window`
    ///
    /// Does nothing unless `window` holds focus.
    ///
    /// # Returns
    /// Number of button and axis events delivered
    pub fn update(&mut self, window: WindowId) -> usize {
        if !self.focus.is_focused(window) {
            return 0;
        }
        let Some(target) = self.windows.get_mut(&window) else {
            return 0;
        };

        let backend = &mut self.backend;
        let range = self
            .config
            .trigger_range
            .unwrap_or_else(|| backend.trigger_range());
        let mut delivered = 0;

        for (user, slot) in self.registry.iter_mut() {
            if !slot.is_mapped() {
                continue;
            }
            let Some(state) = backend.read_state(slot.handle) else {
                continue;
            };

            for (index, &pressed) in state.buttons.iter().enumerate() {
                let was_pressed = slot.buttons.get(index).copied().unwrap_or(false);
                if pressed == was_pressed {
                    continue;
                }
                let button = backend.button_id(index);
                if button == GamepadButton::Unknown {
                    continue;
                }
                target.on_gamepad_button(user, button, pressed);
                delivered += 1;
            }
            slot.buttons = state.buttons;

            for (index, &value) in state.axes.iter().enumerate() {
                let axis = backend.axis_id(index);
                if axis == GamepadAxis::Unknown {
                    continue;
                }
                target.on_gamepad_axis(user, axis, forward_axis_value(axis, value, range));
                delivered += 1;
            }
        }

        trace!("Polled {} device(s), {} event(s)", self.registry.len(), delivered);
        delivered
    }

    /// Per-frame tick on behalf of whichever window holds focus
    pub fn update_focused(&mut self) -> usize {
        match self.focus.focused() {
            Some(window) => self.update(window),
            None => 0,
        }
    }

    /// Connected devices in unspecified order
    pub fn connected(&self) -> impl Iterator<Item = (UserId, &DeviceSlot)> {
        self.registry.iter()
    }

    pub fn user_id_of(&self, handle: DeviceHandle) -> Option<UserId> {
        self.registry.user_id_of(handle)
    }

    pub fn device(&self, id: UserId) -> Option<&DeviceSlot> {
        self.registry.get(id)
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.focus.focused()
    }

    pub fn window(&self, id: WindowId) -> Option<&(dyn GamepadWindow + 'static)> {
        self.windows.get(&id).map(|w| &**w)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut (dyn GamepadWindow + 'static)> {
        self.windows.get_mut(&id).map(|w| &mut **w)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn mappings(&self) -> &MappingDatabase {
        &self.mappings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
