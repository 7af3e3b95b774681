//! In-memory joystick backend
//!
//! Simulated joysticks expose raw axes, buttons and hats like a platform
//! joystick API. Gamepad state is derived by applying the SDL mapping known for
//! the joystick's GUID, the same way native libraries do. Triggers are reported
//! bipolar (`[-1.0, 1.0]`, released at -1.0).
//!
//! Used by the test suite and the `--simulate` mode of the binary.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{Backend, DeviceHandle, DeviceInfo, Notification, RawPadState};
use crate::input::gamepad::axis::TriggerRange;
use crate::input::gamepad::buttons::{GamepadAxis, GamepadButton};
use crate::input::gamepad::mapping::{Mapping, Platform, RawInputs};

/// Simulated joystick
#[derive(Debug, Clone)]
pub struct VirtualJoystick {
    pub name: String,
    pub guid: String,
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
    pub hats: Vec<u8>,
    mapping: Option<Arc<Mapping>>,
}

impl VirtualJoystick {
    /// Joystick with every input at rest
    pub fn new(
        name: impl Into<String>,
        guid: impl Into<String>,
        axes: usize,
        buttons: usize,
        hats: usize,
    ) -> Self {
        Self {
            name: name.into(),
            guid: guid.into(),
            axes: vec![0.0; axes],
            buttons: vec![false; buttons],
            hats: vec![0; hats],
            mapping: None,
        }
    }

    /// Mapping currently backing this joystick
    pub fn mapping(&self) -> Option<&Arc<Mapping>> {
        self.mapping.as_ref()
    }
}

/// Backend over simulated joysticks
#[derive(Debug)]
pub struct VirtualBackend {
    platform: Platform,
    devices: Vec<Option<VirtualJoystick>>,
    mappings: HashMap<String, Arc<Mapping>>,
    pending: Vec<Notification>,
}

impl Default for VirtualBackend {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl VirtualBackend {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            devices: Vec::new(),
            mappings: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Plug in a joystick and queue its `Added` notification
    pub fn connect(&mut self, mut joystick: VirtualJoystick) -> DeviceHandle {
        joystick.mapping = self.mappings.get(&joystick.guid).cloned();

        let index = match self.devices.iter().position(Option::is_none) {
            Some(free) => {
                self.devices[free] = Some(joystick);
                free
            }
            None => {
                self.devices.push(Some(joystick));
                self.devices.len() - 1
            }
        };

        let handle = DeviceHandle(index);
        debug!("Virtual joystick {} plugged in", handle);
        self.pending.push(Notification::Added(handle));
        handle
    }

    /// Unplug a joystick and queue its `Removed` notification
    pub fn disconnect(&mut self, handle: DeviceHandle) -> bool {
        match self.devices.get_mut(handle.0).and_then(Option::take) {
            Some(_) => {
                debug!("Virtual joystick {} unplugged", handle);
                self.pending.push(Notification::Removed(handle));
                true
            }
            None => false,
        }
    }

    /// Queue a notification without changing any device
    ///
    /// Mimics platforms that repeat hot-plug events.
    pub fn push_notification(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    pub fn joystick(&self, handle: DeviceHandle) -> Option<&VirtualJoystick> {
        self.devices.get(handle.0).and_then(Option::as_ref)
    }

    pub fn joystick_mut(&mut self, handle: DeviceHandle) -> Option<&mut VirtualJoystick> {
        self.devices.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn set_button(&mut self, handle: DeviceHandle, index: usize, pressed: bool) {
        if let Some(b) = self
            .joystick_mut(handle)
            .and_then(|j| j.buttons.get_mut(index))
        {
            *b = pressed;
        }
    }

    pub fn set_axis(&mut self, handle: DeviceHandle, index: usize, value: f32) {
        if let Some(a) = self.joystick_mut(handle).and_then(|j| j.axes.get_mut(index)) {
            *a = value.clamp(-1.0, 1.0);
        }
    }

    pub fn set_hat(&mut self, handle: DeviceHandle, index: usize, bits: u8) {
        if let Some(h) = self.joystick_mut(handle).and_then(|j| j.hats.get_mut(index)) {
            *h = bits;
        }
    }
}

impl Backend for VirtualBackend {
    fn name(&self) -> &str {
        "virtual"
    }

    fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    fn enumerate(&self) -> Vec<DeviceHandle> {
        self.devices
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some())
            .map(|(i, _)| DeviceHandle(i))
            .collect()
    }

    fn describe(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
        self.joystick(handle).map(|j| DeviceInfo {
            name: j.name.clone(),
            guid: j.guid.clone(),
            axes: j.axes.len(),
            buttons: j.buttons.len(),
            hats: j.hats.len(),
            is_gamepad: j.mapping.is_some(),
        })
    }

    fn is_gamepad(&self, handle: DeviceHandle) -> bool {
        self.joystick(handle).is_some_and(|j| j.mapping.is_some())
    }

    fn read_state(&mut self, handle: DeviceHandle) -> Option<RawPadState> {
        let joystick = self.joystick(handle)?;
        let mapping = joystick.mapping.as_ref()?;
        let inputs = RawInputs {
            axes: &joystick.axes,
            buttons: &joystick.buttons,
            hats: &joystick.hats,
        };
        Some(mapping.apply(&inputs, TriggerRange::Bipolar))
    }

    fn button_id(&self, index: usize) -> GamepadButton {
        GamepadButton::from_index(index)
    }

    fn axis_id(&self, index: usize) -> GamepadAxis {
        GamepadAxis::from_index(index)
    }

    fn trigger_range(&self) -> TriggerRange {
        TriggerRange::Bipolar
    }

    fn update_mappings(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Mapping::parse_for(line, self.platform) {
                Ok(mapping) => {
                    let mapping = Arc::new(mapping);
                    // Joysticks never mutate their mapping; swap the reference
                    for joystick in self.devices.iter_mut().flatten() {
                        if joystick.guid == mapping.guid() {
                            joystick.mapping = Some(mapping.clone());
                        }
                    }
                    self.mappings.insert(mapping.guid().to_string(), mapping);
                    count += 1;
                }
                Err(e) => trace!("Virtual backend ignored mapping line: {}", e),
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD_GUID: &str = "03000000de280000fc11000001000000";
    const PAD_MAPPING: &str = "03000000de280000fc11000001000000,Test Pad,a:b0,b:b1,leftx:a0,lefttrigger:a2,dpup:h0.1,";

    #[test]
    fn test_connect_queues_notification() {
        let mut backend = VirtualBackend::new(Platform::Linux);
        let h = backend.connect(VirtualJoystick::new("Pad", PAD_GUID, 3, 2, 1));

        assert_eq!(backend.drain_notifications(), vec![Notification::Added(h)]);
        assert!(backend.drain_notifications().is_empty());
        assert_eq!(backend.enumerate(), vec![h]);
    }

    #[test]
    fn test_handles_are_reused_after_disconnect() {
        let mut backend = VirtualBackend::new(Platform::Linux);
        let a = backend.connect(VirtualJoystick::new("A", "ga", 0, 1, 0));
        let b = backend.connect(VirtualJoystick::new("B", "gb", 0, 1, 0));
        assert!(backend.disconnect(a));
        assert!(!backend.disconnect(a));
        let c = backend.connect(VirtualJoystick::new("C", "gc", 0, 1, 0));

        assert_eq!(c, a);
        assert_eq!(backend.enumerate(), vec![c, b]);
    }

    #[test]
    fn test_unmapped_joystick_has_no_state() {
        let mut backend = VirtualBackend::new(Platform::Linux);
        let h = backend.connect(VirtualJoystick::new("Pad", PAD_GUID, 3, 2, 1));

        assert!(!backend.is_gamepad(h));
        assert_eq!(backend.read_state(h), None);
        let info = backend.describe(h).unwrap();
        assert_eq!((info.axes, info.buttons, info.hats), (3, 2, 1));
    }

    #[test]
    fn test_mapping_update_replaces_reference() {
        let mut backend = VirtualBackend::new(Platform::Linux);
        let h = backend.connect(VirtualJoystick::new("Pad", PAD_GUID, 3, 2, 1));

        assert_eq!(backend.update_mappings(PAD_MAPPING), 1);
        assert!(backend.is_gamepad(h));
        let first = backend.joystick(h).unwrap().mapping().cloned().unwrap();

        backend.update_mappings(PAD_MAPPING);
        let second = backend.joystick(h).unwrap().mapping().cloned().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_read_state_applies_mapping() {
        let mut backend = VirtualBackend::new(Platform::Linux);
        backend.update_mappings(PAD_MAPPING);
        let h = backend.connect(VirtualJoystick::new("Pad", PAD_GUID, 3, 2, 1));

        backend.set_button(h, 1, true);
        backend.set_axis(h, 0, -2.0);
        backend.set_axis(h, 2, 1.0);
        backend.set_hat(h, 0, 1);

        let state = backend.read_state(h).unwrap();
        assert!(state.buttons[GamepadButton::B.index().unwrap()]);
        assert!(state.buttons[GamepadButton::DpadUp.index().unwrap()]);
        assert_eq!(state.axes[GamepadAxis::LeftX.index().unwrap()], -1.0);
        assert_eq!(state.axes[GamepadAxis::LeftTrigger.index().unwrap()], 1.0);
    }

    #[test]
    fn test_foreign_platform_lines_are_not_installed() {
        let mut backend = VirtualBackend::new(Platform::Windows);
        let text = format!("{}platform:Linux,", PAD_MAPPING);
        assert_eq!(backend.update_mappings(&text), 0);
    }
}
