//! Native backend on top of gilrs
//!
//! gilrs cannot attach a new SDL mapping to a gamepad it already opened. When
//! mappings change, the whole context is rebuilt with the registered mapping
//! lines and every arena slot is re-pointed at the matching gamepad of the new
//! context. Handles given to the manager are arena indices, so they survive
//! the rebuild.
//!
//! Only pads with an SDL mapping count as gamepads. A pad gilrs merely drives
//! through its kernel driver layout is reported unmapped, so the manager can
//! synthesize a mapping for it.

use std::collections::BTreeMap;

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs, GilrsBuilder, MappingSource};
use tracing::{debug, info, trace, warn};

use super::{Backend, DeviceHandle, DeviceInfo, Notification, RawPadState};
use crate::input::gamepad::axis::TriggerRange;
use crate::input::gamepad::buttons::{GamepadAxis, GamepadButton};
use crate::input::gamepad::error::BackendError;

/// Native button order reported by `read_state`
const NATIVE_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadRight,
    Button::DPadDown,
    Button::DPadLeft,
    Button::C,
    Button::Z,
];

/// Native axis order; indices 4 and 5 are the analog trigger buttons
const NATIVE_AXES: [Option<Axis>; 8] = [
    Some(Axis::LeftStickX),
    Some(Axis::LeftStickY),
    Some(Axis::RightStickX),
    Some(Axis::RightStickY),
    None,
    None,
    Some(Axis::DPadX),
    Some(Axis::DPadY),
];

const TRIGGER_BUTTONS: [Button; 2] = [Button::LeftTrigger2, Button::RightTrigger2];

/// Digital controls counted when describing a device
const CAPABILITY_BUTTONS: [Button; 15] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
];

const CAPABILITY_AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
];

const DPAD_BUTTONS: [Button; 4] = [
    Button::DPadUp,
    Button::DPadRight,
    Button::DPadDown,
    Button::DPadLeft,
];

/// Count `(axes, buttons, hats)` from the controls a pad has codes for
///
/// gilrs exposes a hat as the DPadX/DPadY axis pair; a pad without one but
/// with d-pad buttons counts those as plain buttons.
fn capability_counts(
    has_button: impl Fn(Button) -> bool,
    has_axis: impl Fn(Axis) -> bool,
) -> (usize, usize, usize) {
    let axes = CAPABILITY_AXES.iter().filter(|a| has_axis(**a)).count();
    let hats = usize::from(has_axis(Axis::DPadX) || has_axis(Axis::DPadY));

    let mut buttons = CAPABILITY_BUTTONS.iter().filter(|b| has_button(**b)).count();
    if hats == 0 {
        buttons += DPAD_BUTTONS.iter().filter(|b| has_button(**b)).count();
    }
    (axes, buttons, hats)
}

/// Whether gilrs laid the pad out from an SDL mapping
fn has_sdl_mapping(source: MappingSource) -> bool {
    matches!(source, MappingSource::SdlMappings)
}

/// Registered mapping lines, one per GUID and platform
#[derive(Debug, Clone, Default)]
struct MappingLines {
    lines: BTreeMap<(String, Option<String>), String>,
}

impl MappingLines {
    /// Add every line of `text`, replacing earlier lines for the same pad
    ///
    /// # Returns
    /// Number of mapping lines in `text`
    fn insert_text(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
        {
            let mut fields = line.split(',').map(str::trim);
            let guid = fields.next().unwrap_or_default().to_string();
            let platform = fields
                .find_map(|f| f.strip_prefix("platform:"))
                .map(|p| p.trim().to_string());
            self.lines.insert((guid, platform), line.to_string());
            count += 1;
        }
        count
    }

    fn text(&self) -> String {
        self.lines
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn len(&self) -> usize {
        self.lines.len()
    }
}

fn logical_button(button: Button) -> GamepadButton {
    match button {
        Button::South => GamepadButton::A,
        Button::East => GamepadButton::B,
        Button::West => GamepadButton::X,
        Button::North => GamepadButton::Y,
        Button::LeftTrigger => GamepadButton::LeftBumper,
        Button::RightTrigger => GamepadButton::RightBumper,
        Button::Select => GamepadButton::Back,
        Button::Start => GamepadButton::Start,
        Button::Mode => GamepadButton::Guide,
        Button::LeftThumb => GamepadButton::LeftStick,
        Button::RightThumb => GamepadButton::RightStick,
        Button::DPadUp => GamepadButton::DpadUp,
        Button::DPadRight => GamepadButton::DpadRight,
        Button::DPadDown => GamepadButton::DpadDown,
        Button::DPadLeft => GamepadButton::DpadLeft,
        _ => GamepadButton::Unknown,
    }
}

/// Arena entry for one opened gamepad
#[derive(Debug, Clone)]
struct GilrsSlot {
    id: GamepadId,
    uuid: [u8; 16],
    name: String,
}

/// gilrs-backed joystick access
pub struct GilrsBackend {
    gilrs: Gilrs,
    slots: Vec<Option<GilrsSlot>>,
    pending: Vec<Notification>,
    /// Replayed into every rebuilt context
    mappings: MappingLines,
}

impl GilrsBackend {
    /// Open the platform gamepad library
    pub fn new() -> Result<Self, BackendError> {
        let gilrs = build_context("")?;
        let mut backend = Self {
            gilrs,
            slots: Vec::new(),
            pending: Vec::new(),
            mappings: MappingLines::default(),
        };

        let ids: Vec<GamepadId> = backend.gilrs.gamepads().map(|(id, _)| id).collect();
        for id in ids {
            backend.attach(id);
        }
        info!("gilrs backend ready ({} gamepad(s))", backend.slots.len());
        Ok(backend)
    }

    fn handle_of(&self, id: GamepadId) -> Option<DeviceHandle> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.id == id))
            .map(DeviceHandle)
    }

    fn slot(&self, handle: DeviceHandle) -> Option<&GilrsSlot> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Give `id` an arena slot and queue `Added`
    fn attach(&mut self, id: GamepadId) -> DeviceHandle {
        if let Some(handle) = self.handle_of(id) {
            return handle;
        }

        let (uuid, name) = match self.gilrs.connected_gamepad(id) {
            Some(g) => (g.uuid(), g.name().to_string()),
            None => ([0; 16], String::new()),
        };
        let slot = GilrsSlot { id, uuid, name };

        let index = match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(slot);
                free
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        let handle = DeviceHandle(index);
        self.pending.push(Notification::Added(handle));
        handle
    }

    fn detach(&mut self, id: GamepadId) {
        if let Some(handle) = self.handle_of(id) {
            self.slots[handle.0] = None;
            self.pending.push(Notification::Removed(handle));
        }
    }

    /// Swap in a context built with the registered mapping lines
    fn rebuild(&mut self) -> Result<(), BackendError> {
        let mut gilrs = build_context(&self.mappings.text())?;

        // Connection events for already-known pads
        while gilrs.next_event().is_some() {}

        let fresh: Vec<(GamepadId, [u8; 16], String)> = gilrs
            .gamepads()
            .map(|(id, g)| (id, g.uuid(), g.name().to_string()))
            .collect();
        let mut claimed = vec![false; fresh.len()];

        for index in 0..self.slots.len() {
            let Some(slot) = self.slots[index].as_mut() else {
                continue;
            };
            let found = fresh.iter().enumerate().position(|(i, (_, uuid, name))| {
                !claimed[i] && *uuid == slot.uuid && *name == slot.name
            });
            match found {
                Some(i) => {
                    claimed[i] = true;
                    slot.id = fresh[i].0;
                }
                None => {
                    debug!("Gamepad \"{}\" vanished during rebuild", slot.name);
                    self.slots[index] = None;
                    self.pending.push(Notification::Removed(DeviceHandle(index)));
                }
            }
        }

        self.gilrs = gilrs;
        for (i, (id, _, _)) in fresh.iter().enumerate() {
            if !claimed[i] {
                self.attach(*id);
            }
        }
        Ok(())
    }
}

fn build_context(mappings: &str) -> Result<Gilrs, BackendError> {
    match GilrsBuilder::new().add_mappings(mappings).build() {
        Ok(gilrs) => Ok(gilrs),
        Err(gilrs::Error::NotImplemented(gilrs)) => {
            warn!("gilrs has no backend for this platform; no gamepads will be found");
            Ok(gilrs)
        }
        Err(e) => Err(BackendError::Init(e.to_string())),
    }
}

impl Backend for GilrsBackend {
    fn name(&self) -> &str {
        "gilrs"
    }

    fn drain_notifications(&mut self) -> Vec<Notification> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    let handle = self.attach(id);
                    trace!("gilrs gamepad {:?} connected as {}", id, handle);
                }
                EventType::Disconnected => self.detach(id),
                _ => {}
            }
        }
        std::mem::take(&mut self.pending)
    }

    fn enumerate(&self) -> Vec<DeviceHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| DeviceHandle(i))
            .collect()
    }

    fn describe(&self, handle: DeviceHandle) -> Option<DeviceInfo> {
        let slot = self.slot(handle)?;
        let gamepad = self.gilrs.connected_gamepad(slot.id)?;
        let (axes, buttons, hats) = capability_counts(
            |b| gamepad.button_code(b).is_some(),
            |a| gamepad.axis_code(a).is_some(),
        );
        Some(DeviceInfo {
            name: gamepad.name().to_string(),
            guid: hex::encode(gamepad.uuid()),
            axes,
            buttons,
            hats,
            is_gamepad: has_sdl_mapping(gamepad.mapping_source()),
        })
    }

    fn is_gamepad(&self, handle: DeviceHandle) -> bool {
        self.slot(handle)
            .and_then(|s| self.gilrs.connected_gamepad(s.id))
            .is_some_and(|g| has_sdl_mapping(g.mapping_source()))
    }

    fn read_state(&mut self, handle: DeviceHandle) -> Option<RawPadState> {
        let slot = self.slot(handle)?;
        let gamepad = self.gilrs.connected_gamepad(slot.id)?;
        if !has_sdl_mapping(gamepad.mapping_source()) {
            return None;
        }

        let buttons = NATIVE_BUTTONS.iter().map(|b| gamepad.is_pressed(*b)).collect();
        let axes = NATIVE_AXES
            .iter()
            .enumerate()
            .map(|(i, axis)| match axis {
                Some(axis) => gamepad.value(*axis),
                None => TRIGGER_BUTTONS
                    .get(i - 4)
                    .and_then(|b| gamepad.button_data(*b))
                    .map(|d| d.value())
                    .unwrap_or(0.0),
            })
            .collect();

        Some(RawPadState { buttons, axes })
    }

    fn button_id(&self, index: usize) -> GamepadButton {
        NATIVE_BUTTONS
            .get(index)
            .map(|b| logical_button(*b))
            .unwrap_or(GamepadButton::Unknown)
    }

    fn axis_id(&self, index: usize) -> GamepadAxis {
        match index {
            0 => GamepadAxis::LeftX,
            1 => GamepadAxis::LeftY,
            2 => GamepadAxis::RightX,
            3 => GamepadAxis::RightY,
            4 => GamepadAxis::LeftTrigger,
            5 => GamepadAxis::RightTrigger,
            _ => GamepadAxis::Unknown,
        }
    }

    /// Analog trigger buttons report `[0.0, 1.0]`
    fn trigger_range(&self) -> TriggerRange {
        TriggerRange::Unipolar
    }

    fn update_mappings(&mut self, text: &str) -> usize {
        let previous = self.mappings.clone();
        let count = self.mappings.insert_text(text);
        if count == 0 {
            return 0;
        }

        match self.rebuild() {
            Ok(()) => {
                debug!(
                    "gilrs context rebuilt ({} updated, {} registered)",
                    count,
                    self.mappings.len()
                );
                count
            }
            Err(e) => {
                warn!("Failed to rebuild gilrs context: {}", e);
                self.mappings = previous;
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_button_table() {
        let backend_ids: Vec<GamepadButton> =
            NATIVE_BUTTONS.iter().map(|b| logical_button(*b)).collect();

        for button in GamepadButton::ALL {
            assert!(backend_ids.contains(&button), "{} has no native code", button);
        }
        assert_eq!(logical_button(Button::C), GamepadButton::Unknown);
        assert_eq!(logical_button(Button::Z), GamepadButton::Unknown);
    }

    #[test]
    fn test_native_axis_table_has_trigger_slots() {
        assert_eq!(NATIVE_AXES[4], None);
        assert_eq!(NATIVE_AXES[5], None);
        assert_eq!(NATIVE_AXES.len(), 8);
    }

    #[test]
    fn test_only_sdl_layouts_count_as_gamepads() {
        assert!(has_sdl_mapping(MappingSource::SdlMappings));
        assert!(!has_sdl_mapping(MappingSource::Driver));
        assert!(!has_sdl_mapping(MappingSource::None));
    }

    #[test]
    fn test_capability_counts_from_available_codes() {
        // Twin-stick pad with a hat and twelve buttons
        let pad_buttons = [
            Button::South,
            Button::East,
            Button::North,
            Button::West,
            Button::LeftTrigger,
            Button::LeftTrigger2,
            Button::RightTrigger,
            Button::RightTrigger2,
            Button::Select,
            Button::Start,
            Button::LeftThumb,
            Button::RightThumb,
        ];
        let pad_axes = [
            Axis::LeftStickX,
            Axis::LeftStickY,
            Axis::RightStickX,
            Axis::RightStickY,
            Axis::DPadX,
            Axis::DPadY,
        ];
        let counts = capability_counts(|b| pad_buttons.contains(&b), |a| pad_axes.contains(&a));
        assert_eq!(counts, (4, 12, 1));

        // D-pad reported as buttons, no hat
        let counts = capability_counts(
            |b| matches!(b, Button::South | Button::East) || DPAD_BUTTONS.contains(&b),
            |a| a == Axis::LeftStickX,
        );
        assert_eq!(counts, (1, 6, 0));

        assert_eq!(capability_counts(|_| false, |_| false), (0, 0, 0));
    }

    #[test]
    fn test_mapping_lines_replace_instead_of_growing() {
        let db = "g1,Pad,a:b0,platform:Linux,\ng1,Pad,a:b0,platform:Mac OS X,\ng2,Stick,a:b1,";
        let mut lines = MappingLines::default();

        assert_eq!(lines.insert_text(db), 3);
        assert_eq!(lines.insert_text(db), 3);
        assert_eq!(lines.len(), 3);

        assert_eq!(lines.insert_text("# reload\ng2,Stick,a:b4,\n\n"), 1);
        assert_eq!(lines.len(), 3);
        let text = lines.text();
        assert!(text.contains("g2,Stick,a:b4,"));
        assert!(!text.contains("a:b1"));
        assert_eq!(text.lines().count(), 3);

        assert_eq!(lines.insert_text("# only comments\n"), 0);
    }
}
