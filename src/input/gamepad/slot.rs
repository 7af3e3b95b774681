//! Device registry
//!
//! Each connected device occupies a slot whose index is its user ID. A new
//! device always takes the lowest free slot, so numbering stays compact as
//! devices come and go:
//!
//! ```text
//! connect A -> 0, connect B -> 1, disconnect A, connect C -> 0
//! ```

use std::fmt;

use tracing::{debug, info};

use super::backend::DeviceHandle;

/// Small integer identifying a connected device to the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub usize);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gamepad{}", self.0)
    }
}

/// Whether a registered device produces button/axis events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Backend has a gamepad layout for it
    Mapped,
    /// No usable mapping; only connect/disconnect is visible
    Inert,
}

/// Registry record for one connected device
#[derive(Debug, Clone)]
pub struct DeviceSlot {
    pub handle: DeviceHandle,
    pub name: String,
    pub guid: String,
    pub status: DeviceStatus,

    /// Button states as of the last poll, backend-native order
    pub buttons: Vec<bool>,
}

impl DeviceSlot {
    pub fn new(handle: DeviceHandle, name: String, guid: String, status: DeviceStatus) -> Self {
        Self {
            handle,
            name,
            guid,
            status,
            buttons: Vec::new(),
        }
    }

    /// Fresh record with a new status, carrying identity and button history
    pub fn with_status(self, status: DeviceStatus) -> Self {
        Self { status, ..self }
    }

    pub fn is_mapped(&self) -> bool {
        self.status == DeviceStatus::Mapped
    }
}

/// Tracks connected devices and their user IDs
#[derive(Debug, Default)]
pub struct SlotManager {
    slots: Vec<Option<DeviceSlot>>,
}

impl SlotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest user ID not currently assigned
    pub fn allocate_user_id(&self) -> UserId {
        UserId(
            self.slots
                .iter()
                .position(Option::is_none)
                .unwrap_or(self.slots.len()),
        )
    }

    /// Register a device under the lowest free user ID
    ///
    /// # Returns
    /// The assigned ID, or `None` if the handle is already registered
    pub fn register(&mut self, slot: DeviceSlot) -> Option<UserId> {
        if let Some(existing) = self.user_id_of(slot.handle) {
            debug!("Device {} already registered as {}", slot.handle, existing);
            return None;
        }

        let id = self.allocate_user_id();
        info!("✅ {} connected: {} ({})", id, slot.name, slot.handle);
        if id.0 == self.slots.len() {
            self.slots.push(Some(slot));
        } else {
            self.slots[id.0] = Some(slot);
        }
        Some(id)
    }

    /// Release the user ID bound to `handle`
    ///
    /// # Returns
    /// The released ID, or `None` if the handle was not registered
    pub fn unregister(&mut self, handle: DeviceHandle) -> Option<UserId> {
        let id = self.user_id_of(handle)?;
        if let Some(slot) = self.slots[id.0].take() {
            info!("🔌 {} disconnected: {}", id, slot.name);
        }

        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        Some(id)
    }

    /// Replace the record for `id` with a freshly built one
    pub fn replace(&mut self, id: UserId, slot: DeviceSlot) -> bool {
        match self.slots.get_mut(id.0) {
            Some(entry @ Some(_)) => {
                *entry = Some(slot);
                true
            }
            _ => false,
        }
    }

    pub fn user_id_of(&self, handle: DeviceHandle) -> Option<UserId> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.handle == handle))
            .map(UserId)
    }

    pub fn get(&self, id: UserId) -> Option<&DeviceSlot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Connected devices; callers must not rely on the order
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &DeviceSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (UserId(i), s)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (UserId, &mut DeviceSlot)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|s| (UserId(i), s)))
    }

    /// Number of connected devices
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
