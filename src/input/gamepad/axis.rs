//! Shared axis utilities
//!
//! Backends disagree on the range they report analog triggers in. Sticks are
//! always `[-1.0, 1.0]`; triggers are forwarded to windows in `[0.0, 1.0]`.

use serde::{Deserialize, Serialize};

use super::buttons::GamepadAxis;

/// Native range a backend reports trigger axes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerRange {
    /// `[-1.0, 1.0]`, released at -1.0 (GLFW/SDL joystick convention)
    Bipolar,
    /// `[0.0, 1.0]`, released at 0.0
    Unipolar,
}

/// Map a bipolar trigger value onto `[0.0, 1.0]`
///
/// `-1.0 -> 0.0`, `0.0 -> 0.5`, `1.0 -> 1.0`.
pub fn rescale_trigger(value: f32) -> f32 {
    value / 2.0 + 0.5
}

/// Value forwarded to windows for `axis`, given the backend's trigger range
pub fn forward_axis_value(axis: GamepadAxis, value: f32, range: TriggerRange) -> f32 {
    if axis.is_trigger() && range == TriggerRange::Bipolar {
        rescale_trigger(value)
    } else {
        value
    }
}
