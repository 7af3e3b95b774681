//! Missing-mapping synthesis
//!
//! A joystick with no known gamepad layout gets a best-effort mapping built
//! from its capability counts, so it stays usable until someone writes a real
//! one. The generated text is included in the diagnostic so it can be copied
//! into a mapping file and corrected by hand.

use tracing::{info, warn};

use super::backend::DeviceInfo;
use super::error::ErrorHandler;

/// Component name used in error reports
pub const COMPONENT: &str = "JoystickManager";

/// Button tokens, assigned to button indices in this order
const BUTTON_NAMES: [&str; 17] = [
    "a",
    "b",
    "x",
    "y",
    "leftshoulder",
    "rightshoulder",
    "righttrigger",
    "lefttrigger",
    "back",
    "start",
    "leftstick",
    "rightstick",
    "guide",
    "dpleft",
    "dpdown",
    "dpright",
    "dpup",
];

/// Axis tokens, assigned to axis indices in this order
const AXIS_NAMES: [&str; 6] = [
    "leftx",
    "lefty",
    "rightx",
    "righty",
    "lefttrigger",
    "righttrigger",
];

/// Hat bit for each d-pad direction
const HAT_BITS: [(&str, u8); 4] = [("dpup", 1), ("dpright", 2), ("dpdown", 4), ("dpleft", 8)];

/// Platform tags the generated line is duplicated for
const PLATFORM_TAGS: [&str; 2] = ["Linux", "Mac OS X"];

/// Build the generated mapping text for a device
///
/// One line per entry in the platform tag list, joined by newlines.
pub fn candidate_mapping(info: &DeviceInfo) -> String {
    let mut line = format!("{},{},", info.guid, info.name.replace(',', " "));

    for (index, name) in AXIS_NAMES.iter().take(info.axes).enumerate() {
        line.push_str(&format!("{}:a{},", name, index));
    }
    if info.hats > 0 {
        for (name, bit) in HAT_BITS {
            line.push_str(&format!("{}:h0.{},", name, bit));
        }
    }
    for (index, name) in BUTTON_NAMES.iter().take(info.buttons).enumerate() {
        line.push_str(&format!("{}:b{},", name, index));
    }

    PLATFORM_TAGS
        .iter()
        .map(|tag| format!("{}platform:{},", line, tag))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate and install a mapping for an unmapped device
///
/// # Arguments
/// * `info` - Device identity and capability counts
/// * `enabled` - `false` makes this a silent no-op (no window yet, or disabled)
/// * `install` - Registers the text with the backend and reports whether the
///   device is now mapped
/// * `errors` - Receives exactly one report per attempt
///
/// # Returns
/// `true` if the device is now usable
pub fn synthesize_mapping<F>(
    info: &DeviceInfo,
    enabled: bool,
    install: F,
    errors: &mut dyn ErrorHandler,
) -> bool
where
    F: FnOnce(&str) -> bool,
{
    if !enabled {
        return false;
    }

    let text = candidate_mapping(info);
    let installed = install(&text);

    let message = if installed {
        info!("🎮 Generated mapping installed for \"{}\"", info.name);
        format!(
            "Gamepad \"{}\" ({}) has no mapping; using a generated one. \
             Add a corrected line to gamecontrollerdb.txt:\n{}",
            info.name, info.guid, text
        )
    } else {
        warn!("Generated mapping for \"{}\" was not accepted", info.name);
        format!(
            "Gamepad \"{}\" ({}) has no mapping and the generated one was rejected; \
             the device will not report input:\n{}",
            info.name, info.guid, text
        )
    };
    errors.on_error(COMPONENT, &message);

    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        reports: Vec<(String, String)>,
    }

    impl ErrorHandler for Recorder {
        fn on_error(&mut self, component: &str, message: &str) -> bool {
            self.reports.push((component.to_string(), message.to_string()));
            true
        }
    }

    fn unknown_pad() -> DeviceInfo {
        DeviceInfo {
            name: "Unknown".to_string(),
            guid: "03000000de280000fc11000001000000".to_string(),
            axes: 4,
            buttons: 12,
            hats: 1,
            is_gamepad: false,
        }
    }

    #[test]
    fn test_candidate_for_unknown_pad() {
        let text = candidate_mapping(&unknown_pad());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("platform:Linux,"));
        assert!(lines[1].ends_with("platform:Mac OS X,"));
        for line in lines {
            assert!(line.starts_with("03000000de280000fc11000001000000,Unknown,"));
            assert!(line.contains("a:b0,b:b1,x:b2,y:b3"));
            assert!(line.contains("leftx:a0,lefty:a1,rightx:a2,righty:a3"));
            assert!(line.contains("dpup:h0.1,dpright:h0.2,dpdown:h0.4,dpleft:h0.8"));
            assert!(!line.contains("guide:"));
            assert!(line.contains("rightstick:b11,"));
            assert!(!line.contains("lefttrigger:a4"));
        }
    }

    #[test]
    fn test_candidate_caps_counts_and_sanitizes_name() {
        let info = DeviceInfo {
            name: "Pad, Deluxe".to_string(),
            guid: "g".to_string(),
            axes: 9,
            buttons: 40,
            hats: 0,
            is_gamepad: false,
        };
        let text = candidate_mapping(&info);
        let line = text.lines().next().unwrap();

        assert!(line.starts_with("g,Pad  Deluxe,"));
        assert!(line.contains("righttrigger:a5,"));
        assert!(!line.contains(":a6"));
        assert!(line.contains("dpup:b16,"));
        assert!(!line.contains(":b17"));
        assert!(!line.contains(":h0."));
    }

    #[test]
    fn test_synthesize_reports_once_with_text() {
        let mut recorder = Recorder::default();
        let mut installed_text = String::new();

        let ok = synthesize_mapping(
            &unknown_pad(),
            true,
            |text| {
                installed_text = text.to_string();
                true
            },
            &mut recorder,
        );

        assert!(ok);
        assert_eq!(recorder.reports.len(), 1);
        assert_eq!(recorder.reports[0].0, COMPONENT);
        assert!(recorder.reports[0].1.contains(&installed_text));
    }

    #[test]
    fn test_synthesize_failure_is_reported() {
        let mut recorder = Recorder::default();
        let ok = synthesize_mapping(&unknown_pad(), true, |_| false, &mut recorder);
        assert!(!ok);
        assert_eq!(recorder.reports.len(), 1);
        assert!(recorder.reports[0].1.contains("rejected"));
    }

    #[test]
    fn test_disabled_is_silent_noop() {
        let mut recorder = Recorder::default();
        let mut called = false;
        let ok = synthesize_mapping(
            &unknown_pad(),
            false,
            |_| {
                called = true;
                true
            },
            &mut recorder,
        );
        assert!(!ok);
        assert!(!called);
        assert!(recorder.reports.is_empty());
    }
}
