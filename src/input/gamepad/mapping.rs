//! Gamepad mapping records
//!
//! A mapping is one line of an SDL-style controller database:
//!
//! ```text
//! GUID,Name,a:b0,b:b1,leftx:a0,lefty:a1,dpup:h0.1,platform:Linux,
//! ```
//!
//! Sources use the following syntax:
//! - `bN` digital button `N`
//! - `aN` axis `N`; `+aN` / `-aN` select one half, a trailing `~` inverts
//! - `hN.M` hat `N`, bit `M` (1 = up, 2 = right, 4 = down, 8 = left)
//!
//! A token may carry a `+`/`-` prefix (`+leftx:b3`) to drive only one half of
//! an output axis.
//!
//! Parsing is all-or-nothing: a line either becomes a complete [`Mapping`] or a
//! [`ParseError`]. Mappings are immutable once built; a newer line for the same
//! GUID replaces the old mapping instead of editing it.

use std::fmt;

use super::axis::TriggerRange;
use super::backend::RawPadState;
use super::buttons::{Control, GamepadAxis, AXIS_COUNT, BUTTON_COUNT};
use super::error::ParseError;

/// Platform tags understood in `platform:` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Android,
    Ios,
    Other,
}

impl Platform {
    /// Platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Other
        }
    }

    /// Tag used in mapping lines
    pub fn tag(self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOs => "Mac OS X",
            Platform::Windows => "Windows",
            Platform::Android => "Android",
            Platform::Ios => "iOS",
            Platform::Other => "Other",
        }
    }
}

/// Half of a bidirectional axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisHalf {
    Positive,
    Negative,
}

impl AxisHalf {
    fn prefix(self) -> char {
        match self {
            AxisHalf::Positive => '+',
            AxisHalf::Negative => '-',
        }
    }

    fn strip(text: &str) -> (Option<Self>, &str) {
        if let Some(rest) = text.strip_prefix('+') {
            (Some(AxisHalf::Positive), rest)
        } else if let Some(rest) = text.strip_prefix('-') {
            (Some(AxisHalf::Negative), rest)
        } else {
            (None, text)
        }
    }
}

/// Physical input a logical control is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Button(usize),
    Axis {
        index: usize,
        half: Option<AxisHalf>,
        invert: bool,
    },
    Hat { index: usize, mask: u8 },
}

impl Source {
    fn parse(token: &str, text: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidSource {
            token: token.to_string(),
            value: text.to_string(),
        };

        let (half, rest) = AxisHalf::strip(text);
        let (invert, rest) = match rest.strip_suffix('~') {
            Some(inner) => (true, inner),
            None => (false, rest),
        };

        let mut chars = rest.chars();
        let kind = chars.next().ok_or_else(invalid)?;
        let body = chars.as_str();

        match kind {
            'b' if half.is_none() && !invert => {
                body.parse().map(Source::Button).map_err(|_| invalid())
            }
            'a' => {
                let index = body.parse().map_err(|_| invalid())?;
                Ok(Source::Axis { index, half, invert })
            }
            'h' if half.is_none() && !invert => {
                let (index, mask) = body.split_once('.').ok_or_else(invalid)?;
                let index = index.parse().map_err(|_| invalid())?;
                let mask: u8 = mask.parse().map_err(|_| invalid())?;
                if !matches!(mask, 1 | 2 | 4 | 8) {
                    return Err(ParseError::InvalidHatMask(mask));
                }
                Ok(Source::Hat { index, mask })
            }
            _ => Err(invalid()),
        }
    }

    /// Current value in `[0, 1]` for digital sources and half axes, `[-1, 1]`
    /// for full axes
    fn read(&self, inputs: &RawInputs<'_>) -> f32 {
        match *self {
            Source::Button(index) => {
                if inputs.buttons.get(index).copied().unwrap_or(false) {
                    1.0
                } else {
                    0.0
                }
            }
            Source::Axis { index, half, invert } => {
                let mut value = inputs.axes.get(index).copied().unwrap_or(0.0);
                if invert {
                    value = -value;
                }
                match half {
                    Some(AxisHalf::Positive) => value.max(0.0),
                    Some(AxisHalf::Negative) => (-value).max(0.0),
                    None => value,
                }
            }
            Source::Hat { index, mask } => {
                let bits = inputs.hats.get(index).copied().unwrap_or(0);
                if bits & mask != 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn is_full_axis(&self) -> bool {
        matches!(self, Source::Axis { half: None, .. })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Source::Button(index) => write!(f, "b{}", index),
            Source::Axis { index, half, invert } => {
                if let Some(half) = half {
                    write!(f, "{}", half.prefix())?;
                }
                write!(f, "a{}", index)?;
                if invert {
                    f.write_str("~")?;
                }
                Ok(())
            }
            Source::Hat { index, mask } => write!(f, "h{}.{}", index, mask),
        }
    }
}

/// Logical control (optionally one half of an output axis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub control: Control,
    pub half: Option<AxisHalf>,
}

/// One `token:source` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub target: Target,
    pub source: Source,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(half) = self.target.half {
            write!(f, "{}", half.prefix())?;
        }
        write!(f, "{}:{}", self.target.control.token(), self.source)
    }
}

/// Raw joystick inputs a mapping is applied to
#[derive(Debug, Clone, Copy, Default)]
pub struct RawInputs<'a> {
    pub axes: &'a [f32],
    pub buttons: &'a [bool],
    pub hats: &'a [u8],
}

/// Parsed mapping-database record
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    guid: String,
    name: String,
    bindings: Vec<Binding>,
    platform: Option<String>,
}

/// Metadata keys that are accepted and ignored
fn is_metadata_key(key: &str) -> bool {
    matches!(key, "crc" | "hint") || key.starts_with("sdk")
}

impl Mapping {
    /// Parse a line for the platform this binary runs on
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        Self::parse_for(line, Platform::current())
    }

    /// Parse a line, rejecting it if it names a platform other than `platform`
    pub fn parse_for(line: &str, platform: Platform) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut fields = line.split(',');
        let guid = fields.next().map(str::trim).unwrap_or_default();
        if guid.is_empty() || guid.contains(':') {
            return Err(ParseError::MissingGuid);
        }
        let name = fields.next().ok_or(ParseError::MissingName)?.trim();

        let fields: Vec<&str> = fields.map(str::trim).filter(|f| !f.is_empty()).collect();

        // Foreign lines are rejected before their bindings are looked at
        let line_platform = fields.iter().find_map(|field| {
            field
                .split_once(':')
                .filter(|(key, _)| key.trim() == "platform")
                .map(|(_, value)| value.trim().to_string())
        });
        if let Some(tag) = &line_platform {
            if tag != platform.tag() {
                return Err(ParseError::PlatformMismatch(tag.clone()));
            }
        }

        let mut bindings: Vec<Binding> = Vec::new();
        for field in fields {
            let (key, value) = field
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedPair(field.to_string()))?;
            let (key, value) = (key.trim(), value.trim());

            if key == "platform" || is_metadata_key(key) {
                continue;
            }

            let (half, token) = AxisHalf::strip(key);
            let control = Control::from_token(token)
                .ok_or_else(|| ParseError::UnknownToken(key.to_string()))?;
            let source = Source::parse(key, value)?;
            let binding = Binding {
                target: Target { control, half },
                source,
            };

            // Later entries for the same target win
            match bindings.iter_mut().find(|b| b.target == binding.target) {
                Some(existing) => *existing = binding,
                None => bindings.push(binding),
            }
        }

        Ok(Self {
            guid: guid.to_string(),
            name: name.to_string(),
            bindings,
            platform: line_platform,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Source bound to a whole logical control
    pub fn source_for(&self, control: Control) -> Option<Source> {
        self.bindings
            .iter()
            .find(|b| b.target.control == control && b.target.half.is_none())
            .map(|b| b.source)
    }

    /// Translate raw joystick inputs into the logical gamepad layout
    ///
    /// Buttons are indexed by `GamepadButton::ALL`, axes by
    /// [`GamepadAxis::ALL`]. Triggers are produced in `trigger_range`.
    pub fn apply(&self, inputs: &RawInputs<'_>, trigger_range: TriggerRange) -> RawPadState {
        let released = match trigger_range {
            TriggerRange::Bipolar => -1.0,
            TriggerRange::Unipolar => 0.0,
        };

        let mut state = RawPadState {
            buttons: vec![false; BUTTON_COUNT],
            axes: vec![0.0; AXIS_COUNT],
        };
        for axis in [GamepadAxis::LeftTrigger, GamepadAxis::RightTrigger] {
            if let Some(i) = axis.index() {
                state.axes[i] = released;
            }
        }

        for binding in &self.bindings {
            let value = binding.source.read(inputs);
            match binding.target.control {
                Control::Button(button) => {
                    if let Some(i) = button.index() {
                        state.buttons[i] = value > 0.5;
                    }
                }
                Control::Axis(axis) => {
                    let Some(i) = axis.index() else { continue };
                    if axis.is_trigger() {
                        state.axes[i] = match (binding.source.is_full_axis(), trigger_range) {
                            (true, TriggerRange::Bipolar) => value,
                            (true, TriggerRange::Unipolar) => (value + 1.0) / 2.0,
                            (false, TriggerRange::Bipolar) => value * 2.0 - 1.0,
                            (false, TriggerRange::Unipolar) => value,
                        };
                        continue;
                    }
                    match binding.target.half {
                        // Halves share an output: only the active one writes
                        Some(AxisHalf::Positive) if value != 0.0 => state.axes[i] = value.abs(),
                        Some(AxisHalf::Negative) if value != 0.0 => state.axes[i] = -value.abs(),
                        Some(_) => {}
                        None => state.axes[i] = value,
                    }
                }
                Control::Extra(_) => {}
            }
        }

        state
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},", self.guid, self.name)?;
        for binding in &self.bindings {
            write!(f, "{},", binding)?;
        }
        if let Some(platform) = &self.platform {
            write!(f, "platform:{},", platform)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::gamepad::buttons::GamepadButton;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const XBOX_LINE: &str = "030000005e0400008e02000014010000,Xbox 360 Controller,a:b0,b:b1,back:b6,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,dpup:h0.1,guide:b8,leftshoulder:b4,leftstick:b9,lefttrigger:a2,leftx:a0,lefty:a1,rightshoulder:b5,rightstick:b10,righttrigger:a5,rightx:a3,righty:a4,start:b7,x:b2,y:b3,platform:Linux,";

    #[test]
    fn test_parse_full_line() {
        let mapping = Mapping::parse_for(XBOX_LINE, Platform::Linux).unwrap();
        assert_eq!(mapping.guid(), "030000005e0400008e02000014010000");
        assert_eq!(mapping.name(), "Xbox 360 Controller");
        assert_eq!(mapping.platform(), Some("Linux"));
        assert_eq!(mapping.bindings().len(), 21);
        assert_eq!(
            mapping.source_for(Control::Button(GamepadButton::A)),
            Some(Source::Button(0))
        );
        assert_eq!(
            mapping.source_for(Control::Button(GamepadButton::DpadLeft)),
            Some(Source::Hat { index: 0, mask: 8 })
        );
        assert_eq!(
            mapping.source_for(Control::Axis(GamepadAxis::RightTrigger)),
            Some(Source::Axis {
                index: 5,
                half: None,
                invert: false
            })
        );
    }

    #[test]
    fn test_axis_modifiers() {
        let mapping =
            Mapping::parse_for("abc,Pad,lefty:a1~,-leftx:-a0,+leftx:b3,", Platform::Linux).unwrap();
        assert_eq!(
            mapping.source_for(Control::Axis(GamepadAxis::LeftY)),
            Some(Source::Axis {
                index: 1,
                half: None,
                invert: true
            })
        );
        assert_eq!(mapping.bindings().len(), 3);
        assert_eq!(mapping.bindings()[1].target.half, Some(AxisHalf::Negative));
        assert_eq!(
            mapping.bindings()[1].source,
            Source::Axis {
                index: 0,
                half: Some(AxisHalf::Negative),
                invert: false
            }
        );
    }

    #[test]
    fn test_rejects_empty_and_missing_fields() {
        assert_eq!(Mapping::parse_for("", Platform::Linux), Err(ParseError::Empty));
        assert_eq!(Mapping::parse_for("   ", Platform::Linux), Err(ParseError::Empty));
        assert_eq!(
            Mapping::parse_for("a:b0,b:b1", Platform::Linux),
            Err(ParseError::MissingGuid)
        );
        assert_eq!(
            Mapping::parse_for("0300000000", Platform::Linux),
            Err(ParseError::MissingName)
        );
    }

    #[test]
    fn test_rejects_bad_entries() {
        assert_eq!(
            Mapping::parse_for("g,Pad,a:b0,oops,", Platform::Linux),
            Err(ParseError::MalformedPair("oops".to_string()))
        );
        assert_eq!(
            Mapping::parse_for("g,Pad,turbo:b0,", Platform::Linux),
            Err(ParseError::UnknownToken("turbo".to_string()))
        );
        assert_eq!(
            Mapping::parse_for("g,Pad,a:x0,", Platform::Linux),
            Err(ParseError::InvalidSource {
                token: "a".to_string(),
                value: "x0".to_string()
            })
        );
        assert_eq!(
            Mapping::parse_for("g,Pad,a:b,", Platform::Linux),
            Err(ParseError::InvalidSource {
                token: "a".to_string(),
                value: "b".to_string()
            })
        );
        assert_eq!(
            Mapping::parse_for("g,Pad,dpup:h0.3,", Platform::Linux),
            Err(ParseError::InvalidHatMask(3))
        );
        assert!(matches!(
            Mapping::parse_for("g,Pad,a:+b0,", Platform::Linux),
            Err(ParseError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_platform_filtering() {
        let line = "g,Pad,a:b0,platform:Mac OS X,";
        assert!(Mapping::parse_for(line, Platform::MacOs).is_ok());
        assert_eq!(
            Mapping::parse_for(line, Platform::Linux),
            Err(ParseError::PlatformMismatch("Mac OS X".to_string()))
        );
        // No platform entry: valid everywhere
        assert!(Mapping::parse_for("g,Pad,a:b0,", Platform::Windows).is_ok());
    }

    #[test]
    fn test_foreign_platform_wins_over_bad_entries() {
        // Newer database entries may use tokens this parser does not know
        let line = "g,Pad,a:b0,paddle9:b20,platform:Windows,";
        assert_eq!(
            Mapping::parse_for(line, Platform::Linux),
            Err(ParseError::PlatformMismatch("Windows".to_string()))
        );
        assert_eq!(
            Mapping::parse_for(line, Platform::Windows),
            Err(ParseError::UnknownToken("paddle9".to_string()))
        );
    }

    #[test]
    fn test_metadata_keys_are_ignored() {
        let mapping =
            Mapping::parse_for("g,Pad,a:b0,crc:1234,hint:!SDL_X,sdk>=:33,", Platform::Linux)
                .unwrap();
        assert_eq!(mapping.bindings().len(), 1);
    }

    #[test]
    fn test_later_duplicate_wins() {
        let mapping = Mapping::parse_for("g,Pad,dpup:h0.1,dpup:b16,", Platform::Linux).unwrap();
        assert_eq!(mapping.bindings().len(), 1);
        assert_eq!(
            mapping.source_for(Control::Button(GamepadButton::DpadUp)),
            Some(Source::Button(16))
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let mapping = Mapping::parse_for(XBOX_LINE, Platform::Linux).unwrap();
        let text = mapping.to_string();
        let reparsed = Mapping::parse_for(&text, Platform::Linux).unwrap();
        assert_eq!(mapping, reparsed);
        assert!(text.ends_with("platform:Linux,"));
    }

    #[test]
    fn test_apply_translates_raw_inputs() {
        let mapping = Mapping::parse_for(XBOX_LINE, Platform::Linux).unwrap();
        let mut buttons = vec![false; 11];
        buttons[0] = true; // a
        buttons[7] = true; // start
        let axes = [0.5, -0.25, 0.0, 0.0, 0.0, 1.0];
        let hats = [1u8 | 2u8];
        let state = mapping.apply(
            &RawInputs {
                axes: &axes,
                buttons: &buttons,
                hats: &hats,
            },
            TriggerRange::Bipolar,
        );

        let pressed = |b: GamepadButton| state.buttons[b.index().unwrap()];
        let value = |a: GamepadAxis| state.axes[a.index().unwrap()];

        assert!(pressed(GamepadButton::A));
        assert!(pressed(GamepadButton::Start));
        assert!(pressed(GamepadButton::DpadUp));
        assert!(pressed(GamepadButton::DpadRight));
        assert!(!pressed(GamepadButton::DpadDown));
        assert!(!pressed(GamepadButton::B));
        assert_eq!(value(GamepadAxis::LeftX), 0.5);
        assert_eq!(value(GamepadAxis::LeftY), -0.25);
        assert_eq!(value(GamepadAxis::LeftTrigger), 0.0);
        assert_eq!(value(GamepadAxis::RightTrigger), 1.0);
    }

    #[test]
    fn test_apply_button_bound_triggers_and_missing_inputs() {
        let mapping =
            Mapping::parse_for("g,Pad,lefttrigger:b6,righttrigger:b7,x:b40,", Platform::Linux)
                .unwrap();
        let buttons = [false, false, false, false, false, false, true, false];
        let inputs = RawInputs {
            buttons: &buttons,
            ..RawInputs::default()
        };

        let bipolar = mapping.apply(&inputs, TriggerRange::Bipolar);
        assert_eq!(bipolar.axes[GamepadAxis::LeftTrigger.index().unwrap()], 1.0);
        assert_eq!(bipolar.axes[GamepadAxis::RightTrigger.index().unwrap()], -1.0);
        // Out-of-range source reads as released
        assert!(!bipolar.buttons[GamepadButton::X.index().unwrap()]);

        let unipolar = mapping.apply(&inputs, TriggerRange::Unipolar);
        assert_eq!(unipolar.axes[GamepadAxis::RightTrigger.index().unwrap()], 0.0);
    }

    #[test]
    fn test_apply_split_axis_halves() {
        let mapping = Mapping::parse_for("g,Pad,-leftx:b0,+leftx:b1,", Platform::Linux).unwrap();
        let left = [true, false];
        let right = [false, true];
        let idle = [false, false];
        let x = |buttons: &[bool]| {
            let inputs = RawInputs {
                buttons,
                ..RawInputs::default()
            };
            mapping.apply(&inputs, TriggerRange::Bipolar).axes[0]
        };
        assert_eq!(x(&left), -1.0);
        assert_eq!(x(&right), 1.0);
        assert_eq!(x(&idle), 0.0);
    }

    fn source_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0usize..32).prop_map(|i| format!("b{}", i)),
            (0usize..8, prop::option::of(prop::bool::ANY), prop::bool::ANY).prop_map(
                |(i, half, invert)| {
                    let prefix = match half {
                        Some(true) => "+",
                        Some(false) => "-",
                        None => "",
                    };
                    format!("{}a{}{}", prefix, i, if invert { "~" } else { "" })
                }
            ),
            (0usize..4, prop::sample::select(vec![1u8, 2, 4, 8]))
                .prop_map(|(i, m)| format!("h{}.{}", i, m)),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_pairs(
            pairs in prop::collection::vec(
                (prop::sample::select(GamepadButton::ALL.to_vec()), source_strategy()),
                1..12,
            )
        ) {
            let body: Vec<String> = pairs
                .iter()
                .map(|(b, s)| format!("{}:{}", b.token().unwrap(), s))
                .collect();
            let line = format!("deadbeef,Prop Pad,{},", body.join(","));

            let parsed = Mapping::parse_for(&line, Platform::Linux).unwrap();
            let reparsed = Mapping::parse_for(&parsed.to_string(), Platform::Linux).unwrap();

            let set = |m: &Mapping| -> HashSet<String> {
                m.bindings().iter().map(|b| b.to_string()).collect()
            };
            prop_assert_eq!(set(&parsed), set(&reparsed));
        }
    }
}
