//! Logical control identities for the two-deck console
//!
//! Decks, controls and host parameters are closed enumerations so the handler
//! table and the per-control state are checked for exhaustiveness at compile
//! time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two logical decks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Channel1,
    Channel2,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Channel1, Channel::Channel2];

    /// Zero-based index for fixed-size per-deck tables
    pub fn index(self) -> usize {
        match self {
            Channel::Channel1 => 0,
            Channel::Channel2 => 1,
        }
    }

    /// Deck number as the scratch engine expects it (1-based)
    pub fn deck_number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Host group name, e.g. `[Channel1]`
    pub fn group(self) -> &'static str {
        match self {
            Channel::Channel1 => "[Channel1]",
            Channel::Channel2 => "[Channel2]",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

/// A named logical function on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Control {
    #[serde(rename = "play")]
    Play,
    #[serde(rename = "pfl")]
    Pfl,
    #[serde(rename = "keylock")]
    Keylock,
    #[serde(rename = "beatsync")]
    Beatsync,
    #[serde(rename = "cue_default")]
    CueDefault,
    #[serde(rename = "jog")]
    Jog,
    #[serde(rename = "rate")]
    Rate,
    #[serde(rename = "volume")]
    Volume,
    #[serde(rename = "loop")]
    Loop,
    #[serde(rename = "fxCue")]
    FxCue,
}

impl Control {
    pub const COUNT: usize = 10;

    pub const ALL: [Control; Control::COUNT] = [
        Control::Play,
        Control::Pfl,
        Control::Keylock,
        Control::Beatsync,
        Control::CueDefault,
        Control::Jog,
        Control::Rate,
        Control::Volume,
        Control::Loop,
        Control::FxCue,
    ];

    /// Position in [`Control::ALL`]
    pub fn index(self) -> usize {
        match self {
            Control::Play => 0,
            Control::Pfl => 1,
            Control::Keylock => 2,
            Control::Beatsync => 3,
            Control::CueDefault => 4,
            Control::Jog => 5,
            Control::Rate => 6,
            Control::Volume => 7,
            Control::Loop => 8,
            Control::FxCue => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Play => "play",
            Control::Pfl => "pfl",
            Control::Keylock => "keylock",
            Control::Beatsync => "beatsync",
            Control::CueDefault => "cue_default",
            Control::Jog => "jog",
            Control::Rate => "rate",
            Control::Volume => "volume",
            Control::Loop => "loop",
            Control::FxCue => "fxCue",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named parameter in the host engine's per-deck parameter store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Play,
    Pfl,
    Keylock,
    Beatsync,
    CueDefault,
    Rate,
    Volume,
    /// Temporary, self-relaxing pitch nudge
    Jog,
}

impl Parameter {
    /// Parameters whose changes are mirrored onto the console LEDs
    pub const FEEDBACK: [Parameter; 5] = [
        Parameter::Play,
        Parameter::Pfl,
        Parameter::Keylock,
        Parameter::Beatsync,
        Parameter::CueDefault,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Play => "play",
            Parameter::Pfl => "pfl",
            Parameter::Keylock => "keylock",
            Parameter::Beatsync => "beatsync",
            Parameter::CueDefault => "cue_default",
            Parameter::Rate => "rate",
            Parameter::Volume => "volume",
            Parameter::Jog => "jog",
        }
    }

    /// The LED-bearing control that displays this parameter, if any
    pub fn led_control(self) -> Option<Control> {
        match self {
            Parameter::Play => Some(Control::Play),
            Parameter::Pfl => Some(Control::Pfl),
            Parameter::Keylock => Some(Control::Keylock),
            Parameter::Beatsync => Some(Control::Beatsync),
            Parameter::CueDefault => Some(Control::CueDefault),
            Parameter::Rate | Parameter::Volume | Parameter::Jog => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host parameters are doubles; anything non-zero counts as "on"
pub fn is_truthy(value: f64) -> bool {
    value != 0.0
}

/// The addressable unit: one control on one deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId {
    pub channel: Channel,
    pub control: Control,
}

impl ControlId {
    pub const fn new(channel: Channel, control: Control) -> Self {
        Self { channel, control }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.channel, self.control)
    }
}

/// An inbound control event, already resolved to its (Channel, Control) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub id: ControlId,
    /// Raw controller value (0-127)
    pub value: u8,
    /// Status byte the event arrived on
    pub status: u8,
}
