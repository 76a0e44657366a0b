//! Configuration management for the DJ console mapping
//!
//! Handles loading, parsing and validation of the YAML configuration file:
//! MIDI ports, the LED output status byte, per-deck LED tables and the
//! inbound control bindings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::console::debounce::DEFAULT_DEBOUNCE_MS;
use crate::controls::{Channel, Control};
use crate::host::ScratchParams;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub midi: MidiConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub decks: DecksConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    pub input_port: String,
    pub output_port: String,
    /// Status byte used for every LED message
    #[serde(default = "default_led_status")]
    pub led_status: u8,
}

/// Behavioural constants of the mapping
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub scratch: ScratchParams,
}

/// Per-deck configuration for both decks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecksConfig {
    #[serde(default = "default_channel1")]
    pub channel1: DeckConfig,
    #[serde(default = "default_channel2")]
    pub channel2: DeckConfig,
}

/// LED table and inbound bindings of one deck
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeckConfig {
    /// LED index (0-127) per control
    #[serde(default)]
    pub leds: BTreeMap<Control, u8>,
    /// Physical MIDI messages that drive each control
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// One inbound binding: MIDI message -> control
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BindingConfig {
    pub control: Control,
    #[serde(rename = "type")]
    pub midi_type: MidiType,
    /// MIDI channel (1-16)
    pub channel: u8,
    /// CC or note number (0-127)
    pub number: u8,
}

/// Kind of inbound MIDI message
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MidiType {
    Cc,
    Note,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            midi: MidiConfig {
                input_port: default_port(),
                output_port: default_port(),
                led_status: default_led_status(),
            },
            mapping: MappingConfig::default(),
            decks: DecksConfig::default(),
        }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            scratch: ScratchParams::default(),
        }
    }
}

impl Default for DecksConfig {
    fn default() -> Self {
        Self {
            channel1: default_channel1(),
            channel2: default_channel2(),
        }
    }
}

impl DecksConfig {
    pub fn deck(&self, channel: Channel) -> &DeckConfig {
        match channel {
            Channel::Channel1 => &self.channel1,
            Channel::Channel2 => &self.channel2,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration, falling back to the stock console layout if the file is absent
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!(
                "Config file {} not found, using the stock Hercules DJ Console layout",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.midi.input_port.is_empty() {
            anyhow::bail!("MIDI input_port cannot be empty");
        }
        if self.midi.output_port.is_empty() {
            anyhow::bail!("MIDI output_port cannot be empty");
        }
        if !(0x80..0xF0).contains(&self.midi.led_status) {
            anyhow::bail!(
                "MIDI led_status 0x{:02X} is not a channel message status byte",
                self.midi.led_status
            );
        }

        let scratch = &self.mapping.scratch;
        if scratch.intervals_per_rev == 0 {
            anyhow::bail!("scratch intervals_per_rev must be greater than 0");
        }
        if scratch.rpm.is_nan() || scratch.rpm <= 0.0 {
            anyhow::bail!("scratch rpm must be greater than 0");
        }

        let mut seen = HashSet::new();
        for channel in Channel::ALL {
            let deck = self.decks.deck(channel);

            for (control, index) in &deck.leds {
                if *index > 127 {
                    anyhow::bail!(
                        "{} LED '{}' has invalid index {} (must be 0-127)",
                        channel, control, index
                    );
                }
            }

            for binding in &deck.bindings {
                if binding.channel == 0 || binding.channel > 16 {
                    anyhow::bail!(
                        "{} binding '{}' has invalid MIDI channel {} (must be 1-16)",
                        channel, binding.control, binding.channel
                    );
                }
                if binding.number > 127 {
                    anyhow::bail!(
                        "{} binding '{}' has invalid number {} (must be 0-127)",
                        channel, binding.control, binding.number
                    );
                }
                if !seen.insert((binding.midi_type, binding.channel, binding.number)) {
                    anyhow::bail!(
                        "{} binding '{}' reuses {:?} {} on MIDI channel {}",
                        channel, binding.control, binding.midi_type, binding.number, binding.channel
                    );
                }
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_port() -> String { "Hercules DJ Console".to_string() }
fn default_led_status() -> u8 { 0xB1 }
fn default_debounce_ms() -> u64 { DEFAULT_DEBOUNCE_MS }

fn cc(control: Control, number: u8) -> BindingConfig {
    BindingConfig {
        control,
        midi_type: MidiType::Cc,
        channel: 1,
        number,
    }
}

/// Deck A of the Hercules DJ Console
///
/// Button CC numbers match the LED numbering. Verify continuous controls via
/// MIDI learn if the console firmware differs.
fn default_channel1() -> DeckConfig {
    DeckConfig {
        leds: BTreeMap::from([
            (Control::Play, 8),
            (Control::CueDefault, 9),
            (Control::Beatsync, 10), // Auto beat
            (Control::Loop, 13),
            (Control::FxCue, 14),
            (Control::Pfl, 21),     // Headphones
            (Control::Keylock, 22), // Master tempo
        ]),
        bindings: vec![
            cc(Control::Play, 8),
            cc(Control::CueDefault, 9),
            cc(Control::Beatsync, 10),
            cc(Control::Pfl, 21),
            cc(Control::Keylock, 22),
            cc(Control::Volume, 0x31),
            cc(Control::Rate, 0x34),
            cc(Control::Jog, 0x36),
        ],
    }
}

/// Deck B of the Hercules DJ Console
fn default_channel2() -> DeckConfig {
    DeckConfig {
        leds: BTreeMap::from([
            (Control::Play, 2),
            (Control::CueDefault, 3),
            (Control::Beatsync, 4), // Auto beat
            (Control::Loop, 18),
            (Control::FxCue, 17),
            (Control::Pfl, 25),     // Headphones
            (Control::Keylock, 26), // Master tempo
        ]),
        bindings: vec![
            cc(Control::Play, 2),
            cc(Control::CueDefault, 3),
            cc(Control::Beatsync, 4),
            cc(Control::Pfl, 25),
            cc(Control::Keylock, 26),
            cc(Control::Volume, 0x32),
            cc(Control::Rate, 0x35),
            cc(Control::Jog, 0x37),
        ],
    }
}
