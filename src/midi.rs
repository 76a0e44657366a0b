//! MIDI utilities and message types
//!
//! Provides parsing and encoding of the channel-voice messages the DJ console
//! speaks, the outbound transport seam, and controller value conversions.

use std::fmt;

use crate::error::Result;

/// Data byte the console sends for a button press (release sends 0)
pub const PRESS: u8 = 0x7F;

/// LED "on" data byte
pub const LED_ON: u8 = 0x7F;

/// LED "off" data byte
pub const LED_OFF: u8 = 0x00;

/// MIDI message types understood by the mapping layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    ///
    /// Returns `None` for anything other than Note On/Off and Control Change,
    /// including running-status fragments and system messages.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];
        if !(0x80..0xF0).contains(&status) {
            return None;
        }

        let channel = status & 0x0F;
        let data1 = data[1] & 0x7F;
        let data2 = data[2] & 0x7F;

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            }),
            0x90 => {
                // Note On with velocity 0 is a Note Off
                if data2 == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data1,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data1,
                        velocity: data2,
                    })
                }
            },
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                cc: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> [u8; 3] {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            },
            MidiMessage::NoteOn { channel, note, velocity } => {
                [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            },
            MidiMessage::ControlChange { channel, cc, value } => {
                [0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            },
        }
    }

    /// MIDI channel (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => channel,
        }
    }

    /// Controller value carried by the message (Note Off is always 0)
    pub fn value(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { .. } => 0,
            MidiMessage::NoteOn { velocity, .. } => velocity,
            MidiMessage::ControlChange { value, .. } => value,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            },
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            },
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            },
        }
    }
}

/// Outbound MIDI channel to the controller
///
/// Fire-and-forget: there is no acknowledgement from the device.
pub trait MidiTransport: Send + Sync {
    /// Send a three-byte short message
    fn send(&self, status: u8, data1: u8, data2: u8) -> Result<()>;
}

/// Controller value conversion utilities
pub mod convert {
    /// Values closer to zero than this snap to exactly zero
    pub const DEAD_ZONE: f64 = 0.008;

    /// Map a 7-bit fader value (0-127) onto -1.0..=1.0
    ///
    /// Results inside the dead zone snap to 0 so mechanical noise around the
    /// fader's centre detent does not cause pitch drift.
    pub fn to_bipolar(raw: u8) -> f64 {
        let raw = raw.min(127) as f64;
        let output = -1.0 + (2.0 / 127.0) * raw;

        if output.abs() < DEAD_ZONE {
            0.0
        } else {
            output
        }
    }

    /// Decode a relative (two's complement, 7-bit) jog value into a signed delta
    ///
    /// 0..=63 are positive ticks, 64..=127 are -64..=-1.
    pub fn to_signed_delta(raw: u8) -> i8 {
        let raw = raw & 0x7F;
        if raw < 64 {
            raw as i8
        } else {
            (raw as i16 - 128) as i8
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
