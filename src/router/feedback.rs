//! LED feedback: host parameter changes -> console LEDs

use crate::config::DecksConfig;
use crate::controls::{is_truthy, Channel, Control, Parameter};
use crate::error::Result;
use crate::midi::{MidiTransport, LED_OFF, LED_ON};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// On/off state of a console LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedState {
    #[default]
    Off,
    On,
}

impl LedState {
    pub fn from_value(value: f64) -> Self {
        if is_truthy(value) {
            LedState::On
        } else {
            LedState::Off
        }
    }

    fn data_byte(self) -> u8 {
        match self {
            LedState::On => LED_ON,
            LedState::Off => LED_OFF,
        }
    }
}

/// Pushes LED updates to the console
///
/// The LED table is fixed at construction; only the cached on/off states change.
pub struct LedFeedback {
    transport: Arc<dyn MidiTransport>,
    /// Status byte for every LED message
    status: u8,
    /// LED index per (Channel, Control)
    leds: [[Option<u8>; Control::COUNT]; 2],
    /// Last state sent per (Channel, Control)
    states: Mutex<[[LedState; Control::COUNT]; 2]>,
}

impl LedFeedback {
    pub fn new(transport: Arc<dyn MidiTransport>, status: u8, decks: &DecksConfig) -> Self {
        let mut leds = [[None; Control::COUNT]; 2];
        for channel in Channel::ALL {
            for (control, index) in &decks.deck(channel).leds {
                leds[channel.index()][control.index()] = Some(*index);
            }
        }

        Self {
            transport,
            status,
            leds,
            states: Mutex::new([[LedState::Off; Control::COUNT]; 2]),
        }
    }

    /// LED index configured for a control
    pub fn led_index(&self, channel: Channel, control: Control) -> Option<u8> {
        self.leds[channel.index()][control.index()]
    }

    /// Last state sent to a control's LED
    pub fn led_state(&self, channel: Channel, control: Control) -> LedState {
        self.states.lock()[channel.index()][control.index()]
    }

    /// Host change notification entry point
    pub fn on_parameter_changed(&self, channel: Channel, param: Parameter, value: f64) {
        let control = match param.led_control() {
            Some(control) => control,
            None => {
                trace!("{}.{} has no LED", channel, param);
                return;
            },
        };

        if let Err(e) = self.set_led(channel, control, LedState::from_value(value)) {
            warn!("LED update for {}.{} failed: {}", channel, control, e);
        }
    }

    /// Drive one LED
    pub fn set_led(&self, channel: Channel, control: Control, state: LedState) -> Result<()> {
        let index = match self.led_index(channel, control) {
            Some(index) => index,
            None => {
                warn!("No LED index configured for {}.{}", channel, control);
                return Ok(());
            },
        };

        self.transport.send(self.status, index, state.data_byte())?;
        self.states.lock()[channel.index()][control.index()] = state;

        debug!("LED {}.{} (#{}) -> {:?}", channel, control, index, state);
        Ok(())
    }

    /// Turn off every configured LED
    pub fn blank(&self) {
        for channel in Channel::ALL {
            for control in Control::ALL {
                if self.led_index(channel, control).is_none() {
                    continue;
                }
                if let Err(e) = self.set_led(channel, control, LedState::Off) {
                    warn!("Failed to blank LED {}.{}: {}", channel, control, e);
                }
            }
        }
    }
}
