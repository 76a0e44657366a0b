//! Tempo fader

use super::LedState;
use crate::controls::{Channel, Control, Parameter};
use crate::error::Result;
use crate::midi::convert;
use tracing::warn;

impl super::Router {
    /// Tempo fader moved
    ///
    /// Moving the fader clears the auto-beat LED without touching the host's
    /// sync parameter, then hands the position to the host under soft takeover.
    pub(crate) fn on_fader_move(&self, channel: Channel, raw: u8) -> Result<()> {
        if let Err(e) = self.feedback.set_led(channel, Control::Beatsync, LedState::Off) {
            warn!("{} auto-beat LED not cleared: {}", channel, e);
        }
        self.host.arm_soft_takeover(channel, Parameter::Rate)?;
        self.host.set(channel, Parameter::Rate, convert::to_bipolar(raw))
    }
}
