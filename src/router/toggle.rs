//! Toggle buttons: headphone cue, key-lock, beat sync

use crate::controls::{is_truthy, Channel, Parameter};
use crate::error::Result;
use crate::midi::PRESS;
use tracing::debug;

impl super::Router {
    /// Flip a boolean host parameter on press; releases are ignored
    ///
    /// Returns the previous value, or `None` if the event was not a press.
    pub(crate) fn toggle_parameter(
        &self,
        channel: Channel,
        param: Parameter,
        value: u8,
    ) -> Result<Option<bool>> {
        if value != PRESS {
            return Ok(None);
        }

        let previous = is_truthy(self.host.get(channel, param)?);
        self.host.set(channel, param, if previous { 0.0 } else { 1.0 })?;

        debug!("{}.{} toggled {} -> {}", channel, param, previous, !previous);
        Ok(Some(previous))
    }

    /// Headphone cue (pfl) and key-lock buttons
    pub(crate) fn on_toggle(&self, channel: Channel, param: Parameter, value: u8) -> Result<()> {
        self.toggle_parameter(channel, param, value).map(|_| ())
    }

    /// Beat sync button; switching sync off also resets the rate
    pub(crate) fn on_beatsync(&self, channel: Channel, value: u8) -> Result<()> {
        if let Some(true) = self.toggle_parameter(channel, Parameter::Beatsync, value)? {
            self.host.set(channel, Parameter::Rate, 0.0)?;
            debug!("{} sync off, rate reset", channel);
        }
        Ok(())
    }
}
