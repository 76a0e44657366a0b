//! Volume stepping from the console's volume buttons
//!
//! The console reports the control as a relative pair: 127 steps down, 1 steps
//! up. Stepping here gives finer resolution than mapping it directly.

use crate::controls::{Channel, Parameter};
use crate::error::Result;
use tracing::trace;

/// Volume change per step
pub const VOLUME_STEP: f64 = 0.03;

const STEP_DOWN: u8 = 127;
const STEP_UP: u8 = 1;

impl super::Router {
    pub(crate) fn on_volume(&self, channel: Channel, value: u8) -> Result<()> {
        let step = match value {
            STEP_DOWN => -VOLUME_STEP,
            STEP_UP => VOLUME_STEP,
            other => {
                trace!("{} volume value {} ignored", channel, other);
                return Ok(());
            },
        };

        let current = self.host.get(channel, Parameter::Volume)?;
        let next = (current + step).clamp(0.0, 1.0);
        self.host.set(channel, Parameter::Volume, next)
    }
}
