//! Play/scratch state machine, jog wheel and cue button
//!
//! The host `play` parameter is the source of truth: the deck state is read
//! from the host at every event and never cached here.

use crate::controls::{is_truthy, Channel, ControlId, Parameter};
use crate::error::{Error, Result};
use crate::midi::{convert, PRESS};
use tracing::{debug, trace, warn};

/// Playback state of a deck as induced by the play button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    Stopped,
    Playing,
    /// Paused with the jog wheel driving the scratch engine
    Scratching,
}

impl super::Router {
    /// Current state of a deck, derived from the host
    pub fn deck_state(&self, channel: Channel) -> Result<DeckState> {
        if is_truthy(self.host.get(channel, Parameter::Play)?) {
            Ok(DeckState::Playing)
        } else if self.scratch.is_scratching(channel.deck_number()) {
            Ok(DeckState::Scratching)
        } else {
            Ok(DeckState::Stopped)
        }
    }

    /// Play button: start playback, or pause into scratch mode
    pub(crate) fn on_play(&mut self, id: ControlId, value: u8) -> Result<()> {
        if value != PRESS {
            return Ok(());
        }

        let now = self.clock.now_ms();
        let debounce = self.debounce.as_mut().ok_or(Error::NotInitialized)?;
        if debounce.should_suppress(id, now) {
            trace!("{} press suppressed by debounce", id);
            return Ok(());
        }

        let channel = id.channel;
        let deck = channel.deck_number();
        let before = self.deck_state(channel)?;

        match before {
            DeckState::Playing => {
                self.scratch.enable(deck, &self.scratch_params)?;
                if let Err(e) = self.host.set(channel, Parameter::Play, 0.0) {
                    // Still playing, so scratch mode must not stay on
                    if let Err(undo) = self.scratch.disable(deck) {
                        warn!("{} scratch not disabled after failed pause: {}", channel, undo);
                    }
                    return Err(e);
                }
            },
            DeckState::Stopped | DeckState::Scratching => {
                self.scratch.disable(deck)?;
                if let Err(e) = self.host.set(channel, Parameter::Play, 1.0) {
                    if before == DeckState::Scratching {
                        if let Err(undo) = self.scratch.enable(deck, &self.scratch_params) {
                            warn!("{} scratch not restored after failed play: {}", channel, undo);
                        }
                    }
                    return Err(e);
                }
            },
        }

        let after = if before == DeckState::Playing {
            DeckState::Scratching
        } else {
            DeckState::Playing
        };
        debug!("{} {:?} -> {:?}", channel, before, after);
        Ok(())
    }

    /// Jog wheel: pitch bend while playing, scratch ticks while paused
    pub(crate) fn on_jog(&self, channel: Channel, raw: u8) -> Result<()> {
        let delta = convert::to_signed_delta(raw);

        if is_truthy(self.host.get(channel, Parameter::Play)?) {
            self.host.set(channel, Parameter::Jog, delta as f64)
        } else {
            self.scratch.tick(channel.deck_number(), delta)
        }
    }

    /// Cue button: held cue while pressed
    pub(crate) fn on_cue(&self, channel: Channel, value: u8) -> Result<()> {
        let pressed = value == PRESS;
        self.host
            .set(channel, Parameter::CueDefault, if pressed { 1.0 } else { 0.0 })
    }
}
