//! Router module - dispatch of console events to control handlers
//!
//! The Router is the entry point of the mapping layer. It owns:
//! - The inbound binding table (MIDI message -> deck control)
//! - The handler table (control -> handler)
//! - The debounce records, scoped to an `init()`/`shutdown()` session
//! - The LED feedback subscriptions

mod feedback;
mod playback;
mod tempo;
mod toggle;
mod volume;

pub use feedback::{LedFeedback, LedState};
pub use playback::DeckState;

#[cfg(test)]
mod tests;

use crate::config::{AppConfig, MidiType};
use crate::console::debounce::{Clock, DebounceFilter, MonotonicClock};
use crate::controls::{Channel, Control, ControlEvent, ControlId, Parameter};
use crate::error::{Error, Result};
use crate::host::{ConnectionId, ParameterHost, ScratchEngine, ScratchParams};
use crate::midi::{format_hex, MidiMessage, MidiTransport};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Key of an inbound binding: message kind, MIDI channel (1-16), number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub midi_type: MidiType,
    pub channel: u8,
    pub number: u8,
}

impl BindingKey {
    /// Derive the binding key of a parsed message
    pub fn from_message(message: &MidiMessage) -> Self {
        match *message {
            MidiMessage::NoteOn { channel, note, .. } | MidiMessage::NoteOff { channel, note, .. } => {
                Self {
                    midi_type: MidiType::Note,
                    channel: channel + 1,
                    number: note,
                }
            },
            MidiMessage::ControlChange { channel, cc, .. } => Self {
                midi_type: MidiType::Cc,
                channel: channel + 1,
                number: cc,
            },
        }
    }
}

/// Handler responsible for a control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Play,
    Jog,
    Cue,
    Toggle(Parameter),
    Beatsync,
    Tempo,
    Volume,
}

impl Handler {
    /// Fixed control -> handler table
    ///
    /// Controls that only carry an LED have no input handler.
    fn for_control(control: Control) -> Option<Self> {
        match control {
            Control::Play => Some(Handler::Play),
            Control::Jog => Some(Handler::Jog),
            Control::CueDefault => Some(Handler::Cue),
            Control::Pfl => Some(Handler::Toggle(Parameter::Pfl)),
            Control::Keylock => Some(Handler::Toggle(Parameter::Keylock)),
            Control::Beatsync => Some(Handler::Beatsync),
            Control::Rate => Some(Handler::Tempo),
            Control::Volume => Some(Handler::Volume),
            Control::Loop | Control::FxCue => None,
        }
    }
}

/// Main router dispatching console events to the host engine
pub struct Router {
    /// Host parameter store
    pub(crate) host: Arc<dyn ParameterHost>,
    /// Host scratch engine
    pub(crate) scratch: Arc<dyn ScratchEngine>,
    /// LED feedback binder
    pub(crate) feedback: Arc<LedFeedback>,
    /// Time source for debouncing
    pub(crate) clock: Arc<dyn Clock>,
    /// Inbound bindings
    bindings: HashMap<BindingKey, ControlId>,
    /// Physical parameters passed on scratch enable
    pub(crate) scratch_params: ScratchParams,
    debounce_ms: u64,
    /// Debounce records; `Some` only between `init()` and `shutdown()`
    pub(crate) debounce: Option<DebounceFilter>,
    /// Feedback subscriptions held with the host
    connections: Vec<ConnectionId>,
}

impl Router {
    /// Create a new Router from configuration and its collaborators
    pub fn new(
        config: &AppConfig,
        host: Arc<dyn ParameterHost>,
        scratch: Arc<dyn ScratchEngine>,
        transport: Arc<dyn MidiTransport>,
    ) -> Self {
        let mut bindings = HashMap::new();
        for channel in Channel::ALL {
            for binding in &config.decks.deck(channel).bindings {
                let key = BindingKey {
                    midi_type: binding.midi_type,
                    channel: binding.channel,
                    number: binding.number,
                };
                let id = ControlId::new(channel, binding.control);
                if let Some(previous) = bindings.insert(key, id) {
                    warn!("Binding {:?} for {} replaces {}", key, id, previous);
                }
            }
        }

        let feedback = Arc::new(LedFeedback::new(
            transport,
            config.midi.led_status,
            &config.decks,
        ));

        Self {
            host,
            scratch,
            feedback,
            clock: Arc::new(MonotonicClock::new()),
            bindings,
            scratch_params: config.mapping.scratch,
            debounce_ms: config.mapping.debounce_ms,
            debounce: None,
            connections: Vec::new(),
        }
    }

    /// Replace the debounce time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// LED feedback binder
    pub fn feedback(&self) -> &Arc<LedFeedback> {
        &self.feedback
    }

    /// Whether `init()` has run without a matching `shutdown()`
    pub fn is_initialized(&self) -> bool {
        self.debounce.is_some()
    }

    /// Establish LED subscriptions and the debounce session
    ///
    /// Each bound parameter's current value is pushed to the LEDs right away.
    /// Calling it again before `shutdown()` does nothing.
    pub fn init(&mut self) -> Result<()> {
        if self.is_initialized() {
            warn!("Router already initialized, ignoring init()");
            return Ok(());
        }

        if let Err(e) = self.subscribe_feedback() {
            // Partial subscriptions would double up on a retried init()
            self.release_connections();
            return Err(e);
        }

        self.debounce = Some(DebounceFilter::new(self.debounce_ms));
        info!(
            "Router initialized ({} bindings, {} LED subscriptions)",
            self.bindings.len(),
            self.connections.len()
        );
        Ok(())
    }

    fn subscribe_feedback(&mut self) -> Result<()> {
        for channel in Channel::ALL {
            for param in Parameter::FEEDBACK {
                let feedback = Arc::clone(&self.feedback);
                let id = self.host.connect(
                    channel,
                    param,
                    Arc::new(move |ch, p, value| feedback.on_parameter_changed(ch, p, value)),
                )?;
                self.connections.push(id);

                match self.host.get(channel, param) {
                    Ok(value) => self.feedback.on_parameter_changed(channel, param, value),
                    Err(e) => warn!("Initial LED sync for {}.{} failed: {}", channel, param, e),
                }
            }
        }
        Ok(())
    }

    fn release_connections(&mut self) {
        for id in self.connections.drain(..) {
            self.host.disconnect(id);
        }
    }

    /// Release subscriptions, drop debounce records and turn off the LEDs
    pub fn shutdown(&mut self) {
        self.release_connections();
        self.debounce = None;
        self.feedback.blank();
        info!("Router shut down");
    }

    /// Process raw MIDI from the console
    pub fn on_midi(&mut self, raw: &[u8]) {
        let message = match MidiMessage::parse(raw) {
            Some(message) => message,
            None => {
                trace!("Unsupported MIDI message: {}", format_hex(raw));
                return;
            },
        };

        let key = BindingKey::from_message(&message);
        let id = match self.bindings.get(&key) {
            Some(id) => *id,
            None => {
                warn!("No control bound to {} ({})", message, format_hex(raw));
                return;
            },
        };

        self.dispatch(ControlEvent {
            id,
            value: message.value(),
            status: raw[0],
        });
    }

    /// Route a resolved control event to its handler
    ///
    /// Handler failures are logged and the event is dropped; processing of
    /// later events is never affected.
    pub fn dispatch(&mut self, event: ControlEvent) {
        let ControlEvent { id, value, status } = event;

        let handler = match Handler::for_control(id.control) {
            Some(handler) => handler,
            None => {
                warn!("No handler registered for {}, dropping event", id);
                return;
            },
        };

        trace!("{} <- 0x{:02X} value {}", id, status, value);

        let result = if self.is_initialized() {
            match handler {
                Handler::Play => self.on_play(id, value),
                Handler::Jog => self.on_jog(id.channel, value),
                Handler::Cue => self.on_cue(id.channel, value),
                Handler::Toggle(param) => self.on_toggle(id.channel, param, value),
                Handler::Beatsync => self.on_beatsync(id.channel, value),
                Handler::Tempo => self.on_fader_move(id.channel, value),
                Handler::Volume => self.on_volume(id.channel, value),
            }
        } else {
            Err(Error::NotInitialized)
        };

        if let Err(e) = result {
            warn!("Dropped {} event (value {}): {}", id, value, e);
        }
    }
}
