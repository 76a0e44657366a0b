//! In-process host engine
//!
//! `MemoryHost` keeps parameter values in memory, fires change notifications
//! and records scratch activity. The binary drives the console against it when
//! no external engine is attached, and the tests use it as the collaborator.

use super::{ConnectionId, ParameterCallback, ParameterHost, ScratchEngine, ScratchParams};
use crate::controls::{Channel, Parameter};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

struct Connection {
    id: ConnectionId,
    channel: Channel,
    param: Parameter,
    callback: ParameterCallback,
}

struct Inner {
    values: HashMap<(Channel, Parameter), f64>,
    connections: Vec<Connection>,
    next_connection: u64,
    soft_takeover: HashSet<(Channel, Parameter)>,
    /// Active scratch parameters per deck (deck 1 at index 0)
    scratch: [Option<ScratchParams>; 2],
    ticks: Vec<(u8, i8)>,
    writes: usize,
    available: bool,
}

/// In-memory parameter store and scratch engine
pub struct MemoryHost {
    inner: Mutex<Inner>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                values: HashMap::new(),
                connections: Vec::new(),
                next_connection: 1,
                soft_takeover: HashSet::new(),
                scratch: [None, None],
                ticks: Vec::new(),
                writes: 0,
                available: true,
            }),
        }
    }

    /// Default value of a parameter that was never written
    fn default_value(param: Parameter) -> f64 {
        match param {
            Parameter::Volume => 1.0,
            _ => 0.0,
        }
    }

    fn deck_slot(deck: u8) -> Option<usize> {
        match deck {
            1 | 2 => Some(deck as usize - 1),
            _ => None,
        }
    }

    /// Simulate the engine going away (every call fails) or coming back
    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Whether soft takeover was armed for a parameter
    pub fn is_soft_takeover_armed(&self, channel: Channel, param: Parameter) -> bool {
        self.inner.lock().soft_takeover.contains(&(channel, param))
    }

    /// Active scratch parameters for a deck
    pub fn scratch_params(&self, deck: u8) -> Option<ScratchParams> {
        Self::deck_slot(deck).and_then(|slot| self.inner.lock().scratch[slot])
    }

    /// Scratch ticks received so far, as `(deck, delta)`
    pub fn ticks(&self) -> Vec<(u8, i8)> {
        self.inner.lock().ticks.clone()
    }

    /// Number of live subscriptions
    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterHost for MemoryHost {
    fn get(&self, channel: Channel, param: Parameter) -> Result<f64> {
        let inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }
        Ok(inner
            .values
            .get(&(channel, param))
            .copied()
            .unwrap_or_else(|| Self::default_value(param)))
    }

    fn set(&self, channel: Channel, param: Parameter, value: f64) -> Result<()> {
        let callbacks: Vec<ParameterCallback> = {
            let mut inner = self.inner.lock();
            if !inner.available {
                return Err(Error::HostUnavailable);
            }

            inner.writes += 1;
            let previous = inner
                .values
                .insert((channel, param), value)
                .unwrap_or_else(|| Self::default_value(param));

            debug!(group = channel.group(), param = param.name(), value, "parameter set");

            if previous == value {
                Vec::new()
            } else {
                inner
                    .connections
                    .iter()
                    .filter(|c| c.channel == channel && c.param == param)
                    .map(|c| c.callback.clone())
                    .collect()
            }
        };

        // Callbacks run with the lock released so they may read the store
        for callback in callbacks {
            callback(channel, param, value);
        }

        Ok(())
    }

    fn arm_soft_takeover(&self, channel: Channel, param: Parameter) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }
        if inner.soft_takeover.insert((channel, param)) {
            trace!(group = channel.group(), param = param.name(), "soft takeover armed");
        }
        Ok(())
    }

    fn connect(
        &self,
        channel: Channel,
        param: Parameter,
        callback: ParameterCallback,
    ) -> Result<ConnectionId> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }

        let id = ConnectionId(inner.next_connection);
        inner.next_connection += 1;
        inner.connections.push(Connection {
            id,
            channel,
            param,
            callback,
        });
        Ok(id)
    }

    fn disconnect(&self, id: ConnectionId) {
        self.inner.lock().connections.retain(|c| c.id != id);
    }
}

impl ScratchEngine for MemoryHost {
    fn enable(&self, deck: u8, params: &ScratchParams) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }
        match Self::deck_slot(deck) {
            Some(slot) => {
                debug!(deck, rpm = params.rpm, "scratch enabled");
                inner.scratch[slot] = Some(*params);
            },
            None => warn!("Scratch enable for unknown deck {}", deck),
        }
        Ok(())
    }

    fn disable(&self, deck: u8) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }
        if let Some(slot) = Self::deck_slot(deck) {
            if inner.scratch[slot].take().is_some() {
                debug!(deck, "scratch disabled");
            }
        }
        Ok(())
    }

    fn tick(&self, deck: u8, delta: i8) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.available {
            return Err(Error::HostUnavailable);
        }
        // Ticks outside scratch mode have no effect on the engine
        let active = Self::deck_slot(deck)
            .map(|slot| inner.scratch[slot].is_some())
            .unwrap_or(false);
        if active {
            inner.ticks.push((deck, delta));
        } else {
            trace!(deck, delta, "scratch tick ignored, deck not scratching");
        }
        Ok(())
    }

    fn is_scratching(&self, deck: u8) -> bool {
        Self::deck_slot(deck)
            .map(|slot| self.inner.lock().scratch[slot].is_some())
            .unwrap_or(false)
    }
}
