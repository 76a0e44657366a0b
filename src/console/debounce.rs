//! Button debounce filter
//!
//! Some consoles (or their drivers) report a single press of the play button
//! twice in quick succession. Presses that arrive within the threshold of the
//! last accepted press of the same control are suppressed.

use crate::controls::{Channel, Control, ControlId};
use std::time::Instant;

/// Default suppression window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Millisecond time source
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Monotonic clock counting from its creation
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start_instant: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start_instant: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start_instant.elapsed().as_millis() as u64
    }
}

/// Last accepted press time per (Channel, Control)
///
/// Fixed-size over the known control set; a control that was never pressed has
/// no record and is never suppressed.
#[derive(Debug, Clone)]
pub struct DebounceFilter {
    threshold_ms: u64,
    last_pressed: [[Option<u64>; Control::COUNT]; 2],
}

impl DebounceFilter {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            threshold_ms,
            last_pressed: [[None; Control::COUNT]; 2],
        }
    }

    /// Check a press at `now_ms`, recording it if it is accepted
    ///
    /// Returns `true` if the press must be ignored. Suppressed presses do not
    /// move the baseline.
    pub fn should_suppress(&mut self, id: ControlId, now_ms: u64) -> bool {
        let slot = &mut self.last_pressed[id.channel.index()][id.control.index()];

        if let Some(last) = *slot {
            if now_ms.saturating_sub(last) < self.threshold_ms {
                return true;
            }
        }

        *slot = Some(now_ms);
        false
    }

    /// Last accepted press time, if any
    pub fn last_pressed(&self, channel: Channel, control: Control) -> Option<u64> {
        self.last_pressed[channel.index()][control.index()]
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
