//! Host engine collaborators
//!
//! The mixing engine owns the parameter store and the scratch physics. The
//! mapping layer only reads and writes named parameters and decides when
//! scratching starts and stops.

pub mod memory;

pub use memory::MemoryHost;

use crate::controls::{Channel, Parameter};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Callback type for parameter change notifications
///
/// The host calls this with `(channel, parameter, new_value)` whenever a
/// connected parameter changes, whoever changed it.
pub type ParameterCallback = Arc<dyn Fn(Channel, Parameter, f64) + Send + Sync>;

/// Handle for a parameter subscription, used to disconnect it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Per-deck parameter store of the host engine
///
/// Note: All methods take &self to support `Arc<dyn ParameterHost>`.
/// Implementations use interior mutability for their state.
pub trait ParameterHost: Send + Sync {
    /// Read the current value of a parameter
    fn get(&self, channel: Channel, param: Parameter) -> Result<f64>;

    /// Write a parameter
    fn set(&self, channel: Channel, param: Parameter, value: f64) -> Result<()>;

    /// Arm soft takeover so the next physical position is adopted gradually
    fn arm_soft_takeover(&self, channel: Channel, param: Parameter) -> Result<()>;

    /// Subscribe to changes of one parameter
    fn connect(
        &self,
        channel: Channel,
        param: Parameter,
        callback: ParameterCallback,
    ) -> Result<ConnectionId>;

    /// Drop a subscription; unknown ids are ignored
    fn disconnect(&self, id: ConnectionId);
}

/// Physical parameters handed to the scratch engine when scratching starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScratchParams {
    /// Jog wheel ticks per revolution
    #[serde(default = "default_intervals_per_rev")]
    pub intervals_per_rev: u32,
    /// Virtual platter speed
    #[serde(default = "default_rpm")]
    pub rpm: f64,
    /// Alpha-beta filter coefficients
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Ramp back to playback speed on disable
    #[serde(default = "default_true")]
    pub ramp: bool,
}

impl Default for ScratchParams {
    fn default() -> Self {
        Self {
            intervals_per_rev: default_intervals_per_rev(),
            rpm: default_rpm(),
            alpha: default_alpha(),
            beta: default_beta(),
            ramp: true,
        }
    }
}

fn default_intervals_per_rev() -> u32 { 128 }
fn default_rpm() -> f64 { 33.3333 }
fn default_alpha() -> f64 { 0.125 }
fn default_beta() -> f64 { 1.0 / 256.0 }
fn default_true() -> bool { true }

/// Scratch-wheel engine of the host
///
/// Decks are addressed by number (1-based).
pub trait ScratchEngine: Send + Sync {
    fn enable(&self, deck: u8, params: &ScratchParams) -> Result<()>;

    fn disable(&self, deck: u8) -> Result<()>;

    /// Forward one jog tick while scratching
    fn tick(&self, deck: u8, delta: i8) -> Result<()>;

    fn is_scratching(&self, deck: u8) -> bool;
}
