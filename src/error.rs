//! Error types for the mapping layer
//!
//! None of these are fatal: the router logs them and drops the triggering
//! event, since the controller stays physically live.

use thiserror::Error;

/// Errors raised while handling a control event or a feedback notification
#[derive(Debug, Error)]
pub enum Error {
    /// The host parameter service could not be reached
    #[error("host parameter service unavailable")]
    HostUnavailable,

    /// The MIDI output rejected a message
    #[error("MIDI transport error: {0}")]
    Transport(String),

    /// An event arrived before `init()` or after `shutdown()`
    #[error("router not initialized")]
    NotInitialized,
}

pub type Result<T> = std::result::Result<T, Error>;
