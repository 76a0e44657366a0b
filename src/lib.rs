//! DJ Console Map
//!
//! Bidirectional control mapping between a two-deck Hercules DJ Console and a
//! mixing engine's parameter model: console events become parameter writes,
//! parameter changes become LED updates.

pub mod config;
pub mod console;
pub mod controls;
pub mod error;
pub mod host;
pub mod midi;
pub mod router;

pub use config::AppConfig;
pub use controls::{Channel, Control, ControlEvent, ControlId, Parameter};
pub use error::{Error, Result};
pub use router::Router;
