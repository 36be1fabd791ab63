//! Driver for XeThru X2M200 respiration modules.
//!
//! [`Module`] sends configuration commands and waits for acks;
//! [`PollSession`] reads telemetry frames on a background thread and
//! delivers parsed [`BaseBandIq`] or [`Respiration`] records until the
//! module goes quiet.

pub mod baseband;
pub mod config;
pub mod error;
pub mod module;
pub mod poll;
pub mod protocol;
pub mod respiration;
pub mod telemetry;

pub use baseband::BaseBandIq;
pub use config::{LedMode, ModuleConfig, PollConfig, DEFAULT_ACK_TIMEOUT, DEFAULT_IDLE_TIMEOUT};
pub use error::{ModuleError, ParseError, Result};
pub use module::Module;
pub use poll::{PollExit, PollSession, StopHandle};
pub use protocol::{Command, ACK, APP_DATA, RESPIRATION_APP};
pub use respiration::{Respiration, RespirationState};
pub use telemetry::Telemetry;
