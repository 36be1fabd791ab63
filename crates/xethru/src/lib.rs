//! Driver for XeThru X2M200 radar modules.
//!
//! The module talks a byte-stuffed, checksummed frame protocol over a
//! serial link. This crate bundles the layers:
//!
//! # Crate Structure
//!
//! - [`transport`]: serial ports and other byte streams
//! - [`frame`]: frame encoder and streaming decoder
//! - [`module`]: commands, telemetry parsing and the polling loop (behind `module` feature)

/// Re-export transport types.
pub mod transport {
    pub use xethru_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use xethru_frame::*;
}

/// Re-export module types (requires `module` feature).
#[cfg(feature = "module")]
pub mod module {
    pub use xethru_module::*;
}
