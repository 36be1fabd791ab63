//! Byte-stream transport for XeThru radar modules.
//!
//! The module speaks over a plain serial link. This crate wraps that link
//! (and, on Unix, in-process socket pairs used for bridged or simulated
//! devices) behind one [`DeviceStream`] type implementing `Read + Write`.
//!
//! No framing happens here; see `xethru-frame`.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, PortInfo, SerialDevice, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
pub use traits::DeviceStream;
