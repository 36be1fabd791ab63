use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::error::Result;

/// Timeout used when the caller asks for a fully blocking serial read.
///
/// Serial drivers have no "infinite" setting, so a day stands in for it.
const BLOCKING_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A connected device stream. Implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Usually it wraps an open serial port; on Unix it can also wrap a
/// connected socket (a bridged device or an in-process simulator).
pub struct DeviceStream {
    inner: DeviceStreamInner,
}

enum DeviceStreamInner {
    Serial(Box<dyn SerialPort>),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            DeviceStreamInner::Serial(port) => port.read(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for DeviceStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            DeviceStreamInner::Serial(port) => port.write(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            DeviceStreamInner::Serial(port) => port.flush(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl DeviceStream {
    /// Create a DeviceStream from an open serial port.
    pub(crate) fn from_serial(port: Box<dyn SerialPort>) -> Self {
        Self {
            inner: DeviceStreamInner::Serial(port),
        }
    }

    /// Create a DeviceStream from a connected Unix stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: DeviceStreamInner::Unix(stream),
        }
    }

    /// Set the read timeout on the underlying stream.
    ///
    /// `None` blocks until data arrives. Serial ports share one timeout
    /// between reads and writes, so this also bounds serial writes.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &mut self.inner {
            DeviceStreamInner::Serial(port) => port
                .set_timeout(timeout.unwrap_or(BLOCKING_TIMEOUT))
                .map_err(Into::into),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Current read timeout; `None` means reads block.
    pub fn read_timeout(&self) -> Result<Option<Duration>> {
        match &self.inner {
            DeviceStreamInner::Serial(port) => {
                let timeout = port.timeout();
                Ok((timeout < BLOCKING_TIMEOUT).then_some(timeout))
            }
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.read_timeout().map_err(Into::into),
        }
    }

    /// Discard anything the driver has buffered in either direction.
    ///
    /// Useful before a command exchange so a stale telemetry frame is not
    /// mistaken for the reply.
    pub fn discard_buffers(&self) -> Result<()> {
        match &self.inner {
            DeviceStreamInner::Serial(port) => port.clear(ClearBuffer::All).map_err(Into::into),
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => Ok(()),
        }
    }

    /// Try to clone this stream (a second handle to the same device).
    ///
    /// The usual split is one handle for the frame reader and one for the
    /// frame writer.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            DeviceStreamInner::Serial(port) => Ok(Self::from_serial(port.try_clone()?)),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Device name, when the driver knows it.
    pub fn name(&self) -> Option<String> {
        match &self.inner {
            DeviceStreamInner::Serial(port) => port.name(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => None,
        }
    }
}

impl std::fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            DeviceStreamInner::Serial(port) => f
                .debug_struct("DeviceStream")
                .field("type", &"serial")
                .field("name", &port.name())
                .finish(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => f.debug_struct("DeviceStream").field("type", &"unix").finish(),
        }
    }
}
