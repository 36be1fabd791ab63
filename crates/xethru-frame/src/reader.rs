use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;
use xethru_transport::DeviceStream;

use crate::codec::{decode_eof, decode_frame, flush_tail, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally, so callers always get complete frames
/// however the transport chunks the bytes. Bytes past the end of one frame
/// stay buffered for the next call.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Framing errors consume the bad bytes and leave the reader usable.
    /// A transport read error (a read timeout, typically) keeps any partial
    /// frame buffered, so calling again resumes it. A read timeout also
    /// settles a frame held back at the buffer tail (see [`flush_tail`]).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_frame_size)? {
                trace!(len = frame.payload.len(), "frame decoded");
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    if let Some(frame) = flush_tail(&mut self.buf, self.config.max_frame_size)? {
                        trace!(len = frame.payload.len(), "frame settled on timeout");
                        return Ok(frame);
                    }
                    return Err(FrameError::Io(err));
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return match decode_eof(&mut self.buf, self.config.max_frame_size)? {
                    Some(frame) => Ok(frame),
                    None => Err(FrameError::ConnectionClosed),
                };
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of bytes received but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partially received frame.
    pub fn discard_buffered(&mut self) {
        self.buf.clear();
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<DeviceStream> {
    /// Create a frame reader for `DeviceStream` and apply read timeout from config.
    pub fn with_config_device(mut inner: DeviceStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn transport_to_frame_error(err: xethru_transport::TransportError) -> FrameError {
    match err {
        xethru_transport::TransportError::Io(io) => FrameError::Io(io),
        xethru_transport::TransportError::Serial(serial)
        | xethru_transport::TransportError::Open { source: serial, .. } => {
            FrameError::Io(serial.into())
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
