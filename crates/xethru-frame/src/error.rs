/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not begin with the start marker.
    #[error("frame does not start with 0x7D")]
    NoStartByte,

    /// The frame does not end with the end marker.
    #[error("frame does not end with 0x7E")]
    NotEndByte,

    /// The transmitted checksum does not match the payload.
    #[error("bad frame checksum (expected {expected:#04x}, got {actual:#04x})")]
    BadCrc { expected: u8, actual: u8 },

    /// The frame carries no checksum byte.
    #[error("frame too short to carry a checksum")]
    TooShort,

    /// The frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The transport accepted only part of an encoded frame.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reached EOF with no partial frame pending.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// The received bytes were not a well-formed frame.
    ///
    /// The decoder has already dropped the offending bytes, so reading can
    /// continue.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            FrameError::NoStartByte
                | FrameError::NotEndByte
                | FrameError::BadCrc { .. }
                | FrameError::TooShort
                | FrameError::FrameTooLarge { .. }
        )
    }

    /// The read timed out without a complete frame.
    ///
    /// Buffered bytes are kept; the next read resumes the same frame.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err) if matches!(
                err.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
