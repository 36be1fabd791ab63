//! `tokio_util` codec over the same wire format.
//!
//! Decoding errors end a `FramedRead` stream (that is how `tokio_util`
//! treats codec errors), so async callers that want to ride out a corrupt
//! frame should rebuild the `FramedRead` from its parts.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_eof, decode_frame, encode_frame, encoded_len, Frame, DEFAULT_MAX_FRAME};
use crate::error::FrameError;

/// Frame codec for `FramedRead` / `FramedWrite` / `Framed`.
#[derive(Debug, Clone)]
pub struct XethruCodec {
    max_frame_size: usize,
}

impl XethruCodec {
    /// Codec with the default maximum frame size.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME)
    }

    /// Codec with an explicit maximum encoded frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Configured maximum encoded frame size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for XethruCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for XethruCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src, self.max_frame_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_eof(src, self.max_frame_size)
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for XethruCodec {
    type Error = FrameError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), FrameError> {
        let payload = item.as_ref();
        let size = encoded_len(payload);
        if size > self.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        encode_frame(payload, dst);
        Ok(())
    }
}
