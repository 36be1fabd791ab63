//! Byte-stuffed frame codec for XeThru radar modules.
//!
//! Every message on the wire is framed as:
//! - a `0x7D` start marker
//! - the payload, with each literal `0x7E` sent as `0x7F 0x7E`
//! - a one-byte XOR checksum, sent raw
//! - a `0x7E` end marker
//!
//! [`FrameReader`] accumulates bytes across partial reads, so callers
//! always get whole payloads.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::XethruCodec;
pub use checksum::checksum;
pub use codec::{
    decode_eof, decode_frame, encode_frame, encoded_len, flush_tail, unframe, Frame,
    FrameConfig, DEFAULT_MAX_FRAME, END, ESCAPE, START,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
