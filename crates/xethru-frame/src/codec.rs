use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::checksum;
use crate::error::{FrameError, Result};

/// Start-of-frame marker.
pub const START: u8 = 0x7D;

/// End-of-frame marker.
pub const END: u8 = 0x7E;

/// Escape prefix; only ever precedes a literal [`END`] inside a payload.
pub const ESCAPE: u8 = 0x7F;

/// Default maximum encoded frame size: 64 KiB.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

/// One decoded application payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The un-stuffed payload, checksum removed.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The first payload byte, which identifies the message kind.
    pub fn tag(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// The checksum this payload carries on the wire.
    pub fn checksum(&self) -> u8 {
        checksum(&self.payload)
    }

    /// The total wire size of this frame (markers, stuffing and checksum).
    pub fn wire_size(&self) -> usize {
        encoded_len(&self.payload)
    }
}

/// Size of `payload` once encoded.
pub fn encoded_len(payload: &[u8]) -> usize {
    let escapes = payload.iter().filter(|&&b| b == END).count();
    payload.len() + escapes + 3
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬──────────────────────────┬──────────┬───────┐
/// │ START │ Payload                  │ Checksum │ END   │
/// │ 0x7D  │ 0x7E sent as 0x7F 0x7E   │ raw      │ 0x7E  │
/// └───────┴──────────────────────────┴──────────┴───────┘
/// ```
///
/// The checksum is never escaped, even when it equals a marker value.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(encoded_len(payload));
    dst.put_u8(START);
    for &b in payload {
        if b == END {
            dst.put_u8(ESCAPE);
        }
        dst.put_u8(b);
    }
    dst.put_u8(checksum(payload));
    dst.put_u8(END);
}

/// Decode exactly one complete frame.
///
/// `frame` must span from the start marker to the end marker inclusive.
pub fn unframe(frame: &[u8]) -> Result<Bytes> {
    if frame.first() != Some(&START) {
        return Err(FrameError::NoStartByte);
    }
    if frame.len() < 2 || frame[frame.len() - 1] != END {
        return Err(FrameError::NotEndByte);
    }

    if frame.len() < 3 {
        return Err(FrameError::TooShort);
    }

    // The checksum travels unescaped, so it is always the byte before END.
    let actual = frame[frame.len() - 2];
    let interior = &frame[1..frame.len() - 2];
    let mut out = BytesMut::with_capacity(interior.len());
    unstuff(interior, &mut out);

    let expected = checksum(&out);
    if expected != actual {
        return Err(FrameError::BadCrc { expected, actual });
    }

    Ok(out.freeze())
}

// Only the exact pair 0x7F 0x7E collapses; a lone 0x7F passes through.
fn unstuff(src: &[u8], dst: &mut BytesMut) {
    let mut i = 0;
    while i < src.len() {
        if src[i] == ESCAPE && src.get(i + 1) == Some(&END) {
            dst.put_u8(END);
            i += 2;
        } else {
            dst.put_u8(src[i]);
            i += 1;
        }
    }
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. On error, the
/// offending bytes are consumed too, so the next call starts fresh.
///
/// Because the checksum is sent raw, an end marker is ambiguous: `0x7E`
/// may also be a checksum, and `0x7F 0x7E` may be an escaped payload byte
/// or a `0x7F` checksum followed by the end marker. Candidates are
/// resolved by the byte that follows them. An escaped candidate at the
/// tail of the buffer waits for that byte; if none comes, [`flush_tail`]
/// (on a read timeout) or [`decode_eof`] settles it. Only a literal
/// `0x7F 0x7E` in payload data followed by `0x7D` stays ambiguous.
pub fn decode_frame(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    let first = match src.first() {
        Some(&b) => b,
        None => return Ok(None),
    };

    if first != START {
        let skip = src.iter().position(|&b| b == START).unwrap_or(src.len());
        src.advance(skip);
        return Err(FrameError::NoStartByte);
    }

    let mut from = 1;
    while let Some(offset) = src[from..].iter().position(|&b| b == END) {
        let end = from + offset;
        let escaped = src[end - 1] == ESCAPE;

        match src.get(end + 1).copied() {
            // This 0x7E is the checksum; the marker comes next.
            Some(END) => {}
            Some(_) if !escaped => return take_frame(src, end, max_frame).map(Some),
            Some(next) => {
                if next == START && unframe(&src[..=end]).is_ok() {
                    return take_frame(src, end, max_frame).map(Some);
                }
            }
            None => {
                if !escaped && unframe(&src[..=end]).is_ok() {
                    return take_frame(src, end, max_frame).map(Some);
                }
                break;
            }
        }

        from = end + 1;
    }

    if src.len() > max_frame {
        let size = src.len();
        src.clear();
        return Err(FrameError::FrameTooLarge {
            size,
            max: max_frame,
        });
    }

    Ok(None) // Need more data
}

/// Settle a frame held back at the tail of `src` once the line is quiet.
///
/// A buffer ending in `0x7F 0x7E` is taken as one frame if it checks out;
/// anything else is left in place for more bytes.
pub fn flush_tail(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    let pending = src.len() >= 3
        && src[0] == START
        && src[src.len() - 1] == END
        && unframe(&src[..]).is_ok();
    if !pending {
        return Ok(None);
    }

    let end = src.len() - 1;
    take_frame(src, end, max_frame).map(Some)
}

/// Resolve whatever is left in `src` once the stream has ended.
///
/// A trailing partial frame is reported as the error it would decode to
/// (`NotEndByte` when the end marker never arrived).
pub fn decode_eof(src: &mut BytesMut, max_frame: usize) -> Result<Option<Frame>> {
    if let Some(frame) = decode_frame(src, max_frame)? {
        return Ok(Some(frame));
    }
    if src.is_empty() {
        return Ok(None);
    }

    let rest = src.split();
    unframe(&rest).map(|payload| Some(Frame { payload }))
}

fn take_frame(src: &mut BytesMut, end: usize, max_frame: usize) -> Result<Frame> {
    let wire = src.split_to(end + 1);
    if wire.len() > max_frame {
        return Err(FrameError::FrameTooLarge {
            size: wire.len(),
            max: max_frame,
        });
    }
    unframe(&wire).map(|payload| Frame { payload })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum encoded frame size in bytes. Default: 64 KiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
            read_timeout: None,
        }
    }
}
