use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send(frame.payload.as_ref())
    }

    /// Encode and send a payload, returning the number of bytes written.
    ///
    /// The frame goes out in a single write. A transport that accepts only
    /// part of it gets `FrameError::ShortWrite`; nothing is retried.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        self.buf.clear();
        encode_frame(payload, &mut self.buf);

        if self.buf.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: self.buf.len(),
                max: self.config.max_frame_size,
            });
        }

        let written = loop {
            match self.inner.write(&self.buf) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        };

        if written < self.buf.len() {
            return Err(FrameError::ShortWrite {
                written,
                expected: self.buf.len(),
            });
        }

        self.flush()?;
        trace!(bytes = written, "frame written");
        Ok(written)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    fn written(payload: &[u8]) -> (usize, Vec<u8>) {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let n = writer.send(payload).unwrap();
        (n, writer.into_inner().into_inner())
    }

    #[test]
    fn write_reports_bytes_on_the_wire() {
        let cases: &[(&[u8], usize, &[u8])] = &[
            (&[0x01, 0x02, 0x00], 6, &[0x7d, 0x01, 0x02, 0x00, 0x7e, 0x7e]),
            (&[0x00, 0x7c, 0x7f], 6, &[0x7d, 0x00, 0x7c, 0x7f, 0x7e, 0x7e]),
            (&[0x01, 0x02, 0x03], 6, &[0x7d, 0x01, 0x02, 0x03, 0x7d, 0x7e]),
            (
                &[0x00, 0x01, 0x02, 0x7e],
                8,
                &[0x7d, 0x00, 0x01, 0x02, 0x7f, 0x7e, 0x00, 0x7e],
            ),
            (
                &[0x7e, 0x01, 0x02, 0x7e],
                9,
                &[0x7d, 0x7f, 0x7e, 0x01, 0x02, 0x7f, 0x7e, 0x7e, 0x7e],
            ),
        ];

        for (payload, n, wire) in cases {
            let (got_n, got_wire) = written(payload);
            assert_eq!(got_n, *n);
            assert_eq!(got_wire, wire.to_vec());
        }
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(&[0x10]).unwrap();
        writer.send(&[0x24, 0x02, 0x00]).unwrap();

        let wire = writer.into_inner().into_inner();
        let mut reader = crate::reader::FrameReader::new(Cursor::new(wire));
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), &[0x10]);
        assert_eq!(
            reader.read_frame().unwrap().payload.as_ref(),
            &[0x24, 0x02, 0x00]
        );
    }

    #[test]
    fn frame_too_large_rejected() {
        let cfg = FrameConfig {
            max_frame_size: 8,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(&[0x7e; 4]).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 11, max: 8 }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(&[0x10]).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = Frame::new(vec![0x21, 0x14, 0x23, 0xa2, 0xd6]);

        let n = writer.write_frame(&frame).unwrap();
        assert_eq!(n, frame.wire_size());
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert_eq!(writer.config().max_frame_size, crate::DEFAULT_MAX_FRAME);
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(&[0x01, 0x02, 0x03]).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, vec![0x7d, 0x01, 0x02, 0x03, 0x7d, 0x7e]);
    }

    #[test]
    fn short_write_is_an_error() {
        let mut writer = FrameWriter::new(HalfWriter::default());
        let err = writer.send(&[0x01, 0x02, 0x03]).unwrap_err();

        assert!(matches!(
            err,
            FrameError::ShortWrite {
                written: 3,
                expected: 6
            }
        ));
        assert_eq!(writer.get_ref().calls, 1);
    }

    #[test]
    fn would_block_write_is_not_retried() {
        let mut writer = FrameWriter::new(WouldBlockWriter);
        let err = writer.send(&[0x10]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(&[0x10]).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct HalfWriter {
        calls: usize,
    }

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct WouldBlockWriter;

    impl Write for WouldBlockWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
