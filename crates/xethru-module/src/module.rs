use std::io::{Read, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use xethru_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use xethru_transport::{DeviceStream, SerialDevice, DEFAULT_TIMEOUT};

use crate::config::{LedMode, ModuleConfig};
use crate::error::{ModuleError, Result};
use crate::poll::PollSession;
use crate::protocol::{tag_name, Command, ACK};
use crate::telemetry::Telemetry;

/// A connected radar module.
///
/// Commands are strictly request/reply: each one writes a frame and waits
/// up to `ack_timeout` for the next frame, which must be an ack.
pub struct Module<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    config: ModuleConfig,
}

impl Module<DeviceStream, DeviceStream> {
    /// Open a serial device, reading with the device's timeout.
    pub fn open(device: &SerialDevice, config: ModuleConfig) -> Result<Self> {
        let stream = device.open()?;
        Self::from_stream_with_timeout(stream, device.timeout(), config)
    }

    /// Split a connected stream into reader and writer halves.
    ///
    /// The reader half gets [`DEFAULT_TIMEOUT`] so waits stay bounded.
    pub fn from_stream(stream: DeviceStream, config: ModuleConfig) -> Result<Self> {
        Self::from_stream_with_timeout(stream, DEFAULT_TIMEOUT, config)
    }

    /// Like [`Module::from_stream`] with an explicit read timeout.
    pub fn from_stream_with_timeout(
        stream: DeviceStream,
        read_timeout: Duration,
        config: ModuleConfig,
    ) -> Result<Self> {
        let writer = FrameWriter::new(stream.try_clone()?);
        let frame_config = FrameConfig {
            read_timeout: Some(read_timeout),
            ..FrameConfig::default()
        };
        let reader = FrameReader::with_config_device(stream, frame_config)?;
        Ok(Self::new(reader, writer, config))
    }
}

impl<R: Read, W: Write> Module<R, W> {
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>, config: ModuleConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    /// Current settings.
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Apply the full configuration: load app, LED, zone, sensitivity.
    ///
    /// Stops at the first command that is not acknowledged.
    pub fn configure(&mut self) -> Result<()> {
        let config = self.config.clone();
        self.load_application(config.app_id)?;
        self.set_led_mode(config.led_mode)?;
        self.set_detection_zone(config.zone_start, config.zone_end)?;
        self.set_sensitivity(config.sensitivity)?;
        info!("module configured");
        Ok(())
    }

    pub fn load_application(&mut self, app_id: [u8; 4]) -> Result<()> {
        self.execute(Command::LoadApp(app_id))?;
        self.config.app_id = app_id;
        Ok(())
    }

    pub fn set_led_mode(&mut self, mode: LedMode) -> Result<()> {
        self.execute(Command::SetLedMode(mode))?;
        self.config.led_mode = mode;
        Ok(())
    }

    pub fn set_detection_zone(&mut self, start: f32, end: f32) -> Result<()> {
        self.execute(Command::SetDetectionZone { start, end })?;
        self.config.zone_start = start;
        self.config.zone_end = end;
        Ok(())
    }

    pub fn set_sensitivity(&mut self, sensitivity: u32) -> Result<()> {
        self.execute(Command::SetSensitivity(sensitivity))?;
        self.config.sensitivity = sensitivity;
        Ok(())
    }

    /// Send a command and require an ack. Nacks are not retried.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        let reply = self.request(&command.encode())?;
        match reply.tag() {
            Some(ACK) => {
                debug!(command = command.name(), "command acknowledged");
                Ok(())
            }
            tag => {
                warn!(
                    command = command.name(),
                    reply = tag.map(tag_name).unwrap_or("empty"),
                    "command not acknowledged"
                );
                Err(ModuleError::NotAcknowledged {
                    command: command.name(),
                    reply: tag,
                })
            }
        }
    }

    /// Send a raw payload and return whatever frame comes back.
    pub fn request(&mut self, payload: &[u8]) -> Result<Frame> {
        self.send(payload)?;
        self.recv_reply()
    }

    /// Send a raw payload without waiting for a reply.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        let written = self.writer.send(payload)?;
        debug!(
            tag = payload.first().copied().unwrap_or_default(),
            bytes = written,
            "payload sent"
        );
        Ok(written)
    }

    /// Wait up to `ack_timeout` for the next frame.
    ///
    /// The deadline is checked between reads, so the reader's transport
    /// needs a read timeout for it to be enforced.
    pub fn recv_reply(&mut self) -> Result<Frame> {
        let timeout = self.config.ack_timeout;
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(ModuleError::Timeout(timeout));
            }

            match self.reader.read_frame() {
                Ok(frame) => return Ok(frame),
                Err(err) if err.is_timeout() => continue,
                Err(FrameError::ConnectionClosed) => {
                    return Err(ModuleError::Disconnected(
                        "connection closed while waiting for reply".to_string(),
                    ));
                }
                Err(err) => return Err(ModuleError::Frame(err)),
            }
        }
    }

    /// Hand the reader to a polling session for `T` records.
    ///
    /// The writer is returned so commands can still be sent; replies will
    /// show up in the session as payloads that fail to parse.
    pub fn start_polling<T: Telemetry>(self) -> Result<(PollSession<T>, FrameWriter<W>)>
    where
        R: Send + 'static,
    {
        let session = PollSession::spawn(self.reader, self.config.poll)?;
        Ok((session, self.writer))
    }

    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>, ModuleConfig) {
        (self.reader, self.writer, self.config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::time::Duration;

    use bytes::BytesMut;
    use xethru_frame::encode_frame;

    use super::*;

    fn wire(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_frame(payload, &mut buf);
        }
        buf.to_vec()
    }

    fn module(replies: &[&[u8]]) -> Module<Cursor<Vec<u8>>, Vec<u8>> {
        Module::new(
            FrameReader::new(Cursor::new(wire(replies))),
            FrameWriter::new(Vec::new()),
            ModuleConfig::default(),
        )
    }

    fn sent(module: Module<Cursor<Vec<u8>>, Vec<u8>>) -> Vec<Vec<u8>> {
        let (_, writer, _) = module.into_parts();
        let mut reader = FrameReader::new(Cursor::new(writer.into_inner()));
        let mut out = Vec::new();
        while let Ok(frame) = reader.read_frame() {
            out.push(frame.payload.to_vec());
        }
        out
    }

    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(Duration::from_millis(2));
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }

    #[test]
    fn configure_sends_commands_in_order() {
        let mut module = module(&[&[0x10], &[0x10], &[0x10], &[0x10]]);
        module.configure().unwrap();

        let sent = sent(module);
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0], vec![0x21, 0x14, 0x23, 0xa2, 0xd6]);
        assert_eq!(sent[1], vec![0x24, 0x00, 0x00]);
        assert_eq!(&sent[2][..6], &[0x10, 0x10, 0x96, 0xa1, 0x0a, 0x1c]);
        assert_eq!(sent[3], vec![0x10, 0x10, 0x10, 0xa5, 0x11, 0x2b, 5, 0, 0, 0]);
    }

    #[test]
    fn configure_stops_at_first_nack() {
        let mut module = module(&[&[0x10], &[0x50, 0x01]]);
        let err = module.configure().unwrap_err();

        assert!(matches!(
            err,
            ModuleError::NotAcknowledged {
                command: "set_led_mode",
                reply: Some(0x50)
            }
        ));
        assert_eq!(sent(module).len(), 2);
    }

    #[test]
    fn successful_commands_update_config() {
        let mut module = module(&[&[0x10], &[0x10]]);
        module.set_led_mode(LedMode::Full).unwrap();
        module.set_sensitivity(9).unwrap();

        assert_eq!(module.config().led_mode, LedMode::Full);
        assert_eq!(module.config().sensitivity, 9);
    }

    #[test]
    fn nack_leaves_config_unchanged() {
        let mut module = module(&[&[0x20]]);
        assert!(module.set_detection_zone(1.0, 3.0).is_err());
        assert_eq!(module.config().zone_start, 0.4);
        assert_eq!(module.config().zone_end, 2.0);
    }

    #[test]
    fn request_returns_any_reply() {
        let mut module = module(&[&[0x50, 0x0c, 0x00]]);
        let reply = module.request(&[0x21, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(reply.payload.as_ref(), &[0x50, 0x0c, 0x00]);
    }

    #[test]
    fn missing_reply_times_out() {
        let mut module = Module::new(
            FrameReader::new(Silent),
            FrameWriter::new(Vec::new()),
            ModuleConfig::default().with_ack_timeout(Duration::from_millis(20)),
        );

        let err = module.load_application([1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, ModuleError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[test]
    fn closed_transport_is_disconnected() {
        let mut module = module(&[]);
        let err = module.set_sensitivity(1).unwrap_err();
        assert!(matches!(err, ModuleError::Disconnected(_)));
    }

    #[cfg(unix)]
    #[test]
    fn stream_read_timeout_reaches_reader() {
        let (host, _device) = std::os::unix::net::UnixStream::pair().unwrap();
        let module = Module::from_stream_with_timeout(
            DeviceStream::from_unix(host),
            Duration::from_millis(750),
            ModuleConfig::default(),
        )
        .unwrap();

        let (reader, _, _) = module.into_parts();
        assert_eq!(reader.config().read_timeout, Some(Duration::from_millis(750)));
        assert_eq!(
            reader.get_ref().read_timeout().unwrap(),
            Some(Duration::from_millis(750))
        );
    }

    #[cfg(unix)]
    #[test]
    fn from_stream_uses_default_timeout() {
        let (host, _device) = std::os::unix::net::UnixStream::pair().unwrap();
        let module = Module::from_stream(DeviceStream::from_unix(host), ModuleConfig::default())
            .unwrap();

        let (reader, _, _) = module.into_parts();
        assert_eq!(reader.get_ref().read_timeout().unwrap(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn corrupt_reply_is_a_frame_error() {
        let mut module = Module::new(
            FrameReader::new(Cursor::new(vec![0x7d, 0x10, 0x00, 0x7e, 0x7d])),
            FrameWriter::new(Vec::new()),
            ModuleConfig::default(),
        );
        let err = module.set_led_mode(LedMode::Simple).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Frame(FrameError::BadCrc { .. })
        ));
    }
}
