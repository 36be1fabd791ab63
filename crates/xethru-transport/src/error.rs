/// Errors that can occur in device transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// Failed to list serial devices.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// The serial driver rejected a port setting.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested baud rate is not usable.
    #[error("invalid baud rate: {0}")]
    InvalidBaudRate(u32),
}

impl TransportError {
    /// The underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Io(err) => Some(err.kind()),
            TransportError::Open { source, .. }
            | TransportError::Enumerate(source)
            | TransportError::Serial(source) => match source.kind() {
                serialport::ErrorKind::Io(kind) => Some(kind),
                _ => None,
            },
            TransportError::InvalidBaudRate(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn io_kind_sees_through_serial_errors() {
        let err = TransportError::Open {
            path: "/dev/ttyACM0".to_string(),
            source: serialport::Error::new(
                serialport::ErrorKind::Io(ErrorKind::PermissionDenied),
                "denied",
            ),
        };
        assert_eq!(err.io_kind(), Some(ErrorKind::PermissionDenied));
        assert!(err.to_string().contains("/dev/ttyACM0"));

        let err = TransportError::Serial(serialport::Error::new(
            serialport::ErrorKind::NoDevice,
            "gone",
        ));
        assert_eq!(err.io_kind(), None);
        assert_eq!(TransportError::InvalidBaudRate(0).io_kind(), None);
    }
}
