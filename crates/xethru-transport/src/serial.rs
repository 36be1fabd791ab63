use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::DeviceStream;

/// Line rate the X2M200 ships with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout for opened ports.
///
/// Short enough that a reader thread can notice a stop request promptly.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial-port transport for a radar module.
///
/// Opens the port as 8N1 with no flow control, which is what the module
/// firmware expects.
#[derive(Debug, Clone)]
pub struct SerialDevice {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialDevice {
    /// Describe a serial device at `path` with default settings.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the read timeout applied at open.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the device (blocking).
    pub fn open(&self) -> Result<DeviceStream> {
        if self.baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(self.baud_rate));
        }

        let port = serialport::new(self.path.as_str(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path, baud = self.baud_rate, "opened serial device");
        Ok(DeviceStream::from_serial(port))
    }

    /// The device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Read timeout applied at open.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "serial"
    }
}

/// A serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS device name (`/dev/ttyACM0`, `COM3`).
    pub name: String,
    /// Bus the port hangs off (`usb`, `pci`, `bluetooth`, `unknown`).
    pub kind: &'static str,
    /// Free-form description, usually the USB product string.
    pub description: Option<String>,
}

/// Enumerate serial ports on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, description) = match port.port_type {
                SerialPortType::UsbPort(usb) => (
                    "usb",
                    Some(match (usb.manufacturer, usb.product) {
                        (Some(m), Some(p)) => format!("{m} {p} ({:04x}:{:04x})", usb.vid, usb.pid),
                        (None, Some(p)) => format!("{p} ({:04x}:{:04x})", usb.vid, usb.pid),
                        _ => format!("{:04x}:{:04x}", usb.vid, usb.pid),
                    }),
                ),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                description,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_module_firmware() {
        let device = SerialDevice::new("/dev/ttyACM0");
        assert_eq!(device.path(), "/dev/ttyACM0");
        assert_eq!(device.baud_rate(), DEFAULT_BAUD_RATE);
        assert_eq!(device.transport_name(), "serial");
        assert_eq!(device.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_override_is_kept() {
        let device = SerialDevice::new("COM3").with_timeout(Duration::from_secs(2));
        assert_eq!(device.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn zero_baud_rate_rejected_before_open() {
        let result = SerialDevice::new("/dev/null").with_baud_rate(0).open();
        assert!(matches!(result, Err(TransportError::InvalidBaudRate(0))));
    }

    #[test]
    fn open_missing_device_reports_path() {
        let path = format!("/nonexistent/xethru-{}", std::process::id());
        let err = SerialDevice::new(path.clone())
            .with_timeout(Duration::from_millis(5))
            .open()
            .unwrap_err();

        match err {
            TransportError::Open { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
