use bytes::{BufMut, Bytes, BytesMut};

use crate::config::LedMode;

/// Tag of application data frames (telemetry) sent by the module.
pub const APP_DATA: u8 = 0x50;
/// Tag of a positive command acknowledgement.
pub const ACK: u8 = 0x10;
/// Application command tag.
pub const APP_COMMAND: u8 = 0x10;
/// Application "set" sub-command.
pub const APP_SET: u8 = 0x10;
/// Load-application command tag.
pub const LOAD_APP: u8 = 0x21;
/// LED control command tag.
pub const SET_LED_CONTROL: u8 = 0x24;

/// Message id of baseband IQ application data (little endian on the wire).
pub const BASEBAND_IQ: u32 = 0x0C;

/// Respiration application id.
pub const RESPIRATION_APP: [u8; 4] = [0x14, 0x23, 0xa2, 0xd6];
/// Detection-zone parameter id.
pub const DETECTION_ZONE: [u8; 4] = [0x96, 0xa1, 0x0a, 0x1c];
/// Sensitivity parameter id.
pub const SENSITIVITY: [u8; 4] = [0x10, 0xa5, 0x11, 0x2b];

/// Human-readable name for a reply tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        ACK => "ack",
        APP_DATA => "app_data",
        _ => "unknown",
    }
}

/// A control command understood by the module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Load the application with this id.
    LoadApp([u8; 4]),
    /// Change the LED indication mode.
    SetLedMode(LedMode),
    /// Restrict detection to `start..end` metres.
    SetDetectionZone { start: f32, end: f32 },
    /// Set detection sensitivity.
    SetSensitivity(u32),
}

impl Command {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadApp(_) => "load_app",
            Self::SetLedMode(_) => "set_led_mode",
            Self::SetDetectionZone { .. } => "set_detection_zone",
            Self::SetSensitivity(_) => "set_sensitivity",
        }
    }

    /// Encode the command payload (unframed).
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(14);
        match *self {
            Self::LoadApp(app_id) => {
                buf.put_u8(LOAD_APP);
                buf.put_slice(&app_id);
            }
            Self::SetLedMode(mode) => {
                buf.put_u8(SET_LED_CONTROL);
                buf.put_u8(mode as u8);
                buf.put_u8(0x00);
            }
            Self::SetDetectionZone { start, end } => {
                buf.put_u8(APP_COMMAND);
                buf.put_u8(APP_SET);
                buf.put_slice(&DETECTION_ZONE);
                buf.put_f32_le(start);
                buf.put_f32_le(end);
            }
            Self::SetSensitivity(sensitivity) => {
                buf.put_u8(APP_COMMAND);
                buf.put_u8(APP_SET);
                buf.put_slice(&SENSITIVITY);
                buf.put_u32_le(sensitivity);
            }
        }
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_app_payload() {
        let payload = Command::LoadApp(RESPIRATION_APP).encode();
        assert_eq!(payload.as_ref(), &[0x21, 0x14, 0x23, 0xa2, 0xd6]);
    }

    #[test]
    fn led_payload() {
        assert_eq!(
            Command::SetLedMode(LedMode::Full).encode().as_ref(),
            &[0x24, 0x02, 0x00]
        );
        assert_eq!(
            Command::SetLedMode(LedMode::Off).encode().as_ref(),
            &[0x24, 0x00, 0x00]
        );
    }

    #[test]
    fn detection_zone_payload() {
        let payload = Command::SetDetectionZone {
            start: 0.5,
            end: 2.0,
        }
        .encode();

        assert_eq!(
            payload.as_ref(),
            &[
                0x10, 0x10, 0x96, 0xa1, 0x0a, 0x1c, // header
                0x00, 0x00, 0x00, 0x3f, // 0.5
                0x00, 0x00, 0x00, 0x40, // 2.0
            ]
        );
    }

    #[test]
    fn sensitivity_payload() {
        let payload = Command::SetSensitivity(7).encode();
        assert_eq!(
            payload.as_ref(),
            &[0x10, 0x10, 0x10, 0xa5, 0x11, 0x2b, 0x07, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn tag_names() {
        assert_eq!(tag_name(0x10), "ack");
        assert_eq!(tag_name(0x50), "app_data");
        assert_eq!(tag_name(0x20), "unknown");
    }
}
