use std::fmt;
use std::time::SystemTime;

use bytes::Buf;
use serde::Serialize;

use crate::error::ParseError;
use crate::protocol::APP_DATA;
use crate::telemetry::{unix_nanos, Telemetry};

/// Tag, then seven 4-byte big-endian fields.
pub const RESPIRATION_SIZE: usize = 29;

/// What the respiration application currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespirationState {
    Breathing,
    Movement,
    Tracking,
    NoMovement,
    Initializing,
    Reserved,
    Unknown,
    /// A code this driver does not know.
    Other(u32),
}

impl From<u32> for RespirationState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Breathing,
            1 => Self::Movement,
            2 => Self::Tracking,
            3 => Self::NoMovement,
            4 => Self::Initializing,
            5 => Self::Reserved,
            6 => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

impl RespirationState {
    /// Wire code of this state.
    pub fn code(self) -> u32 {
        match self {
            Self::Breathing => 0,
            Self::Movement => 1,
            Self::Tracking => 2,
            Self::NoMovement => 3,
            Self::Initializing => 4,
            Self::Reserved => 5,
            Self::Unknown => 6,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for RespirationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breathing => f.pad("breathing"),
            Self::Movement => f.pad("movement"),
            Self::Tracking => f.pad("tracking"),
            Self::NoMovement => f.pad("no_movement"),
            Self::Initializing => f.pad("initializing"),
            Self::Reserved => f.pad("reserved"),
            Self::Unknown => f.pad("unknown"),
            Self::Other(code) => f.pad(&format!("other({code})")),
        }
    }
}

/// One respiration status message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Respiration {
    #[serde(serialize_with = "unix_nanos")]
    pub time: SystemTime,
    pub status: u32,
    pub counter: u32,
    pub state: RespirationState,
    /// Respirations per minute.
    pub rpm: u32,
    /// Distance to the target, metres.
    pub distance: f64,
    pub signal_quality: f64,
    pub movement: f64,
}

impl Respiration {
    /// Parse a respiration payload (big endian).
    pub fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        match payload.first() {
            Some(&APP_DATA) => {}
            tag => {
                return Err(ParseError::NoRespirationByte {
                    tag: tag.copied(),
                })
            }
        }
        if payload.len() < RESPIRATION_SIZE {
            return Err(ParseError::NotEnoughBytes {
                len: payload.len(),
                min: RESPIRATION_SIZE,
            });
        }

        let mut fields = &payload[1..RESPIRATION_SIZE];
        Ok(Self {
            time: SystemTime::now(),
            status: fields.get_u32(),
            counter: fields.get_u32(),
            state: RespirationState::from(fields.get_u32()),
            rpm: fields.get_u32(),
            distance: f64::from(fields.get_f32()),
            signal_quality: f64::from(fields.get_f32()),
            movement: f64::from(fields.get_f32()),
        })
    }
}

impl Telemetry for Respiration {
    const KIND: &'static str = "respiration";

    fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        Respiration::parse(payload)
    }

    fn time(&self) -> SystemTime {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;

    fn payload(state: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(APP_DATA);
        buf.put_u32(0x2375_a004);
        buf.put_u32(1234);
        buf.put_u32(state);
        buf.put_u32(14);
        buf.put_f32(1.25);
        buf.put_f32(8.0);
        buf.put_f32(-0.5);
        buf
    }

    #[test]
    fn parses_all_fields() {
        let record = Respiration::parse(&payload(0)).unwrap();

        assert_eq!(record.status, 0x2375_a004);
        assert_eq!(record.counter, 1234);
        assert_eq!(record.state, RespirationState::Breathing);
        assert_eq!(record.rpm, 14);
        assert_eq!(record.distance, 1.25);
        assert_eq!(record.signal_quality, 8.0);
        assert_eq!(record.movement, -0.5);
    }

    #[test]
    fn exactly_29_bytes() {
        let data = payload(2);
        assert_eq!(data.len(), RESPIRATION_SIZE);
        assert_eq!(
            Respiration::parse(&data).unwrap().state,
            RespirationState::Tracking
        );
    }

    #[test]
    fn short_payload() {
        let data = payload(0);
        assert_eq!(
            Respiration::parse(&data[..28]),
            Err(ParseError::NotEnoughBytes { len: 28, min: 29 })
        );
    }

    #[test]
    fn wrong_tag() {
        let mut data = payload(0);
        data[0] = 0x10;
        assert_eq!(
            Respiration::parse(&data),
            Err(ParseError::NoRespirationByte { tag: Some(0x10) })
        );
    }

    #[test]
    fn empty_payload() {
        assert_eq!(
            Respiration::parse(&[]),
            Err(ParseError::NoRespirationByte { tag: None })
        );
    }

    #[test]
    fn state_codes() {
        let cases = [
            (0, RespirationState::Breathing),
            (1, RespirationState::Movement),
            (3, RespirationState::NoMovement),
            (4, RespirationState::Initializing),
            (5, RespirationState::Reserved),
            (6, RespirationState::Unknown),
            (7, RespirationState::Other(7)),
            (0xdead, RespirationState::Other(0xdead)),
        ];
        for (code, state) in cases {
            assert_eq!(RespirationState::from(code), state);
            assert_eq!(state.code(), code);
        }
        assert_eq!(RespirationState::Other(9).to_string(), "other(9)");
        assert_eq!(format!("{:<10}|", RespirationState::Movement), "movement  |");
    }

    #[test]
    fn serializes_for_output() {
        let record = Respiration::parse(&payload(3)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["state"], "no_movement");
        assert_eq!(json["rpm"], 14);
        assert!(json["time"].as_u64().unwrap() > 0);
    }
}
