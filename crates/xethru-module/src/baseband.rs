use std::time::SystemTime;

use bytes::Buf;
use serde::Serialize;

use crate::error::ParseError;
use crate::protocol::{APP_DATA, BASEBAND_IQ};
use crate::telemetry::{unix_nanos, Telemetry};

/// Fixed header: tag, message id, counter, bins, bin length, sampling
/// frequency, carrier frequency, range offset.
pub const HEADER_SIZE: usize = 29;

/// One baseband IQ snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseBandIq {
    #[serde(serialize_with = "unix_nanos")]
    pub time: SystemTime,
    pub counter: u32,
    pub bins: u32,
    pub bin_length: f64,
    pub sampling_frequency: f64,
    pub carrier_frequency: f64,
    pub range_offset: f64,
    pub sig_i: Vec<f64>,
    pub sig_q: Vec<f64>,
}

impl BaseBandIq {
    /// Parse a baseband IQ payload (little endian).
    pub fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        let tag = *payload.first().ok_or(ParseError::NoData)?;
        if tag != APP_DATA {
            return Err(ParseError::NotBaseBand { tag });
        }
        if payload.len() < HEADER_SIZE {
            return Err(ParseError::NotEnoughBytes {
                len: payload.len(),
                min: HEADER_SIZE,
            });
        }

        let mut header = &payload[1..HEADER_SIZE];
        let id = header.get_u32_le();
        if id != BASEBAND_IQ {
            return Err(ParseError::DataHeader { id });
        }

        let counter = header.get_u32_le();
        let bins = header.get_u32_le();
        let bin_length = f64::from(header.get_f32_le());
        let sampling_frequency = f64::from(header.get_f32_le());
        let carrier_frequency = f64::from(header.get_f32_le());
        let range_offset = f64::from(header.get_f32_le());

        // I samples then Q samples, four bytes each.
        let count = usize::try_from(bins).ok();
        let needed = count
            .and_then(|n| n.checked_mul(8))
            .and_then(|n| n.checked_add(HEADER_SIZE));
        let count = match (count, needed) {
            (Some(count), Some(needed)) if payload.len() >= needed => count,
            _ => {
                return Err(ParseError::IncompletePacket {
                    bins,
                    len: payload.len(),
                })
            }
        };

        let mut samples = &payload[HEADER_SIZE..];
        let sig_i = (0..count).map(|_| f64::from(samples.get_f32_le())).collect();
        let sig_q = (0..count).map(|_| f64::from(samples.get_f32_le())).collect();

        Ok(Self {
            time: SystemTime::now(),
            counter,
            bins,
            bin_length,
            sampling_frequency,
            carrier_frequency,
            range_offset,
            sig_i,
            sig_q,
        })
    }
}

impl Telemetry for BaseBandIq {
    const KIND: &'static str = "baseband";

    fn parse(payload: &[u8]) -> Result<Self, ParseError> {
        BaseBandIq::parse(payload)
    }

    fn time(&self) -> SystemTime {
        self.time
    }
}
