use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serializer;

use crate::error::ParseError;

/// A record decoded from one telemetry payload.
///
/// The polling loop is generic over this trait; the caller picks the
/// record type for the application it loaded.
pub trait Telemetry: Sized + Send + 'static {
    /// Short name used in logs.
    const KIND: &'static str;

    /// Decode a payload (the un-framed frame contents).
    fn parse(payload: &[u8]) -> Result<Self, ParseError>;

    /// When the record was decoded.
    fn time(&self) -> SystemTime;
}

/// Serialize a timestamp as nanoseconds since the Unix epoch.
pub(crate) fn unix_nanos<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let nanos = time
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default();
    serializer.serialize_u64(nanos)
}
