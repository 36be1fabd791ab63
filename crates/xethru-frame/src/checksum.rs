//! Frame integrity checksum.

use crate::codec::START;

/// XOR of every payload byte, folded with the start marker.
///
/// Folding in `0x7D` keeps the checksum of a payload that XORs to zero
/// (including the empty payload) from being zero itself.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(START, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_start_marker() {
        assert_eq!(checksum(&[]), 0x7d);
    }

    #[test]
    fn known_payloads() {
        assert_eq!(checksum(&[0x01, 0x02, 0x00]), 0x7e);
        assert_eq!(checksum(&[0x01, 0x02, 0x03]), 0x7d);
        assert_eq!(checksum(&[0x00, 0x01, 0x02, 0x7e]), 0x00);
        assert_eq!(checksum(&[0x7e, 0x7e, 0x02, 0x7e]), 0x01);
    }

    #[test]
    fn balanced_payload_is_not_zero() {
        assert_eq!(checksum(&[0xaa, 0xaa]), 0x7d);
    }

    #[test]
    fn order_does_not_matter() {
        assert_eq!(checksum(&[0x10, 0x20, 0x30]), checksum(&[0x30, 0x10, 0x20]));
    }
}
