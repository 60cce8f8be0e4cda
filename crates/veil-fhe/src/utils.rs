// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};

/// Number of parallel counters revealed per batch.
pub const NUM_COUNTERS: usize = 4;

/// Decode an oracle cleartext payload into the four counters, little-endian,
/// in snapshot order.
pub fn decode_counters(bytes: &[u8]) -> Result<[u64; NUM_COUNTERS]> {
    if bytes.len() != NUM_COUNTERS * 8 {
        bail!(
            "expected {} cleartext bytes, got {}",
            NUM_COUNTERS * 8,
            bytes.len()
        );
    }

    let mut counters = [0u64; NUM_COUNTERS];
    for (i, chunk) in bytes.chunks_exact(8).enumerate() {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        counters[i] = u64::from_le_bytes(buf);
    }
    Ok(counters)
}

/// Inverse of [`decode_counters`]. Oracle implementations use this to build
/// delivery payloads.
pub fn encode_counters(counters: &[u64; NUM_COUNTERS]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(NUM_COUNTERS * 8);
    for value in counters {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_short_payload() {
        assert!(decode_counters(&[0u8; 31]).is_err());
        assert!(decode_counters(&[0u8; 33]).is_err());
    }

    #[test]
    fn decode_reads_little_endian() {
        let mut bytes = vec![0u8; 32];
        bytes[0] = 2;
        bytes[8] = 6;
        bytes[16] = 2;
        let counters = decode_counters(&bytes).unwrap();
        assert_eq!(counters, [2, 6, 2, 0]);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let counters = [1u64, u64::MAX, 0, 42];
        assert_eq!(decode_counters(&encode_counters(&counters)).unwrap(), counters);
    }
}
