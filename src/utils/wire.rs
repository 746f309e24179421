//! Nom parsers for packed advertisement events
//!
//! The wireless stack hands each advertisement over as one packed,
//! little-endian event (see [`crate::record`] for the layout). These parsers
//! turn raw event bytes into an [`AdvertisementRecord`] without copying more
//! than the record itself.
//!
//! # Feature Flag
//!
//! This module is only available when the `wire` feature is enabled.
//!
//! # Usage
//!
//! ```
//! use tinyscan::prelude::*;
//!
//! let raw = AdvertisementRecord::new(9).with_signal_strength(60).to_bytes();
//! let (rest, rec) = parse_advertisement(&raw).unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(rec.device_id, 9);
//! ```

use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{le_u32, u8 as byte};
use nom::{IResult, Parser};

use crate::record::{AdvertisementRecord, DATA_LEN, NAME_LEN, WIRE_LEN, WireError};

fn fixed<const L: usize>(bytes: &[u8]) -> [u8; L] {
    let mut out = [0u8; L];
    out.copy_from_slice(bytes);
    out
}

/// Parses one packed advertisement event off the front of `input`
pub fn parse_advertisement(input: &[u8]) -> IResult<&[u8], AdvertisementRecord> {
    map(
        (le_u32, take(NAME_LEN), take(DATA_LEN), le_u32, byte),
        |(device_id, name, data, rf_address, signal_strength): (u32, &[u8], &[u8], u32, u8)| {
            AdvertisementRecord {
                device_id,
                name: fixed(name),
                data: fixed(data),
                rf_address,
                signal_strength,
            }
        },
    )
    .parse(input)
}

impl AdvertisementRecord {
    /// Decodes exactly one packed advertisement event
    ///
    /// # Errors
    ///
    /// - [`WireError::Truncated`] if `bytes` is shorter than one event
    /// - [`WireError::TrailingBytes`] if `bytes` is longer than one event
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < WIRE_LEN {
            return Err(WireError::Truncated {
                needed: WIRE_LEN - bytes.len(),
            });
        }

        match parse_advertisement(bytes) {
            Ok(([], record)) => Ok(record),
            Ok((rest, _)) => Err(WireError::TrailingBytes { extra: rest.len() }),
            // Unreachable with the length check above, but report it the same way
            Err(_) => Err(WireError::Truncated {
                needed: WIRE_LEN.saturating_sub(bytes.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn sample() -> AdvertisementRecord {
        let mut rec = AdvertisementRecord::new(0xcafe)
            .with_name(b"pump-17")
            .with_signal_strength(201);
        rec.data[..4].copy_from_slice(b"\x01\x02\x03\x04");
        rec.rf_address = 0x1122_3344;
        rec
    }

    #[test]
    fn test_parse_advertisement() {
        let raw = sample().to_bytes();
        let (rest, rec) = parse_advertisement(&raw).unwrap();

        assert!(rest.is_empty());
        assert_eq!(rec.device_id, 0xcafe);
        assert_eq!(rec.name_str(), Some("pump-17"));
        assert_eq!(&rec.data[..4], b"\x01\x02\x03\x04");
        assert_eq!(rec.rf_address, 0x1122_3344);
        assert_eq!(rec.signal_strength, 201);
    }

    #[test]
    fn test_parse_stream_of_events() {
        let mut stream = Vec::new();
        for id in 1..=3u32 {
            stream.extend_from_slice(&AdvertisementRecord::new(id).to_bytes());
        }

        let mut input = &stream[..];
        let mut ids = Vec::new();
        while !input.is_empty() {
            let (rest, rec) = parse_advertisement(input).unwrap();
            ids.push(rec.device_id);
            input = rest;
        }
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn test_parse_short_input_fails() {
        let raw = sample().to_bytes();
        assert!(parse_advertisement(&raw[..WIRE_LEN - 1]).is_err());
    }

    #[test]
    fn test_from_bytes() {
        let raw = sample().to_bytes();
        assert_eq!(AdvertisementRecord::from_bytes(&raw), Ok(sample()));

        assert_eq!(
            AdvertisementRecord::from_bytes(&raw[..80]),
            Err(WireError::Truncated { needed: 9 })
        );

        let mut long = Vec::from(&raw[..]);
        long.extend_from_slice(&[0, 0]);
        assert_eq!(
            AdvertisementRecord::from_bytes(&long),
            Err(WireError::TrailingBytes { extra: 2 })
        );
    }
}
