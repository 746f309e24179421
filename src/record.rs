//! Advertisement payloads as delivered by the wireless stack, and the
//! entries the registry keeps for each device.
//!
//! The wire layout of one advertisement event is packed little-endian:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | `device_id` |
//! | 4 | 16 | `name` |
//! | 20 | 64 | `data` |
//! | 84 | 4 | `rf_address` |
//! | 88 | 1 | `signal_strength` |

use core::fmt;

/// Length of the device name field in bytes
pub const NAME_LEN: usize = 16;
/// Length of the opaque advertising data field in bytes
pub const DATA_LEN: usize = 64;
/// Length of one packed advertisement event
pub const WIRE_LEN: usize = 4 + NAME_LEN + DATA_LEN + 4 + 1;

/// One advertisement event
///
/// Every field except `signal_strength` is fixed for a given `device_id`.
/// The registry never inspects `name` or `data`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AdvertisementRecord {
    /// Stable device identity
    pub device_id: u32,
    /// Device name, NUL padded
    pub name: [u8; NAME_LEN],
    /// Opaque advertising data
    pub data: [u8; DATA_LEN],
    /// Radio address
    pub rf_address: u32,
    /// Received signal strength; higher is stronger
    pub signal_strength: u8,
}

impl AdvertisementRecord {
    /// An all-zero record
    pub const EMPTY: Self = Self {
        device_id: 0,
        name: [0; NAME_LEN],
        data: [0; DATA_LEN],
        rf_address: 0,
        signal_strength: 0,
    };

    /// Creates a zeroed record for `device_id`
    pub const fn new(device_id: u32) -> Self {
        Self {
            device_id,
            ..Self::EMPTY
        }
    }

    /// Sets the name, truncating to [`NAME_LEN`] bytes
    pub fn with_name(mut self, name: &[u8]) -> Self {
        let len = name.len().min(NAME_LEN);
        self.name = [0; NAME_LEN];
        self.name[..len].copy_from_slice(&name[..len]);
        self
    }

    /// Sets the signal strength
    pub const fn with_signal_strength(mut self, signal_strength: u8) -> Self {
        self.signal_strength = signal_strength;
        self
    }

    /// Name bytes up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &self.name[..end]
    }

    /// Name as UTF-8, if it is valid UTF-8
    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(self.name_bytes()).ok()
    }

    /// Encodes the record in the packed wire layout
    pub fn to_bytes(&self) -> [u8; WIRE_LEN] {
        let mut out = [0u8; WIRE_LEN];
        out[0..4].copy_from_slice(&self.device_id.to_le_bytes());
        out[4..4 + NAME_LEN].copy_from_slice(&self.name);
        out[4 + NAME_LEN..4 + NAME_LEN + DATA_LEN].copy_from_slice(&self.data);
        out[WIRE_LEN - 5..WIRE_LEN - 1].copy_from_slice(&self.rf_address.to_le_bytes());
        out[WIRE_LEN - 1] = self.signal_strength;
        out
    }
}

impl Default for AdvertisementRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for AdvertisementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // data is opaque and long; leave it out
        f.debug_struct("AdvertisementRecord")
            .field("device_id", &self.device_id)
            .field("name", &self.name_bytes())
            .field("rf_address", &format_args!("{:#010x}", self.rf_address))
            .field("signal_strength", &self.signal_strength)
            .finish_non_exhaustive()
    }
}

/// A device held by the registry: its latest advertisement and when it was seen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackedDevice {
    /// Latest advertisement for this device
    pub record: AdvertisementRecord,
    /// Timestamp of the latest observation, in milliseconds
    pub last_seen: u64,
}

impl TrackedDevice {
    /// Device identity
    #[inline]
    pub fn device_id(&self) -> u32 {
        self.record.device_id
    }

    /// Signal strength of the latest observation
    #[inline]
    pub fn signal_strength(&self) -> u8 {
        self.record.signal_strength
    }

    /// Milliseconds since the latest observation, as of `now`
    ///
    /// Saturates at zero if `now` is behind `last_seen`.
    #[inline]
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }
}

/// Errors decoding a packed advertisement event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Input ended early
    Truncated {
        /// Bytes still missing
        needed: usize,
    },
    /// Input longer than one event
    TrailingBytes {
        /// Bytes past the end of the event
        extra: usize,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Truncated { needed } => {
                write!(f, "advertisement truncated, {needed} more bytes needed")
            }
            WireError::TrailingBytes { extra } => {
                write!(f, "{extra} trailing bytes after advertisement")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_len() {
        assert_eq!(WIRE_LEN, 89);
    }

    #[test]
    fn test_name_helpers() {
        let rec = AdvertisementRecord::new(3).with_name(b"proprietary_03");
        assert_eq!(rec.name_bytes(), b"proprietary_03");
        assert_eq!(rec.name_str(), Some("proprietary_03"));

        let long = AdvertisementRecord::new(4).with_name(b"a-name-that-is-far-too-long");
        assert_eq!(long.name_bytes().len(), NAME_LEN);

        let mut bad = AdvertisementRecord::new(5);
        bad.name[0] = 0xff;
        assert_eq!(bad.name_str(), None);
    }

    #[test]
    fn test_to_bytes_layout() {
        let mut rec = AdvertisementRecord::new(0x0403_0201).with_name(b"dev");
        rec.data[0] = 0xaa;
        rec.data[DATA_LEN - 1] = 0xbb;
        rec.rf_address = 0xd4c3_b2a1;
        rec.signal_strength = 0x7f;

        let bytes = rec.to_bytes();
        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[4..7], b"dev");
        assert_eq!(bytes[20], 0xaa);
        assert_eq!(bytes[83], 0xbb);
        assert_eq!(&bytes[84..88], &[0xa1, 0xb2, 0xc3, 0xd4]);
        assert_eq!(bytes[88], 0x7f);
    }

    #[test]
    fn test_wire_len_is_packed_event_size() {
        assert_eq!(WIRE_LEN, 89);
        assert_eq!(AdvertisementRecord::EMPTY.to_bytes().len(), WIRE_LEN);
    }

    #[test]
    fn test_age_saturates() {
        let dev = TrackedDevice {
            record: AdvertisementRecord::new(1),
            last_seen: 500,
        };
        assert_eq!(dev.age_ms(750), 250);
        assert_eq!(dev.age_ms(100), 0);
    }
}
