//! Calibration record layout
//!
//! The record is persisted byte-for-byte with a fixed, platform-independent
//! layout. All multi-byte fields are little-endian and there is no padding:
//!
//! ```text
//! ┌───────┬─────────┬───────┬──────────────┬──────────────┬──────────┐
//! │ MAGIC │ VERSION │ COUNT │ MINIMUM[8]   │ MAXIMUM[8]   │ CHECKSUM │
//! │ 2B    │ 1B      │ 1B    │ 16B          │ 16B          │ 4B       │
//! └───────┴─────────┴───────┴──────────────┴──────────────┴──────────┘
//! ```
//!
//! Capacity for [`MAX_CHANNELS`] is always reserved, so the record size does
//! not depend on how many channels are active.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::checksum;

/// Magic number identifying a calibration record
pub const CALIBRATION_MAGIC: u16 = 0xCAFE;

/// Current record format version
///
/// Bumped on any layout or meaning change. Records of any other version
/// are rejected, never migrated.
pub const FORMAT_VERSION: u8 = 2;

/// Channel slots reserved in every record
pub const MAX_CHANNELS: usize = 8;

/// Largest value the sampling ADC can produce (12-bit)
pub const ADC_MAX: u16 = 4095;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 2;
const COUNT_OFFSET: usize = 3;
const MINIMUM_OFFSET: usize = 4;
const MAXIMUM_OFFSET: usize = MINIMUM_OFFSET + 2 * MAX_CHANNELS;
const CHECKSUM_OFFSET: usize = MAXIMUM_OFFSET + 2 * MAX_CHANNELS;

/// Encoded record size in bytes
pub const RECORD_SIZE: usize = CHECKSUM_OFFSET + 4;

/// Storage bytes needed for a record describing `channel_count` channels
///
/// Constant: the layout always reserves every channel slot, so addresses
/// never shift when the channel count changes.
pub const fn calculate_storage_size(_channel_count: u8) -> u16 {
    RECORD_SIZE as u16
}

/// Calibration bounds of one sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelRange {
    /// Low calibration bound (raw ADC counts)
    pub minimum: u16,
    /// High calibration bound (raw ADC counts)
    pub maximum: u16,
}

impl ChannelRange {
    /// Create a new channel range
    pub const fn new(minimum: u16, maximum: u16) -> Self {
        Self { minimum, maximum }
    }

    /// Non-degenerate and inside the ADC range
    pub const fn is_calibrated(&self) -> bool {
        self.minimum < self.maximum && self.maximum <= ADC_MAX
    }

    /// Width of the range, zero when degenerate
    pub const fn span(&self) -> u16 {
        self.maximum.saturating_sub(self.minimum)
    }
}

/// Persisted calibration record
///
/// Only lives in memory while a save or load is in progress. A record is
/// always built fresh and replaced as a whole, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    /// Format family signature
    pub magic: u16,
    /// Layout version
    pub version: u8,
    /// Active channels described by this record
    pub channel_count: u8,
    /// Per-channel low bounds (unused slots zero)
    pub minimum: [u16; MAX_CHANNELS],
    /// Per-channel high bounds (unused slots zero)
    pub maximum: [u16; MAX_CHANNELS],
    /// Integrity tag over every other field
    pub checksum: u32,
}

impl Default for CalibrationRecord {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl CalibrationRecord {
    /// All-zero record (what a cleared region decodes to)
    pub const fn zeroed() -> Self {
        Self {
            magic: 0,
            version: 0,
            channel_count: 0,
            minimum: [0; MAX_CHANNELS],
            maximum: [0; MAX_CHANNELS],
            checksum: 0,
        }
    }

    /// Build a stamped record from per-channel ranges
    ///
    /// The first `channel_count` entries of `ranges` are copied; every other
    /// slot is zero-filled. The checksum is computed last.
    pub fn from_ranges(channel_count: u8, ranges: &[ChannelRange]) -> Self {
        let mut record = Self {
            magic: CALIBRATION_MAGIC,
            version: FORMAT_VERSION,
            channel_count,
            ..Self::zeroed()
        };

        let active = (channel_count as usize).min(MAX_CHANNELS);
        for (i, range) in ranges.iter().take(active).enumerate() {
            record.minimum[i] = range.minimum;
            record.maximum[i] = range.maximum;
        }

        record.stamp_checksum();
        record
    }

    /// Range stored in slot `index`, if that slot exists
    pub fn channel(&self, index: usize) -> Option<ChannelRange> {
        Some(ChannelRange::new(
            *self.minimum.get(index)?,
            *self.maximum.get(index)?,
        ))
    }

    /// Ranges of the active channels
    pub fn active_channels(&self) -> impl Iterator<Item = ChannelRange> + '_ {
        self.minimum
            .iter()
            .zip(self.maximum.iter())
            .take(self.channel_count as usize)
            .map(|(&minimum, &maximum)| ChannelRange::new(minimum, maximum))
    }

    /// Checksum the record should carry
    pub fn calculate_checksum(&self) -> u32 {
        checksum::compute(self)
    }

    /// Update the checksum field
    pub fn stamp_checksum(&mut self) {
        self.checksum = self.calculate_checksum();
    }

    /// Verify the checksum field
    pub fn verify_checksum(&self) -> bool {
        self.checksum == self.calculate_checksum()
    }

    /// Serialize into the fixed storage layout
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];

        bytes[MAGIC_OFFSET..VERSION_OFFSET].copy_from_slice(&self.magic.to_le_bytes());
        bytes[VERSION_OFFSET] = self.version;
        bytes[COUNT_OFFSET] = self.channel_count;

        for (i, value) in self.minimum.iter().enumerate() {
            let at = MINIMUM_OFFSET + 2 * i;
            bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
        for (i, value) in self.maximum.iter().enumerate() {
            let at = MAXIMUM_OFFSET + 2 * i;
            bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }

        bytes[CHECKSUM_OFFSET..].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Reinterpret stored bytes as a record
    ///
    /// Total: any byte pattern decodes. Whether the result can be trusted is
    /// decided by validation, not here.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

        let mut record = Self {
            magic: u16_at(MAGIC_OFFSET),
            version: bytes[VERSION_OFFSET],
            channel_count: bytes[COUNT_OFFSET],
            ..Self::zeroed()
        };

        for i in 0..MAX_CHANNELS {
            record.minimum[i] = u16_at(MINIMUM_OFFSET + 2 * i);
            record.maximum[i] = u16_at(MAXIMUM_OFFSET + 2 * i);
        }

        record.checksum = u32::from_le_bytes([
            bytes[CHECKSUM_OFFSET],
            bytes[CHECKSUM_OFFSET + 1],
            bytes[CHECKSUM_OFFSET + 2],
            bytes[CHECKSUM_OFFSET + 3],
        ]);

        record
    }

    /// Decode from a slice, which must be exactly [`RECORD_SIZE`] bytes
    pub fn decode_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; RECORD_SIZE] = bytes.try_into().ok()?;
        Some(Self::decode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ranges() -> [ChannelRange; 8] {
        [
            ChannelRange::new(100, 900),
            ChannelRange::new(120, 880),
            ChannelRange::new(140, 860),
            ChannelRange::new(160, 840),
            ChannelRange::new(180, 820),
            ChannelRange::new(200, 800),
            ChannelRange::new(220, 780),
            ChannelRange::new(240, 760),
        ]
    }

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 40);
        for count in 0..=u8::MAX {
            assert_eq!(calculate_storage_size(count), 40);
        }
    }

    #[test]
    fn test_channel_range_is_calibrated() {
        assert!(ChannelRange::new(0, 1).is_calibrated());
        assert!(ChannelRange::new(100, ADC_MAX).is_calibrated());
        assert!(!ChannelRange::new(0, 0).is_calibrated());
        assert!(!ChannelRange::new(900, 100).is_calibrated());
        assert!(!ChannelRange::new(100, ADC_MAX + 1).is_calibrated());
    }

    #[test]
    fn test_channel_range_span() {
        assert_eq!(ChannelRange::new(100, 900).span(), 800);
        assert_eq!(ChannelRange::new(900, 100).span(), 0);
    }

    #[test]
    fn test_from_ranges_stamps_header() {
        let record = CalibrationRecord::from_ranges(8, &sample_ranges());
        assert_eq!(record.magic, CALIBRATION_MAGIC);
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.channel_count, 8);
        assert_eq!(record.minimum[0], 100);
        assert_eq!(record.maximum[7], 760);
        assert!(record.verify_checksum());
    }

    #[test]
    fn test_from_ranges_zero_fills_unused_slots() {
        let record = CalibrationRecord::from_ranges(3, &sample_ranges());
        assert_eq!(record.active_channels().count(), 3);
        for i in 3..MAX_CHANNELS {
            assert_eq!(record.minimum[i], 0);
            assert_eq!(record.maximum[i], 0);
        }
    }

    #[test]
    fn test_encode_layout() {
        let record = CalibrationRecord::from_ranges(2, &sample_ranges());
        let bytes = record.encode();

        // Little-endian magic 0xCAFE
        assert_eq!(&bytes[0..2], &[0xFE, 0xCA]);
        assert_eq!(bytes[2], FORMAT_VERSION);
        assert_eq!(bytes[3], 2);
        // minimum[0] = 100, minimum[1] = 120
        assert_eq!(&bytes[4..8], &[100, 0, 120, 0]);
        // maximum[0] = 900 = 0x0384
        assert_eq!(&bytes[20..22], &[0x84, 0x03]);
        assert_eq!(&bytes[36..40], &record.checksum.to_le_bytes());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let record = CalibrationRecord::from_ranges(8, &sample_ranges());
        assert_eq!(CalibrationRecord::decode(&record.encode()), record);
    }

    #[test]
    fn test_decode_zeroes() {
        let record = CalibrationRecord::decode(&[0u8; RECORD_SIZE]);
        assert_eq!(record, CalibrationRecord::zeroed());
    }

    #[test]
    fn test_decode_slice_length() {
        let bytes = CalibrationRecord::from_ranges(1, &sample_ranges()).encode();
        assert!(CalibrationRecord::decode_slice(&bytes).is_some());
        assert!(CalibrationRecord::decode_slice(&bytes[..RECORD_SIZE - 1]).is_none());
        assert!(CalibrationRecord::decode_slice(&[0u8; RECORD_SIZE + 1]).is_none());
    }

    #[test]
    fn test_channel_accessor() {
        let record = CalibrationRecord::from_ranges(8, &sample_ranges());
        assert_eq!(record.channel(1), Some(ChannelRange::new(120, 880)));
        assert_eq!(record.channel(MAX_CHANNELS), None);
    }
}
