//! Record checksum
//!
//! Add-then-rotate accumulator over the record fields in layout order:
//! magic, version, channel count, every minimum slot, every maximum slot.
//! Each field is added (wrapping) to a 32-bit accumulator which is then
//! rotated left by one bit.
//!
//! The arrays are folded one after the other, not interleaved per channel
//! (`minimum[0], maximum[0], minimum[1], ...`). Earlier firmware used the
//! interleaved order, so its records fail with `ChecksumFailed` here. Do
//! not switch to the interleaved order; records already written would stop
//! validating.
//!
//! Every step is a bijection of the accumulator, so changing any single
//! field always changes the result. The full fixed-capacity arrays are
//! always processed, and the checksum field itself never contributes.

use crate::record::CalibrationRecord;

/// Fold one field into the accumulator
#[inline]
const fn mix(acc: u32, value: u32) -> u32 {
    acc.wrapping_add(value).rotate_left(1)
}

/// Compute the checksum a record should carry
pub fn compute(record: &CalibrationRecord) -> u32 {
    let mut acc = 0;

    acc = mix(acc, record.magic as u32);
    acc = mix(acc, record.version as u32);
    acc = mix(acc, record.channel_count as u32);

    for &value in &record.minimum {
        acc = mix(acc, value as u32);
    }
    for &value in &record.maximum {
        acc = mix(acc, value as u32);
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ChannelRange, MAX_CHANNELS, RECORD_SIZE};
    use proptest::prelude::*;

    #[test]
    fn test_zero_record() {
        assert_eq!(compute(&CalibrationRecord::zeroed()), 0);
    }

    #[test]
    fn test_rotation_is_applied() {
        let mut record = CalibrationRecord::zeroed();
        record.magic = 1;
        // 1 is added then rotated once per remaining field
        let steps = 3 + 2 * MAX_CHANNELS as u32;
        assert_eq!(compute(&record), 1u32.rotate_left(steps));
    }

    #[test]
    fn test_ignores_checksum_field() {
        let mut record = CalibrationRecord::from_ranges(4, &[ChannelRange::new(10, 20); 4]);
        let expected = compute(&record);
        record.checksum = 0xDEAD_BEEF;
        assert_eq!(compute(&record), expected);
    }

    #[test]
    fn test_field_order_matters() {
        let mut a = CalibrationRecord::zeroed();
        a.minimum[0] = 7;
        let mut b = CalibrationRecord::zeroed();
        b.maximum[0] = 7;
        assert_ne!(compute(&a), compute(&b));
    }

    #[test]
    fn test_arrays_folded_not_interleaved() {
        let record = CalibrationRecord::from_ranges(1, &[ChannelRange::new(100, 900)]);

        let mut array_order = 0;
        let mut interleaved = 0;
        for value in [record.magic as u32, record.version as u32, 1] {
            array_order = mix(array_order, value);
            interleaved = mix(interleaved, value);
        }
        for value in record.minimum.iter().chain(&record.maximum) {
            array_order = mix(array_order, *value as u32);
        }
        for (min, max) in record.minimum.iter().zip(&record.maximum) {
            interleaved = mix(interleaved, *min as u32);
            interleaved = mix(interleaved, *max as u32);
        }

        assert_eq!(compute(&record), array_order);
        assert_ne!(compute(&record), interleaved);
    }

    #[test]
    fn test_channel_count_changes_checksum() {
        let ranges = [ChannelRange::new(100, 900); 4];
        let mut record = CalibrationRecord::from_ranges(4, &ranges);
        let four = compute(&record);
        record.channel_count = 5;
        assert_ne!(compute(&record), four);
    }

    #[test]
    fn test_unused_slot_contents_do_not_leak() {
        // Extra source entries beyond the channel count are never stored
        let short = [ChannelRange::new(100, 900); 3];
        let long = [ChannelRange::new(100, 900); 8];
        let a = CalibrationRecord::from_ranges(3, &short);
        let b = CalibrationRecord::from_ranges(3, &long);
        assert_eq!(a.checksum, b.checksum);
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_detected(
            minimum in prop::array::uniform8(any::<u16>()),
            maximum in prop::array::uniform8(any::<u16>()),
            count in 1u8..=8,
            bit in 0usize..(RECORD_SIZE - 4) * 8,
        ) {
            let mut record = CalibrationRecord::zeroed();
            record.magic = 0xCAFE;
            record.version = 2;
            record.channel_count = count;
            record.minimum = minimum;
            record.maximum = maximum;
            record.stamp_checksum();

            let mut bytes = record.encode();
            bytes[bit / 8] ^= 1 << (bit % 8);
            let corrupted = CalibrationRecord::decode(&bytes);

            prop_assert_ne!(compute(&corrupted), record.checksum);
        }
    }
}
