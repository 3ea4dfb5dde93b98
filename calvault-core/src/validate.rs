//! Record validation
//!
//! A decoded record is only trusted after passing five ordered layers.
//! The first failing layer is reported; failures are never aggregated.
//!
//! 1. Signature: magic number
//! 2. Version: exact format version, no migration
//! 3. Configuration: stored channel count matches the hardware
//! 4. Integrity: checksum
//! 5. Semantics: every active channel is a non-degenerate ADC range
//!
//! Layers 1-4 establish that the bytes are a well-formed record written by
//! this firmware; layer 5 only runs on structurally trustworthy data.

use crate::record::{CalibrationRecord, ADC_MAX, CALIBRATION_MAGIC, FORMAT_VERSION};

/// Reasons a stored record is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Magic number does not match
    SignatureMismatch,
    /// Record was written by a different format version
    VersionMismatch,
    /// Record describes a different number of channels
    ChannelCountMismatch,
    /// Stored checksum does not match the contents
    ChecksumFailed,
    /// Channel minimum is not below its maximum
    InvalidRange {
        /// Offending channel index
        channel: u8,
    },
    /// Channel maximum is beyond the ADC range
    RangeExceeded {
        /// Offending channel index
        channel: u8,
    },
}

/// Check a decoded record against the expected channel count
pub fn validate(
    record: &CalibrationRecord,
    expected_channel_count: u8,
) -> Result<(), ValidationError> {
    if record.magic != CALIBRATION_MAGIC {
        return Err(ValidationError::SignatureMismatch);
    }

    if record.version != FORMAT_VERSION {
        return Err(ValidationError::VersionMismatch);
    }

    if record.channel_count != expected_channel_count {
        return Err(ValidationError::ChannelCountMismatch);
    }

    if !record.verify_checksum() {
        return Err(ValidationError::ChecksumFailed);
    }

    for (channel, range) in record.active_channels().enumerate() {
        let channel = channel as u8;
        if range.minimum >= range.maximum {
            return Err(ValidationError::InvalidRange { channel });
        }
        if range.maximum > ADC_MAX {
            return Err(ValidationError::RangeExceeded { channel });
        }
    }

    Ok(())
}
