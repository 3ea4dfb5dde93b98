//! Calibration store errors

use core::fmt;

use crate::validate::ValidationError;

/// Every way a calibration store operation can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    // Configuration
    /// Channel count outside `1..=MAX_CHANNELS`
    InvalidChannelCount,
    /// Record does not fit between the start address and the storage end
    InsufficientSpace,

    // Backend readiness
    /// Storage backend failed the accessibility probe
    StorageNotReady,
    /// Store was not constructed successfully
    NotReady,

    // Save input
    /// No channel holds a usable calibration
    NoValidData,
    /// Source or sink holds fewer entries than the channel count
    MissingInput,

    /// Stored record was rejected
    Validation(ValidationError),

    // Durability
    /// Backend commit failed; region contents are undefined
    CommitFailed,
    /// Read-back does not match what was written
    VerificationFailed,
}

impl StoreError {
    /// Human-readable description
    pub const fn describe(&self) -> &'static str {
        match self {
            StoreError::InvalidChannelCount => {
                "Invalid channel count (must be 1-8) - check store configuration"
            }
            StoreError::InsufficientSpace => {
                "Insufficient storage space for calibration record - increase storage size or lower start address"
            }
            StoreError::StorageNotReady => {
                "Storage backend not accessible - initialize it at system level first"
            }
            StoreError::NotReady => "Calibration store not initialized - check construction error",
            StoreError::NoValidData => {
                "No valid calibration data to save - perform sensor calibration first"
            }
            StoreError::MissingInput => "Channel data shorter than configured channel count",
            StoreError::Validation(ValidationError::SignatureMismatch) => {
                "Magic number mismatch - stored data is not calibration data"
            }
            StoreError::Validation(ValidationError::VersionMismatch) => {
                "Data format version incompatible - recalibration required"
            }
            StoreError::Validation(ValidationError::ChannelCountMismatch) => {
                "Stored channel count doesn't match current hardware configuration"
            }
            StoreError::Validation(ValidationError::ChecksumFailed) => {
                "Data corruption detected (checksum failed) - recalibration recommended"
            }
            StoreError::Validation(ValidationError::InvalidRange { .. }) => {
                "Invalid calibration range (min >= max) - perform proper calibration"
            }
            StoreError::Validation(ValidationError::RangeExceeded { .. }) => {
                "Calibration values exceed ADC range (0-4095) - check sensor wiring"
            }
            StoreError::CommitFailed => {
                "Failed to commit storage changes - check power supply stability"
            }
            StoreError::VerificationFailed => {
                "Data verification failed after write - possible storage corruption"
            }
        }
    }

    /// Whether the error came from rejecting stored data
    pub const fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Validation(e)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Validation(
                ValidationError::InvalidRange { channel }
                | ValidationError::RangeExceeded { channel },
            ) => write!(f, "{} (channel {})", self.describe(), channel),
            _ => f.write_str(self.describe()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&StoreError::Validation(*self), f)
    }
}
