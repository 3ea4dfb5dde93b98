//! Calibration diagnostics
//!
//! Read-only views of what is stored, for status screens and bring-up.
//! Nothing here writes to storage or changes a store's last error.

use calvault_hal::Eeprom;
use heapless::Vec;

use crate::error::StoreError;
use crate::record::{CalibrationRecord, ChannelRange, CALIBRATION_MAGIC, MAX_CHANNELS};
use crate::store::CalibrationStore;

/// Raw bytes captured from an unreadable region
pub const HEADER_DUMP_LEN: usize = 16;

/// Sensor contrast grade, from the average calibrated span
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationQuality {
    /// Average span 400 or less
    Poor,
    /// Average span above 400
    Fair,
    /// Average span above 700
    Good,
    /// Average span above 1000
    VeryGood,
    /// Average span above 1500
    Excellent,
}

impl CalibrationQuality {
    /// Grade an average span (ADC counts)
    pub const fn from_average_span(span: u16) -> Self {
        match span {
            1501..=u16::MAX => CalibrationQuality::Excellent,
            1001..=1500 => CalibrationQuality::VeryGood,
            701..=1000 => CalibrationQuality::Good,
            401..=700 => CalibrationQuality::Fair,
            _ => CalibrationQuality::Poor,
        }
    }

    /// Short description
    pub const fn describe(&self) -> &'static str {
        match self {
            CalibrationQuality::Excellent => "Excellent - high contrast",
            CalibrationQuality::VeryGood => "Very good contrast",
            CalibrationQuality::Good => "Good - adequate contrast",
            CalibrationQuality::Fair => "Fair - consider recalibrating",
            CalibrationQuality::Poor => "Poor - recalibration strongly recommended",
        }
    }
}

/// Per-channel ranges with an overall grade
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationSummary {
    /// Ranges considered (at most [`MAX_CHANNELS`])
    pub channels: Vec<ChannelRange, MAX_CHANNELS>,
    /// Mean span over `channels`, zero when empty
    pub average_span: u16,
    /// Grade of `average_span`
    pub quality: CalibrationQuality,
}

impl CalibrationSummary {
    /// Summarize up to [`MAX_CHANNELS`] ranges
    pub fn from_ranges<I: IntoIterator<Item = ChannelRange>>(ranges: I) -> Self {
        let mut channels = Vec::new();
        for range in ranges.into_iter().take(MAX_CHANNELS) {
            // Capacity is guaranteed by take()
            let _ = channels.push(range);
        }

        let total: u32 = channels.iter().map(|r| r.span() as u32).sum();
        let average_span = match channels.len() {
            0 => 0,
            n => (total / n as u32) as u16,
        };

        Self {
            channels,
            average_span,
            quality: CalibrationQuality::from_average_span(average_span),
        }
    }

    /// Summarize the active channels of a record
    pub fn from_record(record: &CalibrationRecord) -> Self {
        Self::from_ranges(record.active_channels())
    }

    /// Narrowest span, if any channel is present
    pub fn min_span(&self) -> Option<u16> {
        self.channels.iter().map(ChannelRange::span).min()
    }
}

/// Result of inspecting the stored region
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoredCalibration {
    /// Region holds a fully validated record
    Valid {
        /// Decoded record
        record: CalibrationRecord,
        /// Summary of its active channels
        summary: CalibrationSummary,
    },
    /// Region could not be trusted
    Invalid {
        /// Why it was rejected
        error: StoreError,
        /// Leading raw bytes of the region (empty if the store is not ready)
        header: Vec<u8, HEADER_DUMP_LEN>,
    },
}

impl StoredCalibration {
    /// Whether the region holds a valid record
    pub fn is_valid(&self) -> bool {
        matches!(self, StoredCalibration::Valid { .. })
    }
}

/// Store and region status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoreStatus {
    /// Store constructed successfully
    pub ready: bool,
    /// Configured channel count
    pub channel_count: u8,
    /// Bytes reserved for the record
    pub record_size: u16,
    /// Configured storage size
    pub storage_size: u16,
    /// Bytes left after the end of the record
    pub free_space: u16,
    /// Region starts with the calibration magic number
    pub signature_present: bool,
    /// Region holds a fully valid record
    pub valid: bool,
}

impl<S: Eeprom> CalibrationStore<S> {
    /// Inspect the stored record without applying it
    pub fn inspect(&mut self) -> StoredCalibration {
        if let Err(error) = self.ensure_ready() {
            return StoredCalibration::Invalid {
                error,
                header: Vec::new(),
            };
        }

        match self.read_validated() {
            Ok(record) => {
                let summary = CalibrationSummary::from_record(&record);
                debug!(
                    "Stored calibration: {} channel(s), checksum {=u32:#x}, {}",
                    record.channel_count,
                    record.checksum,
                    summary.quality.describe()
                );
                StoredCalibration::Valid { record, summary }
            }
            Err(error) => {
                let raw = self.read_bytes::<HEADER_DUMP_LEN>();
                let mut header = Vec::new();
                // Same length as the capacity
                let _ = header.extend_from_slice(&raw);
                debug!("No valid calibration stored: {}", error);
                StoredCalibration::Invalid { error, header }
            }
        }
    }

    /// Report configuration and region status
    pub fn status(&mut self) -> StoreStatus {
        let config = *self.config();
        let record_size = self.required_size();
        let end = config.start_address as u32 + record_size as u32;
        let free_space = (config.storage_size as u32).saturating_sub(end) as u16;

        let mut status = StoreStatus {
            ready: self.is_ready(),
            channel_count: config.channel_count,
            record_size,
            storage_size: config.storage_size,
            free_space,
            signature_present: false,
            valid: false,
        };

        if status.ready {
            let magic = u16::from_le_bytes(self.read_bytes::<2>());
            status.signature_present = magic == CALIBRATION_MAGIC;
            status.valid = status.signature_present && self.read_validated().is_ok();
        }

        status
    }
}
