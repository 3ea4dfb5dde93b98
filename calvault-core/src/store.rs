//! Calibration store
//!
//! Owns one calibration record in a byte-addressable backend, the address
//! range `[start_address, start_address + RECORD_SIZE)`. Nothing else may
//! write into that range while the store exists.
//!
//! Saves are write-then-verify: the record is written, committed, read back
//! and validated before success is reported. Loads are all-or-nothing: the
//! caller's sink is only written once the stored record has passed every
//! validation layer.
//!
//! The store never initializes the backend. Construction only probes it
//! (read a byte, write it back, commit), since the backend may be shared
//! with other owners of the same physical device.
//!
//! Nothing is retried internally; retry policy belongs to the caller.

use calvault_hal::Eeprom;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::{
    calculate_storage_size, CalibrationRecord, ChannelRange, MAX_CHANNELS, RECORD_SIZE,
};
use crate::report::CalibrationSummary;
use crate::validate::validate;

/// Lifecycle state of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreState {
    /// A construction precondition failed; every operation is refused
    Uninitialized,
    /// Preconditions held and the address range is reserved
    Ready,
}

/// Persistent store for one calibration record
pub struct CalibrationStore<S> {
    storage: S,
    config: StoreConfig,
    state: StoreState,
    last_error: Option<StoreError>,
}

impl<S: Eeprom> CalibrationStore<S> {
    /// Create a store over `storage`
    ///
    /// Checks, in order: the channel count, that the record fits in the
    /// configured storage, and that the backend completes a commit. The
    /// first failure leaves the store [`StoreState::Uninitialized`] with the
    /// cause in [`last_error`](Self::last_error). There is no retry; build a
    /// new store to try again.
    pub fn new(storage: S, config: StoreConfig) -> Self {
        let mut store = Self {
            storage,
            config,
            state: StoreState::Uninitialized,
            last_error: None,
        };

        debug!(
            "Calibration store: {} channel(s), {} byte(s) storage at offset {}",
            config.channel_count,
            config.storage_size,
            config.start_address
        );

        match store.check_preconditions() {
            Ok(()) => {
                store.state = StoreState::Ready;
                info!(
                    "Calibration store ready ({}/{} bytes)",
                    store.required_size(),
                    config.storage_size
                );
            }
            Err(e) => {
                warn!("Calibration store unavailable: {}", e);
                store.last_error = Some(e);
            }
        }

        store
    }

    fn check_preconditions(&mut self) -> Result<(), StoreError> {
        let count = self.config.channel_count;
        if count == 0 || count as usize > MAX_CHANNELS {
            return Err(StoreError::InvalidChannelCount);
        }

        let end = self.config.start_address as u32 + calculate_storage_size(count) as u32;
        if end > self.config.storage_size as u32 {
            return Err(StoreError::InsufficientSpace);
        }

        // Non-destructive probe: same byte back, then a full commit cycle
        let address = self.config.start_address;
        let byte = self.storage.read_byte(address);
        self.storage.write_byte(address, byte);
        self.storage
            .commit()
            .map_err(|_| StoreError::StorageNotReady)
    }

    /// Whether construction succeeded
    pub fn is_ready(&self) -> bool {
        self.state == StoreState::Ready
    }

    /// Current lifecycle state
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Outcome of the last operation (`None` on success)
    pub fn last_error(&self) -> Option<StoreError> {
        self.last_error
    }

    /// Configuration this store was built with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of active channels
    pub fn channel_count(&self) -> u8 {
        self.config.channel_count
    }

    /// Bytes reserved for the record
    pub fn required_size(&self) -> u16 {
        calculate_storage_size(self.config.channel_count)
    }

    /// Access the backend
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Release the backend
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Persist per-channel calibration
    ///
    /// The first `channel_count` entries of `ranges` are stored. Fails with
    /// [`StoreError::NoValidData`] (storage untouched) when none of them is
    /// a usable range. Success means the bytes were read back and matched.
    pub fn save(&mut self, ranges: &[ChannelRange]) -> Result<(), StoreError> {
        let result = self.save_inner(ranges);
        self.track(result)
    }

    fn save_inner(&mut self, ranges: &[ChannelRange]) -> Result<(), StoreError> {
        self.ensure_ready()?;

        let active = ranges
            .get(..self.config.channel_count as usize)
            .ok_or(StoreError::MissingInput)?;

        let calibrated = active.iter().filter(|r| r.is_calibrated()).count();
        if calibrated == 0 {
            warn!("Save refused: no channel has a valid calibration");
            return Err(StoreError::NoValidData);
        }
        if calibrated < active.len() {
            warn!(
                "Saving with {} of {} channel(s) uncalibrated",
                active.len() - calibrated,
                active.len()
            );
        }

        let summary =
            CalibrationSummary::from_ranges(active.iter().copied().filter(ChannelRange::is_calibrated));
        debug!(
            "Average span {} ({})",
            summary.average_span,
            summary.quality.describe()
        );

        let record = CalibrationRecord::from_ranges(self.config.channel_count, active);
        trace!("Record checksum {=u32:#x}", record.checksum);

        self.write_region(&record.encode());
        self.storage.commit().map_err(|_| {
            error!("Commit failed, calibration region may be inconsistent");
            StoreError::CommitFailed
        })?;

        let stored = CalibrationRecord::decode(&self.read_region());
        if let Err(e) = validate(&stored, self.config.channel_count) {
            error!("Read-back rejected: {}", e);
            return Err(StoreError::VerificationFailed);
        }
        if stored != record {
            error!("Read-back differs from written record");
            return Err(StoreError::VerificationFailed);
        }

        info!("Saved calibration for {} channel(s)", self.config.channel_count);
        Ok(())
    }

    /// Apply stored calibration to `sink`
    ///
    /// Writes the first `channel_count` entries of `sink`, and only when the
    /// stored record passes validation. On failure `sink` is untouched.
    pub fn load(&mut self, sink: &mut [ChannelRange]) -> Result<(), StoreError> {
        let result = self.load_inner(sink);
        self.track(result)
    }

    fn load_inner(&mut self, sink: &mut [ChannelRange]) -> Result<(), StoreError> {
        self.ensure_ready()?;

        let targets = sink
            .get_mut(..self.config.channel_count as usize)
            .ok_or(StoreError::MissingInput)?;

        let record = self.read_validated()?;
        for (target, range) in targets.iter_mut().zip(record.active_channels()) {
            *target = range;
        }

        info!("Loaded calibration for {} channel(s)", record.channel_count);
        Ok(())
    }

    /// Read and validate the stored record without applying it
    pub fn read_record(&mut self) -> Result<CalibrationRecord, StoreError> {
        let result = self.ensure_ready().and_then(|()| self.read_validated());
        self.track(result)
    }

    /// Whether a fully valid record is stored
    ///
    /// Pure query: does not modify [`last_error`](Self::last_error).
    pub fn has_valid_calibration(&mut self) -> bool {
        self.is_ready() && self.read_validated().is_ok()
    }

    /// Zero the whole record region
    ///
    /// A cleared region never validates (its magic is zero).
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let result = self.clear_inner();
        self.track(result)
    }

    fn clear_inner(&mut self) -> Result<(), StoreError> {
        self.ensure_ready()?;

        self.write_region(&[0u8; RECORD_SIZE]);
        self.storage.commit().map_err(|_| {
            error!("Commit failed while clearing calibration");
            StoreError::CommitFailed
        })?;

        info!("Calibration cleared");
        Ok(())
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Ready => Ok(()),
            StoreState::Uninitialized => Err(StoreError::NotReady),
        }
    }

    /// Decode and validate the region; caller checks readiness
    pub(crate) fn read_validated(&mut self) -> Result<CalibrationRecord, StoreError> {
        let record = CalibrationRecord::decode(&self.read_region());
        validate(&record, self.config.channel_count).map_err(|e| {
            debug!("Stored calibration rejected: {}", e);
            StoreError::from(e)
        })?;
        Ok(record)
    }

    /// Read `N` bytes from the start of the region; caller checks readiness
    pub(crate) fn read_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0u8; N];
        let start = self.config.start_address;
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = self.storage.read_byte(start + offset as u16);
        }
        bytes
    }

    fn read_region(&mut self) -> [u8; RECORD_SIZE] {
        self.read_bytes::<RECORD_SIZE>()
    }

    fn write_region(&mut self, bytes: &[u8; RECORD_SIZE]) {
        let start = self.config.start_address;
        for (offset, &byte) in bytes.iter().enumerate() {
            self.storage.write_byte(start + offset as u16, byte);
        }
    }

    fn track<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        self.last_error = result.as_ref().err().copied();
        result
    }
}
