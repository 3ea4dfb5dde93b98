//! Validated persistence of sensor calibration records
//!
//! Stores per-channel `(minimum, maximum)` calibration in byte-addressable
//! non-volatile memory and guarantees that whatever is read back is either
//! exactly what was written and verified, or a specific [`StoreError`]:
//!
//! - Record layout and codec ([`record`])
//! - Add-then-rotate checksum ([`checksum`])
//! - Layered record validation ([`validate`])
//! - The write-then-verify store itself ([`store`])
//! - Read-only diagnostics ([`report`])
//!
//! Storage is reached only through the [`calvault_hal::Eeprom`] capability.
//!
//! ```
//! use calvault_core::{CalibrationStore, ChannelRange, StoreConfig};
//! use calvault_hal::RamEeprom;
//!
//! let mut store = CalibrationStore::new(RamEeprom::<64>::new(), StoreConfig::new(2));
//! assert!(store.is_ready());
//!
//! let ranges = [ChannelRange::new(100, 900), ChannelRange::new(120, 880)];
//! store.save(&ranges).unwrap();
//!
//! let mut loaded = [ChannelRange::default(); 2];
//! store.load(&mut loaded).unwrap();
//! assert_eq!(loaded, ranges);
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod checksum;
pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod store;
pub mod validate;

pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use record::{
    calculate_storage_size, CalibrationRecord, ChannelRange, ADC_MAX, CALIBRATION_MAGIC,
    FORMAT_VERSION, MAX_CHANNELS, RECORD_SIZE,
};
pub use report::{CalibrationQuality, CalibrationSummary, StoreStatus, StoredCalibration};
pub use store::{CalibrationStore, StoreState};
pub use validate::{validate, ValidationError};
