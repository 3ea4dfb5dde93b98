//! Calvault Hardware Abstraction Layer
//!
//! This crate defines the byte-addressable storage capability that the
//! calibration store persists into, plus backends that implement it. Chip
//! specific EEPROM drivers implement [`Eeprom`] directly; chips without
//! real EEPROM can use [`FlashEeprom`] on top of their NOR flash driver.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  calvault-core (CalibrationStore)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  calvault-hal (this crate - Eeprom)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │   RamEeprom   │       │  FlashEeprom  │
//! │ (host / test) │       │  (NorFlash)   │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod eeprom;
#[cfg(feature = "embedded-storage")]
pub mod emulated;
pub mod ram;

// Re-export key types at crate root for convenience
pub use eeprom::{Eeprom, EepromError};
#[cfg(feature = "embedded-storage")]
pub use emulated::FlashEeprom;
pub use ram::{RamEeprom, ERASED_BYTE};
