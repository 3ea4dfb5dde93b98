//! Store configuration
//!
//! Describes where in the backend the calibration record lives and how many
//! sensor channels the hardware has. Values are range-checked when a store
//! is constructed, not here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default storage size assumed for the backend (bytes)
pub const DEFAULT_STORAGE_SIZE: u16 = 64;

/// Default start address of the calibration record
pub const DEFAULT_START_ADDRESS: u16 = 0;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Input could not be parsed into a configuration
    Parse,
}

/// Calibration store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreConfig {
    /// Active sensor channels (1-8)
    pub channel_count: u8,
    /// Usable size of the storage backend in bytes
    #[cfg_attr(feature = "serde", serde(default = "default_storage_size"))]
    pub storage_size: u16,
    /// Address of the first record byte
    #[cfg_attr(feature = "serde", serde(default = "default_start_address"))]
    pub start_address: u16,
}

#[cfg(feature = "serde")]
fn default_storage_size() -> u16 {
    DEFAULT_STORAGE_SIZE
}

#[cfg(feature = "serde")]
fn default_start_address() -> u16 {
    DEFAULT_START_ADDRESS
}

impl StoreConfig {
    /// Configuration with default storage geometry
    pub const fn new(channel_count: u8) -> Self {
        Self {
            channel_count,
            storage_size: DEFAULT_STORAGE_SIZE,
            start_address: DEFAULT_START_ADDRESS,
        }
    }

    /// Set the usable storage size
    pub const fn with_storage_size(mut self, storage_size: u16) -> Self {
        self.storage_size = storage_size;
        self
    }

    /// Set the record start address
    pub const fn with_start_address(mut self, start_address: u16) -> Self {
        self.start_address = start_address;
        self
    }

    /// Parse from TOML text
    ///
    /// Accepts either a `[calibration]` table or the keys at top level:
    ///
    /// ```toml
    /// [calibration]
    /// channel_count = 8
    /// storage_size = 512
    /// start_address = 64
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct Document {
            calibration: Option<StoreConfig>,
        }

        let document: Document = toml::from_str(input).map_err(|_| ConfigError::Parse)?;
        match document.calibration {
            Some(config) => Ok(config),
            None => toml::from_str(input).map_err(|_| ConfigError::Parse),
        }
    }
}
