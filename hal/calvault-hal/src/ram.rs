//! In-memory EEPROM
//!
//! Volatile backend for host-side simulation and tests. Starts in the
//! erased state (`0xFF`), like a blank device.

use crate::eeprom::{Eeprom, EepromError};

/// Erased byte value of a blank device
pub const ERASED_BYTE: u8 = 0xFF;

/// RAM-backed EEPROM of `N` bytes
#[derive(Debug, Clone)]
pub struct RamEeprom<const N: usize> {
    data: [u8; N],
    commits: u32,
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamEeprom<N> {
    /// Create a blank (erased) device
    pub const fn new() -> Self {
        Self {
            data: [ERASED_BYTE; N],
            commits: 0,
        }
    }

    /// Create a device pre-loaded with contents
    pub const fn with_contents(data: [u8; N]) -> Self {
        Self { data, commits: 0 }
    }

    /// Device size in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.data
    }

    /// Raw contents, mutable (for simulating corruption)
    pub fn as_bytes_mut(&mut self) -> &mut [u8; N] {
        &mut self.data
    }

    /// Number of successful commits so far
    pub const fn commit_count(&self) -> u32 {
        self.commits
    }
}

impl<const N: usize> Eeprom for RamEeprom<N> {
    fn read_byte(&mut self, address: u16) -> u8 {
        self.data
            .get(address as usize)
            .copied()
            .unwrap_or(ERASED_BYTE)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        if let Some(slot) = self.data.get_mut(address as usize) {
            *slot = value;
        }
    }

    fn commit(&mut self) -> Result<(), EepromError> {
        self.commits = self.commits.wrapping_add(1);
        Ok(())
    }
}
