//! EEPROM storage abstractions
//!
//! Provides the byte-level capability that persistent calibration storage
//! is built on. Implementations wrap a chip's EEPROM (or an emulation of it)
//! and are expected to already be usable when handed to a consumer.

/// Errors from EEPROM backend operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Commit did not reach persistent storage (read-back differs)
    CommitFailed,
    /// Underlying flash operation failed
    Flash,
    /// Region is not aligned to the flash geometry
    NotAligned,
    /// Region lies outside the device
    OutOfBounds,
}

/// Byte-addressable persistent storage
///
/// Writes may be buffered by the implementation; nothing is guaranteed
/// durable until [`Eeprom::commit`] returns `Ok`.
///
/// Addresses outside the device are not an error at this level: reads
/// return the erased value `0xFF` and writes are dropped. Consumers are
/// responsible for keeping their own address range inside the device.
pub trait Eeprom {
    /// Read one byte
    fn read_byte(&mut self, address: u16) -> u8;

    /// Write one byte (buffered until commit)
    fn write_byte(&mut self, address: u16, value: u8);

    /// Flush pending writes to persistent storage
    fn commit(&mut self) -> Result<(), EepromError>;
}

// Lending a backend is the normal way to share one physical device
impl<T: Eeprom + ?Sized> Eeprom for &mut T {
    fn read_byte(&mut self, address: u16) -> u8 {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        (**self).write_byte(address, value)
    }

    fn commit(&mut self) -> Result<(), EepromError> {
        (**self).commit()
    }
}
