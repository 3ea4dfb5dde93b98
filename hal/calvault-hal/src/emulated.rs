//! EEPROM emulation over NOR flash
//!
//! Keeps a RAM shadow of the emulated region. Byte writes only touch the
//! shadow; [`Eeprom::commit`] erases the backing sectors, programs the whole
//! shadow back in one pass and reads it back from flash.
//!
//! Every commit ends with the flash and the shadow agreeing: a commit with
//! nothing pending still reads the region back and compares it, and a failed
//! commit reloads the shadow from flash so reads never report bytes that are
//! not stored. If even that reload fails the shadow reads as erased.

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use crate::eeprom::{Eeprom, EepromError};
use crate::ram::ERASED_BYTE;

/// `N`-byte EEPROM emulated on a NOR flash region starting at `offset`
pub struct FlashEeprom<F, const N: usize> {
    flash: F,
    offset: u32,
    shadow: [u8; N],
    dirty: bool,
}

impl<F: NorFlash, const N: usize> FlashEeprom<F, N> {
    /// Bind to a flash region and load its current contents
    ///
    /// `offset` must sit on an erase boundary and `N` must be a multiple
    /// of the flash's read and write granularity.
    pub fn new(mut flash: F, offset: u32) -> Result<Self, EepromError> {
        if N == 0
            || offset as usize % F::ERASE_SIZE != 0
            || N % F::WRITE_SIZE != 0
            || N % F::READ_SIZE != 0
        {
            return Err(EepromError::NotAligned);
        }

        let end = (offset as usize)
            .checked_add(Self::erase_span())
            .ok_or(EepromError::OutOfBounds)?;
        if end > flash.capacity() {
            return Err(EepromError::OutOfBounds);
        }

        let mut shadow = [ERASED_BYTE; N];
        flash.read(offset, &mut shadow).map_err(map_flash_error)?;

        Ok(Self {
            flash,
            offset,
            shadow,
            dirty: false,
        })
    }

    /// Bytes of flash reserved for the region (whole erase sectors)
    pub fn erase_span() -> usize {
        N.div_ceil(F::ERASE_SIZE) * F::ERASE_SIZE
    }

    /// Whether the shadow holds writes not yet committed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Access the flash peripheral
    ///
    /// Changes made through it are only seen by the next commit.
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the flash peripheral, discarding uncommitted changes
    pub fn release(self) -> F {
        self.flash
    }

    fn program(&mut self) -> Result<(), EepromError> {
        let end = self.offset + Self::erase_span() as u32;
        self.flash
            .erase(self.offset, end)
            .map_err(map_flash_error)?;
        self.flash
            .write(self.offset, &self.shadow)
            .map_err(map_flash_error)
    }

    fn verify(&mut self) -> Result<(), EepromError> {
        let mut stored = [ERASED_BYTE; N];
        self.flash
            .read(self.offset, &mut stored)
            .map_err(map_flash_error)?;
        if stored != self.shadow {
            return Err(EepromError::CommitFailed);
        }
        Ok(())
    }

    fn reload(&mut self) {
        if self.flash.read(self.offset, &mut self.shadow).is_err() {
            self.shadow.fill(ERASED_BYTE);
        }
    }
}

impl<F: NorFlash, const N: usize> Eeprom for FlashEeprom<F, N> {
    fn read_byte(&mut self, address: u16) -> u8 {
        self.shadow
            .get(address as usize)
            .copied()
            .unwrap_or(ERASED_BYTE)
    }

    // Rewriting a byte with its current value still schedules a program
    // cycle, so a write-then-commit always exercises the flash
    fn write_byte(&mut self, address: u16, value: u8) {
        if let Some(slot) = self.shadow.get_mut(address as usize) {
            *slot = value;
            self.dirty = true;
        }
    }

    fn commit(&mut self) -> Result<(), EepromError> {
        let result = if self.dirty {
            self.program().and_then(|()| self.verify())
        } else {
            self.verify()
        };

        if result.is_err() {
            self.reload();
        }
        self.dirty = false;
        result
    }
}

fn map_flash_error<E: NorFlashError>(error: E) -> EepromError {
    match error.kind() {
        NorFlashErrorKind::NotAligned => EepromError::NotAligned,
        NorFlashErrorKind::OutOfBounds => EepromError::OutOfBounds,
        _ => EepromError::Flash,
    }
}
