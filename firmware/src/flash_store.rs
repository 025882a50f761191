//! Settings record kept in the last flash page
//!
//! The part has no EEPROM. Reads and writes go to a RAM mirror of the
//! record; `commit` erases the page and programs the mirror back in one go,
//! so a save costs one erase cycle however many fields changed.

use dds_core::hal::{HalError, SettingsStore};
use dds_core::storage::RECORD_LEN;

use crate::registers::{read, write, FLASH_ADDR, FLASH_BASE, FLASH_CTLR, FLASH_KEYR, FLASH_STATR};

/// Bus address of the settings page (see memory.x)
pub const SETTINGS_PAGE: u32 = 0x0800_FC00;

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

const CTLR_PG: u32 = 1 << 0;
const CTLR_PER: u32 = 1 << 1;
const CTLR_STRT: u32 = 1 << 6;
const CTLR_LOCK: u32 = 1 << 7;

const STATR_BSY: u32 = 1 << 0;
const STATR_WRPRTERR: u32 = 1 << 4;
const STATR_EOP: u32 = 1 << 5;

pub struct FlashStore {
    mirror: &'static mut [u8; RECORD_LEN],
    dirty: bool,
}

impl FlashStore {
    /// Take over the mirror and fill it from the page
    pub fn new(mirror: &'static mut [u8; RECORD_LEN]) -> Self {
        for (offset, byte) in mirror.iter_mut().enumerate() {
            // SAFETY: the page is mapped and readable
            *byte = unsafe { core::ptr::read_volatile((SETTINGS_PAGE + offset as u32) as *const u8) };
        }
        Self { mirror, dirty: false }
    }

    fn wait_idle(&self) -> Result<(), HalError> {
        while read(FLASH_BASE + FLASH_STATR) & STATR_BSY != 0 {}
        let status = read(FLASH_BASE + FLASH_STATR);
        // Flags are cleared by writing one
        write(FLASH_BASE + FLASH_STATR, STATR_EOP | STATR_WRPRTERR);
        if status & STATR_WRPRTERR != 0 {
            return Err(HalError::StorageError);
        }
        Ok(())
    }

    fn program_page(&mut self) -> Result<(), HalError> {
        write(FLASH_BASE + FLASH_KEYR, KEY1);
        write(FLASH_BASE + FLASH_KEYR, KEY2);

        write(FLASH_BASE + FLASH_CTLR, CTLR_PER);
        write(FLASH_BASE + FLASH_ADDR, SETTINGS_PAGE);
        write(FLASH_BASE + FLASH_CTLR, CTLR_PER | CTLR_STRT);
        let erased = self.wait_idle();
        write(FLASH_BASE + FLASH_CTLR, 0);

        let programmed = erased.and_then(|()| {
            write(FLASH_BASE + FLASH_CTLR, CTLR_PG);
            for (offset, pair) in self.mirror.chunks_exact(2).enumerate() {
                let half = u16::from_le_bytes([pair[0], pair[1]]);
                // SAFETY: halfword-aligned address inside the settings page
                unsafe { core::ptr::write_volatile((SETTINGS_PAGE + offset as u32 * 2) as *mut u16, half) };
                self.wait_idle()?;
            }
            Ok(())
        });

        write(FLASH_BASE + FLASH_CTLR, CTLR_LOCK);
        programmed
    }
}

impl SettingsStore for FlashStore {
    fn read_byte(&mut self, addr: u16) -> Result<u8, HalError> {
        self.mirror.get(addr as usize).copied().ok_or(HalError::StorageError)
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), HalError> {
        let slot = self.mirror.get_mut(addr as usize).ok_or(HalError::StorageError)?;
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HalError> {
        if !self.dirty {
            return Ok(());
        }
        self.program_page()?;
        self.dirty = false;
        Ok(())
    }
}
