//! HD44780 16x2 character LCD in 4-bit mode on GPIOB
//!
//! RS on PB0, E on PB1, D4..D7 on PB4..PB7. The R/W line is tied low, so
//! every command is followed by a fixed wait instead of a busy-flag poll.

use dds_core::hal::{CharDisplay, HalError};
use embedded_hal::delay::DelayNs;

use crate::delay::CycleDelay;
use crate::registers::{configure_pin, write, PinMode, GPIOB_BASE, GPIO_BSHR};

const RS: u32 = 1 << 0;
const E: u32 = 1 << 1;
const DATA_SHIFT: u32 = 4;
const DATA_MASK: u32 = 0xF << DATA_SHIFT;

const COLS: u8 = 16;
const ROWS: u8 = 2;
const ROW_ADDR: [u8; 2] = [0x00, 0x40];

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FOUR_BIT_TWO_LINES: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

pub struct Lcd {
    delay: CycleDelay,
}

impl Lcd {
    /// Configure the pins and run the 4-bit initialization sequence
    pub fn new(delay: CycleDelay) -> Self {
        for pin in [0, 1, 4, 5, 6, 7] {
            configure_pin(GPIOB_BASE, pin, PinMode::PushPull);
        }
        let mut lcd = Self { delay };
        lcd.delay.delay_ms(50);

        // Force 8-bit mode three times, then switch to 4-bit
        for wait_us in [4500, 150, 150] {
            lcd.nibble(0x3, false);
            lcd.delay.delay_us(wait_us);
        }
        lcd.nibble(0x2, false);
        lcd.delay.delay_us(150);

        lcd.command(CMD_FOUR_BIT_TWO_LINES);
        lcd.command(CMD_DISPLAY_ON);
        lcd.command(CMD_ENTRY_INCREMENT);
        lcd.command(CMD_CLEAR);
        lcd.delay.delay_ms(2);
        lcd
    }

    fn nibble(&mut self, value: u8, data: bool) {
        let bits = ((value as u32) << DATA_SHIFT) & DATA_MASK;
        let rs_set = if data { RS } else { 0 };
        let rs_reset = if data { 0 } else { RS };
        write(GPIOB_BASE + GPIO_BSHR, bits | rs_set | ((DATA_MASK & !bits) | rs_reset) << 16);

        write(GPIOB_BASE + GPIO_BSHR, E);
        self.delay.delay_us(1);
        write(GPIOB_BASE + GPIO_BSHR, E << 16);
        self.delay.delay_us(50);
    }

    fn byte(&mut self, value: u8, data: bool) {
        self.nibble(value >> 4, data);
        self.nibble(value & 0x0F, data);
    }

    fn command(&mut self, cmd: u8) {
        self.byte(cmd, false);
    }
}

impl CharDisplay for Lcd {
    fn clear(&mut self) -> Result<(), HalError> {
        self.command(CMD_CLEAR);
        self.delay.delay_ms(2);
        Ok(())
    }

    fn goto_xy(&mut self, col: u8, row: u8) -> Result<(), HalError> {
        if col >= COLS || row >= ROWS {
            return Err(HalError::DisplayError);
        }
        self.command(CMD_SET_DDRAM | (ROW_ADDR[row as usize] + col));
        Ok(())
    }

    fn write_char(&mut self, c: char) -> Result<(), HalError> {
        let code = if c.is_ascii() { c as u8 } else { b'?' };
        self.byte(code, true);
        Ok(())
    }
}
