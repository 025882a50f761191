//! Fixed-position field rendering on the 16x2 character display

use core::fmt::{self, Write};

use heapless::String;

use crate::hal::{CharDisplay, HalError};
use crate::types::PulseDuration;

/// Display width in characters
pub const COLS: usize = 16;
/// Column of the ON/OFF marker and the row-0 tags
pub const TAG_COL: u8 = 13;

type Field = String<COLS>;

fn format(args: fmt::Arguments<'_>) -> Field {
    let mut field = Field::new();
    // Anything past the display width is cut off
    let _ = field.write_fmt(args);
    field
}

/// Centred title on row 0
pub fn title<D: CharDisplay>(lcd: &mut D, text: &str) -> Result<(), HalError> {
    lcd.write_text(text, 0, 0)
}

/// Running-state marker at column 13 of row 1
pub fn run_marker<D: CharDisplay>(lcd: &mut D, running: bool) -> Result<(), HalError> {
    lcd.write_text(if running { "ON " } else { "OFF" }, TAG_COL, 1)
}

pub fn frequency<D: CharDisplay>(lcd: &mut D, hz: f64) -> Result<(), HalError> {
    lcd.write_text(&format(format_args!("{:10.3}Hz", hz)), 0, 1)
}

pub fn pwm_rate<D: CharDisplay>(lcd: &mut D, hz: f64) -> Result<(), HalError> {
    lcd.write_text(&format(format_args!("{:8.2}Hz", hz)), 0, 1)
}

pub fn high_speed<D: CharDisplay>(lcd: &mut D, mhz: u8) -> Result<(), HalError> {
    lcd.write_text(&format(format_args!(" {:5}MHz", mhz)), 0, 1)
}

/// Three-digit level at the given position
pub fn level<D: CharDisplay>(lcd: &mut D, value: u8, col: u8, row: u8) -> Result<(), HalError> {
    lcd.write_text(&format(format_args!("{:3}", value)), col, row)
}

pub fn calibration<D: CharDisplay>(lcd: &mut D, coefficient: f64) -> Result<(), HalError> {
    lcd.write_text(&format(format_args!("{:>9.4}", coefficient)), 0, 1)
}

pub fn noise<D: CharDisplay>(lcd: &mut D) -> Result<(), HalError> {
    lcd.write_text("    Random", 0, 1)
}

pub fn pulse<D: CharDisplay>(lcd: &mut D, duration: PulseDuration) -> Result<(), HalError> {
    let text = match duration {
        PulseDuration::Minimum => format(format_args!("{:>8}", "Min")),
        PulseDuration::Millis(ms) => format(format_args!("{:6}ms", ms)),
        PulseDuration::Hold => format(format_args!("{:>8}", "Hold")),
        PulseDuration::Toggle => format(format_args!("{:>8}", "Toggle")),
    };
    lcd.write_text(&text, 0, 1)
}

/// Three-letter tag at column 13 of row 0
pub fn tag<D: CharDisplay>(lcd: &mut D, text: &str) -> Result<(), HalError> {
    lcd.write_text(text, TAG_COL, 0)
}
