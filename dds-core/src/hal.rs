//! Hardware Abstraction Layer for the generator
//!
//! The core talks to the board only through these traits. Everything on the
//! DDS hot path is infallible; the slower collaborators (display, settings
//! store, pins) report [`HalError`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::dds::SampleEngine;
use crate::types::Button;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Settings store read or write failed
    StorageError,
    /// Display did not accept a command
    DisplayError,
    /// Invalid configuration
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::StorageError => write!(f, "Settings store access failed"),
            HalError::DisplayError => write!(f, "Display write failed"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Parallel DAC latch (R-2R ladder data port)
pub trait DacPort {
    /// Latch one output level
    fn write(&mut self, level: u8);

    /// CPU cycles spent by a cycle-counting engine since the last call.
    /// Hardware ports have nothing to do here.
    fn elapse(&mut self, _cycles: u32) {}
}

/// Button lines of the front panel
pub trait ButtonPanel {
    /// Sample the live levels and return the highest-priority pressed button
    fn read(&mut self) -> Result<Button, HalError>;
}

/// Character display collaborator
pub trait CharDisplay {
    fn clear(&mut self) -> Result<(), HalError>;

    fn goto_xy(&mut self, col: u8, row: u8) -> Result<(), HalError>;

    fn write_char(&mut self, c: char) -> Result<(), HalError>;

    /// Write `text` starting at the given position
    fn write_text(&mut self, text: &str, col: u8, row: u8) -> Result<(), HalError> {
        self.goto_xy(col, row)?;
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }
}

/// Byte-addressed persistent store (EEPROM or emulated EEPROM)
pub trait SettingsStore {
    fn read_byte(&mut self, addr: u16) -> Result<u8, HalError>;

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), HalError>;

    /// Make the writes since the last commit durable. Stores that program
    /// each byte immediately have nothing to do.
    fn commit(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

/// Secondary digital output used for the scope sync pulse
pub trait SyncOutput {
    /// Emit one short pulse
    fn pulse(&mut self) -> Result<(), HalError>;

    /// Drive the line low
    fn release(&mut self) -> Result<(), HalError>;
}

/// Hardware timer that toggles the high-speed line
pub trait HighSpeedTimer {
    /// Start (or retune) the square wave at `mhz`
    fn start(&mut self, mhz: u8) -> Result<(), HalError>;

    fn stop(&mut self) -> Result<(), HalError>;
}

/// Switches between the two interrupt configurations of the generator
pub trait InterruptControl {
    /// Periodic tick feeding the button poller
    fn enable_tick(&mut self, enable: bool) -> Result<(), HalError>;

    /// Button edge interrupts that raise the stop flag
    fn enable_stop_sources(&mut self, enable: bool) -> Result<(), HalError>;
}

/// Complete generator HAL interface
pub trait GeneratorHal {
    type Engine: SampleEngine;
    type Display: CharDisplay;
    type Store: SettingsStore;
    type Sync: SyncOutput;
    type Timer: HighSpeedTimer;
    type Interrupts: InterruptControl;
    type Delay: DelayNs;

    /// Output loop and DAC
    fn engine(&mut self) -> &mut Self::Engine;

    fn display(&mut self) -> &mut Self::Display;

    fn store(&mut self) -> &mut Self::Store;

    fn sync(&mut self) -> &mut Self::Sync;

    fn timer(&mut self) -> &mut Self::Timer;

    fn interrupts(&mut self) -> &mut Self::Interrupts;

    fn delay(&mut self) -> &mut Self::Delay;

    /// Called on every iteration of a foreground spin-wait
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}

/// Six active-low button pins read through embedded-hal
pub struct PanelPins<P> {
    /// Pins in [`Button::PRIORITY`] order
    pins: [P; 6],
}

impl<P> PanelPins<P>
where
    P: InputPin,
{
    /// `pins` must be given as up, right, down, left, start, options
    pub fn new(pins: [P; 6]) -> Self {
        Self { pins }
    }
}

impl<P> ButtonPanel for PanelPins<P>
where
    P: InputPin,
{
    fn read(&mut self) -> Result<Button, HalError> {
        let mut asserted = [false; 6];
        for (level, pin) in asserted.iter_mut().zip(self.pins.iter_mut()) {
            // Pulled up, grounded when pressed
            *level = pin.is_low().map_err(|_| HalError::GpioError)?;
        }
        Ok(Button::from_levels(asserted))
    }
}

/// Sync line driven through an embedded-hal output pin
pub struct SyncPin<P> {
    pin: P,
}

impl<P> SyncPin<P>
where
    P: OutputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P> SyncOutput for SyncPin<P>
where
    P: OutputPin,
{
    fn pulse(&mut self) -> Result<(), HalError> {
        self.pin.set_high().map_err(|_| HalError::GpioError)?;
        self.pin.set_low().map_err(|_| HalError::GpioError)
    }

    fn release(&mut self) -> Result<(), HalError> {
        self.pin.set_low().map_err(|_| HalError::GpioError)
    }
}

/// No-op interrupt controller for boards that poll instead
pub struct NoOpInterruptController;

impl InterruptControl for NoOpInterruptController {
    fn enable_tick(&mut self, _enable: bool) -> Result<(), HalError> {
        Ok(())
    }

    fn enable_stop_sources(&mut self, _enable: bool) -> Result<(), HalError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use std::vec::Vec;

    /// Records every latched level
    #[derive(Default)]
    pub struct MockDac {
        levels: Vec<u8>,
    }

    impl MockDac {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn last(&self) -> Option<u8> {
            self.levels.last().copied()
        }

        pub fn levels(&self) -> &[u8] {
            &self.levels
        }
    }

    impl DacPort for MockDac {
        fn write(&mut self, level: u8) {
            self.levels.push(level);
        }
    }

    /// Byte store backed by a plain array; starts erased (0xFF)
    #[derive(Clone)]
    pub struct MockStore {
        bytes: [u8; 64],
        writes: usize,
        commits: usize,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self { bytes: [0xFF; 64], writes: 0, commits: 0 }
        }

        /// Number of byte writes performed so far
        pub fn write_count(&self) -> usize {
            self.writes
        }

        /// Number of commits that followed at least one write
        pub fn commit_count(&self) -> usize {
            self.commits
        }

        pub fn bytes(&self) -> &[u8; 64] {
            &self.bytes
        }
    }

    impl Default for MockStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SettingsStore for MockStore {
        fn read_byte(&mut self, addr: u16) -> Result<u8, HalError> {
            self.bytes.get(addr as usize).copied().ok_or(HalError::StorageError)
        }

        fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), HalError> {
            let slot = self.bytes.get_mut(addr as usize).ok_or(HalError::StorageError)?;
            *slot = value;
            self.writes += 1;
            Ok(())
        }

        fn commit(&mut self) -> Result<(), HalError> {
            self.commits += 1;
            Ok(())
        }
    }

    /// 16x2 character grid
    pub struct MockDisplay {
        rows: [[char; 16]; 2],
        cursor: (u8, u8),
    }

    impl MockDisplay {
        pub fn new() -> Self {
            Self { rows: [[' '; 16]; 2], cursor: (0, 0) }
        }

        /// Contents of one row as a string
        pub fn row(&self, row: usize) -> std::string::String {
            self.rows[row].iter().collect()
        }
    }

    impl Default for MockDisplay {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CharDisplay for MockDisplay {
        fn clear(&mut self) -> Result<(), HalError> {
            self.rows = [[' '; 16]; 2];
            self.cursor = (0, 0);
            Ok(())
        }

        fn goto_xy(&mut self, col: u8, row: u8) -> Result<(), HalError> {
            if col >= 16 || row >= 2 {
                return Err(HalError::DisplayError);
            }
            self.cursor = (col, row);
            Ok(())
        }

        fn write_char(&mut self, c: char) -> Result<(), HalError> {
            let (col, row) = self.cursor;
            // Characters past the right edge are dropped, like the real LCD
            if col < 16 {
                self.rows[row as usize][col as usize] = c;
                self.cursor = (col + 1, row);
            }
            Ok(())
        }
    }

    /// Counts pulses and remembers the line state
    #[derive(Default)]
    pub struct MockSync {
        pub pulses: usize,
        pub high: bool,
    }

    impl SyncOutput for MockSync {
        fn pulse(&mut self) -> Result<(), HalError> {
            self.pulses += 1;
            self.high = false;
            Ok(())
        }

        fn release(&mut self) -> Result<(), HalError> {
            self.high = false;
            Ok(())
        }
    }

    /// Remembers the rate of the running square wave
    #[derive(Default)]
    pub struct MockTimer {
        pub running_mhz: Option<u8>,
        pub starts: usize,
    }

    impl HighSpeedTimer for MockTimer {
        fn start(&mut self, mhz: u8) -> Result<(), HalError> {
            self.running_mhz = Some(mhz);
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), HalError> {
            self.running_mhz = None;
            Ok(())
        }
    }
}
