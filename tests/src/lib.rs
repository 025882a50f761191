//! Host-side tests for the DDS function generator
//!
//! Scenario tests drive the real controller on a [`VirtualBoard`]; the
//! property tests hammer the poller, the sweep loop and the settings codec.

use dds_core::hal::DacPort;
use dds_core::test_utils::VirtualBoard;
use dds_core::{Generator, HalError, MainMode, StopFlag};

#[cfg(test)]
mod concurrency_tests;
#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod scenario_tests;

/// DAC that only counts writes
#[derive(Debug, Default)]
pub struct CountingDac {
    pub writes: u64,
    pub last: u8,
}

impl DacPort for CountingDac {
    fn write(&mut self, level: u8) {
        self.writes += 1;
        self.last = level;
    }
}

/// DAC that raises the stop flag after a fixed number of writes
pub struct StopAfter<'a> {
    stop: &'a StopFlag,
    left: u32,
}

impl<'a> StopAfter<'a> {
    pub fn new(stop: &'a StopFlag, writes: u32) -> Self {
        Self { stop, left: writes }
    }
}

impl DacPort for StopAfter<'_> {
    fn write(&mut self, _level: u8) {
        self.left = self.left.saturating_sub(1);
        if self.left == 0 {
            self.stop.raise();
        }
    }
}

/// Step through the main menu until `mode` is active
pub fn goto(generator: &mut Generator<'_, VirtualBoard>, mode: MainMode) -> Result<(), HalError> {
    for _ in 0..MainMode::ALL.len() {
        if generator.mode() == mode {
            return Ok(());
        }
        generator.perform(dds_core::Action::Next)?;
    }
    Err(HalError::InvalidConfig)
}
