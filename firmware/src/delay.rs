//! Busy-wait delays counted in core cycles

use embedded_hal::delay::DelayNs;

use crate::engine::FIRMWARE_TIMING;

/// Spins for the requested time at the firmware core clock
#[derive(Copy, Clone, Default)]
pub struct CycleDelay;

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = ns as u64 * FIRMWARE_TIMING.cpu_hz as u64 / 1_000_000_000;
        // SAFETY: a plain counting loop with no side effects
        unsafe { riscv::asm::delay(cycles.max(1) as u32) };
    }
}
