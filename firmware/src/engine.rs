//! Fixed-latency output loops for the QingKe V4 core
//!
//! Every loop is a single `asm!` block so that the compiler cannot reorder
//! or stretch the instruction sequence between two DAC writes. The DAC is
//! the low byte of GPIOA, written through BSHR so the upper pins of the
//! port are never disturbed.

use core::arch::asm;

use dds_core::dds::{DdsTiming, PhaseIncrement, SampleEngine, StopFlag, SweepOutcome, SweepPlan};
use dds_core::hal::DacPort;
use dds_core::waveform::{Table, WaveBuffer};

use crate::registers::{GPIOA_BASE, GPIO_BSHR};

/// Cycle counts of the loops below at 72 MHz.
///
/// The sweep rollover path costs about one sweep sample on top of the add
/// that wrapped, so the phase it owes after a period boundary is one extra
/// increment.
/// These figures are calibration dependent: flash wait states and branch
/// penalties differ between parts, which the calibration menu trims out.
pub const FIRMWARE_TIMING: DdsTiming = DdsTiming {
    cpu_hz: 72_000_000,
    phase_cycles: 10,
    noise_cycles: 9,
    sweep_cycles: 11,
    rollover_cycles: 11,
};

const DAC_BSHR: u32 = GPIOA_BASE + GPIO_BSHR;
/// Reset half of BSHR for PA0..=PA7; set bits win over reset bits
const DAC_CLEAR: u32 = 0x00FF_0000;
const PHASE_MASK: u32 = 0x00FF_FFFF;

/// R-2R ladder on PA0..=PA7
#[derive(Default)]
pub struct R2rLadder;

impl DacPort for R2rLadder {
    #[inline(always)]
    fn write(&mut self, level: u8) {
        crate::registers::write(DAC_BSHR, DAC_CLEAR | level as u32);
    }
}

/// Hand-written output loops
pub struct AsmEngine {
    dac: R2rLadder,
}

impl AsmEngine {
    pub fn new(dac: R2rLadder) -> Self {
        Self { dac }
    }
}

impl SampleEngine for AsmEngine {
    fn run_phase(&mut self, buffer: &WaveBuffer, increment: PhaseIncrement, stop: &StopFlag) {
        // SAFETY: the buffer is 256-byte aligned, so OR-ing the index into
        // its address stays inside it; the port and flag addresses are valid
        unsafe {
            asm!(
                "2:",
                "add {phase}, {phase}, {inc}",
                "srli {tmp}, {phase}, 16",
                "andi {tmp}, {tmp}, 0xff",
                "or {tmp}, {tmp}, {base}",
                "lbu {tmp}, 0({tmp})",
                "or {tmp}, {tmp}, {clear}",
                "sw {tmp}, 0({port})",
                "lbu {tmp}, 0({stop})",
                "beqz {tmp}, 2b",
                phase = inout(reg) 0u32 => _,
                inc = in(reg) increment.raw(),
                base = in(reg) buffer.as_ptr() as u32,
                clear = in(reg) DAC_CLEAR,
                port = in(reg) DAC_BSHR,
                stop = in(reg) stop.as_ptr() as u32,
                tmp = out(reg) _,
                options(nostack),
            );
        }
    }

    fn run_sequential(&mut self, table: &Table, start: u8, stop: &StopFlag) -> u8 {
        let next: u32;
        // SAFETY: the index is masked to the table length
        unsafe {
            asm!(
                "2:",
                "add {tmp}, {base}, {index}",
                "lbu {tmp}, 0({tmp})",
                "or {tmp}, {tmp}, {clear}",
                "sw {tmp}, 0({port})",
                "addi {index}, {index}, 1",
                "andi {index}, {index}, 0xff",
                "lbu {tmp}, 0({stop})",
                "beqz {tmp}, 2b",
                index = inout(reg) start as u32 => next,
                base = in(reg) table.as_ptr() as u32,
                clear = in(reg) DAC_CLEAR,
                port = in(reg) DAC_BSHR,
                stop = in(reg) stop.as_ptr() as u32,
                tmp = out(reg) _,
                options(nostack),
            );
        }
        next as u8
    }

    fn run_sweep(&mut self, buffer: &WaveBuffer, plan: &SweepPlan, stop: &StopFlag) -> SweepOutcome {
        let start = plan.start.raw();
        if start >= plan.end {
            return SweepOutcome { periods: 0, final_increment: start, stopped: false };
        }

        let periods: u32;
        let increment: u32;
        let stopped: u32;
        // SAFETY: the phase is below 2^24 on the sample path, so its top
        // byte indexes the aligned buffer without masking
        unsafe {
            asm!(
                "2:",
                "add {phase}, {phase}, {inc}",
                "srli {tmp}, {phase}, 24",
                "bnez {tmp}, 3f",
                "srli {tmp}, {phase}, 16",
                "or {tmp}, {tmp}, {base}",
                "lbu {tmp}, 0({tmp})",
                "or {tmp}, {tmp}, {clear}",
                "sw {tmp}, 0({port})",
                "j 2b",
                "3:",
                "and {phase}, {phase}, {mask}",
                "addi {periods}, {periods}, 1",
                "add {inc}, {inc}, {step}",
                "bgeu {inc}, {end}, 4f",
                "lbu {tmp}, 0({stop})",
                "bnez {tmp}, 5f",
                // Phase owed for the time spent here; it may wrap again
                "add {phase}, {phase}, {inc}",
                "srli {tmp}, {phase}, 24",
                "bnez {tmp}, 3b",
                "j 2b",
                "5:",
                "li {stopped}, 1",
                "4:",
                phase = inout(reg) 0u32 => _,
                inc = inout(reg) start => increment,
                periods = inout(reg) 0u32 => periods,
                stopped = inout(reg) 0u32 => stopped,
                step = in(reg) plan.step.raw(),
                end = in(reg) plan.end,
                mask = in(reg) PHASE_MASK,
                base = in(reg) buffer.as_ptr() as u32,
                clear = in(reg) DAC_CLEAR,
                port = in(reg) DAC_BSHR,
                stop = in(reg) stop.as_ptr() as u32,
                tmp = out(reg) _,
                options(nostack),
            );
        }

        SweepOutcome {
            periods,
            final_increment: increment.min(PHASE_MASK),
            stopped: stopped != 0,
        }
    }

    fn hold(&mut self, level: u8) {
        self.dac.write(level);
    }

    fn timing(&self) -> DdsTiming {
        FIRMWARE_TIMING
    }
}
