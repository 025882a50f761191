//! Direct digital synthesis engine
//!
//! A 24-bit phase accumulator with 16 fractional bits walks a 256-entry
//! table. The output loop emits one sample every fixed number of CPU cycles,
//! so the frequency resolution follows directly from the clock and the cycle
//! count of the loop.

use portable_atomic::{AtomicBool, Ordering};

use crate::hal::DacPort;
use crate::waveform::{Table, WaveBuffer, TABLE_LEN};

/// Phase accumulator width
pub const PHASE_BITS: u32 = 24;
/// Fractional bits below the table index
pub const FRACTION_BITS: u32 = 16;
const PHASE_MASK: u32 = (1 << PHASE_BITS) - 1;

/// Cycle counts of an output loop implementation.
///
/// The rollover figures describe the sweep loop only and are calibration
/// dependent: they must be re-derived for every hand-written loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DdsTiming {
    /// Core clock in Hz
    pub cpu_hz: u32,
    /// Cycles per sample of the phase loop
    pub phase_cycles: u32,
    /// Cycles per sample of the noise loop
    pub noise_cycles: u32,
    /// Cycles per sample of the sweep loop between rollovers
    pub sweep_cycles: u32,
    /// Extra cycles the sweep loop spends on a period boundary, on top of
    /// the sample slot of the add that wrapped
    pub rollover_cycles: u32,
}

impl DdsTiming {
    /// 16 MHz core with a nine-cycle output loop
    pub const REFERENCE: DdsTiming = DdsTiming {
        cpu_hz: 16_000_000,
        phase_cycles: 9,
        noise_cycles: 7,
        sweep_cycles: 9,
        rollover_cycles: 10,
    };

    /// Samples per second of the phase loop
    pub fn sample_rate(&self) -> f64 {
        self.cpu_hz as f64 / self.phase_cycles as f64
    }

    /// Output frequency produced by an increment of one
    pub fn resolution(&self) -> f64 {
        self.sample_rate() / (1u32 << FRACTION_BITS) as f64 / TABLE_LEN as f64
    }

    /// Convert a frequency to a phase increment
    pub fn accumulator_for(&self, frequency: f64, calibration: f64) -> PhaseIncrement {
        let raw = frequency / (self.resolution() / calibration);
        // `as` saturates and maps NaN to zero
        PhaseIncrement::new(raw as u32)
    }

    /// Frequency an increment actually produces
    pub fn frequency_of(&self, increment: PhaseIncrement, calibration: f64) -> f64 {
        increment.raw() as f64 * self.resolution() / calibration
    }

    /// Phase the sweep loop owes after a period boundary at `increment`
    pub fn rollover_compensation(&self, increment: u32) -> u32 {
        if self.sweep_cycles == 0 {
            return 0;
        }
        (increment as u64 * self.rollover_cycles as u64 / self.sweep_cycles as u64) as u32
    }
}

impl Default for DdsTiming {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Phase increment, kept within `1..=0xFF_FFFF`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseIncrement(u32);

impl PhaseIncrement {
    pub const MIN: PhaseIncrement = PhaseIncrement(1);
    pub const MAX: PhaseIncrement = PhaseIncrement(PHASE_MASK);

    /// Clamp a raw value into the valid range
    pub const fn new(raw: u32) -> Self {
        if raw < 1 {
            Self::MIN
        } else if raw > PHASE_MASK {
            Self::MAX
        } else {
            Self(raw)
        }
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// The three bytes as loaded into the loop registers, high byte first
    pub const fn to_bytes(&self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }
}

/// 24-bit phase accumulator
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseAccumulator(u32);

impl PhaseAccumulator {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Add `increment`; returns true when the phase wrapped past a full period
    #[inline]
    pub fn advance(&mut self, increment: u32) -> bool {
        let next = self.0 + (increment & PHASE_MASK);
        self.0 = next & PHASE_MASK;
        next > PHASE_MASK
    }

    /// Table index selected by the integer byte
    #[inline]
    pub fn index(&self) -> u8 {
        (self.0 >> FRACTION_BITS) as u8
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Asynchronous stop request.
///
/// Raised only by the stop interrupts, cleared only by the foreground before
/// a burst is armed.
pub struct StopFlag(AtomicBool);

impl StopFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Address of the flag byte for the hand-written loops
    pub fn as_ptr(&self) -> *mut bool {
        self.0.as_ptr()
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of one sweep burst, in increment units
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepPlan {
    pub start: PhaseIncrement,
    /// Added to the increment after every period
    pub step: PhaseIncrement,
    /// The burst ends once the increment reaches this value
    pub end: u32,
}

impl SweepPlan {
    pub fn new(timing: &DdsTiming, start_hz: f64, end_hz: f64, step_hz: f64, calibration: f64) -> Self {
        Self {
            start: timing.accumulator_for(start_hz, calibration),
            step: timing.accumulator_for(step_hz, calibration),
            end: timing.accumulator_for(end_hz, calibration).raw(),
        }
    }

    /// Periods a full sweep takes
    pub fn expected_periods(&self) -> u32 {
        let start = self.start.raw();
        if start >= self.end {
            return 0;
        }
        (self.end - start).div_ceil(self.step.raw())
    }
}

/// How a sweep burst ended
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepOutcome {
    /// Completed periods
    pub periods: u32,
    /// Increment at exit
    pub final_increment: u32,
    /// True when the stop flag ended the burst before the end frequency
    pub stopped: bool,
}

/// Fixed-latency output loops.
///
/// Every `run_*` call emits samples until its termination condition and then
/// returns; none of them can fail.
pub trait SampleEngine {
    /// Static waveform at a constant increment, until `stop` is raised
    fn run_phase(&mut self, buffer: &WaveBuffer, increment: PhaseIncrement, stop: &StopFlag);

    /// Walk `table` one entry per sample from `start`, until `stop` is
    /// raised. Returns the index to resume from.
    fn run_sequential(&mut self, table: &Table, start: u8, stop: &StopFlag) -> u8;

    /// Frequency sweep; ends at the plan's end increment or on `stop`,
    /// which is checked at period boundaries
    fn run_sweep(&mut self, buffer: &WaveBuffer, plan: &SweepPlan, stop: &StopFlag) -> SweepOutcome;

    /// Drive the DAC to a constant level
    fn hold(&mut self, level: u8);

    /// Cycle counts of the loops
    fn timing(&self) -> DdsTiming;
}

/// Portable engine that computes each sample in software and accounts for
/// the cycles the hand-written loop would have spent
pub struct SoftwareEngine<P> {
    dac: P,
    timing: DdsTiming,
    cycles: u64,
}

impl<P> SoftwareEngine<P>
where
    P: DacPort,
{
    pub fn new(dac: P, timing: DdsTiming) -> Self {
        Self { dac, timing, cycles: 0 }
    }

    /// Cycles accounted since construction
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn dac(&self) -> &P {
        &self.dac
    }

    pub fn into_inner(self) -> P {
        self.dac
    }

    #[inline]
    fn spend(&mut self, cycles: u32) {
        self.cycles += cycles as u64;
        self.dac.elapse(cycles);
    }
}

impl<P> SampleEngine for SoftwareEngine<P>
where
    P: DacPort,
{
    fn run_phase(&mut self, buffer: &WaveBuffer, increment: PhaseIncrement, stop: &StopFlag) {
        let samples = buffer.samples();
        let mut phase = PhaseAccumulator::new();
        loop {
            phase.advance(increment.raw());
            self.dac.write(samples[phase.index() as usize]);
            self.spend(self.timing.phase_cycles);
            if stop.is_raised() {
                break;
            }
        }
    }

    fn run_sequential(&mut self, table: &Table, start: u8, stop: &StopFlag) -> u8 {
        let mut index = start;
        loop {
            self.dac.write(table[index as usize]);
            index = index.wrapping_add(1);
            self.spend(self.timing.noise_cycles);
            if stop.is_raised() {
                break;
            }
        }
        index
    }

    fn run_sweep(&mut self, buffer: &WaveBuffer, plan: &SweepPlan, stop: &StopFlag) -> SweepOutcome {
        let samples = buffer.samples();
        let mut increment = plan.start.raw();
        let mut periods = 0;
        let mut phase = PhaseAccumulator::new();

        if increment >= plan.end {
            return SweepOutcome { periods, final_increment: increment, stopped: false };
        }

        loop {
            if !phase.advance(increment) {
                self.dac.write(samples[phase.index() as usize]);
                self.spend(self.timing.sweep_cycles);
                continue;
            }

            // The wrapping add takes a sample slot without a sample
            self.spend(self.timing.sweep_cycles);

            // A period boundary. The phase owed for the rollover path can
            // carry into the next period, which is a boundary too.
            loop {
                periods += 1;
                increment = (increment + plan.step.raw()).min(PHASE_MASK);
                self.spend(self.timing.rollover_cycles);
                if increment >= plan.end {
                    return SweepOutcome { periods, final_increment: increment, stopped: false };
                }
                if stop.is_raised() {
                    return SweepOutcome { periods, final_increment: increment, stopped: true };
                }
                if !phase.advance(self.timing.rollover_compensation(increment)) {
                    break;
                }
            }
        }
    }

    fn hold(&mut self, level: u8) {
        self.dac.write(level);
    }

    fn timing(&self) -> DdsTiming {
        self.timing
    }
}
