//! Generator configuration record and its clamped edit operations

use crate::types::{HsFrequency, PulseDuration, PwmFrequency};

/// Lowest selectable output frequency in Hz
pub const MIN_FREQ: f64 = 0.0;
/// Highest selectable output frequency in Hz
pub const MAX_FREQ: f64 = 999_999.999;
pub const MIN_FREQ_STEP: f64 = 0.001;
pub const MAX_FREQ_STEP: f64 = 10_000.0;
pub const MIN_CALIBRATION: f64 = 0.9;
pub const MAX_CALIBRATION: f64 = 1.1;
/// Calibration change per Left/Right press
pub const CALIBRATION_STEP: f64 = 0.0001;
pub const MIN_SWEEP_INCREMENT: f64 = 0.001;
pub const MAX_SWEEP_INCREMENT: f64 = 10_000.0;

/// Number of entries in the main menu; bounds the stored menu index
pub const MAIN_MENU_LEN: u8 = 12;

/// All user-adjustable generator parameters.
///
/// Every edit method clamps its field; a value outside its range can only
/// come from decoding a damaged record, and [`GeneratorConfig::sanitized`]
/// removes it.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeneratorConfig {
    /// Target output frequency (also the sweep start frequency)
    pub frequency: f64,
    /// Amount added or removed by Left/Right on frequency fields
    pub frequency_step: f64,
    /// Multiplier applied when converting frequency to phase increment
    pub calibration: f64,
    /// Frequency at which a sweep stops
    pub sweep_end: f64,
    /// Frequency added after every swept period
    pub sweep_increment: f64,
    pub hs_frequency: HsFrequency,
    pub pwm_frequency: PwmFrequency,
    pub pwm_duty: u8,
    /// DAC level held while the generator is idle
    pub off_level: u8,
    pub pulse: PulseDuration,
    /// Index of the last active main menu entry
    pub menu_entry: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frequency: 1000.0,
            frequency_step: 100.0,
            calibration: 1.0,
            sweep_end: 10_000.0,
            sweep_increment: 10.0,
            hs_frequency: HsFrequency::default(),
            pwm_frequency: PwmFrequency::default(),
            pwm_duty: 128,
            off_level: 0x80, // mid scale
            pulse: PulseDuration::default(),
            menu_entry: 0,
        }
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

impl GeneratorConfig {
    /// Clamp every field into its valid range
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            frequency: clamp_or(self.frequency, MIN_FREQ, MAX_FREQ, defaults.frequency),
            frequency_step: clamp_or(
                self.frequency_step,
                MIN_FREQ_STEP,
                MAX_FREQ_STEP,
                defaults.frequency_step,
            ),
            calibration: clamp_or(
                self.calibration,
                MIN_CALIBRATION,
                MAX_CALIBRATION,
                defaults.calibration,
            ),
            sweep_end: clamp_or(self.sweep_end, MIN_FREQ, MAX_FREQ, defaults.sweep_end),
            sweep_increment: clamp_or(
                self.sweep_increment,
                MIN_SWEEP_INCREMENT,
                MAX_SWEEP_INCREMENT,
                defaults.sweep_increment,
            ),
            menu_entry: if self.menu_entry < MAIN_MENU_LEN { self.menu_entry } else { 0 },
            ..self
        }
    }

    pub fn frequency_down(&mut self) {
        self.frequency = (self.frequency - self.frequency_step).max(MIN_FREQ);
    }

    pub fn frequency_up(&mut self) {
        self.frequency = (self.frequency + self.frequency_step).min(MAX_FREQ);
    }

    pub fn step_down(&mut self) {
        self.frequency_step = (self.frequency_step / 10.0).max(MIN_FREQ_STEP);
    }

    pub fn step_up(&mut self) {
        self.frequency_step = (self.frequency_step * 10.0).min(MAX_FREQ_STEP);
    }

    pub fn calibration_down(&mut self) {
        self.calibration = (self.calibration - CALIBRATION_STEP).max(MIN_CALIBRATION);
    }

    pub fn calibration_up(&mut self) {
        self.calibration = (self.calibration + CALIBRATION_STEP).min(MAX_CALIBRATION);
    }

    pub fn sweep_end_down(&mut self) {
        self.sweep_end = (self.sweep_end - self.frequency_step).max(MIN_FREQ);
    }

    pub fn sweep_end_up(&mut self) {
        self.sweep_end = (self.sweep_end + self.frequency_step).min(MAX_FREQ);
    }

    pub fn sweep_increment_down(&mut self) {
        self.sweep_increment = (self.sweep_increment / 10.0).max(MIN_SWEEP_INCREMENT);
    }

    pub fn sweep_increment_up(&mut self) {
        self.sweep_increment = (self.sweep_increment * 10.0).min(MAX_SWEEP_INCREMENT);
    }

    pub fn off_level_down(&mut self) {
        self.off_level = self.off_level.saturating_sub(1);
    }

    pub fn off_level_up(&mut self) {
        self.off_level = self.off_level.saturating_add(1);
    }

    pub fn duty_down(&mut self) {
        self.pwm_duty = self.pwm_duty.saturating_sub(1);
    }

    pub fn duty_up(&mut self) {
        self.pwm_duty = self.pwm_duty.saturating_add(1);
    }
}
