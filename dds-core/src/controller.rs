//! Generator controller: menu dispatch and the generation/menu interleaving
//!
//! The board sits in one of two interrupt configurations. In the menu
//! configuration the tick drives the button poller and the stop sources are
//! off. While a burst runs the stop sources are armed and the tick is off, so
//! nothing but a button edge can disturb the output loop. Between bursts the
//! controller switches back, drains pending input and re-arms.

use embedded_hal::delay::DelayNs;

use crate::config::GeneratorConfig;
use crate::dds::{DdsTiming, PhaseIncrement, SampleEngine, StopFlag, SweepPlan};
use crate::display;
use crate::hal::{CharDisplay, GeneratorHal, HalError, HighSpeedTimer, InterruptControl, SyncOutput};
use crate::input::ButtonLatch;
use crate::menu::{Action, Bindings, MainMode, OptionEntry, SweepStage};
use crate::storage;
use crate::types::{Button, PulseDuration};
use crate::waveform::{table_for, WaveBuffer, NOISE, SINE_FROM_ZERO};

/// Frequency of the calibration reference tone
pub const CALIBRATION_TONE_HZ: f64 = 1000.0;

/// Work for one output burst
#[derive(Copy, Clone, Debug)]
enum Burst {
    Phase(PhaseIncrement),
    Noise,
    Sweep(SweepPlan),
}

/// Function generator state and its board
pub struct Generator<'a, H: GeneratorHal> {
    hal: H,
    config: GeneratorConfig,
    latch: &'a ButtonLatch,
    stop: &'a StopFlag,
    buffer: WaveBuffer,
    mode: MainMode,
    option: Option<OptionEntry>,
    bindings: Bindings,
    running: bool,
    sweep_stage: SweepStage,
    noise_index: u8,
}

impl<'a, H: GeneratorHal> Generator<'a, H> {
    /// Wrap a board with an already loaded configuration
    pub fn new(hal: H, latch: &'a ButtonLatch, stop: &'a StopFlag, config: GeneratorConfig) -> Self {
        let config = config.sanitized();
        let mode = MainMode::from_index(config.menu_entry);
        Self {
            hal,
            config,
            latch,
            stop,
            buffer: WaveBuffer::new(),
            mode,
            option: None,
            bindings: mode.bindings(),
            running: false,
            sweep_stage: SweepStage::default(),
            noise_index: 0,
        }
    }

    /// Load the settings, put the board into the menu configuration and draw
    /// the last active entry
    pub fn boot(mut hal: H, latch: &'a ButtonLatch, stop: &'a StopFlag) -> Result<Self, HalError> {
        let loaded = storage::load(hal.store())?;
        match loaded {
            storage::Loaded::Restored(_cfg) => {
                #[cfg(feature = "defmt")]
                defmt::info!("💾 Settings restored: {}", _cfg);
            }
            storage::Loaded::Initialized(_) => {
                #[cfg(feature = "defmt")]
                defmt::info!("💾 First boot, defaults written");
            }
        }

        let mut generator = Self::new(hal, latch, stop, loaded.config());
        generator.hal.engine().hold(generator.config.off_level);
        generator.menu_mode()?;
        generator.render()?;
        Ok(generator)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> MainMode {
        self.mode
    }

    /// Active options entry, if the options list is open
    pub fn option(&self) -> Option<OptionEntry> {
        self.option
    }

    pub fn sweep_stage(&self) -> SweepStage {
        self.sweep_stage
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Dispatch the latched button if it has not been handled yet.
    /// Returns true if a press was consumed.
    pub fn process_button(&mut self) -> Result<bool, HalError> {
        let Some(button) = self.latch.take_unprocessed() else {
            return Ok(false);
        };
        let action = self.bindings.action(button);
        #[cfg(feature = "defmt")]
        defmt::debug!("🔘 {} -> {}", button, action);
        self.perform(action)?;
        Ok(true)
    }

    /// One pass of the idle loop
    pub fn poll(&mut self) -> Result<bool, HalError> {
        let handled = self.process_button()?;
        self.hal.relax();
        Ok(handled)
    }

    /// Execute a bound action for the active entry
    pub fn perform(&mut self, action: Action) -> Result<(), HalError> {
        match action {
            Action::Nothing => Ok(()),
            Action::Previous => self.navigate(false),
            Action::Next => self.navigate(true),
            Action::EnterOptions => self.enter_options(),
            Action::LeaveOptions => self.leave_options(),
            Action::ToggleRun => self.toggle_run(),
            Action::FrequencyDown => self.edit(GeneratorConfig::frequency_down),
            Action::FrequencyUp => self.edit(GeneratorConfig::frequency_up),
            Action::StepDown => self.edit(GeneratorConfig::step_down),
            Action::StepUp => self.edit(GeneratorConfig::step_up),
            Action::CalibrationDown => self.edit(GeneratorConfig::calibration_down),
            Action::CalibrationUp => self.edit(GeneratorConfig::calibration_up),
            Action::OffLevelDown => self.edit_off_level(GeneratorConfig::off_level_down),
            Action::OffLevelUp => self.edit_off_level(GeneratorConfig::off_level_up),
            Action::HsLower => self.retune_high_speed(false),
            Action::HsHigher => self.retune_high_speed(true),
            Action::PwmSlower => {
                self.config.pwm_frequency = self.config.pwm_frequency.previous();
                self.refresh()
            }
            Action::PwmFaster => {
                self.config.pwm_frequency = self.config.pwm_frequency.next();
                self.refresh()
            }
            Action::DutyUp if self.running => self.edit(GeneratorConfig::duty_up),
            Action::DutyUp => self.navigate(false),
            Action::DutyDown if self.running => self.edit(GeneratorConfig::duty_down),
            Action::DutyDown => self.navigate(true),
            Action::SweepFieldDown => self.edit_sweep_field(false),
            Action::SweepFieldUp => self.edit_sweep_field(true),
            Action::SweepAdvance => self.sweep_advance(),
            Action::PulseShorter => {
                self.config.pulse = self.config.pulse.shorter();
                self.refresh()
            }
            Action::PulseLonger => {
                self.config.pulse = self.config.pulse.longer();
                self.refresh()
            }
            Action::FirePulse => self.fire_pulse(),
        }
    }

    /// Redraw the whole screen for the active entry
    pub fn render(&mut self) -> Result<(), HalError> {
        let title = match self.option {
            Some(entry) => entry.title(),
            None => self.mode.title(),
        };
        let lcd = self.hal.display();
        lcd.clear()?;
        display::title(lcd, title)?;
        self.refresh()
    }

    /// Redraw the value fields of the active entry
    pub fn refresh(&mut self) -> Result<(), HalError> {
        let cfg = self.config;
        let running = self.running;
        let stage = self.sweep_stage;
        let mode = self.mode;
        let option = self.option;
        let lcd = self.hal.display();

        match option {
            Some(OptionEntry::FreqStep) => return display::frequency(lcd, cfg.frequency_step),
            Some(OptionEntry::OffLevel) => return display::level(lcd, cfg.off_level, 0, 1),
            None => {}
        }

        match mode {
            MainMode::Signal(_) => display::frequency(lcd, cfg.frequency)?,
            MainMode::Noise => display::noise(lcd)?,
            MainMode::HighSpeed => display::high_speed(lcd, cfg.hs_frequency.mhz())?,
            MainMode::Pwm => {
                display::level(lcd, cfg.pwm_duty, display::TAG_COL, 0)?;
                display::pwm_rate(lcd, cfg.pwm_frequency.exact_hz())?;
            }
            MainMode::Sweep => {
                display::tag(lcd, stage.tag())?;
                let value = match stage {
                    SweepStage::StartFreq => cfg.frequency,
                    SweepStage::EndFreq => cfg.sweep_end,
                    SweepStage::Increment => cfg.sweep_increment,
                };
                display::frequency(lcd, value)?;
            }
            MainMode::Pulse => display::pulse(lcd, cfg.pulse)?,
            MainMode::Calibration => display::calibration(lcd, cfg.calibration)?,
        }
        display::run_marker(lcd, running)
    }

    fn edit(&mut self, change: fn(&mut GeneratorConfig)) -> Result<(), HalError> {
        change(&mut self.config);
        self.refresh()
    }

    fn edit_off_level(&mut self, change: fn(&mut GeneratorConfig)) -> Result<(), HalError> {
        change(&mut self.config);
        self.hal.engine().hold(self.config.off_level);
        self.refresh()
    }

    fn edit_sweep_field(&mut self, up: bool) -> Result<(), HalError> {
        if self.running {
            return Ok(());
        }
        let change: fn(&mut GeneratorConfig) = match (self.sweep_stage, up) {
            (SweepStage::StartFreq, false) => GeneratorConfig::frequency_down,
            (SweepStage::StartFreq, true) => GeneratorConfig::frequency_up,
            (SweepStage::EndFreq, false) => GeneratorConfig::sweep_end_down,
            (SweepStage::EndFreq, true) => GeneratorConfig::sweep_end_up,
            (SweepStage::Increment, false) => GeneratorConfig::sweep_increment_down,
            (SweepStage::Increment, true) => GeneratorConfig::sweep_increment_up,
        };
        self.edit(change)
    }

    fn navigate(&mut self, forward: bool) -> Result<(), HalError> {
        if self.running {
            return Ok(());
        }
        match self.option {
            Some(entry) => {
                let entry = if forward { entry.next() } else { entry.previous() };
                self.option = Some(entry);
                self.bindings = entry.bindings();
            }
            None => {
                let mode = if forward { self.mode.next() } else { self.mode.previous() };
                self.mode = mode;
                self.config.menu_entry = mode.index();
                self.bindings = mode.bindings();
                self.sweep_stage = SweepStage::StartFreq;
            }
        }
        self.render()
    }

    fn enter_options(&mut self) -> Result<(), HalError> {
        if self.running {
            return Ok(());
        }
        let entry = OptionEntry::ALL[0];
        self.option = Some(entry);
        self.bindings = entry.bindings();
        self.render()
    }

    fn leave_options(&mut self) -> Result<(), HalError> {
        self.option = None;
        self.bindings = self.mode.bindings();
        self.render()
    }

    fn toggle_run(&mut self) -> Result<(), HalError> {
        match (self.mode, self.running) {
            (MainMode::HighSpeed, false) => self.start_high_speed(),
            (MainMode::HighSpeed, true) => self.stop_high_speed(),
            // The run loop notices and winds down
            (_, true) => {
                self.running = false;
                Ok(())
            }
            (_, false) => self.start_run(),
        }
    }

    fn sweep_advance(&mut self) -> Result<(), HalError> {
        if self.running {
            self.running = false;
            return Ok(());
        }
        match self.sweep_stage {
            SweepStage::StartFreq => {
                self.sweep_stage = SweepStage::EndFreq;
                self.render()
            }
            SweepStage::EndFreq => {
                self.sweep_stage = SweepStage::Increment;
                self.render()
            }
            SweepStage::Increment => self.start_run(),
        }
    }

    fn start_high_speed(&mut self) -> Result<(), HalError> {
        storage::save(self.hal.store(), &self.config)?;
        self.hal.timer().start(self.config.hs_frequency.mhz())?;
        self.running = true;
        #[cfg(feature = "defmt")]
        defmt::info!("▶️ High speed output at {} MHz", self.config.hs_frequency.mhz());
        self.refresh()?;
        self.wait_release();
        Ok(())
    }

    fn stop_high_speed(&mut self) -> Result<(), HalError> {
        self.hal.timer().stop()?;
        self.hal.sync().release()?;
        self.running = false;
        #[cfg(feature = "defmt")]
        defmt::info!("⏹️ High speed output stopped");
        self.refresh()?;
        self.wait_release();
        Ok(())
    }

    fn retune_high_speed(&mut self, higher: bool) -> Result<(), HalError> {
        let hs = self.config.hs_frequency;
        self.config.hs_frequency = if higher { hs.higher() } else { hs.lower() };
        if self.running {
            self.hal.timer().start(self.config.hs_frequency.mhz())?;
        }
        self.refresh()
    }

    fn fire_pulse(&mut self) -> Result<(), HalError> {
        let off = self.config.off_level;

        // A toggled pulse is still high
        if self.running {
            self.hal.engine().hold(off);
            self.running = false;
            self.refresh()?;
            self.wait_release();
            return Ok(());
        }

        storage::save(self.hal.store(), &self.config)?;
        self.running = true;
        self.refresh()?;
        self.hal.sync().pulse()?;
        self.hal.engine().hold(u8::MAX);

        match self.config.pulse {
            PulseDuration::Toggle => {
                self.wait_release();
                return Ok(());
            }
            PulseDuration::Minimum => {}
            PulseDuration::Millis(ms) => self.hal.delay().delay_ms(ms as u32),
            PulseDuration::Hold => {
                while self.latch.pressed() == Button::Start {
                    self.hal.relax();
                }
            }
        }

        self.hal.engine().hold(off);
        self.running = false;
        self.refresh()?;
        self.wait_release();
        Ok(())
    }

    fn start_run(&mut self) -> Result<(), HalError> {
        storage::save(self.hal.store(), &self.config)?;
        self.running = true;
        self.refresh()?;
        #[cfg(feature = "defmt")]
        defmt::info!("▶️ Generation started: {}", self.mode);

        let result = self.run_bursts();
        if result.is_err() {
            // Never leave the stop sources armed behind an error
            self.running = false;
            let _ = self.menu_mode();
            self.hal.engine().hold(self.config.off_level);
        }
        result
    }

    fn run_bursts(&mut self) -> Result<(), HalError> {
        let timing = self.hal.engine().timing();
        while self.running {
            let Some(burst) = self.prepare_burst(&timing) else {
                break;
            };
            self.arm()?;
            self.hal.sync().pulse()?;
            match burst {
                Burst::Phase(increment) => {
                    self.hal.engine().run_phase(&self.buffer, increment, self.stop);
                }
                Burst::Noise => {
                    self.noise_index =
                        self.hal.engine().run_sequential(&NOISE, self.noise_index, self.stop);
                }
                Burst::Sweep(plan) => {
                    let _outcome = self.hal.engine().run_sweep(&self.buffer, &plan, self.stop);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Sweep burst: {}", _outcome);
                }
            }
            self.hal.engine().hold(self.config.off_level);
            self.menu_mode()?;
            self.drain_input()?;
        }
        self.finish_run()
    }

    /// Load the working buffer for the active mode. Edits made between bursts
    /// take effect here.
    fn prepare_burst(&mut self, timing: &DdsTiming) -> Option<Burst> {
        let cfg = self.config;
        match self.mode {
            MainMode::Signal(shape) => {
                self.buffer.load(table_for(shape));
                Some(Burst::Phase(timing.accumulator_for(cfg.frequency, cfg.calibration)))
            }
            MainMode::Pwm => {
                self.buffer.fill_duty(cfg.pwm_duty);
                let hz = cfg.pwm_frequency.exact_hz();
                Some(Burst::Phase(timing.accumulator_for(hz, cfg.calibration)))
            }
            MainMode::Calibration => {
                self.buffer.load(&SINE_FROM_ZERO);
                Some(Burst::Phase(timing.accumulator_for(CALIBRATION_TONE_HZ, cfg.calibration)))
            }
            MainMode::Noise => Some(Burst::Noise),
            MainMode::Sweep => {
                self.buffer.load(&SINE_FROM_ZERO);
                Some(Burst::Sweep(SweepPlan::new(
                    timing,
                    cfg.frequency,
                    cfg.sweep_end,
                    cfg.sweep_increment,
                    cfg.calibration,
                )))
            }
            MainMode::HighSpeed | MainMode::Pulse => None,
        }
    }

    /// Switch to the generation configuration
    fn arm(&mut self) -> Result<(), HalError> {
        // The press that started the run must not stop it
        self.wait_release();
        self.stop.clear();
        let irq = self.hal.interrupts();
        irq.enable_stop_sources(true)?;
        irq.enable_tick(false)
    }

    /// Switch to the menu configuration
    fn menu_mode(&mut self) -> Result<(), HalError> {
        let irq = self.hal.interrupts();
        irq.enable_stop_sources(false)?;
        irq.enable_tick(true)
    }

    /// Handle the presses that ended a burst, until the button is released
    fn drain_input(&mut self) -> Result<(), HalError> {
        // The poller has not seen the button yet
        self.wait_tick();
        while self.running && !self.latch.pressed().is_none() {
            self.process_button()?;
            self.hal.relax();
        }
        Ok(())
    }

    fn finish_run(&mut self) -> Result<(), HalError> {
        self.running = false;
        self.hal.engine().hold(self.config.off_level);
        if self.mode == MainMode::Sweep {
            self.sweep_stage = SweepStage::StartFreq;
        }
        #[cfg(feature = "defmt")]
        defmt::info!("⏹️ Generation stopped");
        self.render()?;
        self.wait_release();
        Ok(())
    }

    fn wait_release(&mut self) {
        while !self.latch.pressed().is_none() {
            self.hal.relax();
        }
    }

    fn wait_tick(&mut self) {
        let seen = self.latch.tick_count();
        while self.latch.tick_count() == seen {
            self.hal.relax();
        }
    }
}
