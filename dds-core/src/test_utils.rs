//! Test utilities for generator core functionality

pub use board::{run_for, VirtualBoard};

pub mod board {
    //! Simulated board with virtual time
    //!
    //! Time is counted in CPU cycles. The output engine, spin-waits and delays
    //! all advance it, so the tick interrupt, the button script and the
    //! stop interrupts interleave with the foreground the way they would on
    //! hardware.

    use std::cell::RefCell;
    use std::rc::Rc;
    use std::string::String;
    use std::vec::Vec;

    use embedded_hal::delay::DelayNs;

    use crate::config::GeneratorConfig;
    use crate::controller::Generator;
    use crate::dds::{DdsTiming, SoftwareEngine, StopFlag};
    use crate::hal::mock::{MockDisplay, MockStore, MockSync, MockTimer};
    use crate::hal::{DacPort, GeneratorHal, HalError, InterruptControl};
    use crate::input::{ButtonLatch, ButtonPoller, TICK_PERIOD_US};
    use crate::storage;
    use crate::types::Button;

    /// Cycles burnt by one foreground spin-wait iteration
    pub const RELAX_CYCLES: u64 = 64;
    /// Virtual time after which the simulation gives up
    pub const TIME_LIMIT_MS: u64 = 60_000;
    /// DAC levels kept for inspection
    const HISTORY_LEN: usize = 4096;

    #[derive(Debug, Clone, Copy)]
    struct Press {
        button: Button,
        from: u64,
        until: u64,
    }

    struct Sim {
        timing: DdsTiming,
        now: u64,
        tick_period: u64,
        next_tick: u64,
        tick_enabled: bool,
        stop_armed: bool,
        presses: Vec<Press>,
        poller: ButtonPoller,
        latch: Rc<ButtonLatch>,
        stop: Rc<StopFlag>,
        limit: u64,
    }

    impl Sim {
        fn raw_at(&self, t: u64) -> Button {
            let mut levels = [false; 6];
            for press in self.presses.iter().filter(|p| p.from <= t && t < p.until) {
                if let Some(slot) = Button::PRIORITY.iter().position(|b| *b == press.button) {
                    levels[slot] = true;
                }
            }
            Button::from_levels(levels)
        }

        fn advance(&mut self, cycles: u64) {
            let before = self.raw_at(self.now);
            let target = self.now + cycles;

            while self.next_tick <= target {
                if self.tick_enabled {
                    let raw = self.raw_at(self.next_tick);
                    self.poller.tick(raw, &self.latch);
                }
                self.next_tick += self.tick_period;
            }
            self.now = target;

            // Stop sources fire on press edges only
            let after = self.raw_at(target);
            if self.stop_armed && after != before && !after.is_none() {
                self.stop.raise();
            }

            assert!(self.now < self.limit, "virtual time limit exceeded");
        }

        fn ms_to_cycles(&self, ms: u64) -> u64 {
            ms * self.timing.cpu_hz as u64 / 1000
        }
    }

    /// DAC that records levels and advances virtual time
    pub struct SimDac {
        sim: Rc<RefCell<Sim>>,
        writes: u64,
        last: Option<u8>,
        history: Vec<u8>,
    }

    impl DacPort for SimDac {
        fn write(&mut self, level: u8) {
            self.writes += 1;
            self.last = Some(level);
            if self.history.len() < HISTORY_LEN {
                self.history.push(level);
            }
        }

        fn elapse(&mut self, cycles: u32) {
            self.sim.borrow_mut().advance(cycles as u64);
        }
    }

    /// Tick and stop-source switches
    pub struct SimInterrupts {
        sim: Rc<RefCell<Sim>>,
    }

    impl InterruptControl for SimInterrupts {
        fn enable_tick(&mut self, enable: bool) -> Result<(), HalError> {
            self.sim.borrow_mut().tick_enabled = enable;
            Ok(())
        }

        fn enable_stop_sources(&mut self, enable: bool) -> Result<(), HalError> {
            self.sim.borrow_mut().stop_armed = enable;
            Ok(())
        }
    }

    /// Blocking delay in virtual time
    pub struct SimDelay {
        sim: Rc<RefCell<Sim>>,
    }

    impl DelayNs for SimDelay {
        fn delay_ns(&mut self, ns: u32) {
            let mut sim = self.sim.borrow_mut();
            let cycles = ns as u64 * sim.timing.cpu_hz as u64 / 1_000_000_000;
            sim.advance(cycles.max(1));
        }
    }

    /// Virtual generator board
    pub struct VirtualBoard {
        sim: Rc<RefCell<Sim>>,
        latch: Rc<ButtonLatch>,
        stop: Rc<StopFlag>,
        engine: SoftwareEngine<SimDac>,
        lcd: MockDisplay,
        eeprom: MockStore,
        sync: MockSync,
        timer: MockTimer,
        interrupts: SimInterrupts,
        delay: SimDelay,
    }

    impl VirtualBoard {
        /// Board with an erased settings store
        pub fn new() -> Self {
            Self::with_store(MockStore::new())
        }

        pub fn with_store(eeprom: MockStore) -> Self {
            Self::with_parts(eeprom, DdsTiming::REFERENCE)
        }

        pub fn with_parts(eeprom: MockStore, timing: DdsTiming) -> Self {
            let latch = Rc::new(ButtonLatch::new());
            let stop = Rc::new(StopFlag::new());
            let tick_period = TICK_PERIOD_US as u64 * timing.cpu_hz as u64 / 1_000_000;
            let sim = Rc::new(RefCell::new(Sim {
                timing,
                now: 0,
                tick_period,
                next_tick: tick_period,
                tick_enabled: false,
                stop_armed: false,
                presses: Vec::new(),
                poller: ButtonPoller::new(),
                latch: latch.clone(),
                stop: stop.clone(),
                limit: TIME_LIMIT_MS * timing.cpu_hz as u64 / 1000,
            }));
            let dac = SimDac { sim: sim.clone(), writes: 0, last: None, history: Vec::new() };
            Self {
                engine: SoftwareEngine::new(dac, timing),
                lcd: MockDisplay::new(),
                eeprom,
                sync: MockSync::default(),
                timer: MockTimer::default(),
                interrupts: SimInterrupts { sim: sim.clone() },
                delay: SimDelay { sim: sim.clone() },
                sim,
                latch,
                stop,
            }
        }

        /// Button record shared with the simulated tick interrupt
        pub fn latch(&self) -> Rc<ButtonLatch> {
            self.latch.clone()
        }

        /// Stop flag shared with the simulated stop interrupts
        pub fn stop(&self) -> Rc<StopFlag> {
            self.stop.clone()
        }

        /// Script a press starting `delay_ms` from now and lasting `hold_ms`
        pub fn press_after(&mut self, button: Button, delay_ms: u64, hold_ms: u64) {
            let mut sim = self.sim.borrow_mut();
            let from = sim.now + sim.ms_to_cycles(delay_ms);
            let until = from + sim.ms_to_cycles(hold_ms);
            sim.presses.push(Press { button, from, until });
        }

        /// Let virtual time pass without foreground activity
        pub fn advance_ms(&mut self, ms: u64) {
            let mut sim = self.sim.borrow_mut();
            let cycles = sim.ms_to_cycles(ms);
            sim.advance(cycles);
        }

        pub fn now_ms(&self) -> u64 {
            let sim = self.sim.borrow();
            sim.now * 1000 / sim.timing.cpu_hz as u64
        }

        pub fn tick_enabled(&self) -> bool {
            self.sim.borrow().tick_enabled
        }

        pub fn stop_armed(&self) -> bool {
            self.sim.borrow().stop_armed
        }

        pub fn dac_last(&self) -> Option<u8> {
            self.engine.dac().last
        }

        pub fn dac_writes(&self) -> u64 {
            self.engine.dac().writes
        }

        /// First levels written since power-up
        pub fn dac_history(&self) -> &[u8] {
            &self.engine.dac().history
        }

        /// Cycles spent in output loops
        pub fn engine_cycles(&self) -> u64 {
            self.engine.cycles()
        }

        pub fn lcd_row(&self, row: usize) -> String {
            self.lcd.row(row)
        }

        pub fn sync_pulses(&self) -> usize {
            self.sync.pulses
        }

        /// Rate of the high-speed square wave, if running
        pub fn hs_running(&self) -> Option<u8> {
            self.timer.running_mhz
        }

        pub fn eeprom(&self) -> &MockStore {
            &self.eeprom
        }

        /// Configuration currently held by the settings store
        pub fn stored_config(&self) -> Option<GeneratorConfig> {
            storage::decode(self.eeprom.bytes())
        }
    }

    impl Default for VirtualBoard {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GeneratorHal for VirtualBoard {
        type Engine = SoftwareEngine<SimDac>;
        type Display = MockDisplay;
        type Store = MockStore;
        type Sync = MockSync;
        type Timer = MockTimer;
        type Interrupts = SimInterrupts;
        type Delay = SimDelay;

        fn engine(&mut self) -> &mut Self::Engine {
            &mut self.engine
        }

        fn display(&mut self) -> &mut Self::Display {
            &mut self.lcd
        }

        fn store(&mut self) -> &mut Self::Store {
            &mut self.eeprom
        }

        fn sync(&mut self) -> &mut Self::Sync {
            &mut self.sync
        }

        fn timer(&mut self) -> &mut Self::Timer {
            &mut self.timer
        }

        fn interrupts(&mut self) -> &mut Self::Interrupts {
            &mut self.interrupts
        }

        fn delay(&mut self) -> &mut Self::Delay {
            &mut self.delay
        }

        fn relax(&mut self) {
            self.sim.borrow_mut().advance(RELAX_CYCLES);
        }
    }

    /// Run the idle loop for `ms` of virtual time
    pub fn run_for(generator: &mut Generator<'_, VirtualBoard>, ms: u64) -> Result<(), HalError> {
        let until = generator.hal().now_ms() + ms;
        while generator.hal().now_ms() < until {
            generator.poll()?;
        }
        Ok(())
    }
}
