//! CH32V203 board bring-up and collaborators
//!
//! Pin map:
//! - PA0..=PA7: R-2R ladder
//! - PA8: sync pulse, or TIM1_CH1 square wave in high-speed mode
//! - PB0, PB1, PB4..=PB7: LCD
//! - PB10..=PB15: up, right, down, left, start, options (active low)

use dds_core::hal::{ButtonPanel, GeneratorHal, HalError, HighSpeedTimer, InterruptControl, SyncOutput};
use dds_core::input::TICK_PERIOD_US;
use dds_core::storage::RECORD_LEN;
use dds_core::types::Button;

use crate::delay::CycleDelay;
use crate::engine::{AsmEngine, R2rLadder, FIRMWARE_TIMING};
use crate::flash_store::FlashStore;
use crate::lcd::Lcd;
use crate::registers::*;

/// First button line on GPIOB
pub const BUTTON_FIRST_PIN: u32 = 10;
const BUTTON_MASK: u32 = 0x3F << BUTTON_FIRST_PIN;
const SYNC_PIN: u32 = 8;

/// SysTick compare value for one poller tick
pub const TICK_COMPARE: u32 = (FIRMWARE_TIMING.cpu_hz / 1_000_000) * TICK_PERIOD_US - 1;

/// Switch the core to 72 MHz from the internal oscillator
pub fn init_clocks() {
    // Two wait states above 48 MHz
    modify(FLASH_BASE + FLASH_ACTLR, |v| (v & !0x3) | 0x2);
    // PLL source HSI/2, x18, APB1 = HCLK/2
    modify(RCC_BASE + RCC_CFGR0, |v| {
        let v = v & !((0xF << 18) | (1 << 16) | (0x7 << 8));
        v | (0xF << 18) | (0x4 << 8)
    });
    modify(RCC_BASE + RCC_CTLR, |v| v | (1 << 24));
    while read(RCC_BASE + RCC_CTLR) & (1 << 25) == 0 {}
    modify(RCC_BASE + RCC_CFGR0, |v| (v & !0x3) | 0x2);
    while (read(RCC_BASE + RCC_CFGR0) >> 2) & 0x3 != 0x2 {}
}

/// Clocks, pins and the interrupt sources; everything starts disabled
pub fn init_peripherals() {
    // AFIO, GPIOA, GPIOB, TIM1
    modify(RCC_BASE + RCC_APB2PCENR, |v| v | (1 << 0) | (1 << 2) | (1 << 3) | (1 << 11));

    for pin in 0..8 {
        configure_pin(GPIOA_BASE, pin, PinMode::PushPull);
    }
    configure_pin(GPIOA_BASE, SYNC_PIN, PinMode::PushPull);
    write(GPIOA_BASE + GPIO_BSHR, 1 << (SYNC_PIN + 16));

    for pin in BUTTON_FIRST_PIN..BUTTON_FIRST_PIN + 6 {
        configure_pin(GPIOB_BASE, pin, PinMode::InputPull);
    }
    modify(GPIOB_BASE + GPIO_OUTDR, |v| v | BUTTON_MASK);

    // Route EXTI10..=15 to port B, falling edge only
    modify(AFIO_BASE + AFIO_EXTICR3, |v| (v & !0xFF00) | 0x1100);
    write(AFIO_BASE + AFIO_EXTICR4, 0x1111);
    modify(EXTI_BASE + EXTI_FTENR, |v| v | BUTTON_MASK);

    write(SYSTICK_BASE + STK_CTLR, 0);
    write(SYSTICK_BASE + STK_CMPLR, TICK_COMPARE);
    write(SYSTICK_BASE + STK_CMPHR, 0);
    write(SYSTICK_BASE + STK_CNTL, 0);
    // Enable, interrupt, HCLK source, auto reload
    write(SYSTICK_BASE + STK_CTLR, 0xF);
}

/// Front panel read straight from the port
#[derive(Copy, Clone, Default)]
pub struct GpioPanel;

impl ButtonPanel for GpioPanel {
    fn read(&mut self) -> Result<Button, HalError> {
        let idr = read(GPIOB_BASE + GPIO_INDR);
        let mut asserted = [false; 6];
        for (bit, level) in asserted.iter_mut().enumerate() {
            *level = idr & (1 << (BUTTON_FIRST_PIN + bit as u32)) == 0;
        }
        Ok(Button::from_levels(asserted))
    }
}

/// Acknowledge pending button edges; returns true if any was pending
pub fn take_button_edges() -> bool {
    let pending = read(EXTI_BASE + EXTI_INTFR) & BUTTON_MASK;
    write(EXTI_BASE + EXTI_INTFR, pending);
    pending != 0
}

/// Acknowledge the SysTick compare flag
pub fn take_tick() {
    write(SYSTICK_BASE + STK_SR, 0);
}

/// Sync pulse on PA8 while it is a plain output
#[derive(Default)]
pub struct SyncLine;

impl SyncOutput for SyncLine {
    fn pulse(&mut self) -> Result<(), HalError> {
        write(GPIOA_BASE + GPIO_BSHR, 1 << SYNC_PIN);
        write(GPIOA_BASE + GPIO_BSHR, 1 << (SYNC_PIN + 16));
        Ok(())
    }

    fn release(&mut self) -> Result<(), HalError> {
        write(GPIOA_BASE + GPIO_BSHR, 1 << (SYNC_PIN + 16));
        Ok(())
    }
}

/// TIM1 channel 1 square wave on PA8
#[derive(Default)]
pub struct Tim1Square;

impl HighSpeedTimer for Tim1Square {
    fn start(&mut self, mhz: u8) -> Result<(), HalError> {
        let timer_mhz = FIRMWARE_TIMING.cpu_hz / 1_000_000;
        if mhz == 0 || timer_mhz % mhz as u32 != 0 {
            return Err(HalError::InvalidConfig);
        }
        let period = timer_mhz / mhz as u32;

        write(TIM1_BASE + TIM_CTLR1, 0);
        write(TIM1_BASE + TIM_PSC, 0);
        write(TIM1_BASE + TIM_ATRLR, period - 1);
        write(TIM1_BASE + TIM_CH1CVR, period / 2);
        // PWM mode 1 with preload
        write(TIM1_BASE + TIM_CHCTLR1, (0x6 << 4) | (1 << 3));
        write(TIM1_BASE + TIM_CCER, 1);
        write(TIM1_BASE + TIM_BDTR, 1 << 15);
        write(TIM1_BASE + TIM_CNT, 0);
        configure_pin(GPIOA_BASE, SYNC_PIN, PinMode::AltPushPull);
        // Auto-reload preload, counter enable
        write(TIM1_BASE + TIM_CTLR1, (1 << 7) | 1);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HalError> {
        write(TIM1_BASE + TIM_CTLR1, 0);
        write(TIM1_BASE + TIM_CCER, 0);
        configure_pin(GPIOA_BASE, SYNC_PIN, PinMode::PushPull);
        write(GPIOA_BASE + GPIO_BSHR, 1 << (SYNC_PIN + 16));
        Ok(())
    }
}

/// SysTick and button EXTI switches
#[derive(Default)]
pub struct BoardInterrupts;

impl InterruptControl for BoardInterrupts {
    fn enable_tick(&mut self, enable: bool) -> Result<(), HalError> {
        take_tick();
        enable_irq(IRQ_SYSTICK, enable);
        Ok(())
    }

    fn enable_stop_sources(&mut self, enable: bool) -> Result<(), HalError> {
        // Drop edges seen while disarmed
        take_button_edges();
        if enable {
            modify(EXTI_BASE + EXTI_INTENR, |v| v | BUTTON_MASK);
        } else {
            modify(EXTI_BASE + EXTI_INTENR, |v| v & !BUTTON_MASK);
        }
        enable_irq(IRQ_EXTI15_10, enable);
        Ok(())
    }
}

/// All collaborators of the generator
pub struct Board {
    engine: AsmEngine,
    lcd: Lcd,
    store: FlashStore,
    sync: SyncLine,
    timer: Tim1Square,
    interrupts: BoardInterrupts,
    delay: CycleDelay,
}

impl Board {
    /// Bring the board up. Interrupts stay masked until the generator
    /// switches to menu mode.
    pub fn new(settings: &'static mut [u8; RECORD_LEN]) -> Self {
        init_clocks();
        init_peripherals();
        let delay = CycleDelay;
        Self {
            engine: AsmEngine::new(R2rLadder),
            lcd: Lcd::new(delay),
            store: FlashStore::new(settings),
            sync: SyncLine,
            timer: Tim1Square,
            interrupts: BoardInterrupts,
            delay,
        }
    }
}

impl GeneratorHal for Board {
    type Engine = AsmEngine;
    type Display = Lcd;
    type Store = FlashStore;
    type Sync = SyncLine;
    type Timer = Tim1Square;
    type Interrupts = BoardInterrupts;
    type Delay = CycleDelay;

    fn engine(&mut self) -> &mut Self::Engine {
        &mut self.engine
    }

    fn display(&mut self) -> &mut Self::Display {
        &mut self.lcd
    }

    fn store(&mut self) -> &mut Self::Store {
        &mut self.store
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
}
