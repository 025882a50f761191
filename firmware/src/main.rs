#![no_std]
#![no_main]

// Logging support
#[cfg(feature = "defmt")]
use defmt::{debug, info, warn};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

// Define simple logging macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

use core::cell::RefCell;

use critical_section::Mutex;
use riscv_rt::entry;
use static_cell::StaticCell;

use dds_core::hal::ButtonPanel;
use dds_core::input::{ButtonLatch, ButtonPoller};
use dds_core::storage::RECORD_LEN;
use dds_core::{Generator, StopFlag};
use dds_firmware::board::{self, Board, GpioPanel};

// Critical section implementation for RISC-V
struct RiscvCriticalSection;
critical_section::set_impl!(RiscvCriticalSection);

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let mstatus = riscv::register::mstatus::read();
        riscv::register::mstatus::clear_mie();
        mstatus.mie() as u8
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled != 0 {
            riscv::register::mstatus::set_mie();
        }
    }
}

// ========================================
// State shared with the interrupt handlers
// ========================================

/// Latched button, written by the tick handler only
static LATCH: ButtonLatch = ButtonLatch::new();

/// Raised by the button edge handler only
static STOP: StopFlag = StopFlag::new();

/// Debounce and auto-repeat state, owned by the tick handler
static POLLER: Mutex<RefCell<ButtonPoller>> = Mutex::new(RefCell::new(ButtonPoller::new()));

/// RAM mirror of the settings page
static SETTINGS: StaticCell<[u8; RECORD_LEN]> = StaticCell::new();

#[entry]
fn main() -> ! {
    let board = Board::new(SETTINGS.init([0xFF; RECORD_LEN]));
    info!("🚀 DDS generator v{}", dds_core::VERSION);

    let mut generator = match Generator::boot(board, &LATCH, &STOP) {
        Ok(generator) => generator,
        Err(_e) => {
            warn!("❌ Boot failed: {}", _e);
            loop {
                unsafe { riscv::asm::wfi() };
            }
        }
    };

    // SAFETY: all shared state is initialized
    unsafe { riscv::register::mstatus::set_mie() };
    info!("✅ Menu active: {}", generator.mode());

    loop {
        match generator.poll() {
            Ok(true) => {
                debug!("🔘 {}", generator.mode());
            }
            Ok(false) => {}
            Err(_e) => {
                warn!("⚠️ {}", _e);
            }
        }
    }
}

// ========================================
// Interrupt Handlers
// ========================================

/// Poller tick; enabled only while the menu is active
#[no_mangle]
extern "C" fn SysTick() {
    board::take_tick();
    let raw = GpioPanel.read().unwrap_or(dds_core::Button::None);
    critical_section::with(|cs| {
        POLLER.borrow_ref_mut(cs).tick(raw, &LATCH);
    });
}

/// Button edges; enabled only while an output burst runs
#[no_mangle]
extern "C" fn EXTI15_10_IRQHandler() {
    if board::take_button_edges() {
        STOP.raise();
    }
}
