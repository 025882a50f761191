//! Button poller and the state it shares with the foreground
//!
//! The poller runs from the periodic tick interrupt. It is the only writer of
//! the latched button; the foreground dispatcher is the only code that marks
//! a press as processed.

use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::types::Button;

/// Nominal tick period in microseconds (about 4 ms)
pub const TICK_PERIOD_US: u32 = 4096;
/// Ticks a new state is held before a release is trusted
pub const UNBOUNCE_TICKS: u16 = 20;
/// Ticks before the first auto-repeat
pub const AUTO_REPEAT_START_TICKS: u16 = 100;
/// Ticks between subsequent auto-repeats
pub const AUTO_REPEAT_TICKS: u16 = 8;
/// Half the tick counter range; deadlines further away than this are in the past
pub const TIME_WRAP: u16 = 0x8000;

/// True once `now` is strictly past `deadline` on the wrapping tick counter
#[inline]
pub const fn passed(now: u16, deadline: u16) -> bool {
    deadline.wrapping_sub(now) >= TIME_WRAP
}

/// Button record shared between the tick interrupt and the foreground
pub struct ButtonLatch {
    pressed: AtomicU8,
    processed: AtomicBool,
    ticks: AtomicU16,
}

impl ButtonLatch {
    pub const fn new() -> Self {
        Self {
            pressed: AtomicU8::new(Button::None as u8),
            processed: AtomicBool::new(true),
            ticks: AtomicU16::new(0),
        }
    }

    /// Currently latched button
    pub fn pressed(&self) -> Button {
        Button::from_u8(self.pressed.load(Ordering::Acquire))
    }

    /// Take the latched press if it has not been handled yet
    pub fn take_unprocessed(&self) -> Option<Button> {
        if self.processed.swap(true, Ordering::AcqRel) {
            return None;
        }
        match self.pressed() {
            Button::None => None,
            button => Some(button),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed.load(Ordering::Acquire)
    }

    /// Number of poller ticks seen so far (wrapping)
    pub fn tick_count(&self) -> u16 {
        self.ticks.load(Ordering::Acquire)
    }

    fn latch(&self, button: Button) {
        self.pressed.store(button as u8, Ordering::Release);
        self.processed.store(false, Ordering::Release);
    }

    fn repeat(&self) {
        self.processed.store(false, Ordering::Release);
    }

    fn bump_tick(&self) {
        self.ticks.store(self.ticks.load(Ordering::Relaxed).wrapping_add(1), Ordering::Release);
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Debounce and auto-repeat state owned by the tick handler
#[derive(Debug, Clone)]
pub struct ButtonPoller {
    now: u16,
    pressed_until: u16,
    next_auto: u16,
}

impl ButtonPoller {
    pub const fn new() -> Self {
        Self { now: 0, pressed_until: 0, next_auto: 0 }
    }

    /// Current tick counter value
    pub fn now(&self) -> u16 {
        self.now
    }

    /// Process one tick with the freshly sampled button
    pub fn tick(&mut self, raw: Button, latch: &ButtonLatch) {
        self.now = self.now.wrapping_add(1);
        let now = self.now;
        let latched = latch.pressed();

        if latched != raw {
            // Release bounce inside the hold window is not a release
            if raw.is_none() && !passed(now, self.pressed_until) {
                latch.bump_tick();
                return;
            }
            latch.latch(raw);
            self.pressed_until = now.wrapping_add(UNBOUNCE_TICKS);
            self.next_auto = now.wrapping_add(AUTO_REPEAT_START_TICKS);
        } else if !latched.is_none() && passed(now, self.next_auto) {
            latch.repeat();
            self.next_auto = now.wrapping_add(AUTO_REPEAT_TICKS);
        }
        latch.bump_tick();
    }
}

impl Default for ButtonPoller {
    fn default() -> Self {
        Self::new()
    }
}
