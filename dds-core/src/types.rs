//! Core data types for the function generator

/// Front panel buttons
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    /// Nothing pressed
    None = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Left = 4,
    Start = 5,
    /// Options (enter/leave the options menu)
    Options = 6,
}

impl Button {
    /// Scan order used by the poller: the first asserted line wins
    pub const PRIORITY: [Button; 6] = [
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
        Button::Start,
        Button::Options,
    ];

    /// Decode the value stored in an atomic byte
    pub const fn from_u8(raw: u8) -> Button {
        match raw {
            1 => Button::Up,
            2 => Button::Right,
            3 => Button::Down,
            4 => Button::Left,
            5 => Button::Start,
            6 => Button::Options,
            _ => Button::None,
        }
    }

    /// Pick the highest-priority asserted line.
    ///
    /// `asserted` is indexed in [`Button::PRIORITY`] order.
    pub fn from_levels(asserted: [bool; 6]) -> Button {
        for (button, down) in Self::PRIORITY.iter().zip(asserted) {
            if down {
                return *button;
            }
        }
        Button::None
    }

    pub const fn is_none(&self) -> bool {
        matches!(self, Button::None)
    }
}

/// Static waveform shapes stored as 256-entry tables
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    ReverseSawtooth,
    Ecg,
}

/// Rate of the hardware square wave on the high-speed line, in MHz
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HsFrequency(u8);

impl HsFrequency {
    pub const MIN_MHZ: u8 = 1;
    pub const MAX_MHZ: u8 = 8;

    /// Accepts 1, 2, 4 or 8; anything else falls back to 1 MHz
    pub const fn from_mhz(mhz: u8) -> Self {
        match mhz {
            1 | 2 | 4 | 8 => Self(mhz),
            _ => Self(Self::MIN_MHZ),
        }
    }

    pub const fn mhz(&self) -> u8 {
        self.0
    }

    /// Halve the rate, wrapping 1 MHz around to 8 MHz
    pub const fn lower(&self) -> Self {
        if self.0 == Self::MIN_MHZ {
            Self(Self::MAX_MHZ)
        } else {
            Self(self.0 / 2)
        }
    }

    /// Double the rate, wrapping 8 MHz around to 1 MHz
    pub const fn higher(&self) -> Self {
        if self.0 == Self::MAX_MHZ {
            Self(Self::MIN_MHZ)
        } else {
            Self(self.0 * 2)
        }
    }
}

impl Default for HsFrequency {
    fn default() -> Self {
        Self(Self::MIN_MHZ)
    }
}

/// PWM repetition rates. The set mirrors the prescaler steps of an 8-bit
/// timer clocked at 16 MHz.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmFrequency {
    Hz61,
    Hz244,
    Hz976,
    Hz7813,
    Hz62500,
}

impl PwmFrequency {
    const ORDER: [PwmFrequency; 5] = [
        PwmFrequency::Hz61,
        PwmFrequency::Hz244,
        PwmFrequency::Hz976,
        PwmFrequency::Hz7813,
        PwmFrequency::Hz62500,
    ];

    /// Nominal value stored in the settings record
    pub const fn hz(&self) -> u16 {
        match self {
            PwmFrequency::Hz61 => 61,
            PwmFrequency::Hz244 => 244,
            PwmFrequency::Hz976 => 976,
            PwmFrequency::Hz7813 => 7813,
            PwmFrequency::Hz62500 => 62500,
        }
    }

    /// Exact rate shown on the display
    pub const fn exact_hz(&self) -> f64 {
        match self {
            PwmFrequency::Hz61 => 61.04,
            PwmFrequency::Hz244 => 244.14,
            PwmFrequency::Hz976 => 976.56,
            PwmFrequency::Hz7813 => 7812.50,
            PwmFrequency::Hz62500 => 62500.00,
        }
    }

    /// Decode a stored value; unknown values map to the fastest rate
    pub const fn from_hz(hz: u16) -> Self {
        match hz {
            61 => PwmFrequency::Hz61,
            244 => PwmFrequency::Hz244,
            976 => PwmFrequency::Hz976,
            7813 => PwmFrequency::Hz7813,
            _ => PwmFrequency::Hz62500,
        }
    }

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    /// Next rate, wrapping from the fastest to the slowest
    pub fn next(&self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    /// Previous rate, wrapping from the slowest to the fastest
    pub fn previous(&self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

impl Default for PwmFrequency {
    fn default() -> Self {
        PwmFrequency::Hz62500
    }
}

/// Pulse length selection for the Pulse mode
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseDuration {
    /// One full-scale sample, then back to the off level
    Minimum,
    /// Full scale for the given number of milliseconds
    Millis(u16),
    /// Full scale for as long as Start is held
    Hold,
    /// Each Start flips the output between full scale and the off level
    Toggle,
}

impl PulseDuration {
    /// Timed steps, in milliseconds, between `Minimum` and `Hold`
    pub const LADDER_MS: [u16; 12] = [1, 2, 5, 10, 20, 50, 100, 200, 500, 1000, 2000, 5000];

    pub const CODE_MINIMUM: u16 = 0;
    pub const CODE_HOLD: u16 = 0xFFFE;
    pub const CODE_TOGGLE: u16 = 0xFFFF;

    /// Every selectable value, shortest first
    fn rank(&self) -> usize {
        match self {
            PulseDuration::Minimum => 0,
            PulseDuration::Millis(ms) => {
                // Off-ladder values rank with the next longer step
                let idx = Self::LADDER_MS
                    .iter()
                    .position(|step| step >= ms)
                    .unwrap_or(Self::LADDER_MS.len() - 1);
                idx + 1
            }
            PulseDuration::Hold => Self::LADDER_MS.len() + 1,
            PulseDuration::Toggle => Self::LADDER_MS.len() + 2,
        }
    }

    fn from_rank(rank: usize) -> Self {
        let ladder = Self::LADDER_MS.len();
        match rank {
            0 => PulseDuration::Minimum,
            r if r <= ladder => PulseDuration::Millis(Self::LADDER_MS[r - 1]),
            r if r == ladder + 1 => PulseDuration::Hold,
            _ => PulseDuration::Toggle,
        }
    }

    /// One step longer; `Toggle` is the upper bound
    pub fn longer(&self) -> Self {
        Self::from_rank((self.rank() + 1).min(Self::LADDER_MS.len() + 2))
    }

    /// One step shorter; `Minimum` is the lower bound
    pub fn shorter(&self) -> Self {
        Self::from_rank(self.rank().saturating_sub(1))
    }

    /// Encoding used by the settings record
    pub const fn code(&self) -> u16 {
        match self {
            PulseDuration::Minimum => Self::CODE_MINIMUM,
            PulseDuration::Millis(ms) => *ms,
            PulseDuration::Hold => Self::CODE_HOLD,
            PulseDuration::Toggle => Self::CODE_TOGGLE,
        }
    }

    /// Decode a stored value, snapping unknown lengths onto the ladder
    pub fn from_code(code: u16) -> Self {
        match code {
            Self::CODE_MINIMUM => PulseDuration::Minimum,
            Self::CODE_HOLD => PulseDuration::Hold,
            Self::CODE_TOGGLE => PulseDuration::Toggle,
            ms => Self::from_rank(PulseDuration::Millis(ms).rank()),
        }
    }
}

impl Default for PulseDuration {
    fn default() -> Self {
        PulseDuration::Millis(10)
    }
}
