//! Menu entries and their button bindings
//!
//! Each entry maps the six buttons to an [`Action`]. The table is resolved
//! once when the entry becomes active and then consulted for every press.

use crate::config::MAIN_MENU_LEN;
use crate::types::{Button, Shape};

/// Main menu entries
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MainMode {
    /// DDS output of a static table
    Signal(Shape),
    Noise,
    /// Hardware-timer square wave
    HighSpeed,
    Pwm,
    Sweep,
    Pulse,
    /// 1 kHz reference tone for trimming the calibration coefficient
    Calibration,
}

impl MainMode {
    /// Menu order
    pub const ALL: [MainMode; MAIN_MENU_LEN as usize] = [
        MainMode::Signal(Shape::Sine),
        MainMode::Signal(Shape::Square),
        MainMode::Signal(Shape::Triangle),
        MainMode::Signal(Shape::Sawtooth),
        MainMode::Signal(Shape::ReverseSawtooth),
        MainMode::Signal(Shape::Ecg),
        MainMode::Noise,
        MainMode::HighSpeed,
        MainMode::Pwm,
        MainMode::Sweep,
        MainMode::Pulse,
        MainMode::Calibration,
    ];

    /// Entry at `index`; out-of-range indices select the first entry
    pub fn from_index(index: u8) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or(Self::ALL[0])
    }

    pub fn index(&self) -> u8 {
        Self::ALL.iter().position(|m| m == self).unwrap_or(0) as u8
    }

    pub fn next(&self) -> Self {
        Self::from_index((self.index() + 1) % MAIN_MENU_LEN)
    }

    pub fn previous(&self) -> Self {
        Self::from_index((self.index() + MAIN_MENU_LEN - 1) % MAIN_MENU_LEN)
    }

    pub fn title(&self) -> &'static str {
        match self {
            MainMode::Signal(Shape::Sine) => "      Sine      ",
            MainMode::Signal(Shape::Square) => "     Square     ",
            MainMode::Signal(Shape::Triangle) => "    Triangle    ",
            MainMode::Signal(Shape::Sawtooth) => "    SawTooth    ",
            MainMode::Signal(Shape::ReverseSawtooth) => "  Rev SawTooth  ",
            MainMode::Signal(Shape::Ecg) => "      ECG       ",
            MainMode::Noise => "     Noise      ",
            MainMode::HighSpeed => "   High Speed   ",
            MainMode::Pwm => "      PWM       ",
            MainMode::Sweep => "     Sweep      ",
            MainMode::Pulse => "     Pulse      ",
            MainMode::Calibration => "  Calibration   ",
        }
    }

    pub fn bindings(&self) -> Bindings {
        let (left, right, start) = match self {
            MainMode::Signal(_) => (Action::FrequencyDown, Action::FrequencyUp, Action::ToggleRun),
            MainMode::Noise => (Action::Nothing, Action::Nothing, Action::ToggleRun),
            MainMode::HighSpeed => (Action::HsLower, Action::HsHigher, Action::ToggleRun),
            MainMode::Pwm => (Action::PwmSlower, Action::PwmFaster, Action::ToggleRun),
            MainMode::Sweep => (Action::SweepFieldDown, Action::SweepFieldUp, Action::SweepAdvance),
            MainMode::Pulse => (Action::PulseShorter, Action::PulseLonger, Action::FirePulse),
            MainMode::Calibration => {
                (Action::CalibrationDown, Action::CalibrationUp, Action::ToggleRun)
            }
        };
        let (up, down) = match self {
            MainMode::Pwm => (Action::DutyUp, Action::DutyDown),
            _ => (Action::Previous, Action::Next),
        };
        Bindings { up, down, left, right, start, options: Action::EnterOptions }
    }
}

/// Options menu entries
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OptionEntry {
    FreqStep,
    OffLevel,
}

impl OptionEntry {
    pub const ALL: [OptionEntry; 2] = [OptionEntry::FreqStep, OptionEntry::OffLevel];

    pub fn next(&self) -> Self {
        match self {
            OptionEntry::FreqStep => OptionEntry::OffLevel,
            OptionEntry::OffLevel => OptionEntry::FreqStep,
        }
    }

    /// Two entries, so stepping back is the same as stepping forward
    pub fn previous(&self) -> Self {
        self.next()
    }

    pub fn title(&self) -> &'static str {
        match self {
            OptionEntry::FreqStep => "    Freq Step   ",
            OptionEntry::OffLevel => "   Off Level    ",
        }
    }

    pub fn bindings(&self) -> Bindings {
        let (left, right) = match self {
            OptionEntry::FreqStep => (Action::StepDown, Action::StepUp),
            OptionEntry::OffLevel => (Action::OffLevelDown, Action::OffLevelUp),
        };
        Bindings {
            up: Action::Previous,
            down: Action::Next,
            left,
            right,
            start: Action::LeaveOptions,
            options: Action::LeaveOptions,
        }
    }
}

/// Operations a button can be bound to
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Nothing,
    /// Move up the active list (wrapping)
    Previous,
    /// Move down the active list (wrapping)
    Next,
    EnterOptions,
    LeaveOptions,
    /// Start generation, or stop it if running
    ToggleRun,
    FrequencyDown,
    FrequencyUp,
    StepDown,
    StepUp,
    OffLevelDown,
    OffLevelUp,
    CalibrationDown,
    CalibrationUp,
    HsLower,
    HsHigher,
    PwmSlower,
    PwmFaster,
    /// Duty +1 while running, otherwise `Previous`
    DutyUp,
    /// Duty -1 while running, otherwise `Next`
    DutyDown,
    /// Edit the field of the current sweep stage
    SweepFieldDown,
    SweepFieldUp,
    /// Next sweep stage, or run/stop on the last one
    SweepAdvance,
    PulseShorter,
    PulseLonger,
    FirePulse,
}

/// Per-entry button binding table
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Bindings {
    pub up: Action,
    pub down: Action,
    pub left: Action,
    pub right: Action,
    pub start: Action,
    pub options: Action,
}

impl Bindings {
    pub fn action(&self, button: Button) -> Action {
        match button {
            Button::None => Action::Nothing,
            Button::Up => self.up,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::Right => self.right,
            Button::Start => self.start,
            Button::Options => self.options,
        }
    }
}

/// Stages of the sweep entry
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepStage {
    #[default]
    StartFreq,
    EndFreq,
    Increment,
}

impl SweepStage {
    /// Tag shown at the end of the title row
    pub fn tag(&self) -> &'static str {
        match self {
            SweepStage::StartFreq => "Beg",
            SweepStage::EndFreq => "End",
            SweepStage::Increment => "Inc",
        }
    }
}
