#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # DDS Core
//!
//! Function generator core logic library for embedded systems.
//! Direct digital synthesis of table waveforms, noise, PWM and sweeps behind
//! a button and character display menu.

pub mod types;
pub mod config;
pub mod input;
pub mod waveform;
pub mod dds;
pub mod storage;
pub mod display;
pub mod menu;
pub mod controller;
pub mod hal;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;


pub use types::*;
pub use config::GeneratorConfig;
pub use controller::Generator;
pub use dds::{DdsTiming, PhaseIncrement, SampleEngine, SoftwareEngine, StopFlag, SweepOutcome, SweepPlan};
pub use hal::*;
pub use input::{ButtonLatch, ButtonPoller};
pub use menu::{Action, MainMode, OptionEntry, SweepStage};
pub use waveform::WaveBuffer;

/// Generator library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings used on first boot
pub fn default_config() -> GeneratorConfig {
    GeneratorConfig::default()
}
