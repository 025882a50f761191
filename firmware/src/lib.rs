#![no_std]

//! Board support for the CH32V203 DDS function generator
//!
//! Register-level drivers for the collaborators of [`dds_core::Generator`]
//! and the hand-written output loops.

pub mod board;
pub mod delay;
pub mod engine;
pub mod flash_store;
pub mod lcd;
pub mod registers;

pub use board::Board;
pub use engine::{AsmEngine, FIRMWARE_TIMING};
