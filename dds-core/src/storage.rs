//! Settings record codec for a byte-addressed store
//!
//! Multi-byte fields are little-endian. A sentinel byte in the last slot marks
//! a store that has been initialized; anything else is treated as a first
//! boot.

use crate::config::GeneratorConfig;
use crate::hal::{HalError, SettingsStore};
use crate::types::{HsFrequency, PulseDuration, PwmFrequency};

/// Bytes occupied by the record, sentinel included
pub const RECORD_LEN: usize = 64;
/// Value of an initialized sentinel
pub const SENTINEL: u8 = b'T';

const ADDR_MENU: usize = 0;
const ADDR_FREQ: usize = 1;
const ADDR_STEP: usize = 9;
const ADDR_CAL: usize = 17;
const ADDR_SWEEP_END: usize = 25;
const ADDR_SWEEP_INC: usize = 33;
const ADDR_HS: usize = 41;
const ADDR_PWM_FREQ: usize = 42;
const ADDR_PWM_DUTY: usize = 44;
const ADDR_OFF_LEVEL: usize = 45;
const ADDR_PULSE: usize = 46;
const ADDR_SENTINEL: usize = RECORD_LEN - 1;

/// Record image; slots between the fields and the sentinel stay erased
pub type Record = [u8; RECORD_LEN];

fn put_f64(rec: &mut Record, addr: usize, value: f64) {
    rec[addr..addr + 8].copy_from_slice(&value.to_le_bytes());
}

fn get_f64(rec: &Record, addr: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&rec[addr..addr + 8]);
    f64::from_le_bytes(raw)
}

fn put_u16(rec: &mut Record, addr: usize, value: u16) {
    rec[addr..addr + 2].copy_from_slice(&value.to_le_bytes());
}

fn get_u16(rec: &Record, addr: usize) -> u16 {
    u16::from_le_bytes([rec[addr], rec[addr + 1]])
}

/// Serialize a configuration, sentinel included
pub fn encode(cfg: &GeneratorConfig) -> Record {
    let mut rec = [0xFF; RECORD_LEN];
    rec[ADDR_MENU] = cfg.menu_entry;
    put_f64(&mut rec, ADDR_FREQ, cfg.frequency);
    put_f64(&mut rec, ADDR_STEP, cfg.frequency_step);
    put_f64(&mut rec, ADDR_CAL, cfg.calibration);
    put_f64(&mut rec, ADDR_SWEEP_END, cfg.sweep_end);
    put_f64(&mut rec, ADDR_SWEEP_INC, cfg.sweep_increment);
    rec[ADDR_HS] = cfg.hs_frequency.mhz();
    put_u16(&mut rec, ADDR_PWM_FREQ, cfg.pwm_frequency.hz());
    rec[ADDR_PWM_DUTY] = cfg.pwm_duty;
    rec[ADDR_OFF_LEVEL] = cfg.off_level;
    put_u16(&mut rec, ADDR_PULSE, cfg.pulse.code());
    rec[ADDR_SENTINEL] = SENTINEL;
    rec
}

/// Deserialize a record; `None` if the sentinel is missing.
/// The result is always within the clamped domain.
pub fn decode(rec: &Record) -> Option<GeneratorConfig> {
    if rec[ADDR_SENTINEL] != SENTINEL {
        return None;
    }
    let cfg = GeneratorConfig {
        frequency: get_f64(rec, ADDR_FREQ),
        frequency_step: get_f64(rec, ADDR_STEP),
        calibration: get_f64(rec, ADDR_CAL),
        sweep_end: get_f64(rec, ADDR_SWEEP_END),
        sweep_increment: get_f64(rec, ADDR_SWEEP_INC),
        hs_frequency: HsFrequency::from_mhz(rec[ADDR_HS]),
        pwm_frequency: PwmFrequency::from_hz(get_u16(rec, ADDR_PWM_FREQ)),
        pwm_duty: rec[ADDR_PWM_DUTY],
        off_level: rec[ADDR_OFF_LEVEL],
        pulse: PulseDuration::from_code(get_u16(rec, ADDR_PULSE)),
        menu_entry: rec[ADDR_MENU],
    };
    Some(cfg.sanitized())
}

fn read_record<S: SettingsStore>(store: &mut S) -> Result<Record, HalError> {
    let mut rec = [0u8; RECORD_LEN];
    for (addr, byte) in rec.iter_mut().enumerate() {
        *byte = store.read_byte(addr as u16)?;
    }
    Ok(rec)
}

/// Write the record, touching only bytes that differ from the stored ones.
/// Returns the number of bytes written.
pub fn save<S: SettingsStore>(store: &mut S, cfg: &GeneratorConfig) -> Result<usize, HalError> {
    let rec = encode(cfg);
    let mut written = 0;
    for (addr, &byte) in rec.iter().enumerate() {
        let addr = addr as u16;
        if store.read_byte(addr)? != byte {
            store.write_byte(addr, byte)?;
            written += 1;
        }
    }
    if written > 0 {
        store.commit()?;
    }
    Ok(written)
}

/// Result of loading the settings at boot
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Loaded {
    /// A valid record was found
    Restored(GeneratorConfig),
    /// The sentinel was missing; defaults were written
    Initialized(GeneratorConfig),
}

impl Loaded {
    pub fn config(&self) -> GeneratorConfig {
        match self {
            Loaded::Restored(cfg) | Loaded::Initialized(cfg) => *cfg,
        }
    }
}

/// Load the settings, initializing the store with defaults on first boot
pub fn load<S: SettingsStore>(store: &mut S) -> Result<Loaded, HalError> {
    if let Some(cfg) = decode(&read_record(store)?) {
        return Ok(Loaded::Restored(cfg));
    }
    save(store, &GeneratorConfig::default())?;
    // Read back what was written
    let cfg = decode(&read_record(store)?).ok_or(HalError::StorageError)?;
    Ok(Loaded::Initialized(cfg))
}
