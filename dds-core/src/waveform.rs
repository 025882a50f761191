//! Waveform tables and the aligned working buffer
//!
//! Every table holds one period in 256 samples; 0 and 255 are the DAC rails.

use crate::types::Shape;

/// Samples per period
pub const TABLE_LEN: usize = 256;

/// One period of a waveform
pub type Table = [u8; TABLE_LEN];

pub static SINE: Table = [
    0x80, 0x83, 0x86, 0x89, 0x8c, 0x8f, 0x92, 0x95, 0x98, 0x9c, 0x9f, 0xa2, 0xa5, 0xa8, 0xab, 0xae,
    0xb0, 0xb3, 0xb6, 0xb9, 0xbc, 0xbf, 0xc1, 0xc4, 0xc7, 0xc9, 0xcc, 0xce, 0xd1, 0xd3, 0xd5, 0xd8,
    0xda, 0xdc, 0xde, 0xe0, 0xe2, 0xe4, 0xe6, 0xe8, 0xea, 0xec, 0xed, 0xef, 0xf0, 0xf2, 0xf3, 0xf5,
    0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfc, 0xfd, 0xfe, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xfe, 0xfd, 0xfc, 0xfc, 0xfb, 0xfa, 0xf9, 0xf8, 0xf7,
    0xf6, 0xf5, 0xf3, 0xf2, 0xf0, 0xef, 0xed, 0xec, 0xea, 0xe8, 0xe6, 0xe4, 0xe2, 0xe0, 0xde, 0xdc,
    0xda, 0xd8, 0xd5, 0xd3, 0xd1, 0xce, 0xcc, 0xc9, 0xc7, 0xc4, 0xc1, 0xbf, 0xbc, 0xb9, 0xb6, 0xb3,
    0xb0, 0xae, 0xab, 0xa8, 0xa5, 0xa2, 0x9f, 0x9c, 0x98, 0x95, 0x92, 0x8f, 0x8c, 0x89, 0x86, 0x83,
    0x80, 0x7c, 0x79, 0x76, 0x73, 0x70, 0x6d, 0x6a, 0x67, 0x63, 0x60, 0x5d, 0x5a, 0x57, 0x54, 0x51,
    0x4f, 0x4c, 0x49, 0x46, 0x43, 0x40, 0x3e, 0x3b, 0x38, 0x36, 0x33, 0x31, 0x2e, 0x2c, 0x2a, 0x27,
    0x25, 0x23, 0x21, 0x1f, 0x1d, 0x1b, 0x19, 0x17, 0x15, 0x13, 0x12, 0x10, 0x0f, 0x0d, 0x0c, 0x0a,
    0x09, 0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x03, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x02, 0x03, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
    0x09, 0x0a, 0x0c, 0x0d, 0x0f, 0x10, 0x12, 0x13, 0x15, 0x17, 0x19, 0x1b, 0x1d, 0x1f, 0x21, 0x23,
    0x25, 0x27, 0x2a, 0x2c, 0x2e, 0x31, 0x33, 0x36, 0x38, 0x3b, 0x3e, 0x40, 0x43, 0x46, 0x49, 0x4c,
    0x4f, 0x51, 0x54, 0x57, 0x5a, 0x5d, 0x60, 0x63, 0x67, 0x6a, 0x6d, 0x70, 0x73, 0x76, 0x79, 0x7c,
];

/// Heartbeat-like shape
pub static ECG: Table = [
    0x49, 0x4a, 0x4b, 0x4b, 0x4a, 0x49, 0x49, 0x49, 0x49, 0x48, 0x47, 0x45, 0x44, 0x43, 0x43, 0x43,
    0x44, 0x44, 0x43, 0x41, 0x3e, 0x3d, 0x3b, 0x39, 0x38, 0x37, 0x37, 0x36, 0x36, 0x36, 0x37, 0x37,
    0x37, 0x37, 0x37, 0x37, 0x36, 0x35, 0x33, 0x32, 0x31, 0x31, 0x34, 0x3d, 0x4d, 0x65, 0x84, 0xa9,
    0xcf, 0xee, 0xff, 0xfe, 0xea, 0xc6, 0x9a, 0x6d, 0x44, 0x25, 0x11, 0x05, 0x00, 0x01, 0x06, 0x0d,
    0x14, 0x1c, 0x24, 0x2d, 0x34, 0x39, 0x3d, 0x40, 0x41, 0x42, 0x43, 0x44, 0x44, 0x45, 0x46, 0x47,
    0x47, 0x47, 0x47, 0x47, 0x47, 0x47, 0x47, 0x48, 0x48, 0x48, 0x49, 0x49, 0x4a, 0x4b, 0x4b, 0x4c,
    0x4d, 0x4e, 0x4f, 0x50, 0x51, 0x52, 0x53, 0x54, 0x56, 0x58, 0x5b, 0x5d, 0x60, 0x62, 0x64, 0x66,
    0x68, 0x6b, 0x6d, 0x70, 0x73, 0x76, 0x79, 0x7b, 0x7d, 0x7e, 0x7f, 0x7f, 0x7f, 0x7f, 0x7f, 0x7e,
    0x7d, 0x7c, 0x79, 0x77, 0x74, 0x71, 0x6d, 0x69, 0x66, 0x62, 0x5f, 0x5c, 0x59, 0x57, 0x54, 0x51,
    0x4f, 0x4d, 0x4c, 0x4b, 0x4a, 0x49, 0x48, 0x46, 0x45, 0x44, 0x43, 0x43, 0x43, 0x44, 0x44, 0x44,
    0x45, 0x45, 0x45, 0x45, 0x45, 0x45, 0x45, 0x46, 0x47, 0x48, 0x49, 0x49, 0x4a, 0x4a, 0x4b, 0x4b,
    0x4b, 0x4b, 0x4b, 0x4b, 0x4a, 0x4a, 0x49, 0x49, 0x49, 0x49, 0x48, 0x48, 0x48, 0x47, 0x47, 0x47,
    0x47, 0x47, 0x47, 0x47, 0x46, 0x46, 0x46, 0x45, 0x45, 0x45, 0x45, 0x45, 0x46, 0x46, 0x46, 0x45,
    0x44, 0x44, 0x43, 0x43, 0x43, 0x43, 0x42, 0x42, 0x42, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41,
    0x41, 0x40, 0x40, 0x3f, 0x3f, 0x40, 0x40, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x40, 0x40,
    0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x41, 0x41, 0x41, 0x42, 0x43, 0x44, 0x45, 0x47, 0x48, 0x49,
];

/// Fixed pseudo-random sequence walked by the noise loop
pub static NOISE: Table = [
    0x0a, 0x0e, 0x2d, 0x73, 0xc4, 0x40, 0xaa, 0x8f, 0xdd, 0xf3, 0x6b, 0x97, 0xb9, 0x8d, 0x77, 0x57,
    0xe3, 0x52, 0x93, 0x3f, 0x25, 0x07, 0x99, 0x5f, 0x8b, 0x37, 0x30, 0x7b, 0x3a, 0x89, 0xc6, 0xae,
    0x4e, 0x58, 0xe4, 0x4b, 0x48, 0x05, 0xd6, 0xf2, 0x5c, 0x44, 0xef, 0xf8, 0x69, 0xf6, 0x92, 0x56,
    0x1d, 0x96, 0xab, 0x2f, 0x88, 0x35, 0xf5, 0x36, 0x83, 0xfc, 0x8e, 0x60, 0xe0, 0xda, 0xa8, 0x5b,
    0xdf, 0x7e, 0x4d, 0x3b, 0x38, 0x91, 0x2b, 0xfa, 0x21, 0xc2, 0x23, 0x0d, 0x2e, 0xce, 0x3c, 0xb6,
    0x03, 0x32, 0xed, 0x86, 0xe6, 0x0f, 0x55, 0x6a, 0x34, 0xb8, 0x70, 0x45, 0x49, 0x9b, 0x76, 0xbc,
    0x18, 0x5a, 0x41, 0x46, 0x28, 0xfd, 0x2c, 0xb0, 0xea, 0xb2, 0xde, 0x65, 0xbb, 0x10, 0x59, 0xf1,
    0x9d, 0xb7, 0x29, 0xd4, 0xeb, 0x42, 0x85, 0x6f, 0x39, 0xd5, 0x26, 0x90, 0x7f, 0xa7, 0xe8, 0xd9,
    0x98, 0xc1, 0x8c, 0x11, 0x62, 0xad, 0x81, 0x66, 0x0c, 0x5d, 0x19, 0x01, 0x1e, 0xc8, 0x87, 0xe1,
    0x2a, 0xd2, 0x24, 0xd1, 0x43, 0xe7, 0x4f, 0x68, 0xc0, 0xaf, 0x5e, 0x9e, 0x84, 0xe2, 0x50, 0xcb,
    0x1a, 0xc3, 0xb4, 0x74, 0x04, 0xac, 0x64, 0xa0, 0x13, 0xd3, 0x31, 0x00, 0x9c, 0xfe, 0x4a, 0xb3,
    0x78, 0x15, 0x3e, 0xee, 0x94, 0x7c, 0x1c, 0x72, 0xa1, 0x20, 0x9f, 0x95, 0xcf, 0x3d, 0x82, 0xb5,
    0xbd, 0x54, 0xa6, 0x47, 0x6e, 0x75, 0xc7, 0x1b, 0xd7, 0x09, 0x16, 0xf0, 0x12, 0x02, 0xb1, 0x06,
    0x4c, 0xcd, 0xa9, 0xa2, 0x6c, 0xa5, 0x61, 0xca, 0x7d, 0x1f, 0x22, 0x17, 0x14, 0xc5, 0xd8, 0x6d,
    0x8a, 0xf7, 0x51, 0xa3, 0xfb, 0xf4, 0x63, 0xbf, 0x79, 0xc9, 0x27, 0xec, 0x7a, 0x9a, 0xbe, 0x80,
    0xff, 0xe5, 0xba, 0xcc, 0x0b, 0xdb, 0xdc, 0xf9, 0x67, 0xe9, 0xa4, 0x08, 0xd0, 0x71, 0x33, 0x53,
];

/// Sine rotated to start at its lowest sample. Sweep and calibration bursts
/// use it so every burst begins at the bottom rail.
pub static SINE_FROM_ZERO: Table = rotate(&SINE, SINE_ZERO_OFFSET);

const SINE_ZERO_OFFSET: usize = 187;

pub static SQUARE: Table = square();
pub static TRIANGLE: Table = triangle();
pub static SAWTOOTH: Table = sawtooth();
pub static REVERSE_SAWTOOTH: Table = reverse_sawtooth();

const fn rotate(src: &Table, by: usize) -> Table {
    let mut out = [0u8; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        out[i] = src[(i + by) % TABLE_LEN];
        i += 1;
    }
    out
}

const fn square() -> Table {
    let mut out = [0u8; TABLE_LEN];
    let mut i = TABLE_LEN / 2;
    while i < TABLE_LEN {
        out[i] = 0xFF;
        i += 1;
    }
    out
}

const fn triangle() -> Table {
    let mut out = [0u8; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        out[i] = if i < TABLE_LEN / 2 { (2 * i) as u8 } else { (255 - 2 * (i - TABLE_LEN / 2)) as u8 };
        i += 1;
    }
    out
}

const fn sawtooth() -> Table {
    let mut out = [0u8; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        out[i] = i as u8;
        i += 1;
    }
    out
}

const fn reverse_sawtooth() -> Table {
    let mut out = [0u8; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        out[i] = 255 - i as u8;
        i += 1;
    }
    out
}

/// Table for a static shape
pub fn table_for(shape: Shape) -> &'static Table {
    match shape {
        Shape::Sine => &SINE,
        Shape::Square => &SQUARE,
        Shape::Triangle => &TRIANGLE,
        Shape::Sawtooth => &SAWTOOTH,
        Shape::ReverseSawtooth => &REVERSE_SAWTOOTH,
        Shape::Ecg => &ECG,
    }
}

/// Working buffer read by the output loop.
///
/// The 256-byte alignment lets the loop form a sample address by replacing
/// the low byte of the buffer address with the table index.
#[repr(C, align(256))]
pub struct WaveBuffer {
    samples: Table,
}

impl WaveBuffer {
    pub const fn new() -> Self {
        Self { samples: [0; TABLE_LEN] }
    }

    /// Copy a period into the buffer
    pub fn load(&mut self, table: &Table) {
        self.samples.copy_from_slice(table);
    }

    /// Pulse train: the first `duty + 1` samples at full scale, the rest at zero
    pub fn fill_duty(&mut self, duty: u8) {
        let high = duty as usize + 1;
        self.samples[..high].fill(0xFF);
        self.samples[high..].fill(0);
    }

    pub fn samples(&self) -> &Table {
        &self.samples
    }

    /// Base address for the hand-written loops
    pub fn as_ptr(&self) -> *const u8 {
        self.samples.as_ptr()
    }
}

impl Default for WaveBuffer {
    fn default() -> Self {
        Self::new()
    }
}
