//! Persistent settings store (C9): an 8-byte settings record backed by a
//! magic/schema/checksum-guarded image in the HAL's non-volatile byte
//! store, plus the factory-reset gesture that clears it.
//!
//! This module doubles as the crate's only configuration layer — see
//! `SPEC_FULL.md` §10. There is no file-based config format: the settings
//! record validated here *is* the schema.

use crate::hal::{Hal, Pins};

pub const MAGIC: u16 = 0x474B;
pub const SCHEMA_VERSION: u8 = 2;

const MAGIC_OFFSET: u16 = 0x00;
const SCHEMA_OFFSET: u16 = 0x02;
const SETTINGS_OFFSET: u16 = 0x03;
const CHECKSUM_OFFSET: u16 = 0x10;
const SETTINGS_LEN: usize = 8;

/// Exclusive upper bound for each settings field, in record order. `0`
/// means "unbounded" (the reserved byte).
pub(crate) const FIELD_BOUNDS: [u8; SETTINGS_LEN] = [
    5, // mode
    4, // trigger pulse index
    3, // trigger edge index
    4, // divide divisor index
    5, // cycle tempo index
    2, // toggle edge index
    2, // gate-A-mode index
    0, // reserved, no bound
];

/// The 8-byte settings record. All fields are small indices into a mode's
/// own lookup table (see `modes`), never raw physical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsRecord {
    pub mode: u8,
    pub trigger_pulse: u8,
    pub trigger_edge: u8,
    pub divide_divisor: u8,
    pub cycle_tempo: u8,
    pub toggle_edge: u8,
    pub gate_a_mode: u8,
    pub reserved: u8,
}

impl SettingsRecord {
    pub const fn defaults() -> Self {
        SettingsRecord {
            mode: 0,
            trigger_pulse: 0,
            trigger_edge: 0,
            divide_divisor: 0,
            cycle_tempo: 0,
            toggle_edge: 0,
            gate_a_mode: 0,
            reserved: 0,
        }
    }

    fn to_bytes(self) -> [u8; SETTINGS_LEN] {
        [
            self.mode,
            self.trigger_pulse,
            self.trigger_edge,
            self.divide_divisor,
            self.cycle_tempo,
            self.toggle_edge,
            self.gate_a_mode,
            self.reserved,
        ]
    }

    fn from_bytes(bytes: [u8; SETTINGS_LEN]) -> Self {
        SettingsRecord {
            mode: bytes[0],
            trigger_pulse: bytes[1],
            trigger_edge: bytes[2],
            divide_divisor: bytes[3],
            cycle_tempo: bytes[4],
            toggle_edge: bytes[5],
            gate_a_mode: bytes[6],
            reserved: bytes[7],
        }
    }

    /// Every field (except "reserved") is strictly less than its
    /// per-field upper bound.
    fn in_bounds(&self) -> bool {
        self.to_bytes()
            .iter()
            .zip(FIELD_BOUNDS.iter())
            .all(|(&value, &bound)| bound == 0 || value < bound)
    }
}

impl Default for SettingsRecord {
    fn default() -> Self {
        SettingsRecord::defaults()
    }
}

fn checksum(bytes: &[u8; SETTINGS_LEN]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    BadMagic,
    BadSchema,
    BadChecksum,
    OutOfRange,
}

/// Load and validate the settings record. Any of the four checks failing
/// short-circuits the rest and returns the corresponding [`LoadError`];
/// nothing is propagated as a panic.
pub fn load<H: Hal + ?Sized>(hal: &H) -> Result<SettingsRecord, LoadError> {
    if hal.read_word(MAGIC_OFFSET) != MAGIC {
        return Err(LoadError::BadMagic);
    }
    if hal.read_byte(SCHEMA_OFFSET) != SCHEMA_VERSION {
        return Err(LoadError::BadSchema);
    }
    let mut bytes = [0u8; SETTINGS_LEN];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = hal.read_byte(SETTINGS_OFFSET + i as u16);
    }
    if hal.read_byte(CHECKSUM_OFFSET) != checksum(&bytes) {
        return Err(LoadError::BadChecksum);
    }
    let record = SettingsRecord::from_bytes(bytes);
    if !record.in_bounds() {
        return Err(LoadError::OutOfRange);
    }
    Ok(record)
}

/// Write magic, schema, settings bytes, and checksum. The HAL contract
/// allows (but does not require) skipping a byte write whose value would
/// not change, so repeated saves of identical settings cost no wear.
pub fn save<H: Hal + ?Sized>(hal: &mut H, settings: &SettingsRecord) {
    hal.write_word(MAGIC_OFFSET, MAGIC);
    hal.write_byte(SCHEMA_OFFSET, SCHEMA_VERSION);
    let bytes = settings.to_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        hal.write_byte(SETTINGS_OFFSET + i as u16, b);
    }
    hal.write_byte(CHECKSUM_OFFSET, checksum(&bytes));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryResetResult {
    /// Buttons were not both held at the moment this was called.
    NotHeld,
    /// The millisecond timer did not advance across a 10 ms delay; bailed
    /// out before starting the hold-timer loop.
    TimerFault,
    /// Full 3 s hold observed, defaults written and the magic read back
    /// to confirm.
    Completed,
    /// Defaults were written but the magic did not read back correctly.
    WriteFailed,
}

const POLL_INTERVAL_MS: u32 = 50;
const BLINK_EVERY_N_POLLS: u32 = 2; // 2 * 50ms = 100ms
const HOLD_TARGET_MS: u32 = 3000;
const ITERATION_CAP: u32 = 80;

fn both_buttons_held<H: Hal + ?Sized>(hal: &H, pins: Pins) -> bool {
    !hal.read_pin(pins.button_a) && !hal.read_pin(pins.button_b)
}

/// Called once at startup. If both buttons are held from cold boot, polls
/// for a continuous 3 s hold (bounded by an iteration cap so a stuck
/// millisecond timer can never wedge this loop) and, on success, clears
/// the persisted settings back to defaults.
pub fn maybe_factory_reset<H: Hal + ?Sized>(hal: &mut H) -> FactoryResetResult {
    let pins = hal.pins();
    if !both_buttons_held(hal, pins) {
        return FactoryResetResult::NotHeld;
    }

    let before = hal.millis();
    hal.delay_ms(10);
    if hal.millis().wrapping_sub(before) < 10 {
        return FactoryResetResult::TimerFault;
    }

    let mut elapsed_ms = 0u32;
    let mut iterations = 0u32;
    while elapsed_ms < HOLD_TARGET_MS && iterations < ITERATION_CAP {
        if !both_buttons_held(hal, pins) {
            return FactoryResetResult::NotHeld;
        }
        hal.delay_ms(POLL_INTERVAL_MS);
        iterations += 1;
        if iterations % BLINK_EVERY_N_POLLS == 0 {
            hal.toggle_pin(pins.signal_out);
        }
        elapsed_ms += POLL_INTERVAL_MS;
    }
    if elapsed_ms < HOLD_TARGET_MS {
        return FactoryResetResult::NotHeld;
    }

    hal.write_word(MAGIC_OFFSET, 0x0000);
    save(hal, &SettingsRecord::defaults());
    if hal.read_word(MAGIC_OFFSET) == MAGIC {
        FactoryResetResult::Completed
    } else {
        FactoryResetResult::WriteFailed
    }
}
