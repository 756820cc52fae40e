//! Host-only test harness (C13): a fully in-memory [`Hal`] implementation.
//!
//! Compiled for `cfg(test)`, or opt in via the `std` feature if a host
//! simulator or another crate's integration tests wants `MockHal` without
//! pulling in this crate's own test build. Neither path ships in a firmware
//! build.

use crate::hal::{AdcChannel, Hal, PinId, Pins, ADC_TIMEOUT_VALUE};

/// Capacity of the mock non-volatile byte store. Comfortably larger than the
/// 0x11 bytes the settings layout actually uses (§6).
const NVM_SIZE: usize = 64;

/// Default pin assignment used throughout the test suite: button A on pin 0,
/// button B on pin 1, signal out on pin 2.
pub const MOCK_PINS: Pins = Pins {
    button_a: 0,
    button_b: 1,
    signal_out: 2,
};

/// In-memory [`Hal`]: pin levels, a byte-array NVM store, and a settable
/// millisecond clock, all driven directly by test code rather than real
/// silicon.
pub struct MockHal {
    pins: Pins,
    pin_levels: [bool; 8],
    pin_state: [bool; 8],
    toggle_counts: [u32; 8],
    millis: u32,
    nvm: [u8; NVM_SIZE],
    adc_values: [u8; 8],
    adc_timeout: bool,
    watchdog_enabled: bool,
    watchdog_feeds: u32,
    initialized: bool,
}

impl MockHal {
    pub fn new() -> Self {
        MockHal {
            pins: MOCK_PINS,
            // Idle-high: buttons are active-low, so "not pressed" is a
            // logic-high raw level.
            pin_levels: [true; 8],
            pin_state: [false; 8],
            toggle_counts: [0; 8],
            millis: 0,
            nvm: [0xff; NVM_SIZE],
            adc_values: [ADC_TIMEOUT_VALUE; 8],
            adc_timeout: false,
            watchdog_enabled: false,
            watchdog_feeds: 0,
            initialized: false,
        }
    }

    pub fn with_pins(pins: Pins) -> Self {
        MockHal {
            pins,
            ..MockHal::new()
        }
    }

    /// Set the raw electrical level a subsequent `read_pin` will observe.
    /// `true` = high (released, for an active-low button).
    pub fn set_pin_level(&mut self, pin: PinId, high: bool) {
        self.pin_levels[pin as usize] = high;
    }

    /// Convenience: drive a button as pressed (`true`) or released
    /// (`false`), handling the active-low inversion for the caller.
    pub fn set_button_pressed(&mut self, pin: PinId, pressed: bool) {
        self.set_pin_level(pin, !pressed);
    }

    pub fn set_adc_value(&mut self, channel: AdcChannel, value: u8) {
        self.adc_values[channel as usize] = value;
    }

    /// Force every subsequent `read_adc` to report a conversion timeout
    /// (returning [`ADC_TIMEOUT_VALUE`] per the `Hal` contract).
    pub fn force_adc_timeout(&mut self, timeout: bool) {
        self.adc_timeout = timeout;
    }

    pub fn output_pin_state(&self, pin: PinId) -> bool {
        self.pin_state[pin as usize]
    }

    /// Number of times `toggle_pin` has flipped `pin` so far. Used by tests
    /// to check a blink cue fired the expected number of times without
    /// caring about the exact timing of each toggle.
    pub fn toggle_count(&self, pin: PinId) -> u32 {
        self.toggle_counts[pin as usize]
    }

    pub fn watchdog_enabled(&self) -> bool {
        self.watchdog_enabled
    }

    pub fn watchdog_feed_count(&self) -> u32 {
        self.watchdog_feeds
    }

    pub fn was_initialized(&self) -> bool {
        self.initialized
    }

    /// Wipe the non-volatile store back to an "erased flash" pattern
    /// (`0xff`), as a cold, never-programmed device would report.
    pub fn erase_nvm(&mut self) {
        self.nvm = [0xff; NVM_SIZE];
    }
}

impl Default for MockHal {
    fn default() -> Self {
        MockHal::new()
    }
}

impl Hal for MockHal {
    fn pins(&self) -> Pins {
        self.pins
    }

    fn pin_count(&self) -> PinId {
        8
    }

    fn init(&mut self) {
        self.initialized = true;
    }

    fn set_pin(&mut self, pin: PinId) {
        self.pin_state[pin as usize] = true;
    }

    fn clear_pin(&mut self, pin: PinId) {
        self.pin_state[pin as usize] = false;
    }

    fn toggle_pin(&mut self, pin: PinId) {
        self.pin_state[pin as usize] = !self.pin_state[pin as usize];
        self.toggle_counts[pin as usize] = self.toggle_counts[pin as usize].wrapping_add(1);
    }

    fn read_pin(&self, pin: PinId) -> bool {
        self.pin_levels[pin as usize]
    }

    fn init_timer(&mut self) {}

    fn millis(&self) -> u32 {
        self.millis
    }

    fn delay_ms(&mut self, ms: u32) {
        self.millis = self.millis.wrapping_add(ms);
    }

    fn advance_time(&mut self, ms: u32) {
        self.millis = self.millis.wrapping_add(ms);
    }

    fn reset_time(&mut self) {
        self.millis = 0;
    }

    fn read_byte(&self, addr: u16) -> u8 {
        self.nvm[addr as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.nvm[addr as usize] = value;
    }

    fn read_adc(&mut self, channel: AdcChannel) -> u8 {
        if self.adc_timeout {
            return ADC_TIMEOUT_VALUE;
        }
        self.adc_values[channel as usize]
    }

    fn enable_watchdog(&mut self) {
        self.watchdog_enabled = true;
    }

    fn reset_watchdog(&mut self) {
        self.watchdog_feeds = self.watchdog_feeds.wrapping_add(1);
    }

    fn disable_watchdog(&mut self) {
        self.watchdog_enabled = false;
    }
}
