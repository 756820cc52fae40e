//! The narrow capability set the core consumes from hardware, or a mock.
//!
//! Everything in this module is a contract, not an implementation: no
//! concrete microcontroller is named here, and nothing in this crate links
//! against a chip-specific HAL. A board-bring-up crate implements [`Hal`]
//! against its own pins, timer and non-volatile store and hands the value to
//! [`crate::startup::startup`].

/// Opaque small integer identifying a digital I/O line.
///
/// The core never interprets this beyond equality; only a concrete `Hal`
/// implementation maps it to a physical pin.
pub type PinId = u8;

/// Opaque small integer identifying an ADC channel.
pub type AdcChannel = u8;

/// Value an ADC read returns when the underlying conversion times out.
///
/// Mid-scale by construction lies inside the default CV hysteresis band
/// (§4.2), so a timeout silently holds the current digital level.
pub const ADC_TIMEOUT_VALUE: u8 = 128;

/// The three named pins this core drives or reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    pub button_a: PinId,
    pub button_b: PinId,
    pub signal_out: PinId,
}

/// Hardware (or mock) capability set consumed by the core.
///
/// Buttons are active-low: [`Hal::read_pin`] returns the raw electrical
/// level, and callers invert it to obtain "pressed". The core performs that
/// inversion; `Hal` impls must not.
pub trait Hal {
    /// The three pins this device needs: button A, button B, signal out.
    fn pins(&self) -> Pins;

    /// Exclusive upper bound on valid pin numbers, used for init-time sanity
    /// checks. A `PinId` read via [`Hal::pins`] that is `>= pin_count` is
    /// invalid and must be rejected by the caller (guard-and-drop, §7).
    fn pin_count(&self) -> PinId;

    /// One-time bring-up: pin directions, pull-ups, timer, ADC.
    fn init(&mut self);

    fn set_pin(&mut self, pin: PinId);
    fn clear_pin(&mut self, pin: PinId);
    fn toggle_pin(&mut self, pin: PinId);
    /// Raw level of `pin`. Active-low buttons read 0 when pressed; the
    /// caller, not this method, inverts that into "pressed".
    fn read_pin(&self, pin: PinId) -> bool;

    fn init_timer(&mut self);
    /// Milliseconds since boot. Monotonic; wraps after ~49 days, which every
    /// consumer in this crate tolerates by differencing with
    /// [`u32::wrapping_sub`].
    fn millis(&self) -> u32;
    fn delay_ms(&mut self, ms: u32);

    /// Test-only: advance the mock clock. Real hardware ignores this or
    /// never implements it meaningfully; production `Hal` impls backed by a
    /// free-running timer have no use for it.
    fn advance_time(&mut self, _ms: u32) {}
    /// Test-only: reset the mock clock to 0.
    fn reset_time(&mut self) {}

    fn read_byte(&self, addr: u16) -> u8;
    fn write_byte(&mut self, addr: u16, value: u8);
    /// Little-endian: returns `(high as u16) << 8 | low as u16`, where `low`
    /// is the byte at `addr` and `high` is the byte at `addr + 1`.
    fn read_word(&self, addr: u16) -> u16 {
        let low = self.read_byte(addr) as u16;
        let high = self.read_byte(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }
    /// Little-endian: writes the low byte at `addr`, the high byte at
    /// `addr + 1`.
    fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, (value & 0xff) as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Read an 8-bit ADC channel. Contract: on conversion timeout, return
    /// [`ADC_TIMEOUT_VALUE`] rather than blocking or erroring.
    fn read_adc(&mut self, channel: AdcChannel) -> u8;

    fn enable_watchdog(&mut self);
    fn reset_watchdog(&mut self);
    fn disable_watchdog(&mut self);
}
