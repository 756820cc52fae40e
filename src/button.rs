//! Debounced button (C2): converts a raw, active-low pin sample into a
//! stable pressed/released level plus single-tick edge flags.
//!
//! The debounce algorithm is edge-triggered rather than sample-counting: a
//! transition is reported immediately, and then suppressed from re-firing
//! until a guard window has elapsed, rather than waiting out the guard
//! window before reporting at all. This keeps press/release latency at one
//! tick instead of the guard period, at the cost of a little more
//! bookkeeping per edge:
//!
//! ```text
//! Raw     ______________/  \/\/\/________________
//!                       ^              ^
//! Debounced____________/               \__________
//!                       | <- 5ms guard ->|
//! ```
//!
//! A rising edge is only honored if at least 5 ms have passed since the
//! *previous* rising edge (not since the previous edge of either polarity),
//! so a clean press-then-release pair inside one guard window is never
//! suppressed by the same timer — see [`Button::update`].

use crate::hal::{Hal, PinId};

bitflags::bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ButtonFlags: u8 {
        const RAW               = 0b0000_0001;
        const DEBOUNCED          = 0b0000_0010;
        const PREV_DEBOUNCED     = 0b0000_0100;
        const RISING_THIS_TICK   = 0b0000_1000;
        const FALLING_THIS_TICK  = 0b0001_0000;
        /// Retired gesture bit, kept only so the flag word's layout matches
        /// the original firmware's and unused by this core.
        const LEGACY_A           = 0b0010_0000;
        /// Retired gesture bit, kept only so the flag word's layout matches
        /// the original firmware's and unused by this core.
        const LEGACY_B           = 0b0100_0000;
    }
}

/// Minimum time between two rising edges (and, independently, between two
/// falling edges) for either to be honored.
pub const DEBOUNCE_GUARD_MS: u32 = 5;

/// Debounced state of a single momentary button.
#[derive(Clone, Copy)]
pub struct Button {
    pin: PinId,
    flags: ButtonFlags,
    last_rising_edge: u32,
    last_falling_edge: u32,
}

impl Button {
    pub const fn new(pin: PinId) -> Self {
        // Seed both guards as though the last edge of each polarity happened
        // `DEBOUNCE_GUARD_MS` before boot, so a genuine edge at tick 0 is
        // never suppressed by an unsatisfied guard against a phantom edge
        // at time 0.
        let seeded = 0u32.wrapping_sub(DEBOUNCE_GUARD_MS);
        Button {
            pin,
            flags: ButtonFlags::empty(),
            last_rising_edge: seeded,
            last_falling_edge: seeded,
        }
    }

    pub fn pin(&self) -> PinId {
        self.pin
    }

    /// Sample the pin through `hal`, apply the debounce guard, and update
    /// edge flags for this tick.
    pub fn update<H: Hal + ?Sized>(&mut self, hal: &H, now: u32) {
        let raw_pressed = !hal.read_pin(self.pin);
        self.flags.set(ButtonFlags::RAW, raw_pressed);

        self.flags
            .remove(ButtonFlags::RISING_THIS_TICK | ButtonFlags::FALLING_THIS_TICK);

        let was_debounced = self.flags.contains(ButtonFlags::DEBOUNCED);
        if raw_pressed
            && !was_debounced
            && now.wrapping_sub(self.last_rising_edge) >= DEBOUNCE_GUARD_MS
        {
            self.flags.insert(ButtonFlags::DEBOUNCED);
            self.flags.insert(ButtonFlags::RISING_THIS_TICK);
            self.last_rising_edge = now;
        } else if !raw_pressed
            && was_debounced
            && now.wrapping_sub(self.last_falling_edge) >= DEBOUNCE_GUARD_MS
        {
            self.flags.remove(ButtonFlags::DEBOUNCED);
            self.flags.insert(ButtonFlags::FALLING_THIS_TICK);
            self.last_falling_edge = now;
        }

        self.flags.set(
            ButtonFlags::PREV_DEBOUNCED,
            self.flags.contains(ButtonFlags::DEBOUNCED),
        );
    }

    pub fn pressed(&self) -> bool {
        self.flags.contains(ButtonFlags::DEBOUNCED)
    }

    pub fn rising_edge(&self) -> bool {
        self.flags.contains(ButtonFlags::RISING_THIS_TICK)
    }

    pub fn falling_edge(&self) -> bool {
        self.flags.contains(ButtonFlags::FALLING_THIS_TICK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHal;

    #[test]
    fn rising_edge_is_deferred_for_5ms_guard() {
        let mut hal = MockHal::new();
        hal.set_pin_level(0, true); // idle high (not pressed, active-low)
        let mut button = Button::new(0);
        button.update(&hal, 0);
        assert!(!button.pressed());

        hal.set_pin_level(0, false); // pressed
        button.update(&hal, 0);
        assert!(button.pressed());
        assert!(button.rising_edge());

        // A second press attempt inside the guard window must not re-fire.
        hal.set_pin_level(0, true);
        button.update(&hal, 1);
        hal.set_pin_level(0, false);
        button.update(&hal, 2);
        assert!(!button.rising_edge());
    }

    #[test]
    fn clean_press_then_release_in_one_guard_window_is_not_suppressed() {
        let mut hal = MockHal::new();
        hal.set_pin_level(0, true);
        let mut button = Button::new(0);
        button.update(&hal, 0);

        hal.set_pin_level(0, false);
        button.update(&hal, 100);
        assert!(button.rising_edge());
        assert!(button.pressed());

        hal.set_pin_level(0, true);
        button.update(&hal, 102); // only 2ms later, but falling guard is independent
        assert!(button.falling_edge());
        assert!(!button.pressed());
    }

    #[test]
    fn falling_edge_respects_its_own_guard() {
        let mut hal = MockHal::new();
        hal.set_pin_level(0, false);
        let mut button = Button::new(0);
        button.update(&hal, 0);
        assert!(button.pressed());

        hal.set_pin_level(0, true);
        button.update(&hal, 0);
        assert!(button.falling_edge());

        hal.set_pin_level(0, false);
        button.update(&hal, 1);
        hal.set_pin_level(0, true);
        button.update(&hal, 2);
        assert!(!button.falling_edge());

        button.update(&hal, 5);
        hal.set_pin_level(0, false);
        button.update(&hal, 6);
        hal.set_pin_level(0, true);
        button.update(&hal, 7);
        assert!(button.falling_edge());
    }
}
