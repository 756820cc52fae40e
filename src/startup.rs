//! Bring-up sequence (C10): the six steps run once at power-on before the
//! main loop starts calling [`Coordinator::update`] (§4.9).

use crate::coordinator::Coordinator;
use crate::hal::{Hal, PinId};
use crate::settings::{self, FactoryResetResult, SettingsRecord};

/// Duration of one on/off half-cycle in the settings-load-failure cue.
const DEFAULTS_BLINK_MS: u32 = 100;
/// Pause between the two blink pairs in the settings-load-failure cue.
const DEFAULTS_PAIR_GAP_MS: u32 = 200;
/// Duration of one toggle in the factory-reset-write-failure cue.
const WRITE_FAILED_TOGGLE_MS: u32 = 50;
const WRITE_FAILED_TOGGLE_COUNT: u32 = 10;

/// Settings-load failure cue (§7): "briefly blinks the signal-out LED...
/// double pair of ~100 ms blinks" — two pairs of two blinks, net even
/// toggle count so the pin returns to the level it started at.
fn blink_defaults_cue<H: Hal + ?Sized>(hal: &mut H, pin: PinId) {
    for pair in 0..2 {
        for _ in 0..2 {
            hal.toggle_pin(pin);
            hal.delay_ms(DEFAULTS_BLINK_MS);
            hal.toggle_pin(pin);
            hal.delay_ms(DEFAULTS_BLINK_MS);
        }
        if pair == 0 {
            hal.delay_ms(DEFAULTS_PAIR_GAP_MS);
        }
    }
}

/// Factory-reset write-back failure cue (§7): "signals with ten rapid
/// toggles of the output LED".
fn blink_write_failed_cue<H: Hal + ?Sized>(hal: &mut H, pin: PinId) {
    for _ in 0..WRITE_FAILED_TOGGLE_COUNT {
        hal.toggle_pin(pin);
        hal.delay_ms(WRITE_FAILED_TOGGLE_MS);
    }
}

/// Outcome of [`startup`], also reported to the user directly: `startup`
/// itself blinks the signal-out LED for the two failure cases named in §7
/// before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupResult {
    /// Settings loaded and validated from non-volatile storage.
    Ok,
    /// No valid settings were found (first boot, or a corrupt image); ran
    /// on in-memory defaults without rewriting storage.
    OkDefaults,
    /// The factory-reset gesture was held through bring-up; defaults were
    /// written back and are now in use.
    OkFactoryReset,
    /// The factory-reset gesture was held but the write-back could not be
    /// confirmed; running on in-memory defaults regardless.
    FactoryResetFailed,
}

/// Run the six-step bring-up sequence and return a ready-to-run
/// [`Coordinator`] plus a [`StartupResult`] describing how settings ended
/// up.
///
/// 1. `hal.init()` — pin directions, pull-ups.
/// 2. `hal.init_timer()` — start the millisecond clock.
/// 3. Poll for the factory-reset gesture (§4.8); if held through its full
///    window, defaults are written back to storage.
/// 4. Load settings, falling back to defaults on any [`LoadError`].
/// 5. Build and [`Coordinator::start`] the coordinator.
/// 6. `hal.enable_watchdog()`.
pub fn startup<H: Hal + ?Sized>(hal: &mut H) -> (Coordinator, StartupResult) {
    hal.init();
    hal.init_timer();
    let pins = hal.pins();

    let reset_outcome = settings::maybe_factory_reset(hal);
    let mut result = match reset_outcome {
        FactoryResetResult::Completed => StartupResult::OkFactoryReset,
        FactoryResetResult::WriteFailed => StartupResult::FactoryResetFailed,
        FactoryResetResult::NotHeld | FactoryResetResult::TimerFault => StartupResult::Ok,
    };
    if result == StartupResult::FactoryResetFailed {
        blink_write_failed_cue(hal, pins.signal_out);
    }

    let settings = match settings::load(hal) {
        Ok(record) => record,
        Err(_) => {
            if result == StartupResult::Ok {
                result = StartupResult::OkDefaults;
                blink_defaults_cue(hal, pins.signal_out);
            }
            SettingsRecord::defaults()
        }
    };

    let now = hal.millis();
    let mut coordinator = Coordinator::new(pins, settings, now);
    coordinator.start();

    hal.enable_watchdog();

    (coordinator, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHal;

    #[test]
    fn cold_boot_with_erased_nvm_falls_back_to_defaults() {
        let mut hal = MockHal::new();
        hal.erase_nvm();
        let (coordinator, result) = startup(&mut hal);
        assert_eq!(result, StartupResult::OkDefaults);
        assert_eq!(coordinator.mode(), 0);
        assert!(hal.watchdog_enabled());
        assert!(hal.was_initialized());
    }

    #[test]
    fn boot_with_valid_settings_reports_ok_and_restores_mode() {
        let mut hal = MockHal::new();
        let mut saved = SettingsRecord::defaults();
        saved.mode = 3;
        settings::save(&mut hal, &saved);
        let (coordinator, result) = startup(&mut hal);
        assert_eq!(result, StartupResult::Ok);
        assert_eq!(coordinator.mode(), 3);
    }

    #[test]
    fn factory_reset_gesture_held_through_boot_is_reported() {
        let mut hal = MockHal::new();
        let mut saved = SettingsRecord::defaults();
        saved.mode = 3;
        settings::save(&mut hal, &saved);
        let pins = hal.pins();
        hal.set_button_pressed(pins.button_a, true);
        hal.set_button_pressed(pins.button_b, true);
        let (coordinator, result) = startup(&mut hal);
        assert_eq!(result, StartupResult::OkFactoryReset);
        assert_eq!(coordinator.mode(), 0);
    }

    #[test]
    fn settings_load_failure_blinks_signal_out_four_times() {
        let mut hal = MockHal::new();
        hal.erase_nvm();
        let pins = hal.pins();
        startup(&mut hal);
        // Two pairs of two blinks, two toggles per blink.
        assert_eq!(hal.toggle_count(pins.signal_out), 8);
        // Net-even toggle count: the pin is back at its starting level.
        assert!(!hal.output_pin_state(pins.signal_out));
    }

    #[test]
    fn valid_settings_on_first_boot_never_blinks() {
        let mut hal = MockHal::new();
        let saved = SettingsRecord::defaults();
        settings::save(&mut hal, &saved);
        let pins = hal.pins();
        startup(&mut hal);
        assert_eq!(hal.toggle_count(pins.signal_out), 0);
    }

    /// Delegates everything to an inner `MockHal` except that writes to the
    /// two magic-number bytes are silently dropped, so a factory reset's
    /// write-back confirmation always fails.
    struct JammedMagicHal(MockHal);

    impl Hal for JammedMagicHal {
        fn pins(&self) -> crate::hal::Pins {
            self.0.pins()
        }
        fn pin_count(&self) -> PinId {
            self.0.pin_count()
        }
        fn init(&mut self) {
            self.0.init()
        }
        fn set_pin(&mut self, pin: PinId) {
            self.0.set_pin(pin)
        }
        fn clear_pin(&mut self, pin: PinId) {
            self.0.clear_pin(pin)
        }
        fn toggle_pin(&mut self, pin: PinId) {
            self.0.toggle_pin(pin)
        }
        fn read_pin(&self, pin: PinId) -> bool {
            self.0.read_pin(pin)
        }
        fn init_timer(&mut self) {
            self.0.init_timer()
        }
        fn millis(&self) -> u32 {
            self.0.millis()
        }
        fn delay_ms(&mut self, ms: u32) {
            self.0.delay_ms(ms)
        }
        fn read_byte(&self, addr: u16) -> u8 {
            self.0.read_byte(addr)
        }
        fn write_byte(&mut self, addr: u16, value: u8) {
            if addr == 0x00 || addr == 0x01 {
                return;
            }
            self.0.write_byte(addr, value)
        }
        fn read_adc(&mut self, channel: crate::hal::AdcChannel) -> u8 {
            self.0.read_adc(channel)
        }
        fn enable_watchdog(&mut self) {
            self.0.enable_watchdog()
        }
        fn reset_watchdog(&mut self) {
            self.0.reset_watchdog()
        }
        fn disable_watchdog(&mut self) {
            self.0.disable_watchdog()
        }
    }

    #[test]
    fn factory_reset_write_failure_blinks_signal_out_ten_times() {
        let mut hal = JammedMagicHal(MockHal::new());
        let pins = hal.0.pins();
        hal.0.set_button_pressed(pins.button_a, true);
        hal.0.set_button_pressed(pins.button_b, true);
        let (_, result) = startup(&mut hal);
        assert_eq!(result, StartupResult::FactoryResetFailed);
        // `maybe_factory_reset`'s own 3 s hold loop toggles this pin once
        // every 100 ms while it waits (30 toggles over 60 polls); this
        // cue's 10 toggles land on top of that.
        assert_eq!(hal.0.toggle_count(pins.signal_out), 40);
    }
}
