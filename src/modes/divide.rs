//! Divide mode: a mod-N rising-edge counter that emits one short pulse per
//! full cycle, sharing trigger mode's pulse-duration table.

use super::trigger::PULSE_DURATIONS_MS;

/// Divisor values, indexed by the divide-divisor setting.
pub const DIVISORS: [u8; 4] = [2, 4, 8, 24];

#[derive(Clone, Copy)]
pub struct DivideState {
    output: bool,
    prev_input: bool,
    counter: u8,
    divisor: u8,
    pulse_start: u32,
    pulse_duration_ms: u32,
}

impl DivideState {
    pub const fn new() -> Self {
        DivideState {
            output: false,
            prev_input: false,
            counter: 0,
            divisor: DIVISORS[0],
            pulse_start: 0,
            pulse_duration_ms: PULSE_DURATIONS_MS[0],
        }
    }

    pub fn init(&mut self, divisor_index: u8, pulse_index: u8) {
        self.output = false;
        self.prev_input = false;
        self.counter = 0;
        self.divisor = DIVISORS[divisor_index as usize % DIVISORS.len()];
        self.pulse_duration_ms = PULSE_DURATIONS_MS[pulse_index as usize % PULSE_DURATIONS_MS.len()];
    }

    pub fn process(&mut self, now: u32, input: bool) -> bool {
        let rising = input && !self.prev_input;
        if rising {
            self.counter = self.counter.wrapping_add(1);
            if self.counter % self.divisor == 0 {
                self.output = true;
                self.pulse_start = now;
            }
        }
        if self.output && now.wrapping_sub(self.pulse_start) >= self.pulse_duration_ms {
            self.output = false;
        }
        self.prev_input = input;
        self.output
    }

    pub fn output(&self) -> bool {
        self.output
    }
}

impl Default for DivideState {
    fn default() -> Self {
        DivideState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_two_pulses_on_every_other_edge() {
        let mut divide = DivideState::new();
        divide.init(0, 0); // /2, 10ms pulse
        assert!(!divide.process(0, true));
        assert!(!divide.process(10, false));
        assert!(divide.process(20, true));
        assert!(divide.process(29, true)); // still within the 10ms pulse
        assert!(!divide.process(30, true));
    }

    #[test]
    fn scenario_7_divide_by_24_with_short_pulse() {
        let mut divide = DivideState::new();
        divide.init(3, 0); // /24, 10ms pulse
        let mut now = 0u32;
        for edge in 1..=24u32 {
            now += 20; // 20ms between rising edges
            let fired = divide.process(now, true);
            now += 10; // falling edge mid-cycle, arbitrary
            divide.process(now, false);
            if edge < 24 {
                assert!(!fired, "edge {} should not pulse", edge);
            } else {
                assert!(fired, "edge 24 must pulse");
            }
        }
        // The pulse must have fully decayed by the time the 25th edge
        // (the first edge of the next cycle) arrives.
        now += 20;
        assert!(!divide.process(now, true));
    }
}
