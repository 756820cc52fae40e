//! CV hysteresis (C3): converts an 8-bit ADC sample into a digital level
//! through a Schmitt-trigger band, so a noisy analog signal hovering near a
//! single threshold doesn't chatter the digital output.
//!
//! ```text
//! ADC    255 ─┬─────────────────────────────
//!             │        high
//! high_thr ───┼────────────────●────────────   level -> high
//!             │       band   ╱
//!  low_thr ───┼──────●──────────────────────   level -> low
//!             │     low
//!    0    ────┴─────────────────────────────
//! ```
//!
//! Only a sample strictly above `high_threshold` can raise the level, and
//! only a sample strictly below `low_threshold` can lower it. Anything in
//! between — including the ADC's own timeout value — holds the level.

/// Default high threshold: ≈2.5 V on a 0..255 / 0..5V mapping.
pub const DEFAULT_HIGH_THRESHOLD: u8 = 128;
/// Default low threshold: ≈1.5 V.
pub const DEFAULT_LOW_THRESHOLD: u8 = 77;

/// Schmitt-trigger state for one CV input.
#[derive(Clone, Copy)]
pub struct CvHysteresis {
    high_threshold: u8,
    low_threshold: u8,
    last_sample: u8,
    level: bool,
}

impl CvHysteresis {
    /// Builds a hysteresis state with the given thresholds, starting low.
    ///
    /// `low < high` is required; callers configuring thresholds from
    /// persisted settings must validate this before constructing (the
    /// settings loader in C9 already enforces a narrower invariant that
    /// implies this one for the thresholds this core actually offers).
    pub const fn new(low_threshold: u8, high_threshold: u8) -> Self {
        CvHysteresis {
            high_threshold,
            low_threshold,
            last_sample: 0,
            level: false,
        }
    }

    pub const fn default_thresholds() -> Self {
        CvHysteresis::new(DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD)
    }

    pub fn high_threshold(&self) -> u8 {
        self.high_threshold
    }

    pub fn low_threshold(&self) -> u8 {
        self.low_threshold
    }

    pub fn last_sample(&self) -> u8 {
        self.last_sample
    }

    pub fn level(&self) -> bool {
        self.level
    }

    /// Apply one new ADC sample and return the (possibly unchanged) digital
    /// level.
    pub fn update(&mut self, adc_sample: u8) -> bool {
        self.last_sample = adc_sample;
        if !self.level && adc_sample > self.high_threshold {
            self.level = true;
        } else if self.level && adc_sample < self.low_threshold {
            self.level = false;
        }
        self.level
    }
}

impl Default for CvHysteresis {
    fn default() -> Self {
        CvHysteresis::default_thresholds()
    }
}
