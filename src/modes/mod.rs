//! Mode handlers (C7): the five output behaviors selectable in PERFORM.
//!
//! [`ModeContext`] is a tagged union with exactly one active variant at a
//! time; switching modes replaces the whole value through [`ModeContext::for_mode`]
//! rather than allocating a new one, so memory is reused in place (§9,
//! "no heap").

pub mod cycle;
pub mod divide;
pub mod gate;
pub mod toggle;
pub mod trigger;

use crate::settings::SettingsRecord;

pub const MODE_COUNT: u8 = 5;

pub const MODE_GATE: u8 = 0;
pub const MODE_TRIGGER: u8 = 1;
pub const MODE_TOGGLE: u8 = 2;
pub const MODE_DIVIDE: u8 = 3;
pub const MODE_CYCLE: u8 = 4;

#[derive(Clone, Copy)]
pub enum ModeContext {
    Gate(gate::GateState),
    Trigger(trigger::TriggerState),
    Toggle(toggle::ToggleState),
    Divide(divide::DivideState),
    Cycle(cycle::CycleState),
}

impl ModeContext {
    /// Build and initialize a fresh context for `mode`, reading whichever
    /// settings fields that mode's handler cares about.
    pub fn for_mode(mode: u8, settings: &SettingsRecord, now: u32) -> Self {
        let mut ctx = match mode % MODE_COUNT {
            MODE_GATE => ModeContext::Gate(gate::GateState::new()),
            MODE_TRIGGER => ModeContext::Trigger(trigger::TriggerState::new()),
            MODE_TOGGLE => ModeContext::Toggle(toggle::ToggleState::new()),
            MODE_DIVIDE => ModeContext::Divide(divide::DivideState::new()),
            _ => ModeContext::Cycle(cycle::CycleState::new()),
        };
        ctx.reinit(settings, now);
        ctx
    }

    /// Re-run the active variant's `init` from the current settings,
    /// without changing which variant is active. Used when a setting that
    /// governs the live mode changes (§4.5's "cycle-value" action).
    pub fn reinit(&mut self, settings: &SettingsRecord, now: u32) {
        match self {
            ModeContext::Gate(s) => s.init(),
            ModeContext::Trigger(s) => s.init(settings.trigger_pulse, settings.trigger_edge),
            ModeContext::Toggle(s) => s.init(settings.toggle_edge),
            ModeContext::Divide(s) => s.init(settings.divide_divisor, settings.trigger_pulse),
            ModeContext::Cycle(s) => s.init(settings.cycle_tempo, now),
        }
    }

    pub fn process(&mut self, now: u32, input: bool) -> bool {
        match self {
            ModeContext::Gate(s) => s.process(input),
            ModeContext::Trigger(s) => s.process(now, input),
            ModeContext::Toggle(s) => s.process(input),
            ModeContext::Divide(s) => s.process(now, input),
            ModeContext::Cycle(s) => s.process(now),
        }
    }

    pub fn output(&self) -> bool {
        match self {
            ModeContext::Gate(s) => s.output(),
            ModeContext::Trigger(s) => s.output(),
            ModeContext::Toggle(s) => s.output(),
            ModeContext::Divide(s) => s.output(),
            ModeContext::Cycle(s) => s.output(),
        }
    }

    /// Brightness for the activity LED. Cycle mode supplies a continuous
    /// triangle-wave ramp; every other mode just reflects its binary
    /// output at full or zero brightness.
    pub fn activity_brightness(&self) -> u8 {
        match self {
            ModeContext::Cycle(s) => s.phase(),
            _ => {
                if self.output() {
                    255
                } else {
                    0
                }
            }
        }
    }

    pub fn mode_id(&self) -> u8 {
        match self {
            ModeContext::Gate(_) => MODE_GATE,
            ModeContext::Trigger(_) => MODE_TRIGGER,
            ModeContext::Toggle(_) => MODE_TOGGLE,
            ModeContext::Divide(_) => MODE_DIVIDE,
            ModeContext::Cycle(_) => MODE_CYCLE,
        }
    }
}
