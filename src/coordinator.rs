//! Coordinator (C6): owns the three FSMs, the event processor, CV
//! hysteresis, both buttons, the active mode context and the settings
//! record, and drives all of it from a single `update()` called once per
//! tick (§4.5).
//!
//! Every FSM action is a plain `fn(&mut Coordinator)` (§9, "global pointer
//! replaced by context passing"). Because `Coordinator` owns the `Fsm`
//! instances it hands itself to, each `process`/`start` call first copies
//! the relevant `Fsm` out of `self` into a local (cheap — it's a handful of
//! `'static` slice references and two bytes), calls through the local
//! copy, then writes the (possibly advanced) copy back. This sidesteps
//! the self-referential borrow that `self.top_fsm.process(self, ...)`
//! would otherwise require, without reaching for interior mutability or
//! unsafe aliasing.

use crate::button::Button;
use crate::cv::CvHysteresis;
use crate::event::{Event, EventInput, EventProcessor};
use crate::fsm::{Fsm, State, StateId, Transition, ANY_STATE, NO_TRANSITION};
use crate::hal::{AdcChannel, Hal, Pins};
use crate::led::LedDescriptor;
use crate::modes::{ModeContext, MODE_COUNT, MODE_GATE};
use crate::settings::{self, SettingsRecord, FIELD_BOUNDS};

#[cfg(feature = "diagnostics")]
use crate::diagnostics;

const CV_ADC_CHANNEL: AdcChannel = 0;
const MENU_TIMEOUT_MS: u32 = 60_000;
const MENU_PAGE_COUNT: u8 = 8;
const GATE_A_MODE_MANUAL: u8 = 1;

pub const TOP_PERFORM: StateId = 0;
pub const TOP_MENU: StateId = 1;

/// Entry page for each mode, indexed by mode id (§4.5's enter-menu action).
const ENTRY_PAGE_FOR_MODE: [StateId; MODE_COUNT as usize] = [0, 1, 3, 4, 5];

static TOP_STATES: [State<Coordinator>; 2] = [State::new(TOP_PERFORM), State::new(TOP_MENU)];

static TOP_TRANSITIONS: [Transition<Coordinator>; 4] = [
    Transition::new(TOP_PERFORM, Event::MenuToggle.id(), TOP_MENU).with_action(enter_menu),
    Transition::new(TOP_MENU, Event::MenuToggle.id(), TOP_PERFORM).with_action(exit_menu),
    Transition::new(TOP_MENU, Event::Timeout.id(), TOP_PERFORM).with_action(exit_menu),
    Transition::new(TOP_MENU, Event::AHold.id(), TOP_PERFORM).with_action(exit_menu),
];

static MODE_STATES: [State<Coordinator>; MODE_COUNT as usize] = [
    State::new(0),
    State::new(1),
    State::new(2),
    State::new(3),
    State::new(4),
];

static MODE_TRANSITIONS: [Transition<Coordinator>; 1] =
    [Transition::new(ANY_STATE, Event::ModeNext.id(), NO_TRANSITION).with_action(cycle_next_mode)];

static MENU_STATES: [State<Coordinator>; MENU_PAGE_COUNT as usize] = [
    State::new(0),
    State::new(1),
    State::new(2),
    State::new(3),
    State::new(4),
    State::new(5),
    State::new(6),
    State::new(7),
];

static MENU_TRANSITIONS: [Transition<Coordinator>; 2] = [
    Transition::new(ANY_STATE, Event::ATap.id(), NO_TRANSITION).with_action(next_page),
    Transition::new(ANY_STATE, Event::BTap.id(), NO_TRANSITION).with_action(cycle_value),
];

pub struct Coordinator {
    top_fsm: Fsm<Coordinator>,
    mode_fsm: Fsm<Coordinator>,
    menu_fsm: Fsm<Coordinator>,
    events: EventProcessor,
    cv: CvHysteresis,
    button_a: Button,
    button_b: Button,
    mode_ctx: ModeContext,
    settings: SettingsRecord,
    pins: Pins,
    output: bool,
    now: u32,
    last_activity: u32,
    pending_save: bool,
    #[cfg(feature = "diagnostics")]
    log: diagnostics::Log,
}

impl Coordinator {
    pub fn new(pins: Pins, settings: SettingsRecord, now: u32) -> Self {
        Coordinator {
            top_fsm: Fsm::new(&TOP_STATES, &TOP_TRANSITIONS, TOP_PERFORM),
            mode_fsm: Fsm::new(&MODE_STATES, &MODE_TRANSITIONS, settings.mode % MODE_COUNT),
            menu_fsm: Fsm::new(&MENU_STATES, &MENU_TRANSITIONS, 0),
            events: EventProcessor::new(),
            cv: CvHysteresis::default_thresholds(),
            button_a: Button::new(pins.button_a),
            button_b: Button::new(pins.button_b),
            mode_ctx: ModeContext::for_mode(settings.mode, &settings, now),
            settings,
            pins,
            output: false,
            now,
            last_activity: now,
            pending_save: false,
            #[cfg(feature = "diagnostics")]
            log: diagnostics::Log::new(),
        }
    }

    /// Activate all three FSMs. Called once from startup.
    pub fn start(&mut self) {
        let mut top_fsm = self.top_fsm;
        top_fsm.start(self);
        self.top_fsm = top_fsm;

        let mut mode_fsm = self.mode_fsm;
        mode_fsm.start(self);
        self.mode_fsm = mode_fsm;

        let mut menu_fsm = self.menu_fsm;
        menu_fsm.start(self);
        self.menu_fsm = menu_fsm;
    }

    pub fn top_state(&self) -> StateId {
        self.top_fsm.current()
    }

    pub fn in_menu(&self) -> bool {
        self.top_fsm.current() == TOP_MENU
    }

    pub fn mode(&self) -> u8 {
        self.mode_ctx.mode_id()
    }

    pub fn menu_page(&self) -> u8 {
        self.menu_fsm.current()
    }

    pub fn output_bit(&self) -> bool {
        self.output
    }

    pub fn cv_level(&self) -> bool {
        self.cv.level()
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    #[cfg(feature = "diagnostics")]
    pub fn diagnostics_log(&self) -> &diagnostics::Log {
        &self.log
    }

    pub fn led_descriptor(&self) -> LedDescriptor {
        let page = self.menu_fsm.current();
        let (value, count) = setting_value_and_count(&self.settings, page);
        LedDescriptor {
            mode: self.mode_ctx.mode_id(),
            page,
            in_menu: self.in_menu(),
            setting_value: value,
            setting_count: count,
            activity_output: self.output,
            activity_brightness: self.mode_ctx.activity_brightness(),
        }
    }

    /// Run one tick: read inputs, route at most one event, persist
    /// settings if the routing just exited the menu, drive the active
    /// mode handler, and mirror its output onto the signal pin.
    pub fn update<H: Hal + ?Sized>(&mut self, hal: &mut H) {
        self.now = hal.millis();

        let adc = hal.read_adc(CV_ADC_CHANNEL);
        let cv_level = self.cv.update(adc);

        self.button_a.update(hal, self.now);
        self.button_b.update(hal, self.now);
        let a_pressed = self.button_a.pressed();
        let b_pressed = self.button_b.pressed();

        let event = self.events.update(EventInput {
            a_pressed,
            b_pressed,
            cv_high: cv_level,
            now: self.now,
        });

        if !event.is_none() {
            self.push_event(event);
            if self.in_menu() {
                self.last_activity = self.now;
            }

            let mut top_fsm = self.top_fsm;
            let top_changed = top_fsm.process(self, event.id());
            self.top_fsm = top_fsm;
            if top_changed {
                self.push_transition(0, self.top_fsm.current());
            }

            if !top_changed {
                if self.in_menu() {
                    let mut menu_fsm = self.menu_fsm;
                    menu_fsm.process(self, event.id());
                    self.menu_fsm = menu_fsm;
                } else {
                    let mut mode_fsm = self.mode_fsm;
                    mode_fsm.process(self, event.id());
                    self.mode_fsm = mode_fsm;
                }
            }
        }

        if self.in_menu() && self.now.wrapping_sub(self.last_activity) >= MENU_TIMEOUT_MS {
            let mut top_fsm = self.top_fsm;
            let changed = top_fsm.process(self, Event::Timeout.id());
            self.top_fsm = top_fsm;
            if changed {
                self.push_transition(0, self.top_fsm.current());
            }
        }

        if self.pending_save {
            settings::save(hal, &self.settings);
            self.pending_save = false;
        }

        let input_bit = self.mode_input_bit(a_pressed, b_pressed, cv_level);
        self.output = self.mode_ctx.process(self.now, input_bit);

        if self.output {
            hal.set_pin(self.pins.signal_out);
        } else {
            hal.clear_pin(self.pins.signal_out);
        }
        hal.reset_watchdog();
    }

    fn mode_input_bit(&self, a_pressed: bool, b_pressed: bool, cv_level: bool) -> bool {
        if self.in_menu() {
            return cv_level;
        }
        let mut bit = cv_level || (b_pressed && !a_pressed);
        if self.mode_ctx.mode_id() == MODE_GATE && self.settings.gate_a_mode == GATE_A_MODE_MANUAL {
            bit = bit || a_pressed;
        }
        bit
    }

    #[cfg(feature = "diagnostics")]
    fn push_event(&mut self, event: Event) {
        self.log.push(diagnostics::Record {
            tick: self.now,
            kind: diagnostics::Kind::EventEmitted,
            a: event.id(),
            b: 0,
            c: 0,
        });
    }
    #[cfg(not(feature = "diagnostics"))]
    fn push_event(&mut self, _event: Event) {}

    #[cfg(feature = "diagnostics")]
    fn push_transition(&mut self, component: u8, new_state: StateId) {
        self.log.push(diagnostics::Record {
            tick: self.now,
            kind: diagnostics::Kind::FsmTransitioned,
            a: component,
            b: new_state,
            c: 0,
        });
    }
    #[cfg(not(feature = "diagnostics"))]
    fn push_transition(&mut self, _component: u8, _new_state: StateId) {}
}

fn enter_menu(c: &mut Coordinator) {
    let mode = c.mode_ctx.mode_id();
    c.last_activity = c.now;
    let entry_page = ENTRY_PAGE_FOR_MODE[mode as usize % MODE_COUNT as usize];
    c.menu_fsm.force_state(entry_page);
}

fn exit_menu(c: &mut Coordinator) {
    c.settings.mode = c.mode_ctx.mode_id();
    c.pending_save = true;
}

fn cycle_next_mode(c: &mut Coordinator) {
    let next = (c.mode_ctx.mode_id() + 1) % MODE_COUNT;
    c.settings.mode = next;
    c.mode_ctx = ModeContext::for_mode(next, &c.settings, c.now);
    c.last_activity = c.now;
}

fn next_page(c: &mut Coordinator) {
    let next = (c.menu_fsm.current() + 1) % MENU_PAGE_COUNT;
    c.menu_fsm.force_state(next);
    c.last_activity = c.now;
}

fn cycle_value(c: &mut Coordinator) {
    let page = c.menu_fsm.current();
    advance_setting_for_page(&mut c.settings, page);
    if page_governs_mode(page, c.mode_ctx.mode_id()) {
        let settings = c.settings;
        let now = c.now;
        c.mode_ctx.reinit(&settings, now);
    }
    c.last_activity = c.now;
}

fn next_value(current: u8, bound: u8) -> u8 {
    if bound == 0 {
        current
    } else {
        (current + 1) % bound
    }
}

/// Pages 6 and 7 (the two global options named in §6) have no backing
/// byte in this settings schema version — `reserved` is kept untouched
/// for a future one — so cycling their value is a no-op for now.
fn advance_setting_for_page(settings: &mut SettingsRecord, page: u8) {
    match page {
        0 => settings.gate_a_mode = next_value(settings.gate_a_mode, FIELD_BOUNDS[6]),
        1 => settings.trigger_edge = next_value(settings.trigger_edge, FIELD_BOUNDS[2]),
        2 => settings.trigger_pulse = next_value(settings.trigger_pulse, FIELD_BOUNDS[1]),
        3 => settings.toggle_edge = next_value(settings.toggle_edge, FIELD_BOUNDS[5]),
        4 => settings.divide_divisor = next_value(settings.divide_divisor, FIELD_BOUNDS[3]),
        5 => settings.cycle_tempo = next_value(settings.cycle_tempo, FIELD_BOUNDS[4]),
        _ => {}
    }
}

fn setting_value_and_count(settings: &SettingsRecord, page: u8) -> (u8, u8) {
    match page {
        0 => (settings.gate_a_mode, FIELD_BOUNDS[6]),
        1 => (settings.trigger_edge, FIELD_BOUNDS[2]),
        2 => (settings.trigger_pulse, FIELD_BOUNDS[1]),
        3 => (settings.toggle_edge, FIELD_BOUNDS[5]),
        4 => (settings.divide_divisor, FIELD_BOUNDS[3]),
        5 => (settings.cycle_tempo, FIELD_BOUNDS[4]),
        _ => (0, 1),
    }
}

fn page_governs_mode(page: u8, mode: u8) -> bool {
    matches!((page, mode), (1, 1) | (2, 1) | (3, 2) | (4, 3) | (5, 4))
}
