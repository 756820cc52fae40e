//! Generic table-driven state machine (C5).
//!
//! An [`Fsm`] is parameterized by two immutable, `'static` tables — states
//! and transitions — plus a current-state id. Actions are associated
//! functions `fn(&mut C)` rather than nullary function pointers plus a
//! global context pointer: the FSM engine is handed `&mut C` for the
//! duration of each call and threads it through to whichever action fires
//! (§9, "Global pointer replaced by context passing").
//!
//! Two sentinel ids have special meaning in a transition's `from`/`to`
//! fields: [`ANY_STATE`] on the "from" side matches any current state
//! (wildcard), and [`NO_TRANSITION`] on the "to" side means "run the
//! action but do not change state".
//!
//! Table rows are small `Copy` structs so searching the table never holds a
//! long-lived reference into it — on a target where code and data memory
//! need distinct read intrinsics, a row is always read out by copy before
//! inspection.

pub type StateId = u8;
pub type EventId = u8;

/// Wildcard "from" id: a transition with this `from` matches any current
/// state.
pub const ANY_STATE: StateId = StateId::MAX;
/// Wildcard "to" id: a transition with this `to` runs its action without
/// changing the current state.
pub const NO_TRANSITION: StateId = StateId::MAX - 1;

pub type Action<C> = fn(&mut C);

/// One state in the table: its id and the (optional) actions run on enter,
/// exit, and per-tick update.
#[derive(Clone, Copy)]
pub struct State<C: 'static> {
    pub id: StateId,
    pub on_enter: Option<Action<C>>,
    pub on_exit: Option<Action<C>>,
    pub on_update: Option<Action<C>>,
}

impl<C: 'static> State<C> {
    pub const fn new(id: StateId) -> Self {
        State {
            id,
            on_enter: None,
            on_exit: None,
            on_update: None,
        }
    }

    pub const fn with_enter(mut self, action: Action<C>) -> Self {
        self.on_enter = Some(action);
        self
    }

    pub const fn with_exit(mut self, action: Action<C>) -> Self {
        self.on_exit = Some(action);
        self
    }

    pub const fn with_update(mut self, action: Action<C>) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// One row of the transition table.
#[derive(Clone, Copy)]
pub struct Transition<C: 'static> {
    pub from: StateId,
    pub event: EventId,
    pub to: StateId,
    pub action: Option<Action<C>>,
}

impl<C: 'static> Transition<C> {
    pub const fn new(from: StateId, event: EventId, to: StateId) -> Self {
        Transition {
            from,
            event,
            to,
            action: None,
        }
    }

    pub const fn with_action(mut self, action: Action<C>) -> Self {
        self.action = Some(action);
        self
    }

    fn matches(&self, current: StateId, event: EventId) -> bool {
        self.event == event && (self.from == ANY_STATE || self.from == current)
    }
}

/// A table-driven FSM instance bound to tables of type `C`'s context.
pub struct Fsm<C: 'static> {
    states: &'static [State<C>],
    transitions: &'static [Transition<C>],
    current: StateId,
    initial: StateId,
    active: bool,
}

// Manually implemented (rather than derived) so `Fsm<C>` is `Copy` without
// requiring `C: Copy` — every field is `Copy` on its own regardless of `C`,
// since `C` only ever appears behind a `&'static` reference.
impl<C: 'static> Clone for Fsm<C> {
    fn clone(&self) -> Self {
        Fsm {
            states: self.states,
            transitions: self.transitions,
            current: self.current,
            initial: self.initial,
            active: self.active,
        }
    }
}

impl<C: 'static> Copy for Fsm<C> {}

impl<C: 'static> Fsm<C> {
    pub const fn new(
        states: &'static [State<C>],
        transitions: &'static [Transition<C>],
        initial: StateId,
    ) -> Self {
        Fsm {
            states,
            transitions,
            current: initial,
            initial,
            active: false,
        }
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn find_state(&self, id: StateId) -> Option<State<C>> {
        self.states.iter().copied().find(|s| s.id == id)
    }

    /// Force the current state directly, running neither exit nor entry
    /// actions. Used by callers that compute a destination state outside
    /// the transition table (e.g. a wrapping page index), where the table
    /// only records "something changed, run this action" via
    /// [`NO_TRANSITION`].
    pub fn force_state(&mut self, state: StateId) {
        self.current = state;
    }

    /// Activate the FSM and run the initial state's on-enter action.
    pub fn start(&mut self, ctx: &mut C) {
        self.active = true;
        self.current = self.initial;
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_enter {
                action(ctx);
            }
        }
    }

    /// Run the current state's on-exit action and deactivate.
    pub fn stop(&mut self, ctx: &mut C) {
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_exit {
                action(ctx);
            }
        }
        self.active = false;
    }

    /// Return to the initial state, running exit and entry actions.
    pub fn reset(&mut self, ctx: &mut C) {
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_exit {
                action(ctx);
            }
        }
        self.current = self.initial;
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_enter {
                action(ctx);
            }
        }
    }

    /// Offer `event` to the table. Returns `true` iff the current state
    /// changed.
    ///
    /// Performs a linear search for the first transition whose `from`
    /// matches (exactly, or via [`ANY_STATE`]) and whose `event` matches.
    /// If the matching transition's `to` is [`NO_TRANSITION`], its action
    /// runs and the state is unchanged. Otherwise: the current state's
    /// on-exit runs, then the transition's action, then the new state is
    /// entered (running its on-enter).
    pub fn process(&mut self, ctx: &mut C, event: EventId) -> bool {
        let transition = match self
            .transitions
            .iter()
            .copied()
            .find(|t| t.matches(self.current, event))
        {
            Some(t) => t,
            None => return false,
        };

        if transition.to == NO_TRANSITION {
            if let Some(action) = transition.action {
                action(ctx);
            }
            return false;
        }

        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_exit {
                action(ctx);
            }
        }
        if let Some(action) = transition.action {
            action(ctx);
        }
        self.current = transition.to;
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_enter {
                action(ctx);
            }
        }
        true
    }

    /// Run the current state's on-update action.
    pub fn update(&mut self, ctx: &mut C) {
        if let Some(state) = self.find_state(self.current) {
            if let Some(action) = state.on_update {
                action(ctx);
            }
        }
    }
}
