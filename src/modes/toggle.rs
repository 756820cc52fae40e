//! Toggle mode: output flips on a configurable input edge.

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn from_index(index: u8) -> Self {
        if index == 0 {
            Edge::Rising
        } else {
            Edge::Falling
        }
    }
}

#[derive(Clone, Copy)]
pub struct ToggleState {
    output: bool,
    prev_input: bool,
    edge: Edge,
}

impl ToggleState {
    pub const fn new() -> Self {
        ToggleState {
            output: false,
            prev_input: false,
            edge: Edge::Rising,
        }
    }

    pub fn init(&mut self, edge_index: u8) {
        self.output = false;
        self.prev_input = false;
        self.edge = Edge::from_index(edge_index);
    }

    pub fn process(&mut self, input: bool) -> bool {
        let armed = match self.edge {
            Edge::Rising => input && !self.prev_input,
            Edge::Falling => !input && self.prev_input,
        };
        if armed {
            self.output = !self.output;
        }
        self.prev_input = input;
        self.output
    }

    pub fn output(&self) -> bool {
        self.output
    }
}

impl Default for ToggleState {
    fn default() -> Self {
        ToggleState::new()
    }
}
