//! Gate mode: output mirrors input with no history at all.

#[derive(Clone, Copy, Default)]
pub struct GateState {
    output: bool,
}

impl GateState {
    pub const fn new() -> Self {
        GateState { output: false }
    }

    pub fn init(&mut self) {
        self.output = false;
    }

    pub fn process(&mut self, input: bool) -> bool {
        self.output = input;
        self.output
    }

    pub fn output(&self) -> bool {
        self.output
    }
}
