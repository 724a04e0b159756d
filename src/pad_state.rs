use crate::step::{Button, StickSide};

/// What the remote pad currently looks like, as far as this run knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadState {
    held: Vec<Button>,
    pub left: (i16, i16),
    pub right: (i16, i16),
}

impl PadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hold. Returns `false` if the button was already held.
    pub fn hold(&mut self, button: Button) -> bool {
        if self.held.contains(&button) {
            return false;
        }
        self.held.push(button);
        true
    }

    /// Returns `true` if the button had been held.
    pub fn release(&mut self, button: Button) -> bool {
        let before = self.held.len();
        self.held.retain(|&b| b != button);
        self.held.len() != before
    }

    /// Held buttons, oldest hold first.
    pub fn held(&self) -> &[Button] {
        &self.held
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    pub fn set_stick(&mut self, side: StickSide, x: i16, y: i16) {
        match side {
            StickSide::Left => self.left = (x, y),
            StickSide::Right => self.right = (x, y),
        }
    }

    pub fn stick(&self, side: StickSide) -> (i16, i16) {
        match side {
            StickSide::Left => self.left,
            StickSide::Right => self.right,
        }
    }
}
