//! Step model shared by the parser, the executor and the sinks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::keywords;

macro_rules! buttons {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Every button sys-botbase understands, D-pad diagonals included.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Button {
            $($variant),+
        }

        impl Button {
            pub const ALL: &'static [Button] = &[$(Button::$variant),+];

            /// Canonical (upper-case) name, also the wire spelling.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Button::$variant => $name),+
                }
            }
        }
    };
}

buttons! {
    A => "A",
    B => "B",
    X => "X",
    Y => "Y",
    L => "L",
    R => "R",
    ZL => "ZL",
    ZR => "ZR",
    Plus => "PLUS",
    Minus => "MINUS",
    Home => "HOME",
    Capture => "CAPTURE",
    LStick => "LSTICK",
    RStick => "RSTICK",
    DUp => "DUP",
    DDown => "DDOWN",
    DLeft => "DLEFT",
    DRight => "DRIGHT",
    DUpLeft => "DUPLEFT",
    DUpRight => "DUPRIGHT",
    DDownLeft => "DDOWNLEFT",
    DDownRight => "DDOWNRIGHT",
}

impl Button {
    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Button> {
        let name = name.trim();
        Button::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickSide {
    Left,
    Right,
}

impl StickSide {
    pub fn as_str(self) -> &'static str {
        match self {
            StickSide::Left => "LEFT",
            StickSide::Right => "RIGHT",
        }
    }

    fn prefix(self) -> char {
        match self {
            StickSide::Left => keywords::LEFT_STICK_PREFIX,
            StickSide::Right => keywords::RIGHT_STICK_PREFIX,
        }
    }
}

impl fmt::Display for StickSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StickSide::Left => "left",
            StickSide::Right => "right",
        })
    }
}

/// One macro step. Serialized as its canonical token (`"Hold:A"`, `"%0,0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MacroStep {
    PressButton(Button),
    HoldButton(Button),
    ReleaseButton(Button),
    MoveStick { side: StickSide, x: i16, y: i16 },
    /// Milliseconds.
    Wait(u64),
}

impl MacroStep {
    /// Short human-readable form for previews and progress output.
    pub fn describe(&self) -> String {
        match *self {
            MacroStep::PressButton(b) => format!("Press {b}"),
            MacroStep::HoldButton(b) => format!("Hold {b}"),
            MacroStep::ReleaseButton(b) => format!("Release {b}"),
            MacroStep::MoveStick { side, x: 0, y: 0 } => format!("Center {side} stick"),
            MacroStep::MoveStick { side, x, y } => format!("Move {side} stick to ({x}, {y})"),
            MacroStep::Wait(ms) => format!("Wait {ms} ms"),
        }
    }
}

impl fmt::Display for MacroStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MacroStep::PressButton(b) => write!(f, "Button:{b}"),
            MacroStep::HoldButton(b) => write!(f, "Hold:{b}"),
            MacroStep::ReleaseButton(b) => write!(f, "Release:{b}"),
            MacroStep::MoveStick { side, x, y } => write!(f, "{}{x},{y}", side.prefix()),
            MacroStep::Wait(ms) => write!(f, "Wait:{ms}"),
        }
    }
}

impl From<MacroStep> for String {
    fn from(step: MacroStep) -> Self {
        step.to_string()
    }
}
