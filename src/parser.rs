//! Macro text parser.
//!
//! # Syntax
//!
//! ```text
//! Button:A            tap A (click)
//! Hold:ZL, Release:ZL hold and let go of ZL
//! %0,32767            left stick fully up
//! &32767,0            right stick fully right
//! Wait:250            pause 250 ms
//! ```
//!
//! Steps are separated by newlines or commas. Stick steps carry their own
//! comma, so `%0,0,Button:A` is two steps. Keywords and button names are
//! case-insensitive.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{STICK_MAX, STICK_MIN, keywords};
use crate::step::{Button, MacroStep, StickSide};

/// Why a macro was rejected. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}, column {column}: unknown button \"{name}\" in \"{token}\"")]
    UnknownButton {
        name: String,
        token: String,
        line: usize,
        column: usize,
    },
    #[error(
        "line {line}, column {column}: stick value {value} in \"{token}\" is outside -32767..=32767"
    )]
    StickOutOfRange {
        value: i64,
        token: String,
        line: usize,
        column: usize,
    },
    #[error("line {line}, column {column}: unrecognized step \"{token}\"")]
    UnrecognizedStep {
        token: String,
        line: usize,
        column: usize,
    },
    #[error(
        "line {line}, column {column}: invalid wait duration in \"{token}\" (expected milliseconds >= 0)"
    )]
    InvalidWaitDuration {
        token: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnknownButton { line, .. }
            | Self::StickOutOfRange { line, .. }
            | Self::UnrecognizedStep { line, .. }
            | Self::InvalidWaitDuration { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Self::UnknownButton { column, .. }
            | Self::StickOutOfRange { column, .. }
            | Self::UnrecognizedStep { column, .. }
            | Self::InvalidWaitDuration { column, .. } => *column,
        }
    }

    /// Raw token text as written in the source.
    pub fn token(&self) -> &str {
        match self {
            Self::UnknownButton { token, .. }
            | Self::StickOutOfRange { token, .. }
            | Self::UnrecognizedStep { token, .. }
            | Self::InvalidWaitDuration { token, .. } => token,
        }
    }
}

/// A parsed macro: steps in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroSeq {
    pub steps: Vec<MacroStep>,
}

impl MacroSeq {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Comma-joined single-line form, e.g. `Hold:A,Wait:300,Release:A`.
    pub fn to_inline(&self) -> String {
        self.steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<Vec<MacroStep>> for MacroSeq {
    fn from(steps: Vec<MacroStep>) -> Self {
        Self { steps }
    }
}

/// One canonical token per line.
impl fmt::Display for MacroSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for MacroSeq {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let steps = tokenize(s)
            .iter()
            .map(parse_token)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }
}

/// Parse a single step token, as stored in a macro library.
pub fn parse_step(text: &str) -> Result<MacroStep, ParseError> {
    let trimmed = text.trim_start();
    let column = text[..text.len() - trimmed.len()].chars().count() + 1;
    let trimmed = trimmed.trim_end();
    parse_token(&Token {
        text: trimmed,
        line: 1,
        column,
    })
}

impl TryFrom<String> for MacroStep {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_step(&value)
    }
}

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    line: usize,
    column: usize,
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();

    for (line_idx, line) in input.lines().enumerate() {
        let mut pieces = comma_pieces(line).into_iter();

        while let Some((start, piece)) = pieces.next() {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }
            let begin = start + (piece.len() - piece.trim_start().len());
            let mut end = start + piece.trim_end().len();

            // `%x,y` spans two pieces
            if takes_coordinate_pair(trimmed) {
                if let Some((next_start, next)) = pieces.next() {
                    end = next_start + next.trim_end().len();
                }
            }

            tokens.push(Token {
                text: &line[begin..end],
                line: line_idx + 1,
                column: line[..begin].chars().count() + 1,
            });
        }
    }

    tokens
}

/// Split a line on commas, keeping each piece's byte offset.
fn comma_pieces(line: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in line.match_indices(',') {
        pieces.push((start, &line[start..idx]));
        start = idx + 1;
    }
    pieces.push((start, &line[start..]));
    pieces
}

fn takes_coordinate_pair(token: &str) -> bool {
    token.starts_with(keywords::LEFT_STICK_PREFIX)
        || token.starts_with(keywords::RIGHT_STICK_PREFIX)
        || token
            .split_once(':')
            .is_some_and(|(kw, _)| kw.trim().eq_ignore_ascii_case(keywords::STICK))
}

fn parse_token(token: &Token<'_>) -> Result<MacroStep, ParseError> {
    let text = token.text;

    if let Some(rest) = text.strip_prefix(keywords::LEFT_STICK_PREFIX) {
        return parse_stick(StickSide::Left, rest, token);
    }
    if let Some(rest) = text.strip_prefix(keywords::RIGHT_STICK_PREFIX) {
        return parse_stick(StickSide::Right, rest, token);
    }

    let Some((keyword, arg)) = text.split_once(':') else {
        return Err(unrecognized(token));
    };

    match keyword.trim().to_ascii_lowercase().as_str() {
        keywords::BUTTON => parse_button(arg, token).map(MacroStep::PressButton),
        keywords::HOLD => parse_button(arg, token).map(MacroStep::HoldButton),
        keywords::RELEASE => parse_button(arg, token).map(MacroStep::ReleaseButton),
        keywords::WAIT => parse_wait(arg, token),
        // Older macros used `Stick:x,y` for the left stick
        keywords::STICK => parse_stick(StickSide::Left, arg, token),
        _ => Err(unrecognized(token)),
    }
}

fn parse_button(arg: &str, token: &Token<'_>) -> Result<Button, ParseError> {
    Button::from_name(arg).ok_or_else(|| ParseError::UnknownButton {
        name: arg.trim().to_string(),
        token: token.text.to_string(),
        line: token.line,
        column: token.column,
    })
}

fn parse_wait(arg: &str, token: &Token<'_>) -> Result<MacroStep, ParseError> {
    match arg.trim().parse::<i64>() {
        Ok(ms) if ms >= 0 => Ok(MacroStep::Wait(ms as u64)),
        _ => Err(ParseError::InvalidWaitDuration {
            token: token.text.to_string(),
            line: token.line,
            column: token.column,
        }),
    }
}

fn parse_stick(side: StickSide, arg: &str, token: &Token<'_>) -> Result<MacroStep, ParseError> {
    let (x, y) = arg.split_once(',').ok_or_else(|| unrecognized(token))?;
    let x = parse_axis(x, token)?;
    let y = parse_axis(y, token)?;
    Ok(MacroStep::MoveStick { side, x, y })
}

fn parse_axis(raw: &str, token: &Token<'_>) -> Result<i16, ParseError> {
    let value = raw.trim().parse::<i64>().map_err(|_| unrecognized(token))?;
    if !(i64::from(STICK_MIN)..=i64::from(STICK_MAX)).contains(&value) {
        return Err(ParseError::StickOutOfRange {
            value,
            token: token.text.to_string(),
            line: token.line,
            column: token.column,
        });
    }
    Ok(value as i16)
}

fn unrecognized(token: &Token<'_>) -> ParseError {
    ParseError::UnrecognizedStep {
        token: token.text.to_string(),
        line: token.line,
        column: token.column,
    }
}
