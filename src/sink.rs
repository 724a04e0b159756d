use std::io;
use thiserror::Error;
use tracing::info;

use crate::network::SysBotCommand;
use crate::step::{Button, StickSide};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not connected")]
    NotConnected,
}

/// Something that can put inputs on a pad: a live connection, a log, a test double.
///
/// Every call returns once the command has been handed off (or failed).
pub trait InputSink {
    /// One discrete press-and-release.
    fn press_button(&mut self, button: Button) -> Result<(), SinkError>;
    fn hold_button(&mut self, button: Button) -> Result<(), SinkError>;
    fn release_button(&mut self, button: Button) -> Result<(), SinkError>;
    /// Absolute position, `(0, 0)` is centered.
    fn set_stick(&mut self, side: StickSide, x: i16, y: i16) -> Result<(), SinkError>;
}

impl<S: InputSink + ?Sized> InputSink for Box<S> {
    fn press_button(&mut self, button: Button) -> Result<(), SinkError> {
        (**self).press_button(button)
    }

    fn hold_button(&mut self, button: Button) -> Result<(), SinkError> {
        (**self).hold_button(button)
    }

    fn release_button(&mut self, button: Button) -> Result<(), SinkError> {
        (**self).release_button(button)
    }

    fn set_stick(&mut self, side: StickSide, x: i16, y: i16) -> Result<(), SinkError> {
        (**self).set_stick(side, x, y)
    }
}

/// Dry-run sink: logs each command instead of sending it.
#[derive(Debug, Default)]
pub struct LogSink {
    sent: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    fn log(&mut self, command: SysBotCommand) -> Result<(), SinkError> {
        self.sent += 1;
        info!(%command, "dry run");
        Ok(())
    }
}

impl InputSink for LogSink {
    fn press_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.log(SysBotCommand::Click(button))
    }

    fn hold_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.log(SysBotCommand::Press(button))
    }

    fn release_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.log(SysBotCommand::Release(button))
    }

    fn set_stick(&mut self, side: StickSide, x: i16, y: i16) -> Result<(), SinkError> {
        self.log(SysBotCommand::SetStick(side, x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sink_counts_commands() {
        let mut sink: Box<dyn InputSink> = Box::new(LogSink::new());
        sink.hold_button(Button::A).unwrap();
        sink.set_stick(StickSide::Left, 1, 2).unwrap();
        sink.release_button(Button::A).unwrap();

        let mut plain = LogSink::new();
        plain.press_button(Button::B).unwrap();
        assert_eq!(plain.sent(), 1);
    }

    #[test]
    fn sink_error_display() {
        assert_eq!(SinkError::NotConnected.to_string(), "Not connected");
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        let err: SinkError = io_err.into();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
