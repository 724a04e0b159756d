use std::{
    fmt,
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    thread,
    time::Duration,
};
use tracing::{debug, trace};

use crate::{
    constants::DEFAULT_SETTLE,
    sink::{InputSink, SinkError},
    step::{Button, StickSide},
};

/// One sys-botbase text command. `Display` gives the wire form without the newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysBotCommand {
    /// Press and release.
    Click(Button),
    /// Press and keep holding.
    Press(Button),
    Release(Button),
    SetStick(StickSide, i16, i16),
}

impl fmt::Display for SysBotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SysBotCommand::Click(b) => write!(f, "click {b}"),
            SysBotCommand::Press(b) => write!(f, "press {b}"),
            SysBotCommand::Release(b) => write!(f, "release {b}"),
            SysBotCommand::SetStick(side, x, y) => write!(f, "setStick {} {x} {y}", side.as_str()),
        }
    }
}

/// TCP connection to sys-botbase. Commands are ASCII lines.
pub struct SysBotSink {
    stream: Option<TcpStream>,
    peer: SocketAddr,
    settle: Duration,
}

impl SysBotSink {
    /// Tries every address `host` resolves to, each bounded by `timeout`.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;

        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_write_timeout(Some(timeout))?;
                    debug!(%addr, "connected to sys-botbase");
                    return Ok(Self {
                        stream: Some(stream),
                        peer: addr,
                        settle: DEFAULT_SETTLE,
                    });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{host} did not resolve to any address"),
            )
        }))
    }

    /// Pause after clicks and stick moves so the console registers them.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn send(&mut self, command: SysBotCommand) -> Result<(), SinkError> {
        let stream = self.stream.as_mut().ok_or(SinkError::NotConnected)?;
        trace!(peer = %self.peer, %command, "send");
        let line = format!("{command}\n");
        stream.write_all(line.as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    fn send_and_settle(&mut self, command: SysBotCommand) -> Result<(), SinkError> {
        self.send(command)?;
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        Ok(())
    }

    /// Later commands fail with [`SinkError::NotConnected`].
    pub fn disconnect(&mut self) -> io::Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        debug!(peer = %self.peer, "disconnecting");
        match stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }
}

impl InputSink for SysBotSink {
    fn press_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.send_and_settle(SysBotCommand::Click(button))
    }

    fn hold_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.send(SysBotCommand::Press(button))
    }

    fn release_button(&mut self, button: Button) -> Result<(), SinkError> {
        self.send(SysBotCommand::Release(button))
    }

    fn set_stick(&mut self, side: StickSide, x: i16, y: i16) -> Result<(), SinkError> {
        self.send_and_settle(SysBotCommand::SetStick(side, x, y))
    }
}
