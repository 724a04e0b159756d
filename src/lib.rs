//! Controller macros for a Nintendo Switch running sys-botbase.
//!
//! Macro text is parsed into [`step::MacroStep`]s by [`parser`], then
//! replayed by [`executor::Executor`] against any [`sink::InputSink`],
//! usually a [`network::SysBotSink`] connected over TCP.

pub mod config;
pub mod constants;
pub mod executor;
pub mod library;
pub mod logging;
pub mod macro_worker;
pub mod network;
pub mod pad_state;
pub mod parser;
pub mod sink;
pub mod step;
