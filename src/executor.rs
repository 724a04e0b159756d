//! Macro replay.
//!
//! An [`Executor`] walks a step slice front to back against an [`InputSink`].
//! Cancellation is cooperative: the [`CancelToken`] is checked before each
//! step and wakes any `Wait` early, but a step that has started always
//! finishes. A cancelled run lets go of every button it left held. A run
//! that fails on the sink sends nothing more.

use std::{
    ops::ControlFlow,
    sync::{Arc, Condvar, Mutex, PoisonError},
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    pad_state::PadState,
    sink::{InputSink, SinkError},
    step::MacroStep,
};

/// Shared stop flag for one run. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` unless cancelled first. Returns `true` if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + duration;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            cancelled = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *cancelled
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

/// Progress snapshot for whoever hosts the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatus {
    pub state: RunState,
    /// Index of the step being executed.
    pub step: Option<usize>,
    pub pad: PadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// `completed` steps had fully run when the cancel was observed.
    Cancelled { completed: usize },
}

#[derive(Debug, Error)]
#[error("step {number} `{step}` failed: {source}", number = .index + 1)]
pub struct ExecutionFailed {
    /// 0-based index into the step list.
    pub index: usize,
    pub step: MacroStep,
    pub source: SinkError,
}

/// A single run over a borrowed step list. `run` consumes it, so a
/// finished executor can't be restarted.
pub struct Executor<'a> {
    steps: &'a [MacroStep],
    pad: PadState,
    status: Option<Arc<Mutex<RunStatus>>>,
}

impl<'a> Executor<'a> {
    pub fn new(steps: &'a [MacroStep]) -> Self {
        Self {
            steps,
            pad: PadState::new(),
            status: None,
        }
    }

    /// Publish progress into `status` as the run advances.
    pub fn with_status(mut self, status: Arc<Mutex<RunStatus>>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn run<S: InputSink + ?Sized>(
        mut self,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<RunOutcome, ExecutionFailed> {
        let steps = self.steps;
        info!(steps = steps.len(), "macro run started");
        self.publish(RunState::Running, None);

        for (index, step) in steps.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(self.cancelled(sink, index));
            }
            self.publish(RunState::Running, Some(index));
            debug!(index, %step, "step");

            match self.dispatch(sink, cancel, *step) {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => return Ok(self.cancelled(sink, index)),
                Err(source) => {
                    warn!(index, %step, error = %source, "sink failed, run halted");
                    self.publish(RunState::Failed, Some(index));
                    return Err(ExecutionFailed {
                        index,
                        step: *step,
                        source,
                    });
                }
            }
        }

        info!("macro run completed");
        self.publish(RunState::Completed, None);
        Ok(RunOutcome::Completed)
    }

    /// `Break` means the step was a wait that got cancelled.
    fn dispatch<S: InputSink + ?Sized>(
        &mut self,
        sink: &mut S,
        cancel: &CancelToken,
        step: MacroStep,
    ) -> Result<ControlFlow<()>, SinkError> {
        match step {
            MacroStep::PressButton(button) => sink.press_button(button)?,
            MacroStep::HoldButton(button) => {
                sink.hold_button(button)?;
                self.pad.hold(button);
            }
            MacroStep::ReleaseButton(button) => {
                sink.release_button(button)?;
                self.pad.release(button);
            }
            MacroStep::MoveStick { side, x, y } => {
                sink.set_stick(side, x, y)?;
                self.pad.set_stick(side, x, y);
            }
            MacroStep::Wait(ms) => {
                if cancel.sleep(Duration::from_millis(ms)) {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn cancelled<S: InputSink + ?Sized>(&mut self, sink: &mut S, completed: usize) -> RunOutcome {
        info!(completed, held = self.pad.held().len(), "macro run cancelled");

        for button in self.pad.held().to_vec() {
            match sink.release_button(button) {
                Ok(()) => {
                    self.pad.release(button);
                }
                Err(e) => warn!(%button, error = %e, "could not release held button"),
            }
        }

        self.publish(RunState::Cancelled, None);
        RunOutcome::Cancelled { completed }
    }

    fn publish(&self, state: RunState, step: Option<usize>) {
        if let Some(status) = &self.status {
            let mut status = status.lock().unwrap_or_else(PoisonError::into_inner);
            status.state = state;
            status.step = step;
            status.pad = self.pad.clone();
        }
    }
}
