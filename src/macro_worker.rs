// macro_worker.rs
use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};
use thiserror::Error;

use crate::{
    executor::{CancelToken, ExecutionFailed, Executor, RunOutcome, RunStatus},
    sink::InputSink,
    step::MacroStep,
};

#[derive(Debug, Error)]
#[error("macro worker thread panicked")]
pub struct WorkerPanicked;

/// What a finished worker hands back: the sink, ready for the next run, and the result.
pub struct Finished<S> {
    pub sink: S,
    pub result: Result<RunOutcome, ExecutionFailed>,
    /// Final status. After a cancel, `pad` lists any button cleanup could not release.
    pub status: RunStatus,
}

/// Runs one macro on its own thread so the caller stays responsive.
///
/// The worker owns the sink for the whole run, so two runs can never
/// interleave commands on the same channel.
pub struct MacroWorker<S> {
    sink: S,
    steps: Vec<MacroStep>,
    cancel: CancelToken,
}

impl<S: InputSink + Send + 'static> MacroWorker<S> {
    pub fn new(sink: S, steps: Vec<MacroStep>) -> Self {
        Self {
            sink,
            steps,
            cancel: CancelToken::new(),
        }
    }

    /// The token the run will watch. Available before `spawn`, so a signal
    /// handler can be in place before the first step is sent.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn spawn(self) -> MacroHandle<S> {
        let MacroWorker {
            mut sink,
            steps,
            cancel,
        } = self;
        let status = Arc::new(Mutex::new(RunStatus::default()));

        let handle = {
            let cancel = cancel.clone();
            let status = status.clone();
            thread::spawn(move || {
                let result = Executor::new(&steps)
                    .with_status(status)
                    .run(&mut sink, &cancel);
                (sink, result)
            })
        };

        MacroHandle {
            cancel,
            status,
            handle,
        }
    }
}

pub struct MacroHandle<S> {
    cancel: CancelToken,
    status: Arc<Mutex<RunStatus>>,
    handle: JoinHandle<(S, Result<RunOutcome, ExecutionFailed>)>,
}

impl<S> MacroHandle<S> {
    /// Ask the run to stop. Takes effect at the next step boundary or inside a wait.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the token, e.g. for a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> RunStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> Result<Finished<S>, WorkerPanicked> {
        let (sink, result) = self.handle.join().map_err(|_| WorkerPanicked)?;
        let status = self
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(Finished {
            sink,
            result,
            status,
        })
    }
}
