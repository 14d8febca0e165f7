//! Progress, log and evaluation callbacks for a running optimization.
//!
//! A [`RunObserver`] is handed to the runner and receives events in the
//! order they happen. Every method has a no-op default, so observers only
//! implement what they care about.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sx_types::ProcessParameters;

pub trait RunObserver {
    /// Fraction of the run completed, in `[0, 1]`.
    fn on_progress(&mut self, _fraction: f64) {}

    /// A human-readable log line, as appended to the result log.
    fn on_log_line(&mut self, _line: &str) {}

    /// A real objective evaluation, in evaluation order. Rejected
    /// (non-finite) evaluations are reported too.
    fn on_evaluation(&mut self, _params: &ProcessParameters, _quality: f64) {}

    /// The best-so-far improved. `evaluations` counts the improving one.
    fn on_new_best(&mut self, _evaluations: usize, _params: &ProcessParameters, _quality: f64) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

type ProgressFn<'a> = Box<dyn FnMut(f64) + Send + 'a>;
type LogLineFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Observer built from optional progress and log-line closures.
#[derive(Default)]
pub struct CallbackObserver<'a> {
    progress: Option<ProgressFn<'a>>,
    log_line: Option<LogLineFn<'a>>,
}

impl<'a> CallbackObserver<'a> {
    pub fn new() -> Self {
        Self {
            progress: None,
            log_line: None,
        }
    }

    pub fn with_progress(mut self, f: impl FnMut(f64) + Send + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn with_log_line(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.log_line = Some(Box::new(f));
        self
    }
}

impl RunObserver for CallbackObserver<'_> {
    fn on_progress(&mut self, fraction: f64) {
        if let Some(f) = self.progress.as_mut() {
            f(fraction);
        }
    }

    fn on_log_line(&mut self, line: &str) {
        if let Some(f) = self.log_line.as_mut() {
            f(line);
        }
    }
}

/// Events emitted by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Progress {
        fraction: f64,
    },
    LogLine {
        line: String,
    },
    NewBest {
        evaluations: usize,
        params: ProcessParameters,
        quality: f64,
    },
}

/// Forwards progress, log lines and improvements over a channel so another
/// thread can render them. Per-evaluation events are not sent.
///
/// A disconnected receiver is not an error; the run simply continues.
pub struct ChannelObserver {
    event_tx: Sender<RunEvent>,
}

impl ChannelObserver {
    pub fn new(event_tx: Sender<RunEvent>) -> Self {
        Self { event_tx }
    }

    fn emit(&self, event: RunEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl RunObserver for ChannelObserver {
    fn on_progress(&mut self, fraction: f64) {
        self.emit(RunEvent::Progress { fraction });
    }

    fn on_log_line(&mut self, line: &str) {
        self.emit(RunEvent::LogLine {
            line: line.to_string(),
        });
    }

    fn on_new_best(&mut self, evaluations: usize, params: &ProcessParameters, quality: f64) {
        self.emit(RunEvent::NewBest {
            evaluations,
            params: *params,
            quality,
        });
    }
}

/// Shared cancellation flag, checked by the strategies at their yield
/// points. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
