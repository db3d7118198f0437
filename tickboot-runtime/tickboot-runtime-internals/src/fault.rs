//! The fault boundary.
//!
//! Every piece of work done on behalf of the worker, whether a load stage or an invocation, runs
//! inside [`supervise`](fn.supervise.html). The boundary raises the [`RunningFlag`] before the
//! work starts and lowers it only if the work returns cleanly. Any other exit leaves the flag
//! raised, including the host killing the process outright, so at the start of the next
//! tick the flag doubles as "the last piece of work may have left state corrupt".
//!
//! Errors and panics are turned into a [`FaultReport`] and handed to a [`FaultSink`]; nothing
//! escapes the boundary.

use crate::error::Error;
use crate::provider::LoadStage;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    /// Trace captured by the panic hook for the most recent panic on this thread.
    static LAST_PANIC_TRACE: RefCell<Option<String>> = RefCell::new(None);
}

static PANIC_HOOK: Once = Once::new();

/// Install a panic hook that records a backtrace for the panicking thread, so that faults caused by
/// panics carry a full trace.
///
/// The previously installed hook still runs afterwards. Installing more than once has no further
/// effect.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let prev = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = format!("{}\n{}", info, Backtrace::force_capture());
            LAST_PANIC_TRACE.with(|t| *t.borrow_mut() = Some(trace));
            prev(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    LAST_PANIC_TRACE.with(|t| t.borrow_mut().take())
}

/// Set while supervised work is in flight; still set at the start of a tick if that work did not
/// return cleanly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunningFlag(bool);

impl RunningFlag {
    pub fn new() -> Self {
        RunningFlag(false)
    }

    pub fn raise(&mut self) {
        self.0 = true;
    }

    pub fn lower(&mut self) {
        self.0 = false;
    }

    pub fn is_raised(&self) -> bool {
        self.0
    }
}

/// The fault taxonomy. Every kind leads to the same recovery: a full environment reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// A load stage failed.
    LoadStageFailure(LoadStage),
    /// The worker invocation failed.
    RuntimeFault,
    /// The previous tick's work never returned, and never reported a fault either.
    NonReturningFault,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::LoadStageFailure(stage) => write!(f, "load stage `{}` failed", stage),
            FaultKind::RuntimeFault => write!(f, "runtime fault"),
            FaultKind::NonReturningFault => write!(f, "previous tick did not complete"),
        }
    }
}

/// A fault as seen by operators: what kind it was, a one-line summary, and a trace when one is
/// available.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaultReport {
    pub kind: FaultKind,
    pub summary: String,
    pub trace: Option<String>,
}

impl FaultReport {
    pub fn new(kind: FaultKind, summary: impl Into<String>) -> Self {
        FaultReport {
            kind,
            summary: summary.into(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    fn from_error(kind: FaultKind, err: Error) -> Self {
        let err = anyhow::Error::new(err);
        let report = FaultReport::new(kind, err.to_string());
        if err.chain().count() > 1 {
            report.with_trace(format!("{:?}", err))
        } else {
            report
        }
    }

    fn from_panic(kind: FaultKind, payload: Box<dyn Any + Send>) -> Self {
        let msg = panic_message(payload.as_ref());
        let report = FaultReport::new(kind, Error::WorkerPanic(msg).to_string());
        match take_panic_trace() {
            Some(trace) => report.with_trace(trace),
            None => report,
        }
    }

    /// Render the report as operator notification text, prefixed with the tick it happened on.
    pub fn notification(&self, tick: u64) -> String {
        match &self.trace {
            Some(trace) => format!("[{}] {}: {}\n{}", tick, self.kind, self.summary, trace),
            None => format!("[{}] {}: {}", tick, self.kind, self.summary),
        }
    }
}

impl std::fmt::Display for FaultReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

/// Where the boundary sends fault reports.
pub trait FaultSink {
    fn fault(&mut self, report: &FaultReport);
}

/// Collects reports; mostly useful in tests.
impl FaultSink for Vec<FaultReport> {
    fn fault(&mut self, report: &FaultReport) {
        self.push(report.clone());
    }
}

/// The result of one piece of supervised work.
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    Faulted(FaultReport),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        match self {
            Outcome::Completed(_) => true,
            Outcome::Faulted(_) => false,
        }
    }

    pub fn is_faulted(&self) -> bool {
        !self.is_completed()
    }

    pub fn fault(&self) -> Option<&FaultReport> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Faulted(report) => Some(report),
        }
    }
}

/// Run `work` inside the fault boundary.
///
/// `kind` is how a failure of this particular piece of work is classified. On a clean return the
/// running flag is lowered; on an error or panic it is left raised, the fault is logged and passed
/// to `sink`, and `Outcome::Faulted` is returned.
pub fn supervise<T, F>(
    running: &mut RunningFlag,
    sink: &mut dyn FaultSink,
    kind: FaultKind,
    work: F,
) -> Outcome<T>
where
    F: FnOnce() -> Result<T, Error>,
{
    // a stale trace from a panic outside the boundary must not be attributed to this work
    let _ = take_panic_trace();

    running.raise();
    let report = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(val)) => {
            running.lower();
            return Outcome::Completed(val);
        }
        Ok(Err(err)) => FaultReport::from_error(kind, err),
        Err(payload) => FaultReport::from_panic(kind, payload),
    };

    tracing::error!(
        kind = %report.kind,
        "caught fault, will reset next tick: {}",
        report.summary
    );
    if let Some(trace) = &report.trace {
        tracing::debug!("fault trace:\n{}", trace);
    }
    sink.fault(&report);
    Outcome::Faulted(report)
}
