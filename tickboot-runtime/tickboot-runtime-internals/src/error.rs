use crate::provider::LoadStage;
use anyhow::Error as AnyError;
use thiserror::Error;

/// Supervisor runtime errors.
///
/// None of these escape a tick: the fault boundary converts every one of them into a
/// [`FaultReport`](../fault/struct.FaultReport.html) and the entry point schedules a reset.
#[derive(Debug, Error)]
pub enum Error {
    /// A stage of the worker load procedure failed.
    #[error("Load stage `{}` failed: {}", stage, source)]
    LoadStage {
        stage: LoadStage,
        #[source]
        source: AnyError,
    },

    /// The worker's single-shot invocation returned an error.
    #[error("Worker fault: {}", _0)]
    WorkerFault(#[source] AnyError),

    /// The worker (or a provider stage) panicked; the payload is rendered as text.
    #[error("Worker panicked: {}", _0)]
    WorkerPanic(String),

    /// A catch-all for internal errors that indicate a bug in the supervisor itself.
    #[error("Internal error: {}", _0)]
    InternalError(#[source] AnyError),
}

#[macro_export]
macro_rules! tickboot_bail {
    ($e:expr) => {
        return Err(tickboot_format_err!($e));
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err(tickboot_format_err!($fmt, $($arg)*));
    };
}

#[macro_export]
macro_rules! tickboot_format_err {
    ($($arg:tt)*) => { $crate::error::Error::InternalError(anyhow::format_err!($($arg)*)) }
}

#[macro_export]
macro_rules! tickboot_stage_err {
    ($stage:expr, $source:expr) => {
        $crate::error::Error::LoadStage {
            stage: $stage,
            source: $source,
        }
    };
}
