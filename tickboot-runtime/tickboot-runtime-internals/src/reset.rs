//! The reset controller.
//!
//! After any abnormal exit the supervisor's own state (a half-run load stage, worker memory left
//! mid-mutation) cannot be trusted. There is no attempt at rolling anything back: the controller
//! latches into `PendingReset`, the tick does no work, and the host is asked to throw the whole
//! environment away.

use crate::fault::{FaultKind, RunningFlag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetState {
    Healthy,
    /// Waiting for the host to destroy the environment; carries what caused it.
    PendingReset(FaultKind),
}

impl ResetState {
    pub fn is_healthy(&self) -> bool {
        *self == ResetState::Healthy
    }
}

impl std::fmt::Display for ResetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetState::Healthy => write!(f, "healthy"),
            ResetState::PendingReset(cause) => write!(f, "pending reset ({})", cause),
        }
    }
}

/// The controller's verdict at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetCheck {
    /// Go ahead with this tick's work.
    Healthy,
    /// Do no work and ask for a reset. `entered` is true only on the tick the controller left
    /// `Healthy`.
    PendingReset { cause: FaultKind, entered: bool },
}

#[derive(Debug)]
pub struct ResetController {
    state: ResetState,
}

impl ResetController {
    pub fn new() -> Self {
        ResetController {
            state: ResetState::Healthy,
        }
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    /// Inspect what the previous tick left behind.
    ///
    /// `fault` is the fault signal recorded by the previous tick; it is consumed here whatever the
    /// verdict. A raised `running` flag with no recorded fault means the previous tick's work never
    /// returned at all.
    pub fn check(&mut self, running: &RunningFlag, fault: &mut Option<FaultKind>) -> ResetCheck {
        let signalled = fault.take();

        if let ResetState::PendingReset(cause) = self.state {
            return ResetCheck::PendingReset {
                cause,
                entered: false,
            };
        }

        let cause = match signalled {
            Some(kind) => kind,
            None if running.is_raised() => FaultKind::NonReturningFault,
            None => return ResetCheck::Healthy,
        };

        self.state = ResetState::PendingReset(cause);
        ResetCheck::PendingReset {
            cause,
            entered: true,
        }
    }
}

impl Default for ResetController {
    fn default() -> Self {
        Self::new()
    }
}
