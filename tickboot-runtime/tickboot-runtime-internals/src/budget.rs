//! The budget gate.
//!
//! Loading a worker (fetching its bytes, compiling and instantiating them) costs far more than a
//! single steady-state invocation, so the expensive stages only run on ticks where the host reports
//! a comfortable amount of remaining budget. Once the worker is loaded the gate is no longer
//! consulted; running out of budget mid-invocation is handled as a fault instead.

/// Decide whether a costly load stage may run this tick.
///
/// Pure: returns `false` exactly when `remaining_budget < threshold`.
pub fn should_proceed(remaining_budget: u64, threshold: u64) -> bool {
    remaining_budget >= threshold
}

/// The gate's verdict for one tick, carrying the numbers it was made from so the deferral notice
/// can report them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootDecision {
    Proceed,
    Defer { remaining: u64, threshold: u64 },
}

impl BootDecision {
    pub fn evaluate(remaining: u64, threshold: u64) -> Self {
        if should_proceed(remaining, threshold) {
            BootDecision::Proceed
        } else {
            BootDecision::Defer {
                remaining,
                threshold,
            }
        }
    }

    pub fn is_proceed(&self) -> bool {
        *self == BootDecision::Proceed
    }
}

impl std::fmt::Display for BootDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootDecision::Proceed => write!(f, "proceed"),
            BootDecision::Defer {
                remaining,
                threshold,
            } => write!(
                f,
                "startup deferred; {} / {} required budget",
                remaining, threshold
            ),
        }
    }
}
