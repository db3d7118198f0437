//! The host the supervisor runs inside.
//!
//! The host drives the tick loop, meters the budget, and owns the execution environment. The
//! supervisor only ever reads the budget, writes operator notifications, and asks for the
//! environment to be torn down.

/// Everything the supervisor needs from its host for one tick.
pub trait Host {
    /// The current tick number, used to stamp notifications.
    fn tick(&self) -> u64;

    /// The remaining resource allowance. Read-only to the supervisor.
    fn remaining_budget(&self) -> u64;

    /// Send a message to an operator. Unlike diagnostic logging, notifications are expected to
    /// reach someone who is not watching the logs.
    fn notify(&mut self, message: &str);

    /// Ask the host to destroy the entire execution environment, including the supervisor and
    /// everything it owns, before the next tick.
    fn request_environment_reset(&mut self);
}

/// A host that records what the supervisor asked of it.
///
/// This stands in for the real host in tests and simulations: the budget and tick number are
/// plain fields, and every notification and reset request is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingHost {
    pub tick: u64,
    pub budget: u64,
    pub notifications: Vec<String>,
    pub reset_requests: u64,
    /// Whether a reset was requested during the current tick.
    pub reset_requested: bool,
}

impl RecordingHost {
    pub fn new(budget: u64) -> Self {
        RecordingHost {
            budget,
            ..RecordingHost::default()
        }
    }

    /// Move on to the next tick, clearing per-tick state.
    pub fn next_tick(&mut self) {
        self.tick += 1;
        self.reset_requested = false;
    }

    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }
}

impl Host for RecordingHost {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn remaining_budget(&self) -> u64 {
        self.budget
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_owned());
    }

    fn request_environment_reset(&mut self) {
        self.reset_requests += 1;
        self.reset_requested = true;
    }
}
