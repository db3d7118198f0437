//! `tickboot-runtime` runs a single worker exactly once per tick of an external host, under a
//! resource budget that the host meters.
//!
//! A [`Supervisor`](struct.Supervisor.html) is handed a [`WorkerProvider`](trait.WorkerProvider.html)
//! that knows how to acquire, compile, instantiate, and invoke the worker, and is then called once
//! per tick with the [`Host`](trait.Host.html):
//!
//! ```
//! use tickboot_runtime::{MockProvider, RecordingHost, Supervisor, SupervisorConfig, TickOutcome};
//!
//! let mut sup = Supervisor::new(SupervisorConfig::new(500), MockProvider::new());
//! let mut host = RecordingHost::new(400);
//!
//! sup.tick(&mut host);
//! assert_eq!(
//!     sup.last_outcome(),
//!     &TickOutcome::Deferred { remaining: 400, threshold: 500 }
//! );
//! ```
//!
//! While the worker is not yet loaded, each tick first checks that the remaining budget is at
//! least the configured boot threshold, and if so runs one load stage. Once loaded, the worker runs
//! every tick regardless of budget.
//!
//! Any fault, whether a failed load stage, a failed or panicking invocation, or a tick that never
//! returned at all, puts the supervisor into a pending-reset state: the next tick does no work and
//! asks the host to destroy the environment. [`Environment`](struct.Environment.html) models that
//! destruction for hosts that keep the supervisor in-process.

#![deny(bare_trait_objects)]

pub use tickboot_runtime_internals::budget::{self, should_proceed, BootDecision};
pub use tickboot_runtime_internals::environment::Environment;
pub use tickboot_runtime_internals::error::Error;
pub use tickboot_runtime_internals::fault::{
    self, install_panic_hook, FaultKind, FaultReport, FaultSink, Outcome, RunningFlag,
};
pub use tickboot_runtime_internals::host::{Host, RecordingHost};
pub use tickboot_runtime_internals::loader::{LoadState, Loader};
pub use tickboot_runtime_internals::provider::{
    self, LoadStage, MockProvider, MockProviderBuilder, WorkerProvider,
};
pub use tickboot_runtime_internals::reset::{ResetController, ResetState};
pub use tickboot_runtime_internals::supervisor::{
    Supervisor, SupervisorConfig, SupervisorState, TickOutcome, TickStats,
};
