//! The execution entry point.
//!
//! A [`Supervisor`](struct.Supervisor.html) is called once per tick by the host. Each tick it
//!
//! 1. asks the reset controller whether the previous tick ended cleanly, and if not, does nothing
//!    but request an environment reset;
//! 2. while the worker is not loaded, consults the budget gate and runs at most one load stage;
//! 3. once the worker is loaded, runs it exactly once.
//!
//! All work in steps 2 and 3 happens inside the fault boundary.

use crate::budget::BootDecision;
use crate::error::Error;
use crate::fault::{supervise, FaultKind, FaultReport, FaultSink, Outcome, RunningFlag};
use crate::host::Host;
use crate::loader::{LoadState, Loader};
use crate::provider::{LoadStage, WorkerProvider};
use crate::reset::{ResetCheck, ResetController, ResetState};

/// Supervisor configuration.
///
/// There is no default boot threshold; it depends on how the host meters its budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Minimum remaining budget required to run a load stage. (no default)
    pub boot_threshold: u64,
    /// Whether faults are sent to the host as operator notifications. (default `true`)
    pub notify_faults: bool,
}

impl SupervisorConfig {
    pub const fn new(boot_threshold: u64) -> SupervisorConfig {
        SupervisorConfig {
            boot_threshold,
            notify_faults: true,
        }
    }

    pub fn with_boot_threshold(mut self, boot_threshold: u64) -> Self {
        self.boot_threshold = boot_threshold;
        self
    }

    pub fn with_notify_faults(mut self, notify_faults: bool) -> Self {
        self.notify_faults = notify_faults;
        self
    }
}

/// Counters kept across the ticks of one environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks this supervisor has been called for.
    pub ticks: u64,
    /// Worker invocations that completed cleanly.
    pub invocations: u64,
    /// Host tick on which the first load stage ran.
    pub load_started_at: Option<u64>,
    /// Host tick on which the worker was instantiated.
    pub loaded_at: Option<u64>,
}

impl TickStats {
    /// Number of ticks the load took, counting the first and last stage ticks.
    ///
    /// Host tick clocks are not trusted to be monotonic; a clock that went backwards counts as a
    /// single tick.
    pub fn load_ticks(&self) -> Option<u64> {
        match (self.load_started_at, self.loaded_at) {
            (Some(started), Some(loaded)) => Some(loaded.saturating_sub(started) + 1),
            _ => None,
        }
    }
}

/// What happened during the most recent tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No tick has run yet.
    Idle,
    /// The budget gate deferred loading.
    Deferred { remaining: u64, threshold: u64 },
    /// A load stage other than the last one completed.
    Advanced(LoadStage),
    /// The worker ran to completion. `loaded_this_tick` is set on the tick that also
    /// instantiated it.
    Invoked { loaded_this_tick: bool },
    /// A load stage or the invocation faulted; the next tick will request a reset.
    Faulted(FaultReport),
    /// No work was done; the host was asked to destroy the environment.
    ResetRequested(FaultKind),
}

/// All of the supervisor's mutable state, persisted by the host between ticks.
pub struct SupervisorState<P: WorkerProvider> {
    load: LoadState<P>,
    running: RunningFlag,
    fault: Option<FaultKind>,
    reset: ResetController,
    stats: TickStats,
}

impl<P: WorkerProvider> SupervisorState<P> {
    pub fn new() -> Self {
        SupervisorState {
            load: LoadState::new(),
            running: RunningFlag::new(),
            fault: None,
            reset: ResetController::new(),
            stats: TickStats::default(),
        }
    }

    pub fn load_state(&self) -> &LoadState<P> {
        &self.load
    }

    pub fn running(&self) -> RunningFlag {
        self.running
    }

    /// Mutable access to the running flag.
    ///
    /// The supervisor manages the flag itself. This exists for hosts that restore state from
    /// outside the process, where a flag persisted as raised is the only trace of a tick that was
    /// killed mid-flight.
    pub fn running_mut(&mut self) -> &mut RunningFlag {
        &mut self.running
    }

    /// The fault recorded by the last tick, if it has not been consumed yet.
    pub fn pending_fault(&self) -> Option<FaultKind> {
        self.fault
    }

    pub fn reset_state(&self) -> ResetState {
        self.reset.state()
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }
}

impl<P: WorkerProvider> Default for SupervisorState<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: WorkerProvider> std::fmt::Debug for SupervisorState<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorState")
            .field("load", &self.load)
            .field("running", &self.running)
            .field("fault", &self.fault)
            .field("reset", &self.reset.state())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Forwards fault reports to the host as operator notifications.
struct HostSink<'a, H: Host + ?Sized> {
    host: &'a mut H,
    tick: u64,
    enabled: bool,
}

impl<'a, H: Host + ?Sized> FaultSink for HostSink<'a, H> {
    fn fault(&mut self, report: &FaultReport) {
        if self.enabled {
            self.host.notify(&report.notification(self.tick));
        }
    }
}

/// The per-tick entry point.
pub struct Supervisor<P: WorkerProvider> {
    config: SupervisorConfig,
    provider: P,
    state: SupervisorState<P>,
    last: TickOutcome,
}

impl<P: WorkerProvider> Supervisor<P> {
    pub fn new(config: SupervisorConfig, provider: P) -> Self {
        Supervisor {
            config,
            provider,
            state: SupervisorState::new(),
            last: TickOutcome::Idle,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &SupervisorState<P> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SupervisorState<P> {
        &mut self.state
    }

    /// What happened during the most recent call to [`tick`](#method.tick).
    pub fn last_outcome(&self) -> &TickOutcome {
        &self.last
    }

    /// Run one tick.
    ///
    /// Never panics on behalf of the worker and never returns an error: everything the host needs
    /// to know is communicated through `host`.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.last = self.run_tick(host);
    }

    fn run_tick<H: Host + ?Sized>(&mut self, host: &mut H) -> TickOutcome {
        let now = host.tick();
        self.state.stats.ticks += 1;

        let check = self
            .state
            .reset
            .check(&self.state.running, &mut self.state.fault);
        if let ResetCheck::PendingReset { cause, entered } = check {
            return self.request_reset(host, now, cause, entered);
        }

        let mut loaded_this_tick = false;
        if let Some(stage) = self.state.load.next_stage() {
            let decision = BootDecision::evaluate(host.remaining_budget(), self.config.boot_threshold);
            if let BootDecision::Defer {
                remaining,
                threshold,
            } = decision
            {
                tracing::info!("{}", decision);
                return TickOutcome::Deferred {
                    remaining,
                    threshold,
                };
            }

            if self.state.stats.load_started_at.is_none() {
                self.state.stats.load_started_at = Some(now);
            }

            match self.advance_loader(host, now, stage) {
                Outcome::Completed(LoadStage::Instantiate) => {
                    self.state.stats.loaded_at = Some(now);
                    tracing::info!(
                        ticks = self.state.stats.load_ticks().unwrap_or(1),
                        remaining_budget = host.remaining_budget(),
                        "loading complete"
                    );
                    loaded_this_tick = true;
                }
                Outcome::Completed(stage) => return TickOutcome::Advanced(stage),
                Outcome::Faulted(report) => {
                    self.state.fault = Some(report.kind);
                    return TickOutcome::Faulted(report);
                }
            }
        }

        match self.invoke_worker(host, now) {
            Outcome::Completed(()) => {
                self.state.stats.invocations += 1;
                TickOutcome::Invoked { loaded_this_tick }
            }
            Outcome::Faulted(report) => {
                self.state.fault = Some(report.kind);
                TickOutcome::Faulted(report)
            }
        }
    }

    fn request_reset<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        now: u64,
        cause: FaultKind,
        entered: bool,
    ) -> TickOutcome {
        if entered {
            tracing::warn!(%cause, "previous tick did not end cleanly; requesting environment reset");
            // faults caught by the boundary were already reported; a tick that never returned
            // had no chance to report anything
            if cause == FaultKind::NonReturningFault && self.config.notify_faults {
                let report = FaultReport::new(
                    cause,
                    "worker did not return control; resetting environment",
                );
                host.notify(&report.notification(now));
            }
            self.provider.reload();
        } else {
            tracing::debug!(%cause, "environment reset still pending");
        }
        host.request_environment_reset();
        TickOutcome::ResetRequested(cause)
    }

    fn advance_loader<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        now: u64,
        stage: LoadStage,
    ) -> Outcome<LoadStage> {
        let SupervisorState { load, running, .. } = &mut self.state;
        let provider = &mut self.provider;
        let mut sink = HostSink {
            host,
            tick: now,
            enabled: self.config.notify_faults,
        };
        supervise(
            running,
            &mut sink,
            FaultKind::LoadStageFailure(stage),
            || Loader::advance(load, provider),
        )
    }

    fn invoke_worker<H: Host + ?Sized>(&mut self, host: &mut H, now: u64) -> Outcome<()> {
        let SupervisorState { load, running, .. } = &mut self.state;
        let provider = &mut self.provider;
        let mut sink = HostSink {
            host,
            tick: now,
            enabled: self.config.notify_faults,
        };
        supervise(running, &mut sink, FaultKind::RuntimeFault, || {
            let handle = load
                .handle_mut()
                .ok_or_else(|| tickboot_format_err!("no instantiated worker to invoke"))?;
            provider.invoke(handle).map_err(Error::WorkerFault)
        })
    }
}

impl<P: WorkerProvider> std::fmt::Debug for Supervisor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("last", &self.last)
            .finish()
    }
}
