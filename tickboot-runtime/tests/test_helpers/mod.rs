use tickboot_runtime::{
    MockProvider, RecordingHost, Supervisor, SupervisorConfig, TickOutcome, WorkerProvider,
};

/// The threshold used throughout these tests.
pub const THRESHOLD: u64 = 500;

/// A host whose first tick is numbered 1.
pub fn host(budget: u64) -> RecordingHost {
    let mut host = RecordingHost::new(budget);
    host.tick = 1;
    host
}

pub fn mock_supervisor(threshold: u64) -> Supervisor<MockProvider> {
    Supervisor::new(SupervisorConfig::new(threshold), MockProvider::new())
}

/// Run `n` ticks, advancing the host's tick counter after each one, and collect the outcomes.
pub fn run_ticks<P: WorkerProvider>(
    sup: &mut Supervisor<P>,
    host: &mut RecordingHost,
    n: usize,
) -> Vec<TickOutcome> {
    let mut outcomes = Vec::with_capacity(n);
    for _ in 0..n {
        sup.tick(host);
        outcomes.push(sup.last_outcome().clone());
        host.next_tick();
    }
    outcomes
}

/// Run ticks until the worker is loaded, returning how many it took.
#[allow(dead_code)]
pub fn load_fully<P: WorkerProvider>(sup: &mut Supervisor<P>, host: &mut RecordingHost) -> usize {
    let mut ticks = 0;
    while !sup.state().load_state().is_instantiated() {
        assert!(ticks < 10, "worker failed to load: {:?}", sup.last_outcome());
        run_ticks(sup, host, 1);
        ticks += 1;
    }
    ticks
}
