//! The hosting environment's lifetime, modeled explicitly.
//!
//! The supervisor never recovers from a fault in place; it asks its host to destroy everything and
//! start over. [`Environment`](struct.Environment.html) is that host-side owner: it holds the
//! current supervisor, passes each tick through to it, and when a reset was requested during the
//! tick, drops the supervisor so that the next tick starts from a freshly built one.

use crate::host::Host;
use crate::provider::WorkerProvider;
use crate::supervisor::{Supervisor, TickOutcome};

/// Watches for reset requests while forwarding everything to the real host.
struct ResetWatch<'a, H: Host + ?Sized> {
    inner: &'a mut H,
    requested: bool,
}

impl<'a, H: Host + ?Sized> Host for ResetWatch<'a, H> {
    fn tick(&self) -> u64 {
        self.inner.tick()
    }

    fn remaining_budget(&self) -> u64 {
        self.inner.remaining_budget()
    }

    fn notify(&mut self, message: &str) {
        self.inner.notify(message)
    }

    fn request_environment_reset(&mut self) {
        self.requested = true;
        self.inner.request_environment_reset()
    }
}

/// Owns a [`Supervisor`](../supervisor/struct.Supervisor.html) and rebuilds it from `factory`
/// after every reset.
pub struct Environment<P, F>
where
    P: WorkerProvider,
    F: FnMut() -> Supervisor<P>,
{
    factory: F,
    supervisor: Option<Supervisor<P>>,
    generation: u64,
    resets: u64,
}

impl<P, F> Environment<P, F>
where
    P: WorkerProvider,
    F: FnMut() -> Supervisor<P>,
{
    /// Create an environment. No supervisor is built until the first tick.
    pub fn new(factory: F) -> Self {
        Environment {
            factory,
            supervisor: None,
            generation: 0,
            resets: 0,
        }
    }

    /// Run one tick, building a supervisor first if there is none.
    ///
    /// If the supervisor requested a reset during this tick, it is dropped along with everything
    /// it owns before this returns.
    pub fn run_tick<H: Host + ?Sized>(&mut self, host: &mut H) -> TickOutcome {
        let factory = &mut self.factory;
        let generation = &mut self.generation;
        let supervisor = self.supervisor.get_or_insert_with(|| {
            *generation += 1;
            tracing::debug!(generation = *generation, "creating environment");
            factory()
        });

        let mut watch = ResetWatch {
            inner: host,
            requested: false,
        };
        supervisor.tick(&mut watch);
        let outcome = supervisor.last_outcome().clone();

        if watch.requested {
            self.destroy();
        }
        outcome
    }

    /// Drop the current supervisor, if any.
    pub fn destroy(&mut self) {
        if self.supervisor.take().is_some() {
            self.resets += 1;
            tracing::info!(
                generation = self.generation,
                resets = self.resets,
                "environment destroyed"
            );
        }
    }

    pub fn supervisor(&self) -> Option<&Supervisor<P>> {
        self.supervisor.as_ref()
    }

    /// How many supervisors have been built so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How many times the environment has been destroyed.
    pub fn resets(&self) -> u64 {
        self.resets
    }
}
