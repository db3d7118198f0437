pub mod mock;

pub use crate::provider::mock::{MockProvider, MockProviderBuilder};

use anyhow::Error as AnyError;

/// One unit of externally-costly load work.
///
/// Stages run in declaration order; the derived `Ord` reflects that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadStage {
    AcquireBytes,
    Compile,
    Instantiate,
}

impl LoadStage {
    pub const ALL: [LoadStage; 3] = [
        LoadStage::AcquireBytes,
        LoadStage::Compile,
        LoadStage::Instantiate,
    ];
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::AcquireBytes => write!(f, "acquire bytes"),
            LoadStage::Compile => write!(f, "compile"),
            LoadStage::Instantiate => write!(f, "instantiate"),
        }
    }
}

/// The source of the worker: everything the supervisor knows about the unit it runs.
///
/// Implementations are free to fail any operation with an arbitrary error, or to panic; the
/// supervisor treats both the same way. Operations are never called concurrently, and each load
/// stage is called at most once per environment lifetime unless a previous call failed (in which
/// case the environment is reset before anything else happens).
pub trait WorkerProvider {
    /// The executable form produced by [`compile`](#tymethod.compile).
    type Compiled;

    /// A runnable instance of the worker.
    type Handle;

    /// Fetch the raw worker artifact.
    fn acquire_bytes(&mut self) -> Result<Vec<u8>, AnyError>;

    fn compile(&mut self, bytes: &[u8]) -> Result<Self::Compiled, AnyError>;

    fn instantiate(&mut self, compiled: &Self::Compiled) -> Result<Self::Handle, AnyError>;

    /// Run the worker once.
    fn invoke(&mut self, handle: &mut Self::Handle) -> Result<(), AnyError>;

    /// Drop any copy of the raw artifact the provider itself is caching.
    ///
    /// Called once, after instantiation succeeds.
    fn release_bytes(&mut self) {}

    /// Forget everything cached about the worker so that a fresh environment loads it from
    /// scratch.
    ///
    /// Called when the supervisor enters the pending-reset state.
    fn reload(&mut self) {}
}
