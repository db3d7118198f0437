//! The resumable worker loader.
//!
//! Loading is split into stages so that no single tick has to pay for all of it. Each stage's
//! result is cached in the [`LoadState`](enum.LoadState.html) variant itself, so re-entering the
//! loader on a later tick picks up exactly where the previous tick left off.

use crate::error::Error;
use crate::provider::{LoadStage, WorkerProvider};

/// How far the worker has been loaded in the current environment.
///
/// The state only ever moves forward. The only way back to `NotStarted` is to drop the whole
/// state along with the environment that owns it.
pub enum LoadState<P: WorkerProvider> {
    NotStarted,
    BytesAcquired(Vec<u8>),
    Compiled(P::Compiled),
    Instantiated(P::Handle),
}

impl<P: WorkerProvider> LoadState<P> {
    pub fn new() -> Self {
        LoadState::NotStarted
    }

    /// The stage that the next call to [`Loader::advance`](struct.Loader.html#method.advance)
    /// will run, or `None` once the worker is instantiated.
    pub fn next_stage(&self) -> Option<LoadStage> {
        match self {
            LoadState::NotStarted => Some(LoadStage::AcquireBytes),
            LoadState::BytesAcquired(_) => Some(LoadStage::Compile),
            LoadState::Compiled(_) => Some(LoadStage::Instantiate),
            LoadState::Instantiated(_) => None,
        }
    }

    /// Position of this state in the load order, `0` for `NotStarted` through `3` for
    /// `Instantiated`.
    pub fn ordinal(&self) -> u8 {
        match self {
            LoadState::NotStarted => 0,
            LoadState::BytesAcquired(_) => 1,
            LoadState::Compiled(_) => 2,
            LoadState::Instantiated(_) => 3,
        }
    }

    pub fn is_instantiated(&self) -> bool {
        match self {
            LoadState::Instantiated(_) => true,
            _ => false,
        }
    }

    pub fn handle(&self) -> Option<&P::Handle> {
        match self {
            LoadState::Instantiated(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn handle_mut(&mut self) -> Option<&mut P::Handle> {
        match self {
            LoadState::Instantiated(handle) => Some(handle),
            _ => None,
        }
    }
}

impl<P: WorkerProvider> Default for LoadState<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: WorkerProvider> std::fmt::Debug for LoadState<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::NotStarted => write!(f, "NotStarted"),
            LoadState::BytesAcquired(bytes) => write!(f, "BytesAcquired({} bytes)", bytes.len()),
            LoadState::Compiled(_) => write!(f, "Compiled"),
            LoadState::Instantiated(_) => write!(f, "Instantiated"),
        }
    }
}

impl<P: WorkerProvider> std::fmt::Display for LoadState<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::NotStarted => write!(f, "not started"),
            LoadState::BytesAcquired(_) => write!(f, "bytes acquired"),
            LoadState::Compiled(_) => write!(f, "compiled"),
            LoadState::Instantiated(_) => write!(f, "instantiated"),
        }
    }
}

pub struct Loader;

impl Loader {
    /// Run exactly one load stage, moving `state` forward by one step.
    ///
    /// On failure `state` is left untouched at the stage that was attempted and the provider's
    /// error is wrapped with the stage name. Calling this on an instantiated state is a bug in the
    /// caller.
    ///
    /// Returns the stage that completed.
    pub fn advance<P: WorkerProvider>(
        state: &mut LoadState<P>,
        provider: &mut P,
    ) -> Result<LoadStage, Error> {
        match state {
            LoadState::NotStarted => {
                tracing::debug!("acquiring worker bytes");
                let bytes = provider
                    .acquire_bytes()
                    .map_err(|e| tickboot_stage_err!(LoadStage::AcquireBytes, e))?;
                *state = LoadState::BytesAcquired(bytes);
                Ok(LoadStage::AcquireBytes)
            }
            LoadState::BytesAcquired(bytes) => {
                tracing::debug!(len = bytes.len(), "compiling worker");
                let compiled = provider
                    .compile(bytes)
                    .map_err(|e| tickboot_stage_err!(LoadStage::Compile, e))?;
                *state = LoadState::Compiled(compiled);
                Ok(LoadStage::Compile)
            }
            LoadState::Compiled(compiled) => {
                tracing::debug!("instantiating worker");
                let handle = provider
                    .instantiate(compiled)
                    .map_err(|e| tickboot_stage_err!(LoadStage::Instantiate, e))?;
                // replacing the variant drops the compiled form; the provider can drop its own
                // copy of the raw artifact now too
                *state = LoadState::Instantiated(handle);
                provider.release_bytes();
                Ok(LoadStage::Instantiate)
            }
            LoadState::Instantiated(_) => {
                tickboot_bail!("loader advanced past instantiation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, MockProviderBuilder};

    #[test]
    fn stages_run_in_order() {
        let mut provider = MockProvider::new();
        let mut state = LoadState::<MockProvider>::new();

        let mut seen = vec![];
        while !state.is_instantiated() {
            let before = state.ordinal();
            let expected = state.next_stage().expect("not instantiated yet");
            let stage = Loader::advance(&mut state, &mut provider).expect("stage succeeds");
            assert_eq!(stage, expected);
            assert_eq!(state.ordinal(), before + 1);
            seen.push(stage);
        }

        assert_eq!(seen, LoadStage::ALL.to_vec());
        assert_eq!(provider.acquire_calls, 1);
        assert_eq!(provider.compile_calls, 1);
        assert_eq!(provider.instantiate_calls, 1);
        assert_eq!(provider.release_calls, 1);
        assert!(!provider.holds_bytes());
        assert_eq!(state.handle().map(|h| h.generation), Some(1));
    }

    #[test]
    fn advancing_an_instantiated_state_is_an_error() {
        let mut provider = MockProvider::new();
        let mut state = LoadState::<MockProvider>::new();
        for _ in 0..3 {
            Loader::advance(&mut state, &mut provider).unwrap();
        }
        match Loader::advance(&mut state, &mut provider) {
            Err(Error::InternalError(_)) => {}
            res => panic!("unexpected result: {:?}", res.map(|s| s.to_string())),
        }
        assert_eq!(provider.stage_calls(), 3);
        assert!(state.is_instantiated());
    }

    #[test]
    fn failed_stage_leaves_state_in_place() {
        let mut provider = MockProviderBuilder::new()
            .with_failing_stage(LoadStage::Compile, "bad magic")
            .build();
        let mut state = LoadState::<MockProvider>::new();

        Loader::advance(&mut state, &mut provider).expect("bytes acquired");
        match Loader::advance(&mut state, &mut provider) {
            Err(Error::LoadStage { stage, source }) => {
                assert_eq!(stage, LoadStage::Compile);
                assert_eq!(source.to_string(), "bad magic");
            }
            res => panic!("unexpected result: {:?}", res.map(|s| s.to_string())),
        }
        assert_eq!(state.ordinal(), 1);
        assert_eq!(state.next_stage(), Some(LoadStage::Compile));
    }

    #[test]
    fn compiled_form_sees_acquired_bytes() {
        let mut provider = MockProviderBuilder::new().with_bytes(&[1, 2, 3, 4, 5]).build();
        let mut state = LoadState::<MockProvider>::new();
        Loader::advance(&mut state, &mut provider).unwrap();
        assert_eq!(format!("{:?}", state), "BytesAcquired(5 bytes)");
        Loader::advance(&mut state, &mut provider).unwrap();
        match &state {
            LoadState::Compiled(compiled) => assert_eq!(compiled.len, 5),
            other => panic!("unexpected state: {:?}", other),
        }
    }
}
