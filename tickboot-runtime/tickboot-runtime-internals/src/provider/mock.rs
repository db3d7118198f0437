use crate::provider::{LoadStage, WorkerProvider};
use anyhow::{format_err, Error as AnyError};
use std::collections::HashMap;

type InvokeFn = Box<dyn FnMut(u64) -> Result<(), AnyError>>;

/// What a mock stage does when it is called.
enum StageBehavior {
    Fail(String),
    Panic(String),
}

/// The executable form produced by [`MockProvider`](struct.MockProvider.html).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCompiled {
    pub len: usize,
}

/// A runnable mock worker instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockInstance {
    /// Which instantiation produced this handle, starting at 1.
    pub generation: u64,
    /// How many times this instance has been invoked, including failed invocations.
    pub invocations: u64,
}

/// A scriptable worker provider, counting every call made to it.
pub struct MockProvider {
    bytes: Vec<u8>,
    cached_bytes: Option<Vec<u8>>,
    stage_behavior: HashMap<LoadStage, StageBehavior>,
    invoke_fn: Option<InvokeFn>,
    pub acquire_calls: u64,
    pub compile_calls: u64,
    pub instantiate_calls: u64,
    pub invoke_calls: u64,
    pub release_calls: u64,
    pub reload_calls: u64,
}

impl MockProvider {
    pub fn new() -> Self {
        MockProviderBuilder::new().build()
    }

    /// Total number of load stages that have been attempted.
    pub fn stage_calls(&self) -> u64 {
        self.acquire_calls + self.compile_calls + self.instantiate_calls
    }

    /// Whether the provider is still holding onto a copy of the raw artifact.
    pub fn holds_bytes(&self) -> bool {
        self.cached_bytes.is_some()
    }

    fn run_stage(&self, stage: LoadStage) -> Result<(), AnyError> {
        match self.stage_behavior.get(&stage) {
            None => Ok(()),
            Some(StageBehavior::Fail(msg)) => Err(format_err!("{}", msg)),
            Some(StageBehavior::Panic(msg)) => panic!("{}", msg),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerProvider for MockProvider {
    type Compiled = MockCompiled;
    type Handle = MockInstance;

    fn acquire_bytes(&mut self) -> Result<Vec<u8>, AnyError> {
        self.acquire_calls += 1;
        self.run_stage(LoadStage::AcquireBytes)?;
        let bytes = self.bytes.clone();
        self.cached_bytes = Some(bytes.clone());
        Ok(bytes)
    }

    fn compile(&mut self, bytes: &[u8]) -> Result<MockCompiled, AnyError> {
        self.compile_calls += 1;
        self.run_stage(LoadStage::Compile)?;
        Ok(MockCompiled { len: bytes.len() })
    }

    fn instantiate(&mut self, _compiled: &MockCompiled) -> Result<MockInstance, AnyError> {
        self.instantiate_calls += 1;
        self.run_stage(LoadStage::Instantiate)?;
        Ok(MockInstance {
            generation: self.instantiate_calls,
            invocations: 0,
        })
    }

    fn invoke(&mut self, handle: &mut MockInstance) -> Result<(), AnyError> {
        self.invoke_calls += 1;
        handle.invocations += 1;
        match self.invoke_fn.as_mut() {
            Some(f) => f(handle.invocations),
            None => Ok(()),
        }
    }

    fn release_bytes(&mut self) {
        self.release_calls += 1;
        self.cached_bytes = None;
    }

    fn reload(&mut self) {
        self.reload_calls += 1;
        self.cached_bytes = None;
    }
}

/// A builder for [`MockProvider`](struct.MockProvider.html)s.
pub struct MockProviderBuilder {
    bytes: Vec<u8>,
    stage_behavior: HashMap<LoadStage, StageBehavior>,
    invoke_fn: Option<InvokeFn>,
}

impl MockProviderBuilder {
    pub fn new() -> Self {
        MockProviderBuilder {
            bytes: b"\0asm\x01\0\0\0".to_vec(),
            stage_behavior: HashMap::new(),
            invoke_fn: None,
        }
    }

    pub fn with_bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes = bytes.to_vec();
        self
    }

    /// Make the given load stage return an error.
    pub fn with_failing_stage(mut self, stage: LoadStage, msg: &str) -> Self {
        self.stage_behavior
            .insert(stage, StageBehavior::Fail(msg.to_owned()));
        self
    }

    /// Make the given load stage panic.
    pub fn with_panicking_stage(mut self, stage: LoadStage, msg: &str) -> Self {
        self.stage_behavior
            .insert(stage, StageBehavior::Panic(msg.to_owned()));
        self
    }

    /// Script the worker's behavior. The closure receives the 1-based invocation count of the
    /// current instance.
    pub fn with_invoke<F>(mut self, f: F) -> Self
    where
        F: FnMut(u64) -> Result<(), AnyError> + 'static,
    {
        self.invoke_fn = Some(Box::new(f));
        self
    }

    pub fn build(self) -> MockProvider {
        MockProvider {
            bytes: self.bytes,
            cached_bytes: None,
            stage_behavior: self.stage_behavior,
            invoke_fn: self.invoke_fn,
            acquire_calls: 0,
            compile_calls: 0,
            instantiate_calls: 0,
            invoke_calls: 0,
            release_calls: 0,
            reload_calls: 0,
        }
    }
}

impl Default for MockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
