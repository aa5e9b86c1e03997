//! Scripted endpoint stub shared by retry and driver tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use brandlens_core::{CompletionEndpoint, CompletionError, Provider};

/// Replays a fixed sequence of completion results, one per call.
pub(crate) struct ScriptedEndpoint {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    probe_error: Option<CompletionError>,
    calls: AtomicUsize,
}

impl ScriptedEndpoint {
    pub(crate) fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            probe_error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_probe_error(mut self, err: CompletionError) -> Self {
        self.probe_error = Some(err);
        self
    }

    /// Number of `complete` calls made so far
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionEndpoint for ScriptedEndpoint {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::transient("script exhausted")))
    }

    async fn probe(&self) -> Result<(), CompletionError> {
        match &self.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
