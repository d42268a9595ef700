//! Scripted [`CorrectionService`] for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::corrector::{CorrectionService, LlmError};

/// Plays back queued results, then repeats `fallback` forever.
pub struct ScriptedService {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Result<String, LlmError>,
    latency: Duration,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedService {
    pub fn always(result: Result<String, LlmError>) -> Self {
        Self::then(Vec::new(), result)
    }

    pub fn then(
        script: Vec<Result<String, LlmError>>,
        fallback: Result<String, LlmError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            latency: Duration::ZERO,
            gate: None,
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every call blocks until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// When each call started.
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CorrectionService for ScriptedService {
    async fn correct(&self, prompt: &str, text: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(Instant::now());
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), text.to_string()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
