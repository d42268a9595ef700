//! Pipeline orchestrator: capture → correct (with retries) → paste → restore.
//!
//! [`OrchestratorHandle`] is the cheap, cloneable front door used by the
//! hotkey side; [`PipelineOrchestrator`] is the single worker task that runs
//! accepted jobs one at a time.
//!
//! # Job flow
//!
//! ```text
//! trigger()  Idle ─CAS─▶ Capturing, epoch += 1, epoch ─▶ worker
//!
//! worker:
//!   cursor_position()                       anchor fixed for the job
//!   spawn_blocking(capture_selection)       [Capturing]
//!     └─ Err ─▶ Failed(EmptySelection | InputSimulationFailure)
//!   client.correct(prompt, text, n)         [Correcting(n)]
//!     ├─ retryable, n < max ─▶ Correcting(n+1), backoff wait
//!     └─ fatal / exhausted  ─▶ Failed(kind)
//!   spawn_blocking(apply_and_restore)       [Applying]
//!     └─ Err ─▶ Failed(InputSimulationFailure)
//!   Succeeded
//!   terminal display delay ─▶ Idle
//! ```
//!
//! `cancel()` flips the phase to `Failed(Cancelled)` immediately.  The worker
//! checks for that at every boundary (before and after each service call,
//! during backoff, before applying) and abandons the job, restoring the
//! clipboard.  A service call already in flight is not interrupted; its
//! result is discarded.
//!
//! All blocking work (clipboard I/O, key simulation) is pushed onto
//! `tokio::task::spawn_blocking` so the async runtime never stalls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::config::AppConfig;
use crate::inject::{CaptureTiming, ClipboardGuard, InjectError, InputSimulator};
use crate::llm::{CorrectionClient, CorrectionService};

use super::job::{CorrectionJob, JobOutcome};
use super::state::{Anchor, ErrorKind, PhaseCell, PhaseSnapshot, PhaseUpdate, PipelinePhase};

// ---------------------------------------------------------------------------
// OrchestratorHandle
// ---------------------------------------------------------------------------

/// Front door to the pipeline.  Cloneable; every method returns at once.
#[derive(Clone)]
pub struct OrchestratorHandle {
    cell: Arc<PhaseCell>,
    jobs: mpsc::Sender<u64>,
}

impl OrchestratorHandle {
    /// Start a job if the pipeline is idle.
    ///
    /// Returns `false`, with no side effect, when a job is already
    /// outstanding (including its terminal display) or the worker is gone.
    pub fn trigger(&self) -> bool {
        let Some(epoch) = self.cell.try_begin() else {
            log::debug!(
                "pipeline: trigger dropped, busy in {}",
                self.cell.phase().label()
            );
            return false;
        };
        if let Err(e) = self.jobs.try_send(epoch) {
            log::warn!("pipeline: worker unavailable ({e}), trigger dropped");
            self.cell.abandon(epoch);
            return false;
        }
        log::info!("pipeline: job {epoch} accepted");
        true
    }

    /// Cancel the outstanding job, if it is still capturing or correcting.
    pub fn cancel(&self) {
        match self.cell.cancel() {
            Some(epoch) => log::info!("pipeline: job {epoch} cancelled"),
            None => log::debug!(
                "pipeline: nothing to cancel in {}",
                self.cell.phase().label()
            ),
        }
    }

    pub fn current_phase(&self) -> PipelinePhase {
        self.cell.phase()
    }

    /// Watch every committed phase change.
    pub fn subscribe(&self) -> watch::Receiver<PhaseSnapshot> {
        self.cell.subscribe()
    }
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// The pipeline worker.
///
/// Create with [`PipelineOrchestrator::from_config`], then spawn
/// [`run`](Self::run) as a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use text_corrector::config::AppConfig;
/// use text_corrector::inject::SystemInput;
/// use text_corrector::llm::ApiCorrector;
/// use text_corrector::pipeline::PipelineOrchestrator;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let (orchestrator, handle) = PipelineOrchestrator::from_config(
///     &config,
///     Arc::new(SystemInput::default()),
///     Arc::new(ApiCorrector::from_config(&config.llm)),
///     None,
/// );
/// tokio::spawn(orchestrator.run());
/// handle.trigger();
/// # }
/// ```
pub struct PipelineOrchestrator {
    cell: Arc<PhaseCell>,
    jobs: mpsc::Receiver<u64>,
    guard: Arc<ClipboardGuard>,
    client: CorrectionClient,
    prompt: String,
    terminal_display: Duration,
    outcomes: Option<mpsc::Sender<JobOutcome>>,
}

/// How a job left the correction loop early.
enum Abort {
    Failed(ErrorKind),
    Cancelled,
}

impl PipelineOrchestrator {
    /// Build the worker and its handle.
    ///
    /// # Arguments
    ///
    /// * `input`  : OS input primitives (e.g. `SystemInput`).
    /// * `service`: correction backend (e.g. `ApiCorrector`).
    /// * `overlay`: receives every committed phase change, if given.
    pub fn from_config(
        config: &AppConfig,
        input: Arc<dyn InputSimulator>,
        service: Arc<dyn CorrectionService>,
        overlay: Option<mpsc::UnboundedSender<PhaseUpdate>>,
    ) -> (Self, OrchestratorHandle) {
        let cell = Arc::new(PhaseCell::new(overlay));
        // Triggers are only accepted from Idle, so one slot is enough.
        let (jobs_tx, jobs_rx) = mpsc::channel(1);

        let orchestrator = Self {
            cell: Arc::clone(&cell),
            jobs: jobs_rx,
            guard: Arc::new(ClipboardGuard::new(
                input,
                CaptureTiming::from(&config.clipboard),
            )),
            client: CorrectionClient::from_config(service, config),
            prompt: config.llm.prompt.clone(),
            terminal_display: Duration::from_millis(config.overlay.terminal_display_ms),
            outcomes: None,
        };
        let handle = OrchestratorHandle {
            cell,
            jobs: jobs_tx,
        };
        (orchestrator, handle)
    }

    /// Report every finished job on `tx`.
    pub fn with_outcomes(mut self, tx: mpsc::Sender<JobOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    /// Replace the correction client (e.g. to seed its jitter).
    pub fn with_client(mut self, client: CorrectionClient) -> Self {
        self.client = client;
        self
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run jobs until every [`OrchestratorHandle`] is dropped.
    pub async fn run(mut self) {
        while let Some(epoch) = self.jobs.recv().await {
            let outcome = self.run_job(epoch).await;
            self.finish(outcome).await;
        }
        log::info!("pipeline: all handles dropped, orchestrator shutting down");
    }

    async fn run_job(&self, epoch: u64) -> JobOutcome {
        let anchor = self.cursor_anchor().await;
        self.cell.set_anchor(epoch, anchor);
        let mut job = CorrectionJob::new(epoch, anchor);

        let result = match self.capture_and_correct(&mut job).await {
            Ok(corrected) => self.apply(epoch, corrected).await,
            Err(abort) => Err(self.abort(epoch, abort).await),
        };
        job.finish(result)
    }

    /// Capturing and Correcting phases.  Returns the corrected text.
    async fn capture_and_correct(&self, job: &mut CorrectionJob) -> Result<String, Abort> {
        let epoch = job.epoch;

        let guard = Arc::clone(&self.guard);
        job.original_text = blocking(move || guard.capture_selection())
            .await
            .map_err(|e| Abort::Failed(e.kind()))?;
        log::info!(
            "pipeline: job {epoch} captured {} chars",
            job.original_text.chars().count()
        );

        let mut attempt = 1;
        if !self.cell.advance(epoch, PipelinePhase::Correcting { attempt }) {
            return Err(Abort::Cancelled);
        }

        loop {
            job.attempt_count = attempt;
            if self.cell.is_stale(epoch) {
                return Err(Abort::Cancelled);
            }

            let result = self
                .client
                .correct(&self.prompt, &job.original_text, attempt)
                .await;

            if self.cell.is_stale(epoch) {
                log::info!("pipeline: job {epoch} result discarded after cancel");
                return Err(Abort::Cancelled);
            }

            let err = match result {
                Ok(corrected) => {
                    job.corrected_text = Some(corrected.clone());
                    return Ok(corrected);
                }
                Err(err) => err,
            };

            let Some(delay) = self.client.retry_delay(attempt, &err) else {
                if err.retryable {
                    log::warn!("pipeline: job {epoch} gave up after {attempt} attempts");
                }
                return Err(Abort::Failed(err.kind));
            };

            attempt += 1;
            if !self.cell.advance(epoch, PipelinePhase::Correcting { attempt }) {
                return Err(Abort::Cancelled);
            }
            log::info!(
                "pipeline: job {epoch} retrying in {} ms (attempt {attempt})",
                delay.as_millis()
            );
            if !self.backoff(epoch, delay).await {
                return Err(Abort::Cancelled);
            }
        }
    }

    /// Applying phase.  The paste is committed once `Applying` is entered.
    async fn apply(&self, epoch: u64, corrected: String) -> Result<(), ErrorKind> {
        if !self.cell.advance(epoch, PipelinePhase::Applying) {
            return Err(self.abort(epoch, Abort::Cancelled).await);
        }

        let guard = Arc::clone(&self.guard);
        match blocking(move || guard.apply_and_restore(&corrected)).await {
            Ok(()) => {
                self.cell.advance(epoch, PipelinePhase::Succeeded);
                Ok(())
            }
            Err(e) => {
                log::error!("pipeline: job {epoch} paste failed: {e}");
                let kind = ErrorKind::InputSimulationFailure;
                self.cell.advance(epoch, PipelinePhase::Failed(kind));
                Err(kind)
            }
        }
    }

    /// Restore the clipboard and record the failure.  Returns the kind the
    /// job actually ended with (a concurrent cancel wins).
    async fn abort(&self, epoch: u64, abort: Abort) -> ErrorKind {
        let guard = Arc::clone(&self.guard);
        if let Err(e) = blocking(move || guard.restore()).await {
            log::warn!("pipeline: job {epoch} clipboard restore failed: {e}");
        }

        match abort {
            Abort::Failed(kind) if self.cell.advance(epoch, PipelinePhase::Failed(kind)) => kind,
            _ => ErrorKind::Cancelled,
        }
    }

    /// Sleep `delay`, waking early on cancel.  Returns `false` when the job
    /// went stale.
    async fn backoff(&self, epoch: u64, delay: Duration) -> bool {
        let mut rx = self.cell.subscribe();
        let stale = async {
            rx.wait_for(|s| {
                s.epoch != epoch || s.phase == PipelinePhase::Failed(ErrorKind::Cancelled)
            })
            .await
            .map(|_| ())
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.cell.is_stale(epoch),
            _ = stale => false,
        }
    }

    async fn cursor_anchor(&self) -> Anchor {
        let guard = Arc::clone(&self.guard);
        match blocking(move || guard.input().cursor_position()).await {
            Ok(pos) => Anchor::from(pos),
            Err(e) => {
                log::debug!("pipeline: cursor position unavailable ({e}), using origin");
                Anchor::default()
            }
        }
    }

    /// Log, report, hold the terminal phase on screen, then go back to Idle.
    async fn finish(&self, outcome: JobOutcome) {
        let epoch = outcome.epoch;
        match &outcome.result {
            Ok(_) => log::info!(
                "pipeline: job {epoch} succeeded after {} attempt(s) in {} ms",
                outcome.attempts,
                outcome.elapsed.as_millis()
            ),
            Err(kind) => log::info!(
                "pipeline: job {epoch} failed: {kind} after {} attempt(s) in {} ms",
                outcome.attempts,
                outcome.elapsed.as_millis()
            ),
        }

        if let Some(tx) = &self.outcomes {
            if tx.try_send(outcome).is_err() {
                log::debug!("pipeline: outcome of job {epoch} not delivered");
            }
        }

        tokio::time::sleep(self.terminal_display).await;
        if !self.cell.advance(epoch, PipelinePhase::Idle) {
            log::warn!(
                "pipeline: job {epoch} could not return to Idle from {}",
                self.cell.phase().label()
            );
        }
    }
}

/// Run blocking input work off the runtime.  A panicked task counts as an
/// input failure.
async fn blocking<T, F>(f: F) -> Result<T, InjectError>
where
    F: FnOnce() -> Result<T, InjectError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(InjectError::KeySimulation(format!("input task failed: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::fake::FakeInput;
    use crate::llm::scripted::ScriptedService;
    use crate::llm::LlmError;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    struct Harness {
        handle: OrchestratorHandle,
        input: Arc<FakeInput>,
        service: Arc<ScriptedService>,
        outcomes: mpsc::Receiver<JobOutcome>,
        overlay: mpsc::UnboundedReceiver<PhaseUpdate>,
    }

    fn test_config(max_attempts: u32) -> AppConfig {
        let mut config = AppConfig::default();
        config.retry.max_attempts = max_attempts;
        config.clipboard.capture_timeout_ms = 40;
        config.clipboard.poll_interval_ms = 2;
        config.clipboard.pre_capture_delay_ms = 0;
        config.clipboard.settle_delay_ms = 0;
        config.overlay.terminal_display_ms = 100;
        config
    }

    fn start(input: FakeInput, service: ScriptedService, max_attempts: u32) -> Harness {
        let input = Arc::new(input);
        let service = Arc::new(service);
        let (overlay_tx, overlay) = mpsc::unbounded_channel();
        let (outcome_tx, outcomes) = mpsc::channel(8);

        let (orchestrator, handle) = PipelineOrchestrator::from_config(
            &test_config(max_attempts),
            Arc::clone(&input) as Arc<dyn InputSimulator>,
            Arc::clone(&service) as Arc<dyn CorrectionService>,
            Some(overlay_tx),
        );
        tokio::spawn(orchestrator.with_outcomes(outcome_tx).run());

        Harness {
            handle,
            input,
            service,
            outcomes,
            overlay,
        }
    }

    impl Harness {
        async fn next_outcome(&mut self) -> JobOutcome {
            self.outcomes.recv().await.expect("orchestrator stopped")
        }

        async fn wait_idle(&self) {
            let mut rx = self.handle.subscribe();
            rx.wait_for(|s| s.phase == PipelinePhase::Idle)
                .await
                .map(|_| ())
                .expect("cell dropped");
        }

        fn phases(&mut self) -> Vec<PipelinePhase> {
            let mut seen = Vec::new();
            while let Ok(update) = self.overlay.try_recv() {
                seen.push(update.phase);
            }
            seen
        }
    }

    fn connection_reset() -> Result<String, LlmError> {
        Err(LlmError::Connection("reset by peer".into()))
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn success_pastes_and_restores_clipboard() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("hello wrld")),
            ScriptedService::always(Ok("hello world".into())),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.result.as_deref(), Ok("hello world"));
        assert_eq!(outcome.attempts, 1);

        h.wait_idle().await;
        let st = h.input.state();
        assert_eq!(st.pasted, vec!["hello world".to_string()]);
        assert_eq!(st.clipboard.as_deref(), Some("X"));
        assert_eq!(
            h.service.prompts()[0].1,
            "hello wrld",
            "selection is sent verbatim"
        );

        assert_eq!(
            h.phases(),
            vec![
                PipelinePhase::Capturing,
                PipelinePhase::Capturing, // anchor recorded
                PipelinePhase::Correcting { attempt: 1 },
                PipelinePhase::Applying,
                PipelinePhase::Succeeded,
                PipelinePhase::Idle,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_while_busy_is_dropped() {
        let gate = Arc::new(Notify::new());
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(Ok("fixed".into())).gated(Arc::clone(&gate)),
            3,
        );

        assert!(h.handle.trigger());
        assert!(!h.handle.trigger());
        assert!(!h.handle.trigger());

        gate.notify_one();
        let outcome = h.next_outcome().await;
        assert!(outcome.is_success());
        // Still showing Succeeded: triggers stay dropped until Idle.
        assert!(!h.handle.trigger());

        h.wait_idle().await;
        assert_eq!(h.service.calls(), 1);
        assert_eq!(h.input.state().pasted.len(), 1);

        assert!(h.handle.trigger());
        gate.notify_one();
        assert!(h.next_outcome().await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("hello wrld")),
            ScriptedService::then(
                vec![connection_reset(), connection_reset()],
                Ok("hello world".into()),
            ),
            5,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(h.service.calls(), 3);
        assert_eq!(h.handle.current_phase(), PipelinePhase::Succeeded);

        let phases = h.phases();
        assert!(phases.contains(&PipelinePhase::Correcting { attempt: 3 }));
        assert!(!phases.contains(&PipelinePhase::Correcting { attempt: 4 }));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_is_not_retried() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(Err(LlmError::Auth("HTTP 401".into()))),
            5,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::AuthFailure));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(h.service.calls(), 1);
        assert_eq!(
            h.handle.current_phase(),
            PipelinePhase::Failed(ErrorKind::AuthFailure)
        );

        let st = h.input.state();
        assert!(st.pasted.is_empty());
        assert_eq!(st.clipboard.as_deref(), Some("X"));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_exhausts_with_growing_delays() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(Err(LlmError::RateLimited { retry_after: None })),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::RateLimited));
        assert_eq!(outcome.attempts, 3);

        let times = h.service.call_times();
        assert_eq!(times.len(), 3);
        let first_gap = times[1] - times[0];
        let second_gap = times[2] - times[1];
        // base 500 ms, doubled again for throttling.
        assert!(first_gap >= Duration::from_millis(1_000), "{first_gap:?}");
        assert!(second_gap > first_gap, "{first_gap:?} then {second_gap:?}");

        assert_eq!(h.input.state().clipboard.as_deref(), Some("X"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_in_flight_result() {
        let gate = Arc::new(Notify::new());
        let mut h = start(
            FakeInput::new(Some("X"), Some("hello wrld")),
            ScriptedService::always(Ok("hello world".into())).gated(Arc::clone(&gate)),
            3,
        );

        assert!(h.handle.trigger());
        while h.service.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        h.handle.cancel();
        assert_eq!(
            h.handle.current_phase(),
            PipelinePhase::Failed(ErrorKind::Cancelled)
        );

        // The call now resolves successfully; it must be ignored.
        gate.notify_one();
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));

        h.wait_idle().await;
        let st = h.input.state();
        assert!(st.pasted.is_empty());
        assert_eq!(st.clipboard.as_deref(), Some("X"));
        assert!(!h.phases().contains(&PipelinePhase::Applying));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_stops_retrying() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(connection_reset()),
            5,
        );

        assert!(h.handle.trigger());
        let mut rx = h.handle.subscribe();
        rx.wait_for(|s| s.phase == PipelinePhase::Correcting { attempt: 2 })
            .await
            .map(|_| ())
            .unwrap();

        h.handle.cancel();
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(h.service.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_selection_never_calls_service() {
        let mut h = start(
            FakeInput::new(Some("X"), None),
            ScriptedService::always(Ok("unused".into())),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::EmptySelection));
        assert_eq!(outcome.attempts, 0);
        assert_eq!(h.service.calls(), 0);
        assert_eq!(h.input.state().clipboard.as_deref(), Some("X"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_clipboard_stays_empty_after_failed_capture() {
        let mut h = start(
            FakeInput::new(None, None),
            ScriptedService::always(Ok("unused".into())),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::EmptySelection));
        assert_eq!(h.input.state().clipboard, None);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_clipboard_stays_empty_after_cancel() {
        let gate = Arc::new(Notify::new());
        let mut h = start(
            FakeInput::new(None, Some("text")),
            ScriptedService::always(Ok("fixed".into())).gated(Arc::clone(&gate)),
            3,
        );

        assert!(h.handle.trigger());
        while h.service.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        h.handle.cancel();
        gate.notify_one();

        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
        let st = h.input.state();
        assert!(st.pasted.is_empty());
        assert_eq!(st.clipboard, None);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_correction_fails_without_paste() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(Ok("   ".into())),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::EmptyResponse));
        assert_eq!(h.service.calls(), 1);
        assert!(h.input.state().pasted.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn paste_failure_is_input_simulation_failure() {
        let mut h = start(
            FakeInput::new(Some("X"), Some("text")).failing_paste(),
            ScriptedService::always(Ok("fixed".into())),
            3,
        );

        assert!(h.handle.trigger());
        let outcome = h.next_outcome().await;
        assert_eq!(
            outcome.error_kind(),
            Some(ErrorKind::InputSimulationFailure)
        );
        assert_eq!(h.input.state().clipboard.as_deref(), Some("X"));
        h.wait_idle().await;
    }

    #[tokio::test]
    async fn cancel_when_idle_is_noop() {
        let h = start(
            FakeInput::new(Some("X"), Some("text")),
            ScriptedService::always(Ok("fixed".into())),
            3,
        );
        h.handle.cancel();
        assert_eq!(h.handle.current_phase(), PipelinePhase::Idle);
    }

    #[tokio::test]
    async fn trigger_without_worker_is_rejected() {
        let (orchestrator, handle) = PipelineOrchestrator::from_config(
            &test_config(3),
            Arc::new(FakeInput::new(None, Some("text"))),
            Arc::new(ScriptedService::always(Ok("x".into()))),
            None,
        );
        drop(orchestrator);

        assert!(!handle.trigger());
        assert_eq!(handle.current_phase(), PipelinePhase::Idle);
    }
}
