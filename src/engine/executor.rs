// src/engine/executor.rs

//! The command executor: one request in, one outcome out.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{CommandSection, ConfigFile, Schedule};
use crate::engine::gate::{AdmissionGate, GatePermit};
use crate::engine::{ExecutionOutcome, ExecutionRequest, StatusReporter};
use crate::exec::{Invocation, LifecycleOutcome, ManagedProcess, ProcessBackend};
use crate::output::{PostprocessOptions, postprocess};
use crate::types::BusyPolicy;

/// Everything about an execution that comes from configuration.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub command: CommandSection,
    pub schedule: Schedule,
    pub busy_policy: BusyPolicy,
    pub output: PostprocessOptions,
}

impl From<&ConfigFile> for ExecutorSettings {
    fn from(cfg: &ConfigFile) -> Self {
        Self {
            command: cfg.command.clone(),
            schedule: cfg.schedule,
            busy_policy: cfg.gate.when_busy,
            output: PostprocessOptions::from(&cfg.output),
        }
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&ConfigFile::default())
    }
}

/// Runs prompts through the external command, one at a time per gate scope.
///
/// Generic over the process backend so tests can drive it with a fake.
pub struct CommandExecutor<B: ProcessBackend> {
    gate: Arc<AdmissionGate>,
    backend: B,
    settings: ExecutorSettings,
}

impl<B: ProcessBackend> CommandExecutor<B> {
    pub fn new(gate: Arc<AdmissionGate>, backend: B, settings: ExecutorSettings) -> Self {
        Self {
            gate,
            backend,
            settings,
        }
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Execute one request, pushing its events into `reporter`.
    ///
    /// - Admission first: under `reject`, a busy gate ends the request with
    ///   `Busy` before anything is spawned.
    /// - The gate is released, and the process verified dead, before the
    ///   terminal event goes out; a caller reacting to the reply can submit
    ///   again straight away.
    /// - Exactly one terminal event is reported, always last.
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        reporter: &dyn StatusReporter,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let outcome = match self.admit(request, cancel).await {
            Ok(permit) => {
                let outcome = self.run_admitted(request, reporter, cancel).await;
                permit.release();
                outcome
            }
            Err(outcome) => outcome,
        };

        log_outcome(request, &outcome);
        reporter.report(outcome.terminal_event()).await;
        outcome
    }

    /// A permit, or the outcome that ends the request without spawning.
    /// A queued request stops waiting as soon as it is cancelled.
    async fn admit(
        &self,
        request: &ExecutionRequest,
        cancel: &CancellationToken,
    ) -> Result<GatePermit, ExecutionOutcome> {
        match self.settings.busy_policy {
            BusyPolicy::Reject => self
                .gate
                .try_acquire(&request.actor)
                .ok_or(ExecutionOutcome::Busy),
            BusyPolicy::Queue => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(actor = %request.actor, "cancelled while queued");
                    Err(ExecutionOutcome::Cancelled)
                }
                acquired = self.gate.acquire(&request.actor) => acquired.map_err(|e| {
                    error!(actor = %request.actor, error = %e, "could not wait for admission");
                    ExecutionOutcome::Busy
                }),
            },
        }
    }

    /// Everything that happens while the gate is held.
    async fn run_admitted(
        &self,
        request: &ExecutionRequest,
        reporter: &dyn StatusReporter,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let invocation = Invocation::for_prompt(&self.settings.command, &request.prompt);

        let mut process = match ManagedProcess::spawn(&self.backend, &invocation) {
            Ok(process) => process,
            Err(error) => {
                error!(actor = %request.actor, error = %error, "failed to start command");
                return ExecutionOutcome::Failed { error };
            }
        };

        let lifecycle = process
            .supervise(&self.settings.schedule, reporter, cancel)
            .await;

        // Whatever happened above, nothing of this request may keep running.
        process.ensure_stopped();

        match lifecycle {
            LifecycleOutcome::Completed { raw } => {
                let processed = postprocess(&raw, &self.settings.output);
                debug!(
                    actor = %request.actor,
                    has_code = processed.has_code(),
                    chars = processed.text.len(),
                    "reply post-processed"
                );
                ExecutionOutcome::Completed {
                    text: processed.text,
                    code: processed.code,
                }
            }
            LifecycleOutcome::TimedOut => ExecutionOutcome::TimedOut,
            LifecycleOutcome::Cancelled => ExecutionOutcome::Cancelled,
            LifecycleOutcome::Failed { error } => ExecutionOutcome::Failed { error },
        }
    }
}

fn log_outcome(request: &ExecutionRequest, outcome: &ExecutionOutcome) {
    let waited = request.submitted_at.elapsed().unwrap_or_default();
    match outcome {
        ExecutionOutcome::Completed { code, .. } => info!(
            actor = %request.actor,
            has_code = code.is_some(),
            elapsed_secs = waited.as_secs(),
            "execution completed"
        ),
        ExecutionOutcome::Busy => info!(actor = %request.actor, "execution rejected: busy"),
        ExecutionOutcome::TimedOut => warn!(
            actor = %request.actor,
            elapsed_secs = waited.as_secs(),
            "execution timed out"
        ),
        ExecutionOutcome::Cancelled => info!(actor = %request.actor, "execution cancelled"),
        ExecutionOutcome::Failed { error } => {
            error!(actor = %request.actor, error = %error, "execution failed")
        }
    }
}
