// src/exec/lifecycle.rs

//! Lifecycle of one managed process: spawn, two-phase bounded wait,
//! escalating termination.
//!
//! ```text
//! Spawning -> Running -> Completed
//!                     -> TimedOutKilling   (hard ceiling reached)
//!                     -> Cancelled         (caller cancelled)
//!                     -> Failed            (wait raised)
//! ```
//!
//! Every path that leaves a possibly-live process behind goes through
//! [`ManagedProcess::terminate`]. Dropping a `ManagedProcess` whose leader is
//! still running force-kills the group, so even a cancelled or panicking
//! caller cannot leak the process tree.

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{MAX_SCHEDULE_DURATION, Schedule};
use crate::engine::{StatusEvent, StatusReporter};
use crate::errors::{RelayError, Result};
use crate::exec::backend::{ProcessBackend, ProcessExit, ProcessHandle, Termination};
use crate::exec::invocation::Invocation;

/// Raw response used when the process printed nothing at all.
pub const NO_RESPONSE: &str = "no response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Spawning,
    Running,
    Completed,
    TimedOutKilling,
    Cancelled,
    Failed,
}

/// How supervision ended. Produced once per process.
#[derive(Debug)]
pub enum LifecycleOutcome {
    /// Exited within the schedule. `raw` is never empty.
    Completed { raw: String },
    /// Hit the hard ceiling; the group has been terminated.
    TimedOut,
    /// The cancel token fired; the group has been terminated.
    Cancelled,
    /// Waiting failed; the group has been terminated.
    Failed { error: RelayError },
}

/// Result of one bounded wait.
enum WaitStep {
    Exited(ProcessExit),
    WaitError(std::io::Error),
    DeadlinePassed,
    Cancelled,
}

pub struct ManagedProcess {
    handle: Box<dyn ProcessHandle>,
    pid: Option<u32>,
    started: Instant,
    state: ProcessState,
}

impl ManagedProcess {
    /// Start `invocation` through `backend` in its own process group.
    pub fn spawn(backend: &dyn ProcessBackend, invocation: &Invocation) -> Result<Self> {
        debug!(state = ?ProcessState::Spawning, cmd = %invocation.describe(), "spawning process");
        let handle = backend.spawn(invocation)?;
        let pid = handle.id();
        info!(pid = ?pid, cmd = %invocation.describe(), "process running");

        Ok(Self {
            handle,
            pid,
            started: Instant::now(),
            state: ProcessState::Running,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_running(&mut self) -> bool {
        self.handle.is_running()
    }

    /// Wait for the process according to `schedule`, reporting progress.
    ///
    /// Phase 1 waits `quiet_window` silently. After that, a progress event is
    /// reported at every deadline that passes (quiet window, then each
    /// `poll_interval`), carrying the elapsed time of that deadline. The last
    /// increment is clamped to `hard_ceiling`; reaching the ceiling
    /// terminates the process without a further progress event.
    pub async fn supervise(
        &mut self,
        schedule: &Schedule,
        reporter: &dyn StatusReporter,
        cancel: &CancellationToken,
    ) -> LifecycleOutcome {
        // Hand-built schedules are clamped to the validated bound.
        let hard_ceiling = schedule.hard_ceiling.min(MAX_SCHEDULE_DURATION);
        let poll_interval = schedule.poll_interval.min(MAX_SCHEDULE_DURATION);
        let ceiling = self.started + hard_ceiling;
        let mut deadline = (self.started + schedule.quiet_window.min(hard_ceiling)).min(ceiling);
        let mut announced = false;

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => WaitStep::Cancelled,
                res = time::timeout_at(deadline, self.handle.wait()) => match res {
                    Ok(Ok(exit)) => WaitStep::Exited(exit),
                    Ok(Err(e)) => WaitStep::WaitError(e),
                    Err(_elapsed) => WaitStep::DeadlinePassed,
                },
            };

            match step {
                WaitStep::Exited(exit) => {
                    self.transition(ProcessState::Completed);
                    info!(
                        pid = ?self.pid,
                        exit_code = ?exit.code,
                        elapsed_secs = self.elapsed().as_secs(),
                        "process exited"
                    );
                    return LifecycleOutcome::Completed {
                        raw: response_text(&exit),
                    };
                }
                WaitStep::WaitError(e) => {
                    self.transition(ProcessState::Failed);
                    warn!(pid = ?self.pid, error = %e, "waiting for process failed");
                    self.terminate(schedule.grace_period).await;
                    return LifecycleOutcome::Failed {
                        error: RelayError::Runtime(format!("waiting for process: {e}")),
                    };
                }
                WaitStep::Cancelled => {
                    self.transition(ProcessState::Cancelled);
                    info!(pid = ?self.pid, "execution cancelled; terminating process group");
                    self.terminate(schedule.grace_period).await;
                    return LifecycleOutcome::Cancelled;
                }
                WaitStep::DeadlinePassed if deadline >= ceiling => {
                    self.transition(ProcessState::TimedOutKilling);
                    warn!(
                        pid = ?self.pid,
                        ceiling_secs = schedule.hard_ceiling.as_secs(),
                        "hard ceiling reached; terminating process group"
                    );
                    self.terminate(schedule.grace_period).await;
                    return LifecycleOutcome::TimedOut;
                }
                WaitStep::DeadlinePassed => {
                    let elapsed = deadline - self.started;
                    debug!(pid = ?self.pid, elapsed_secs = elapsed.as_secs(), "process still running");
                    reporter.report(progress_event(elapsed, announced)).await;
                    announced = true;
                    deadline = (deadline + poll_interval).min(ceiling);
                }
            }
        }
    }

    /// Escalating termination of the whole group: graceful signal, up to
    /// `grace` for the exit, then the forceful signal.
    ///
    /// Best-effort throughout: nothing here fails, and calling it on a group
    /// that is already gone is harmless. The forceful signal is always sent,
    /// since grandchildren can outlive a leader that exited on the graceful
    /// one.
    pub async fn terminate(&mut self, grace: Duration) {
        if let Err(e) = self.handle.signal(Termination::Graceful) {
            debug!(pid = ?self.pid, error = %e, "graceful signal failed; escalating");
        }

        match time::timeout(grace, self.handle.wait()).await {
            Ok(Ok(exit)) => {
                debug!(pid = ?self.pid, exit_code = ?exit.code, "process exited after graceful signal")
            }
            Ok(Err(e)) => {
                debug!(pid = ?self.pid, error = %e, "collecting exit after graceful signal failed")
            }
            Err(_) => {
                warn!(pid = ?self.pid, grace_secs = grace.as_secs(), "process outlived grace period")
            }
        }

        if let Err(e) = self.handle.signal(Termination::Forceful) {
            warn!(pid = ?self.pid, error = %e, "forceful signal failed");
        }
    }

    /// Safety net: force-kill the group if the leader is still running.
    pub fn ensure_stopped(&mut self) {
        if self.handle.is_running() {
            warn!(pid = ?self.pid, state = ?self.state, "process still running; killing process group");
            if let Err(e) = self.handle.signal(Termination::Forceful) {
                warn!(pid = ?self.pid, error = %e, "forceful signal failed");
            }
        }
    }

    fn transition(&mut self, next: ProcessState) {
        debug!(pid = ?self.pid, from = ?self.state, to = ?next, "process state change");
        self.state = next;
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        self.ensure_stopped();
    }
}

/// Stdout if there is any, else stderr, else [`NO_RESPONSE`].
pub fn response_text(exit: &ProcessExit) -> String {
    let stdout = exit.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    let stderr = exit.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    NO_RESPONSE.to_string()
}

fn progress_event(elapsed: Duration, announced: bool) -> StatusEvent {
    let message = if announced {
        format!("still working... ({}s)", elapsed.as_secs())
    } else {
        "still working...".to_string()
    };
    StatusEvent::Progress { elapsed, message }
}
