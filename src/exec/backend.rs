// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The lifecycle manager talks to a `ProcessBackend` instead of
//! `tokio::process` directly. This keeps the OS-facing surface down to four
//! primitives (spawn in a new group, wait, signal the group gracefully,
//! signal it forcefully) and lets tests swap in a scripted fake that runs on
//! Tokio's paused clock.
//!
//! - `RealProcessBackend` is the production implementation.
//! - `promptrelay-test-utils` provides `FakeBackend` for tests.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{RelayError, Result};
use crate::exec::invocation::Invocation;

/// How hard to ask a process group to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM: the process may clean up.
    Graceful,
    /// SIGKILL: not negotiable.
    Forceful,
}

/// What a process left behind when it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = io::Result<ProcessExit>> + Send + 'a>>;

/// Trait abstracting how external processes are started.
///
/// Production code uses [`RealProcessBackend`]; tests provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync {
    /// Start `invocation` as the leader of a new process group.
    fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>>;
}

/// One spawned process tree.
pub trait ProcessHandle: Send {
    /// OS process id of the leader, if still known.
    fn id(&self) -> Option<u32>;

    /// Wait for the leader to exit and collect its output.
    ///
    /// Must be cancel-safe: the lifecycle manager wraps it in timeouts and
    /// calls it again after each one. Once it has returned `Ok`, further
    /// calls return the same exit.
    fn wait(&mut self) -> WaitFuture<'_>;

    /// Signal the whole process group. Signalling a group that no longer
    /// exists is not an error.
    fn signal(&mut self, termination: Termination) -> io::Result<()>;

    /// Liveness of the leader. Never blocks.
    fn is_running(&mut self) -> bool;
}

/// Real process backend used in production: `tokio::process`, one new
/// process group per child.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealProcessBackend;

impl RealProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = invocation.to_command();
        cmd.kill_on_drop(true);

        // Leader of a fresh group (pgid == pid), so an interposed shell and
        // everything it starts can be signalled together.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| RelayError::SpawnFailed {
            program: invocation.program.clone(),
            source,
        })?;

        let pgid = child.id();
        debug!(pid = ?pgid, cmd = %invocation.describe(), "spawned process group");

        if let (Some(input), Some(mut stdin)) = (invocation.stdin.clone(), child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    // The child may legitimately exit without reading its input.
                    debug!(error = %e, "failed to write prompt to child stdin");
                }
                // Dropping `stdin` closes the pipe so the child sees EOF.
            });
        }

        // Always drain both pipes so a chatty child cannot block on a full
        // buffer while we are waiting for it.
        let stdout = OutputCollector::start(child.stdout.take());
        let stderr = OutputCollector::start(child.stderr.take());

        Ok(Box::new(RealProcessHandle {
            child,
            pgid,
            stdout,
            stderr,
            exit: None,
        }))
    }
}

struct RealProcessHandle {
    child: Child,
    pgid: Option<u32>,
    stdout: OutputCollector,
    stderr: OutputCollector,
    exit: Option<ProcessExit>,
}

impl ProcessHandle for RealProcessHandle {
    fn id(&self) -> Option<u32> {
        self.pgid
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move {
            if let Some(exit) = &self.exit {
                return Ok(exit.clone());
            }

            // `Child::wait` is cancel-safe and caches the status once reaped.
            let status = self.child.wait().await?;
            let stdout = self.stdout.finish().await?;
            let stderr = self.stderr.finish().await?;

            let exit = ProcessExit {
                code: status.code(),
                stdout,
                stderr,
            };
            self.exit = Some(exit.clone());
            Ok(exit)
        })
    }

    fn signal(&mut self, termination: Termination) -> io::Result<()> {
        signal_group(&mut self.child, self.pgid, termination)
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

#[cfg(unix)]
fn signal_group(_child: &mut Child, pgid: Option<u32>, termination: Termination) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pgid) = pgid else {
        return Ok(());
    };
    let Ok(raw) = i32::try_from(pgid) else {
        return Err(io::Error::other(format!("process group id {pgid} out of range")));
    };

    let signal = match termination {
        Termination::Graceful => Signal::SIGTERM,
        Termination::Forceful => Signal::SIGKILL,
    };

    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) => Ok(()),
        // The whole group is already gone.
        Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

/// No process groups here: only the immediate child can be stopped, and
/// anything it started may survive it.
#[cfg(not(unix))]
fn signal_group(child: &mut Child, _pgid: Option<u32>, _termination: Termination) -> io::Result<()> {
    match child.start_kill() {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(e) => Err(e),
    }
}

/// Background reader for one output pipe.
enum OutputCollector {
    Pending(JoinHandle<io::Result<Vec<u8>>>),
    Done(String),
}

impl OutputCollector {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        match pipe {
            Some(mut pipe) => OutputCollector::Pending(tokio::spawn(async move {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).await?;
                Ok(buf)
            })),
            None => OutputCollector::Done(String::new()),
        }
    }

    /// Cancel-safe: the reader task stays in place until it has finished.
    async fn finish(&mut self) -> io::Result<String> {
        if let OutputCollector::Pending(handle) = self {
            let (text, read_result) = match handle.await {
                Ok(Ok(bytes)) => (String::from_utf8_lossy(&bytes).into_owned(), Ok(())),
                Ok(Err(e)) => (String::new(), Err(e)),
                Err(join_err) => {
                    warn!(error = %join_err, "output reader task failed");
                    (String::new(), Err(io::Error::other(join_err)))
                }
            };
            // A finished JoinHandle must not be polled again.
            *self = OutputCollector::Done(text);
            read_result?;
        }

        match self {
            OutputCollector::Done(text) => Ok(text.clone()),
            OutputCollector::Pending(_) => Ok(String::new()),
        }
    }
}
