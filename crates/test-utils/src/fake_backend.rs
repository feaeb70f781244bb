//! A scripted process backend that spawns nothing.
//!
//! Each fake process follows a [`FakeScript`] on Tokio's clock, so tests
//! running with `start_paused = true` can drive a 300s schedule instantly.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use promptrelay::errors::{RelayError, Result};
use promptrelay::exec::{
    Invocation, ProcessBackend, ProcessExit, ProcessHandle, Termination, WaitFuture,
};

/// How one fake process behaves.
#[derive(Debug, Clone)]
pub struct FakeScript {
    /// `None`: never exits on its own.
    pub exits_after: Option<Duration>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// SIGTERM is ignored; only the forceful signal stops it.
    pub ignores_sigterm: bool,
    /// `wait` fails after this long (the process itself keeps running).
    pub wait_error_after: Option<Duration>,
    /// `spawn` fails outright.
    pub fail_spawn: bool,
}

impl FakeScript {
    /// Exits with `stdout` after `secs` seconds.
    pub fn exits_after(secs: u64, stdout: &str) -> Self {
        Self {
            exits_after: Some(Duration::from_secs(secs)),
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    pub fn never_exits() -> Self {
        Self::default()
    }

    pub fn fails_to_spawn() -> Self {
        Self {
            fail_spawn: true,
            ..Self::default()
        }
    }

    pub fn wait_fails_after(secs: u64) -> Self {
        Self {
            wait_error_after: Some(Duration::from_secs(secs)),
            ..Self::default()
        }
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.to_string();
        self
    }

    pub fn ignoring_sigterm(mut self) -> Self {
        self.ignores_sigterm = true;
        self
    }
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            exits_after: None,
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            ignores_sigterm: false,
            wait_error_after: None,
            fail_spawn: false,
        }
    }
}

#[derive(Debug)]
struct FakeProcess {
    started: Instant,
    exits_after: Option<Duration>,
    ignores_sigterm: bool,
    killed: bool,
}

impl FakeProcess {
    fn is_running(&self) -> bool {
        !self.killed
            && self
                .exits_after
                .is_none_or(|d| Instant::now() < self.started + d)
    }
}

/// Shared view of everything a [`FakeBackend`] did.
#[derive(Debug, Default)]
pub struct FakeProbe {
    invocations: Mutex<Vec<Invocation>>,
    processes: Mutex<Vec<Arc<Mutex<FakeProcess>>>>,
    signals: Mutex<Vec<Termination>>,
}

impl FakeProbe {
    /// Every invocation `spawn` was called with, failed ones included.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Processes actually started.
    pub fn spawn_count(&self) -> usize {
        self.processes.lock().unwrap().len()
    }

    /// Processes still running right now.
    pub fn running_count(&self) -> usize {
        self.processes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.lock().unwrap().is_running())
            .count()
    }

    /// Every signal sent, in order, across all processes.
    pub fn signals(&self) -> Vec<Termination> {
        self.signals.lock().unwrap().clone()
    }
}

/// Hands out fake processes. Scripts queued with [`FakeBackend::then`] are
/// used first, one per spawn; after that every spawn uses the base script.
pub struct FakeBackend {
    base: FakeScript,
    queued: Mutex<VecDeque<FakeScript>>,
    probe: Arc<FakeProbe>,
    next_pid: Mutex<u32>,
}

impl FakeBackend {
    pub fn new(script: FakeScript) -> Self {
        Self {
            base: script,
            queued: Mutex::new(VecDeque::new()),
            probe: Arc::new(FakeProbe::default()),
            next_pid: Mutex::new(1000),
        }
    }

    /// Use `script` for the next spawn that has no earlier queued script.
    pub fn then(self, script: FakeScript) -> Self {
        self.queued.lock().unwrap().push_back(script);
        self
    }

    pub fn probe(&self) -> Arc<FakeProbe> {
        Arc::clone(&self.probe)
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&self, invocation: &Invocation) -> Result<Box<dyn ProcessHandle>> {
        self.probe
            .invocations
            .lock()
            .unwrap()
            .push(invocation.clone());

        let script = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.base.clone());

        if script.fail_spawn {
            return Err(RelayError::SpawnFailed {
                program: invocation.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake: no such program"),
            });
        }

        let process = Arc::new(Mutex::new(FakeProcess {
            started: Instant::now(),
            exits_after: script.exits_after,
            ignores_sigterm: script.ignores_sigterm,
            killed: false,
        }));
        self.probe
            .processes
            .lock()
            .unwrap()
            .push(Arc::clone(&process));

        let pid = {
            let mut next = self.next_pid.lock().unwrap();
            *next += 1;
            *next
        };

        Ok(Box::new(FakeHandle {
            pid,
            script,
            process,
            probe: Arc::clone(&self.probe),
        }))
    }
}

struct FakeHandle {
    pid: u32,
    script: FakeScript,
    process: Arc<Mutex<FakeProcess>>,
    probe: Arc<FakeProbe>,
}

enum Next {
    Exit(Instant),
    Error(Instant),
    Never,
}

impl ProcessHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move {
            let next = {
                let p = self.process.lock().unwrap();
                if p.killed {
                    return Ok(ProcessExit {
                        code: None,
                        stdout: String::new(),
                        stderr: String::new(),
                    });
                }
                let exit_at = p.exits_after.map(|d| p.started + d);
                let error_at = self.script.wait_error_after.map(|d| p.started + d);
                match (exit_at, error_at) {
                    (Some(exit), Some(err)) if err < exit => Next::Error(err),
                    (Some(exit), _) => Next::Exit(exit),
                    (None, Some(err)) => Next::Error(err),
                    (None, None) => Next::Never,
                }
            };

            match next {
                Next::Exit(at) => {
                    sleep_until(at).await;
                    Ok(ProcessExit {
                        code: Some(self.script.exit_code),
                        stdout: self.script.stdout.clone(),
                        stderr: self.script.stderr.clone(),
                    })
                }
                Next::Error(at) => {
                    sleep_until(at).await;
                    Err(io::Error::other("fake: injected wait failure"))
                }
                Next::Never => std::future::pending().await,
            }
        })
    }

    fn signal(&mut self, termination: Termination) -> io::Result<()> {
        self.probe.signals.lock().unwrap().push(termination);
        let mut p = self.process.lock().unwrap();
        match termination {
            Termination::Graceful if p.ignores_sigterm => {}
            Termination::Graceful | Termination::Forceful => {
                if p.is_running() {
                    p.killed = true;
                }
            }
        }
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.process.lock().unwrap().is_running()
    }
}
