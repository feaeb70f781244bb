// src/engine/mod.rs

//! Request orchestration.
//!
//! This module ties together:
//! - the admission gate (at most one execution in flight per scope)
//! - the command executor (gate → spawn → bounded wait → postprocess)
//! - the status reporter interface transports implement
//! - the relay front that transports submit prompts to
//!
//! Process handling itself lives in [`crate::exec`].

use std::fmt;
use std::time::SystemTime;

use crate::errors::RelayError;

pub mod executor;
pub mod gate;
pub mod relay;
pub mod reporter;

pub use executor::{CommandExecutor, ExecutorSettings};
pub use gate::{AdmissionGate, GatePermit};
pub use relay::Relay;
pub use reporter::{ReportFuture, StatusEvent, StatusReporter};

/// Opaque identity of whoever submitted a prompt. Only used for gate scoping,
/// access checks and logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One prompt submission.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub prompt: String,
    pub actor: ActorId,
    pub submitted_at: SystemTime,
}

impl ExecutionRequest {
    pub fn new(actor: ActorId, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            actor,
            submitted_at: SystemTime::now(),
        }
    }
}

/// Final result of one request.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Completed { text: String, code: Option<String> },
    /// Admission was refused; nothing was spawned.
    Busy,
    TimedOut,
    Cancelled,
    Failed { error: RelayError },
}

impl ExecutionOutcome {
    /// The terminal event a reporter receives for this outcome.
    pub fn terminal_event(&self) -> StatusEvent {
        match self {
            ExecutionOutcome::Completed { text, code } => StatusEvent::Response {
                text: text.clone(),
                code: code.clone(),
            },
            ExecutionOutcome::Busy => StatusEvent::Busy,
            ExecutionOutcome::TimedOut => StatusEvent::TimeoutExceeded,
            ExecutionOutcome::Cancelled => StatusEvent::Cancelled,
            ExecutionOutcome::Failed { error } => StatusEvent::ExecutionError {
                message: error.to_string(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }
}
