// src/engine/reporter.rs

//! The sink every transport implements to receive execution events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// One event of a request's event stream.
///
/// Per request: zero or more `Progress`, then exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The command is still running after `elapsed`.
    Progress { elapsed: Duration, message: String },
    /// The command finished; `code` is the first fenced block, if any.
    Response { text: String, code: Option<String> },
    /// Another execution holds the gate; try again later.
    Busy,
    /// The hard ceiling was reached and the process group was terminated.
    TimeoutExceeded,
    ExecutionError { message: String },
    /// The request was cancelled (e.g. shutdown) and its process terminated.
    Cancelled,
}

impl StatusEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusEvent::Progress { .. })
    }

    pub fn has_code(&self) -> bool {
        matches!(self, StatusEvent::Response { code: Some(_), .. })
    }
}

pub type ReportFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Where the executor pushes a request's events.
///
/// Events are delivered one at a time: the executor awaits each `report`
/// before it moves on, which is what keeps a request's events ordered.
/// Delivery failures are the reporter's business (log and drop); the
/// executor does not react to them.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: StatusEvent) -> ReportFuture<'_>;
}

impl<R: StatusReporter + ?Sized> StatusReporter for Arc<R> {
    fn report(&self, event: StatusEvent) -> ReportFuture<'_> {
        (**self).report(event)
    }
}
