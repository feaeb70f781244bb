use std::sync::Mutex;
use std::time::Duration;

use promptrelay::engine::{ReportFuture, StatusEvent, StatusReporter};

/// A reporter that keeps every event it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Elapsed time of each progress event, in seconds.
    pub fn progress_secs(&self) -> Vec<u64> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::Progress { elapsed, .. } => Some(elapsed.as_secs()),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_events(&self) -> Vec<StatusEvent> {
        self.events()
            .into_iter()
            .filter(StatusEvent::is_terminal)
            .collect()
    }

    /// The last event, if it is terminal.
    pub fn terminal(&self) -> Option<StatusEvent> {
        self.events().last().filter(|e| e.is_terminal()).cloned()
    }

    /// Elapsed of the progress events as `Duration`s.
    pub fn progress_elapsed(&self) -> Vec<Duration> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::Progress { elapsed, .. } => Some(*elapsed),
                _ => None,
            })
            .collect()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, event: StatusEvent) -> ReportFuture<'_> {
        self.events.lock().unwrap().push(event);
        Box::pin(async {})
    }
}
