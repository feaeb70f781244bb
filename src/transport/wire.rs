// src/transport/wire.rs

//! JSON line encoding of the event stream.
//!
//! Outbound:
//!
//! ```text
//! {"type":"status","content":"still working... (40s)","elapsed_secs":40}
//! {"type":"response","content":"...","has_code":true,"code_snippet":"print(1)"}
//! {"type":"error","kind":"busy","content":"..."}
//! ```
//!
//! Inbound: `{"type":"text","content":"..."}`, or any line that is not a JSON
//! object, taken verbatim as the prompt. Other JSON objects are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::StatusEvent;

pub const BUSY_MESSAGE: &str = "previous request is still running, try again later";
pub const TIMEOUT_MESSAGE: &str = "no reply within the time limit (process terminated)";
pub const CANCELLED_MESSAGE: &str = "request cancelled (process terminated)";
pub const DENIED_MESSAGE: &str = "access denied";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Status {
        content: String,
        elapsed_secs: u64,
    },
    Response {
        content: String,
        has_code: bool,
        code_snippet: Option<String>,
    },
    Error {
        kind: ErrorKind,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Busy,
    Timeout,
    Execution,
    Cancelled,
    Denied,
}

impl WireMessage {
    pub fn denied() -> Self {
        WireMessage::Error {
            kind: ErrorKind::Denied,
            content: DENIED_MESSAGE.to_string(),
        }
    }
}

impl From<&StatusEvent> for WireMessage {
    fn from(event: &StatusEvent) -> Self {
        match event {
            StatusEvent::Progress { elapsed, message } => WireMessage::Status {
                content: message.clone(),
                elapsed_secs: elapsed.as_secs(),
            },
            StatusEvent::Response { text, code } => WireMessage::Response {
                content: text.clone(),
                has_code: code.is_some(),
                code_snippet: code.clone(),
            },
            StatusEvent::Busy => WireMessage::Error {
                kind: ErrorKind::Busy,
                content: BUSY_MESSAGE.to_string(),
            },
            StatusEvent::TimeoutExceeded => WireMessage::Error {
                kind: ErrorKind::Timeout,
                content: TIMEOUT_MESSAGE.to_string(),
            },
            StatusEvent::ExecutionError { message } => WireMessage::Error {
                kind: ErrorKind::Execution,
                content: message.clone(),
            },
            StatusEvent::Cancelled => WireMessage::Error {
                kind: ErrorKind::Cancelled,
                content: CANCELLED_MESSAGE.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Text { content: String },
}

/// Extract the prompt from one input line. `None` for blank lines.
pub fn parse_inbound(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let text = match serde_json::from_str::<InboundMessage>(trimmed) {
        Ok(InboundMessage::Text { content }) => content,
        Err(e) => {
            if matches!(serde_json::from_str::<Value>(trimmed), Ok(Value::Object(_))) {
                // Well-formed, but not a message we handle (uploads etc.).
                debug!(error = %e, "ignoring unsupported inbound message");
                return None;
            }
            trimmed.to_string()
        }
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
