// src/transport/stdio.rs

//! Line-oriented transport over stdin/stdout.
//!
//! Every input line is one submission, run in the background so the next
//! line is read immediately; a prompt arriving while another runs is
//! answered `Busy` (under the default gate policy). Output from concurrent
//! requests is serialised through one writer lock, a message at a time.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::engine::{
    ActorId, ExecutionOutcome, Relay, ReportFuture, StatusEvent, StatusReporter,
};
use crate::errors::{RelayError, Result};
use crate::exec::ProcessBackend;
use crate::output::split_message;
use crate::transport::wire::{
    BUSY_MESSAGE, CANCELLED_MESSAGE, DENIED_MESSAGE, TIMEOUT_MESSAGE, WireMessage, parse_inbound,
};

/// Reporter writing rendered events to an async writer (stdout in
/// production, an in-memory buffer in tests).
pub struct WriterReporter<W> {
    out: Mutex<W>,
    format: OutputFormat,
    max_message_len: usize,
}

impl<W> WriterReporter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W, format: OutputFormat, max_message_len: usize) -> Self {
        Self {
            out: Mutex::new(out),
            format,
            max_message_len,
        }
    }

    /// Tell the user their prompt was refused by the access check.
    pub async fn report_denied(&self) {
        let blocks = match self.format {
            OutputFormat::Json => encode_json(&WireMessage::denied()).into_iter().collect(),
            OutputFormat::Text => vec![DENIED_MESSAGE.to_string()],
        };
        self.write_blocks(&blocks).await;
    }

    /// Consume the reporter and hand back the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_blocks(&self, blocks: &[String]) {
        if blocks.is_empty() {
            return;
        }
        let mut out = self.out.lock().await;
        for block in blocks {
            if let Err(e) = write_line(&mut *out, block).await {
                warn!(error = %e, "failed to write to output");
                return;
            }
        }
        if let Err(e) = out.flush().await {
            warn!(error = %e, "failed to flush output");
        }
    }
}

impl<W> StatusReporter for WriterReporter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn report(&self, event: StatusEvent) -> ReportFuture<'_> {
        Box::pin(async move {
            let blocks = render(&event, self.format, self.max_message_len);
            self.write_blocks(&blocks).await;
        })
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, block: &str) -> std::io::Result<()> {
    out.write_all(block.as_bytes()).await?;
    out.write_all(b"\n").await
}

/// Render one event as the blocks of text to print, each followed by a
/// newline. JSON always yields exactly one block.
pub fn render(event: &StatusEvent, format: OutputFormat, max_message_len: usize) -> Vec<String> {
    match format {
        OutputFormat::Json => encode_json(&WireMessage::from(event)).into_iter().collect(),
        OutputFormat::Text => render_text(event, max_message_len),
    }
}

fn encode_json(msg: &WireMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(error = %e, "failed to encode wire message");
            None
        }
    }
}

fn render_text(event: &StatusEvent, max_message_len: usize) -> Vec<String> {
    match event {
        StatusEvent::Progress { message, .. } => vec![message.clone()],
        StatusEvent::Response { text, code } => {
            let mut blocks = Vec::new();
            if !text.is_empty() {
                let chunks = split_message(text, max_message_len);
                let total = chunks.len();
                if total == 1 {
                    blocks.extend(chunks);
                } else {
                    for (i, chunk) in chunks.into_iter().enumerate() {
                        blocks.push(format!("({}/{})", i + 1, total));
                        blocks.push(chunk);
                    }
                }
            }
            if let Some(code) = code {
                blocks.push(format!("```\n{code}\n```"));
            }
            blocks
        }
        StatusEvent::Busy => vec![BUSY_MESSAGE.to_string()],
        StatusEvent::TimeoutExceeded => vec![TIMEOUT_MESSAGE.to_string()],
        StatusEvent::ExecutionError { message } => vec![format!("error: {message}")],
        StatusEvent::Cancelled => vec![CANCELLED_MESSAGE.to_string()],
    }
}

/// Read prompts from `input` until EOF or shutdown, submitting each one.
///
/// On EOF, waits for the executions still in flight. On shutdown (the relay's
/// shutdown token), stops reading; in-flight executions are cancelled by the
/// same token and are awaited as well.
pub async fn serve_lines<B, R, W>(
    relay: &Relay<B>,
    actor: ActorId,
    input: R,
    reporter: Arc<WriterReporter<W>>,
) -> Result<()>
where
    B: ProcessBackend + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let shutdown = relay.shutdown_token();
    let mut lines = input.lines();
    let mut in_flight: Vec<JoinHandle<ExecutionOutcome>> = Vec::new();

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("shutdown requested; no longer reading input");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            debug!("input closed");
            break;
        };
        let Some(prompt) = parse_inbound(&line) else {
            continue;
        };

        in_flight.retain(|h| !h.is_finished());

        let sink: Arc<dyn StatusReporter> = reporter.clone();
        match relay.submit_prompt(actor.clone(), &prompt, sink) {
            Ok(handle) => in_flight.push(handle),
            Err(RelayError::AccessDenied(_)) => reporter.report_denied().await,
            Err(RelayError::EmptyPrompt) => {}
            Err(e) => warn!(error = %e, "could not submit prompt"),
        }
    }

    for handle in in_flight {
        if let Err(e) = handle.await {
            warn!(error = %e, "execution task ended abnormally");
        }
    }

    Ok(())
}

/// Submit a single prompt and wait for its outcome.
pub async fn run_once<B, W>(
    relay: &Relay<B>,
    actor: ActorId,
    prompt: &str,
    reporter: Arc<WriterReporter<W>>,
) -> Result<ExecutionOutcome>
where
    B: ProcessBackend + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let sink: Arc<dyn StatusReporter> = reporter.clone();
    match relay.submit_prompt(actor, prompt, sink) {
        Ok(handle) => handle
            .await
            .map_err(|e| RelayError::Runtime(format!("execution task failed: {e}"))),
        Err(e @ RelayError::AccessDenied(_)) => {
            reporter.report_denied().await;
            Err(e)
        }
        Err(e) => Err(e),
    }
}
