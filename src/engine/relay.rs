// src/engine/relay.rs

//! The entry point transports submit prompts to.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::access::Authorizer;
use crate::engine::{ActorId, CommandExecutor, ExecutionOutcome, ExecutionRequest, StatusReporter};
use crate::errors::{RelayError, Result};
use crate::exec::ProcessBackend;

/// Access check in front of a shared executor.
///
/// Each accepted prompt runs as its own Tokio task, so the transport loop
/// that submitted it stays free for further input while the command runs.
pub struct Relay<B: ProcessBackend + 'static> {
    executor: Arc<CommandExecutor<B>>,
    access: Arc<dyn Authorizer>,
    shutdown: CancellationToken,
}

impl<B: ProcessBackend + 'static> Relay<B> {
    pub fn new(executor: Arc<CommandExecutor<B>>, access: Arc<dyn Authorizer>) -> Self {
        Self {
            executor,
            access,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn executor(&self) -> &Arc<CommandExecutor<B>> {
        &self.executor
    }

    /// Submit `text` on behalf of `actor`.
    ///
    /// Fails without reporting anything if the actor is not authorized or the
    /// prompt is blank. Otherwise returns the handle of the background
    /// execution; all further news arrives through `reporter`.
    pub fn submit_prompt(
        &self,
        actor: ActorId,
        text: &str,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<JoinHandle<ExecutionOutcome>> {
        if !self.access.is_authorized(&actor) {
            warn!(actor = %actor, "prompt from unauthorized actor rejected");
            return Err(RelayError::AccessDenied(actor));
        }

        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(RelayError::EmptyPrompt);
        }

        info!(actor = %actor, chars = prompt.chars().count(), "prompt received");
        let request = ExecutionRequest::new(actor, prompt);
        let executor = Arc::clone(&self.executor);
        let cancel = self.shutdown.child_token();

        Ok(tokio::spawn(async move {
            executor.execute(&request, reporter.as_ref(), &cancel).await
        }))
    }

    /// Cancel every execution submitted through this relay. Their processes
    /// are terminated and they end with `Cancelled`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Token cancelled by [`Relay::shutdown`], for transports that need to
    /// stop reading input at the same moment.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
