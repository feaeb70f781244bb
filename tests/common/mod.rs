#![allow(dead_code)]

pub use promptrelay_test_utils::builders;
pub use promptrelay_test_utils::{
    FakeBackend, FakeProbe, FakeScript, RecordingReporter, init_tracing, with_timeout,
};

use std::sync::Arc;

use promptrelay::engine::{AdmissionGate, CommandExecutor, ExecutorSettings};
use promptrelay::types::GateScope;

/// Executor over a fake backend with a fresh gate. Returns the backend's
/// probe alongside.
pub fn fake_executor(
    backend: FakeBackend,
    settings: ExecutorSettings,
) -> (Arc<CommandExecutor<FakeBackend>>, Arc<FakeProbe>) {
    fake_executor_scoped(backend, settings, GateScope::Global)
}

pub fn fake_executor_scoped(
    backend: FakeBackend,
    settings: ExecutorSettings,
    scope: GateScope,
) -> (Arc<CommandExecutor<FakeBackend>>, Arc<FakeProbe>) {
    let probe = backend.probe();
    let gate = Arc::new(AdmissionGate::new(scope));
    (Arc::new(CommandExecutor::new(gate, backend, settings)), probe)
}
