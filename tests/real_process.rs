// tests/real_process.rs
//
// Runs actual child processes through `RealProcessBackend`. Unix only: the
// process-group behaviour under test does not exist elsewhere.

#![cfg(unix)]

mod common;
use crate::common::builders::SettingsBuilder;
use crate::common::{RecordingReporter, init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use promptrelay::config::{CommandSection, Schedule};
use promptrelay::engine::{
    ActorId, AdmissionGate, CommandExecutor, ExecutionOutcome, ExecutionRequest, ExecutorSettings,
};
use promptrelay::errors::RelayError;
use promptrelay::exec::{Invocation, LifecycleOutcome, ManagedProcess, RealProcessBackend};
use promptrelay::types::InvocationMode;

type TestResult = Result<(), Box<dyn Error>>;

fn real_executor(settings: ExecutorSettings) -> CommandExecutor<RealProcessBackend> {
    CommandExecutor::new(
        Arc::new(AdmissionGate::global()),
        RealProcessBackend::new(),
        settings,
    )
}

async fn run(settings: ExecutorSettings, prompt: &str) -> (ExecutionOutcome, RecordingReporter) {
    let executor = real_executor(settings);
    let reporter = RecordingReporter::new();
    let request = ExecutionRequest::new(ActorId::from("tester"), prompt);
    let outcome = with_timeout(executor.execute(&request, &reporter, &CancellationToken::new())).await;
    assert!(!executor.gate().is_busy(&ActorId::from("tester")));
    (outcome, reporter)
}

fn completed_text(outcome: ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Completed { text, .. } => text,
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn stdin_mode_delivers_the_prompt() {
    init_tracing();
    let prompt = "it's `id` and $(whoami); \"quoted\"";
    let (outcome, reporter) = run(SettingsBuilder::new().argv("cat", &[]).build(), prompt).await;

    assert_eq!(completed_text(outcome), prompt);
    assert!(reporter.progress_secs().is_empty());
}

#[tokio::test]
async fn shell_mode_prompt_cannot_inject() {
    init_tracing();
    let prompt = "it's $(echo pwned) `echo pwned`; echo pwned' && echo pwned '";
    let settings = SettingsBuilder::new()
        .shell_template("printf '%s' {prompt}")
        .build();

    let (outcome, _) = run(settings, prompt).await;

    assert_eq!(completed_text(outcome), prompt);
}

#[tokio::test]
async fn default_shell_template_keeps_backslashes() {
    init_tracing();
    let default = CommandSection::default();
    let upstream = "claude -p --continue --model haiku --input-format text";
    assert!(default.shell_template.contains(upstream));
    let command = CommandSection {
        mode: InvocationMode::Shell,
        shell_template: default.shell_template.replace(upstream, "cat"),
        ..default
    };

    for prompt in [
        r"path C:\new\table",
        r"ends \c here",
        r"tab\tand\\double",
        r"octal \0101 and \x41",
    ] {
        let settings = SettingsBuilder::new().command(command.clone()).build();
        let (outcome, _) = run(settings, prompt).await;
        assert_eq!(completed_text(outcome), prompt);
    }
}

#[tokio::test]
async fn argument_mode_passes_one_argument() {
    let settings = SettingsBuilder::new()
        .argv("printf", &["%s|"])
        .mode(promptrelay::types::InvocationMode::Argument)
        .build();

    let (outcome, _) = run(settings, "a b; c").await;

    // One argument, so the format is applied exactly once.
    assert_eq!(completed_text(outcome), "a b; c|");
}

#[tokio::test]
async fn stderr_is_used_when_stdout_is_empty() {
    let settings = SettingsBuilder::new()
        .argv("sh", &["-c", "echo oops >&2; exit 3"])
        .build();

    let (outcome, _) = run(settings, "ignored").await;

    assert_eq!(completed_text(outcome), "oops");
}

#[tokio::test]
async fn large_output_does_not_stall() {
    let settings = SettingsBuilder::new()
        .argv("sh", &["-c", "i=0; while [ $i -lt 4000 ]; do echo line-$i-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx; i=$((i+1)); done"])
        .build();

    let (outcome, _) = run(settings, "ignored").await;

    let text = completed_text(outcome);
    assert!(text.len() > 150_000, "got {} bytes", text.len());
    assert!(text.ends_with("line-3999-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"));
}

#[tokio::test]
async fn working_dir_is_applied() -> TestResult {
    let dir = tempdir()?;
    let mut settings = SettingsBuilder::new().argv("pwd", &[]).build();
    settings.command.working_dir = Some(dir.path().to_path_buf());

    let (outcome, _) = run(settings, "ignored").await;

    let expected = dir.path().canonicalize()?;
    assert_eq!(completed_text(outcome), expected.display().to_string());
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    init_tracing();
    let settings = SettingsBuilder::new()
        .argv("/nonexistent/binary", &[])
        .build();

    let (outcome, reporter) = run(settings, "hello").await;

    match outcome {
        ExecutionOutcome::Failed {
            error: RelayError::SpawnFailed { program, .. },
        } => assert_eq!(program, "/nonexistent/binary"),
        other => panic!("expected SpawnFailed, got {other:?}"),
    }
    assert_eq!(reporter.events().len(), 1);
}

#[tokio::test]
async fn timeout_kills_the_whole_process_group() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let marker = dir.path().join("alive");
    // The background subshell would write the marker after 3s if it
    // survived the group kill at the 2s ceiling.
    let script = format!(
        "(sleep 3; echo alive > '{}') & sleep 30",
        marker.display()
    );
    let invocation = Invocation::argv("sh", ["-c", script.as_str()]);
    let schedule = Schedule {
        quiet_window: Duration::from_secs(1),
        poll_interval: Duration::from_secs(1),
        hard_ceiling: Duration::from_secs(2),
        grace_period: Duration::from_secs(1),
    };
    let reporter = RecordingReporter::new();

    let mut process = ManagedProcess::spawn(&RealProcessBackend::new(), &invocation)?;
    let outcome = with_timeout(process.supervise(&schedule, &reporter, &CancellationToken::new())).await;

    assert!(matches!(outcome, LifecycleOutcome::TimedOut));
    assert_eq!(reporter.progress_secs(), vec![1]);
    assert!(!process.is_running());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists(), "a grandchild outlived the group kill");

    // Killing an already-dead group is harmless.
    process.terminate(Duration::from_millis(100)).await;
    process.ensure_stopped();
    Ok(())
}

#[tokio::test]
async fn cancellation_kills_the_process_group() -> TestResult {
    let dir = tempdir()?;
    let marker = dir.path().join("alive");
    let script = format!(
        "(sleep 2; echo alive > '{}') & sleep 30",
        marker.display()
    );
    let invocation = Invocation::argv("sh", ["-c", script.as_str()]);
    let cancel = CancellationToken::new();
    let reporter = RecordingReporter::new();

    let mut process = ManagedProcess::spawn(&RealProcessBackend::new(), &invocation)?;
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        });
    }
    let outcome = with_timeout(process.supervise(&Schedule::default(), &reporter, &cancel)).await;

    assert!(matches!(outcome, LifecycleOutcome::Cancelled));
    assert!(reporter.events().is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists());
    Ok(())
}
