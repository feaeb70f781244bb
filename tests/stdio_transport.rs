// tests/stdio_transport.rs

mod common;
use crate::common::builders::SettingsBuilder;
use crate::common::{FakeBackend, FakeScript, fake_executor, init_tracing};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use promptrelay::access::{AllowList, Authorizer};
use promptrelay::cli::OutputFormat;
use promptrelay::engine::{ActorId, ExecutionOutcome, Relay, StatusEvent, StatusReporter};
use promptrelay::errors::RelayError;
use promptrelay::transport::wire::{BUSY_MESSAGE, DENIED_MESSAGE};
use promptrelay::transport::{WriterReporter, parse_inbound, render, run_once, serve_lines};

type TestResult = Result<(), Box<dyn Error>>;

fn relay_with(backend: FakeBackend, access: AllowList) -> (Relay<FakeBackend>, Arc<common::FakeProbe>) {
    let (executor, probe) = fake_executor(backend, SettingsBuilder::new().build());
    let access: Arc<dyn Authorizer> = Arc::new(access);
    (Relay::new(executor, access), probe)
}

fn output_of(reporter: Arc<WriterReporter<Vec<u8>>>) -> Vec<String> {
    let bytes = Arc::try_unwrap(reporter)
        .ok()
        .expect("reporter still shared")
        .into_inner();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn inbound_lines() {
    assert_eq!(parse_inbound("   "), None);
    assert_eq!(parse_inbound(" hello "), Some("hello".to_string()));
    assert_eq!(
        parse_inbound(r#"{"type":"text","content":" hi there "}"#),
        Some("hi there".to_string())
    );
    assert_eq!(parse_inbound(r#"{"type":"text","content":"  "}"#), None);
    assert_eq!(parse_inbound(r#"{"type":"photo","file":"x.jpg"}"#), None);
    // Not an object: taken verbatim.
    assert_eq!(parse_inbound("[1, 2]"), Some("[1, 2]".to_string()));
    assert_eq!(parse_inbound("{not json"), Some("{not json".to_string()));
}

#[test]
fn json_rendering_matches_wire_format() {
    let progress = StatusEvent::Progress {
        elapsed: Duration::from_secs(40),
        message: "still working... (40s)".to_string(),
    };
    assert_eq!(
        render(&progress, OutputFormat::Json, 4000),
        vec![r#"{"type":"status","content":"still working... (40s)","elapsed_secs":40}"#]
    );

    let response = StatusEvent::Response {
        text: "Explanation text\nmore text".to_string(),
        code: Some("print(1)".to_string()),
    };
    assert_eq!(
        render(&response, OutputFormat::Json, 4000),
        vec![
            r#"{"type":"response","content":"Explanation text\nmore text","has_code":true,"code_snippet":"print(1)"}"#
        ]
    );

    let plain = StatusEvent::Response {
        text: "Hi there".to_string(),
        code: None,
    };
    assert_eq!(
        render(&plain, OutputFormat::Json, 4000),
        vec![r#"{"type":"response","content":"Hi there","has_code":false,"code_snippet":null}"#]
    );

    let busy = render(&StatusEvent::Busy, OutputFormat::Json, 4000);
    assert_eq!(
        busy,
        vec![format!(r#"{{"type":"error","kind":"busy","content":"{BUSY_MESSAGE}"}}"#)]
    );

    let timeout = render(&StatusEvent::TimeoutExceeded, OutputFormat::Json, 4000);
    assert!(timeout[0].contains(r#""kind":"timeout""#));

    let failed = StatusEvent::ExecutionError {
        message: "failed to spawn 'claude': not found".to_string(),
    };
    assert_eq!(
        render(&failed, OutputFormat::Json, 4000),
        vec![
            r#"{"type":"error","kind":"execution","content":"failed to spawn 'claude': not found"}"#
        ]
    );
}

#[test]
fn text_rendering_chunks_and_fences() {
    let response = StatusEvent::Response {
        text: "aaaa\nbbbb\ncccc".to_string(),
        code: Some("ls".to_string()),
    };
    assert_eq!(
        render(&response, OutputFormat::Text, 9),
        vec!["(1/2)", "aaaa\nbbbb", "(2/2)", "cccc", "```\nls\n```"]
    );

    let short = StatusEvent::Response {
        text: "Hi there".to_string(),
        code: None,
    };
    assert_eq!(render(&short, OutputFormat::Text, 4000), vec!["Hi there"]);

    let code_only = StatusEvent::Response {
        text: String::new(),
        code: Some("print(1)".to_string()),
    };
    assert_eq!(
        render(&code_only, OutputFormat::Text, 4000),
        vec!["```\nprint(1)\n```"]
    );

    assert_eq!(
        render(&StatusEvent::Busy, OutputFormat::Text, 4000),
        vec![BUSY_MESSAGE]
    );
}

#[tokio::test(start_paused = true)]
async fn serves_json_prompt_and_waits_for_reply_at_eof() -> TestResult {
    init_tracing();
    let (relay, probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(2, "Hi there")),
        AllowList::default(),
    );
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Json, 4000));
    let input: &[u8] = b"{\"type\":\"text\",\"content\":\"hello\"}\n";

    serve_lines(&relay, ActorId::from("local"), input, Arc::clone(&reporter)).await?;

    assert_eq!(
        output_of(reporter),
        vec![r#"{"type":"response","content":"Hi there","has_code":false,"code_snippet":null}"#]
    );
    assert_eq!(probe.invocations()[0].stdin.as_deref(), Some("hello"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn second_line_while_running_gets_busy() -> TestResult {
    init_tracing();
    let (relay, probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(2, "first done")),
        AllowList::default(),
    );
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Text, 4000));
    let input: &[u8] = b"first\nsecond\n";

    serve_lines(&relay, ActorId::from("local"), input, Arc::clone(&reporter)).await?;

    let lines = output_of(reporter);
    // The busy reply to "second" goes out at once; "first" answers at 2s.
    assert_eq!(lines, vec![BUSY_MESSAGE.to_string(), "first done".to_string()]);
    assert_eq!(probe.spawn_count(), 1);
    assert_eq!(probe.invocations()[0].stdin.as_deref(), Some("first"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unauthorized_actor_is_denied_without_spawning() -> TestResult {
    let (relay, probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(1, "secret")),
        AllowList::new(["alice"]),
    );
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Json, 4000));
    let input: &[u8] = b"let me in\n";

    serve_lines(&relay, ActorId::from("mallory"), input, Arc::clone(&reporter)).await?;

    assert_eq!(
        output_of(reporter),
        vec![format!(r#"{{"type":"error","kind":"denied","content":"{DENIED_MESSAGE}"}}"#)]
    );
    assert_eq!(probe.invocations().len(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn blank_and_unsupported_lines_are_skipped() -> TestResult {
    let (relay, probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(1, "x")),
        AllowList::default(),
    );
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Json, 4000));
    let input: &[u8] = b"\n   \n{\"type\":\"photo\",\"file\":\"a.png\"}\n";

    serve_lines(&relay, ActorId::from("local"), input, Arc::clone(&reporter)).await?;

    assert!(output_of(reporter).is_empty());
    assert_eq!(probe.invocations().len(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_reading_and_cancels_running_work() -> TestResult {
    init_tracing();
    let (relay, probe) = relay_with(
        FakeBackend::new(FakeScript::never_exits()),
        AllowList::default(),
    );
    let relay = Arc::new(relay);
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Json, 4000));

    // Input that never ends after the first line.
    let (mut writer, reader) = tokio::io::duplex(1024);
    tokio::io::AsyncWriteExt::write_all(&mut writer, b"wait forever\n").await?;

    let serving = {
        let relay = Arc::clone(&relay);
        let reporter = Arc::clone(&reporter);
        tokio::spawn(async move {
            let input = tokio::io::BufReader::new(reader);
            serve_lines(&relay, ActorId::from("local"), input, reporter).await
        })
    };

    tokio::time::sleep(Duration::from_secs(15)).await;
    relay.shutdown();
    serving.await??;
    drop(writer);

    let lines = output_of(reporter);
    assert_eq!(lines.len(), 2, "got {lines:?}");
    assert!(lines[0].contains(r#""type":"status""#));
    assert!(lines[1].contains(r#""kind":"cancelled""#));
    assert_eq!(probe.running_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn submit_prompt_rejects_blank_and_unauthorized() {
    let (relay, _probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(1, "x")),
        AllowList::new(["alice"]),
    );
    let sink: Arc<dyn StatusReporter> = Arc::new(common::RecordingReporter::new());

    assert!(matches!(
        relay.submit_prompt(ActorId::from("alice"), "   \n", Arc::clone(&sink)),
        Err(RelayError::EmptyPrompt)
    ));
    assert!(matches!(
        relay.submit_prompt(ActorId::from("bob"), "hi", Arc::clone(&sink)),
        Err(RelayError::AccessDenied(actor)) if actor.as_str() == "bob"
    ));
}

#[tokio::test(start_paused = true)]
async fn run_once_returns_the_outcome() -> TestResult {
    let (relay, _probe) = relay_with(
        FakeBackend::new(FakeScript::exits_after(3, "one shot")),
        AllowList::default(),
    );
    let reporter = Arc::new(WriterReporter::new(Vec::new(), OutputFormat::Text, 4000));

    let outcome = run_once(&relay, ActorId::from("local"), "go", Arc::clone(&reporter)).await?;

    assert!(matches!(outcome, ExecutionOutcome::Completed { ref text, .. } if text == "one shot"));
    assert_eq!(output_of(reporter), vec!["one shot"]);
    Ok(())
}
