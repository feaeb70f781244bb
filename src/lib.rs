// src/lib.rs

pub mod access;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod transport;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::access::AllowList;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, format_duration, load_and_validate, load_or_default};
use crate::engine::{ActorId, AdmissionGate, CommandExecutor, ExecutorSettings, Relay};
use crate::exec::RealProcessBackend;
use crate::transport::{WriterReporter, run_once, serve_lines};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading (plus CLI overrides)
/// - admission gate / executor / relay
/// - the stdio transport
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let gate = Arc::new(AdmissionGate::new(cfg.gate.scope));
    let executor = Arc::new(CommandExecutor::new(
        gate,
        RealProcessBackend::new(),
        ExecutorSettings::from(&cfg),
    ));
    let relay = Arc::new(Relay::new(executor, Arc::new(AllowList::from(&cfg.access))));

    // Ctrl-C -> cancel everything in flight and stop reading input.
    {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; shutting down");
            relay.shutdown();
        });
    }

    let actor = ActorId::new(args.actor.clone());
    let reporter = Arc::new(WriterReporter::new(
        tokio::io::stdout(),
        args.format,
        cfg.output.max_message_len,
    ));

    match args.prompt.as_deref() {
        Some(prompt) => {
            let outcome = run_once(&relay, actor, prompt, reporter)
                .await
                .context("running prompt")?;
            Ok(if outcome.is_completed() { 0 } else { 1 })
        }
        None => {
            info!(actor = %actor, format = ?args.format, "reading prompts from stdin");
            let input = BufReader::new(tokio::io::stdin());
            serve_lines(&relay, actor, input, reporter)
                .await
                .context("serving prompts from stdin")?;
            Ok(0)
        }
    }
}

/// Explicit `--config` must exist; the default location may be absent.
fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut cfg = match &args.config {
        Some(path) => {
            let path = PathBuf::from(path);
            load_and_validate(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => {
            let path = default_config_path();
            load_or_default(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
    };

    if let Some(policy) = args.when_busy {
        cfg.gate.when_busy = policy;
    }
    if let Some(scope) = args.gate_scope {
        cfg.gate.scope = scope;
    }
    if let Some(mode) = args.mode {
        cfg.command.mode = mode;
        crate::config::validate::validate_command(&cfg.command)
            .context("applying --mode override")?;
    }

    Ok(cfg)
}

/// Print the effective settings; executes nothing.
fn print_dry_run(cfg: &ConfigFile) {
    println!("promptrelay dry-run");
    println!();

    println!("command:");
    println!("  mode: {:?}", cfg.command.mode);
    println!("  program: {}", cfg.command.program);
    if !cfg.command.args.is_empty() {
        println!("  args: {:?}", cfg.command.args);
    }
    println!("  shell_template: {}", cfg.command.shell_template);
    if let Some(ref dir) = cfg.command.working_dir {
        println!("  working_dir: {}", dir.display());
    }

    println!("schedule:");
    println!("  quiet_window: {}", format_duration(cfg.schedule.quiet_window));
    println!("  poll_interval: {}", format_duration(cfg.schedule.poll_interval));
    println!("  hard_ceiling: {}", format_duration(cfg.schedule.hard_ceiling));
    println!("  grace_period: {}", format_duration(cfg.schedule.grace_period));

    println!("gate:");
    println!("  scope: {:?}", cfg.gate.scope);
    println!("  when_busy: {:?}", cfg.gate.when_busy);

    println!("output:");
    println!("  noise_prefixes: {:?}", cfg.output.noise_prefixes);
    println!("  code_languages: {:?}", cfg.output.code_languages);
    println!("  max_message_len: {}", cfg.output.max_message_len);

    println!("access:");
    if cfg.access.allowed_actors.is_empty() {
        println!("  allowed_actors: (everyone)");
    } else {
        println!("  allowed_actors: {:?}", cfg.access.allowed_actors);
    }

    debug!("dry-run complete (no execution)");
}
