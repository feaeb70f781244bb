// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::{BusyPolicy, GateScope, InvocationMode};

/// Command-line arguments for `promptrelay`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "promptrelay",
    version,
    about = "Relay prompts to an external text-generation command, one at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Relay.toml` in the current working directory. A missing
    /// default file means built-in defaults; a missing explicit file is an
    /// error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Identity the prompts are submitted as.
    #[arg(long, value_name = "ID", default_value = "local")]
    pub actor: String,

    /// Encoding of stdin/stdout.
    #[arg(long, value_enum, value_name = "FORMAT", default_value = "text")]
    pub format: OutputFormat,

    /// Run a single prompt and exit instead of reading prompts from stdin.
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Override `[gate].when_busy` (reject, queue).
    #[arg(long, value_name = "POLICY")]
    pub when_busy: Option<BusyPolicy>,

    /// Override `[gate].scope` (global, actor).
    #[arg(long, value_name = "SCOPE")]
    pub gate_scope: Option<GateScope>,

    /// Override `[command].mode` (stdin, argument, shell).
    #[arg(long, value_name = "MODE")]
    pub mode: Option<InvocationMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROMPTRELAY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the effective settings, but don't
    /// execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Stdio encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines; long replies are chunked.
    Text,
    /// One JSON object per line in both directions.
    Json,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
