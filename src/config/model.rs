// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{BusyPolicy, GateScope, InvocationMode};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [command]
/// program = "claude"
/// args = ["-p", "--continue", "--model", "haiku", "--input-format", "text"]
/// mode = "stdin"
///
/// [schedule]
/// quiet_window = "10s"
/// poll_interval = "30s"
/// hard_ceiling = "300s"
/// grace_period = "5s"
///
/// [gate]
/// scope = "global"
/// when_busy = "reject"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub command: CommandSection,

    /// Durations are still strings here; validation parses them.
    #[serde(default)]
    pub schedule: RawScheduleSection,

    #[serde(default)]
    pub gate: GateSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub access: AccessSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (or [`ConfigFile::default`]).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub command: CommandSection,
    pub schedule: Schedule,
    pub gate: GateSection,
    pub output: OutputSection,
    pub access: AccessSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        command: CommandSection,
        schedule: Schedule,
        gate: GateSection,
        output: OutputSection,
        access: AccessSection,
    ) -> Self {
        Self {
            command,
            schedule,
            gate,
            output,
            access,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            CommandSection::default(),
            Schedule::default(),
            GateSection::default(),
            OutputSection::default(),
            AccessSection::default(),
        )
    }
}

/// `[command]` section: what to run and how the prompt reaches it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSection {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub mode: InvocationMode,

    /// Only used in `shell` mode. `{prompt}` is replaced by the quoted prompt.
    #[serde(default = "default_shell_template")]
    pub shell_template: String,

    /// Working directory for the child; inherits ours when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_args() -> Vec<String> {
    ["-p", "--continue", "--model", "haiku", "--input-format", "text"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_shell_template() -> String {
    "printf '%s\\n' {prompt} | claude -p --continue --model haiku --input-format text".to_string()
}

impl Default for CommandSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            mode: InvocationMode::default(),
            shell_template: default_shell_template(),
            working_dir: None,
        }
    }
}

/// `[schedule]` section as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawScheduleSection {
    #[serde(default = "default_quiet_window")]
    pub quiet_window: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    #[serde(default = "default_hard_ceiling")]
    pub hard_ceiling: String,
    #[serde(default = "default_grace_period")]
    pub grace_period: String,
}

fn default_quiet_window() -> String {
    "10s".to_string()
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

fn default_hard_ceiling() -> String {
    "300s".to_string()
}

fn default_grace_period() -> String {
    "5s".to_string()
}

impl Default for RawScheduleSection {
    fn default() -> Self {
        Self {
            quiet_window: default_quiet_window(),
            poll_interval: default_poll_interval(),
            hard_ceiling: default_hard_ceiling(),
            grace_period: default_grace_period(),
        }
    }
}

/// The two-phase wait schedule of one execution.
///
/// - Wait `quiet_window` without any progress event.
/// - Then report progress and keep waiting in `poll_interval` steps, reporting
///   after each one, until the process exits or `hard_ceiling` is reached.
/// - At the ceiling, terminate: graceful signal, `grace_period`, forceful
///   signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub quiet_window: Duration,
    pub poll_interval: Duration,
    pub hard_ceiling: Duration,
    pub grace_period: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            hard_ceiling: Duration::from_secs(300),
            grace_period: Duration::from_secs(5),
        }
    }
}

/// `[gate]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSection {
    #[serde(default)]
    pub scope: GateScope,

    #[serde(default)]
    pub when_busy: BusyPolicy,
}

/// `[output]` section: post-processing of the raw reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Lines starting with any of these are tooling noise and get dropped.
    #[serde(default = "default_noise_prefixes")]
    pub noise_prefixes: Vec<String>,

    /// Language tags stripped from the first line of an extracted code block.
    #[serde(default = "default_code_languages")]
    pub code_languages: Vec<String>,

    /// Longest message a text transport sends in one piece.
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,
}

fn default_noise_prefixes() -> Vec<String> {
    vec!["[".to_string(), "Using model".to_string()]
}

fn default_code_languages() -> Vec<String> {
    ["bash", "sh", "python", "js", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_message_len() -> usize {
    4000
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            noise_prefixes: default_noise_prefixes(),
            code_languages: default_code_languages(),
            max_message_len: default_max_message_len(),
        }
    }
}

/// `[access]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSection {
    /// Actors allowed to submit prompts. Empty means everyone.
    #[serde(default)]
    pub allowed_actors: Vec<String>,
}
