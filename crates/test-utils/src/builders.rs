#![allow(dead_code)]

use std::time::Duration;

use promptrelay::config::{CommandSection, ConfigFile, RawConfigFile, Schedule};
use promptrelay::engine::ExecutorSettings;
use promptrelay::types::{BusyPolicy, GateScope, InvocationMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_program(mut self, program: &str, args: &[&str]) -> Self {
        self.config.command.program = program.to_string();
        self.config.command.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_mode(mut self, mode: InvocationMode) -> Self {
        self.config.command.mode = mode;
        self
    }

    pub fn with_shell_template(mut self, template: &str) -> Self {
        self.config.command.shell_template = template.to_string();
        self
    }

    /// Durations in the config string format, e.g. `"10s"`.
    pub fn with_schedule(mut self, quiet: &str, poll: &str, ceiling: &str, grace: &str) -> Self {
        self.config.schedule.quiet_window = quiet.to_string();
        self.config.schedule.poll_interval = poll.to_string();
        self.config.schedule.hard_ceiling = ceiling.to_string();
        self.config.schedule.grace_period = grace.to_string();
        self
    }

    pub fn with_when_busy(mut self, policy: BusyPolicy) -> Self {
        self.config.gate.when_busy = policy;
        self
    }

    pub fn with_gate_scope(mut self, scope: GateScope) -> Self {
        self.config.gate.scope = scope;
        self
    }

    pub fn with_allowed_actors(mut self, actors: &[&str]) -> Self {
        self.config.access.allowed_actors = actors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ExecutorSettings`. Starts from the production defaults
/// (10s / 30s / 300s / 5s, reject when busy).
pub struct SettingsBuilder {
    settings: ExecutorSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: ExecutorSettings::default(),
        }
    }

    pub fn schedule_secs(mut self, quiet: u64, poll: u64, ceiling: u64, grace: u64) -> Self {
        self.settings.schedule = Schedule {
            quiet_window: Duration::from_secs(quiet),
            poll_interval: Duration::from_secs(poll),
            hard_ceiling: Duration::from_secs(ceiling),
            grace_period: Duration::from_secs(grace),
        };
        self
    }

    pub fn busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.settings.busy_policy = policy;
        self
    }

    pub fn command(mut self, command: CommandSection) -> Self {
        self.settings.command = command;
        self
    }

    /// `program args...` with the prompt on stdin.
    pub fn argv(mut self, program: &str, args: &[&str]) -> Self {
        self.settings.command.program = program.to_string();
        self.settings.command.args = args.iter().map(|s| s.to_string()).collect();
        self.settings.command.mode = InvocationMode::Stdin;
        self
    }

    pub fn mode(mut self, mode: InvocationMode) -> Self {
        self.settings.command.mode = mode;
        self
    }

    pub fn shell_template(mut self, template: &str) -> Self {
        self.settings.command.mode = InvocationMode::Shell;
        self.settings.command.shell_template = template.to_string();
        self
    }

    pub fn build(self) -> ExecutorSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
