// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    CommandSection, ConfigFile, OutputSection, RawConfigFile, RawScheduleSection, Schedule,
};
use crate::errors::{RelayError, Result};
use crate::exec::invocation::PROMPT_PLACEHOLDER;
use crate::types::InvocationMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RelayError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_command(&raw.command)?;
        validate_output(&raw.output)?;
        let schedule = build_schedule(&raw.schedule)?;
        Ok(ConfigFile::new_unchecked(
            raw.command,
            schedule,
            raw.gate,
            raw.output,
            raw.access,
        ))
    }
}

pub(crate) fn validate_command(cmd: &CommandSection) -> Result<()> {
    match cmd.mode {
        InvocationMode::Shell => {
            if !cmd.shell_template.contains(PROMPT_PLACEHOLDER) {
                return Err(RelayError::ConfigError(format!(
                    "[command].shell_template must contain {PROMPT_PLACEHOLDER} in shell mode"
                )));
            }
        }
        InvocationMode::Stdin | InvocationMode::Argument => {
            if cmd.program.trim().is_empty() {
                return Err(RelayError::ConfigError(
                    "[command].program must not be empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_output(output: &OutputSection) -> Result<()> {
    if output.max_message_len == 0 {
        return Err(RelayError::ConfigError(
            "[output].max_message_len must be >= 1 (got 0)".to_string(),
        ));
    }
    if output.noise_prefixes.iter().any(|p| p.is_empty()) {
        // An empty prefix matches every line.
        return Err(RelayError::ConfigError(
            "[output].noise_prefixes must not contain an empty string".to_string(),
        ));
    }
    Ok(())
}

fn build_schedule(raw: &RawScheduleSection) -> Result<Schedule> {
    let schedule = Schedule {
        quiet_window: schedule_field("quiet_window", &raw.quiet_window)?,
        poll_interval: schedule_field("poll_interval", &raw.poll_interval)?,
        hard_ceiling: schedule_field("hard_ceiling", &raw.hard_ceiling)?,
        grace_period: schedule_field("grace_period", &raw.grace_period)?,
    };

    if schedule.poll_interval.is_zero() {
        return Err(RelayError::ConfigError(
            "[schedule].poll_interval must be greater than zero".to_string(),
        ));
    }
    if schedule.hard_ceiling.is_zero() {
        return Err(RelayError::ConfigError(
            "[schedule].hard_ceiling must be greater than zero".to_string(),
        ));
    }
    if schedule.quiet_window > schedule.hard_ceiling {
        return Err(RelayError::ConfigError(format!(
            "[schedule].quiet_window ({}) must not exceed hard_ceiling ({})",
            raw.quiet_window, raw.hard_ceiling
        )));
    }

    Ok(schedule)
}

/// Upper bound for every `[schedule]` value; keeps deadline arithmetic on
/// `Instant` far from overflow.
pub const MAX_SCHEDULE_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn schedule_field(name: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value)
        .map_err(|e| RelayError::ConfigError(format!("[schedule].{name}: {e}")))?;
    if duration > MAX_SCHEDULE_DURATION {
        return Err(RelayError::ConfigError(format!(
            "[schedule].{name}: {value} exceeds the maximum of 168h"
        )));
    }
    Ok(duration)
}
