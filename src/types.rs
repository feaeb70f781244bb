use std::str::FromStr;
use serde::Deserialize;

/// What the executor does when a request arrives while its gate scope is
/// already busy.
///
/// - `Reject`: answer `Busy` immediately and never spawn (default, matches
///   the single-slot behaviour the relay has always had).
/// - `Queue`: wait for the running execution to release the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    #[default]
    Reject,
    Queue,
}

impl FromStr for BusyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(BusyPolicy::Reject),
            "queue" => Ok(BusyPolicy::Queue),
            other => Err(format!(
                "invalid when_busy: {other} (expected \"reject\" or \"queue\")"
            )),
        }
    }
}

/// Granularity of the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateScope {
    /// One execution slot for the whole process.
    #[default]
    Global,
    /// One execution slot per acting identity.
    Actor,
}

impl FromStr for GateScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(GateScope::Global),
            "actor" => Ok(GateScope::Actor),
            other => Err(format!(
                "invalid gate scope: {other} (expected \"global\" or \"actor\")"
            )),
        }
    }
}

/// How the prompt is handed to the external program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    /// `program args...`, prompt written to stdin. No shell involved.
    #[default]
    Stdin,
    /// `program args... <prompt>`. No shell involved.
    Argument,
    /// `sh -c <shell_template>` with `{prompt}` replaced by the quoted prompt.
    Shell,
}

impl FromStr for InvocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdin" => Ok(InvocationMode::Stdin),
            "argument" => Ok(InvocationMode::Argument),
            "shell" => Ok(InvocationMode::Shell),
            other => Err(format!(
                "invalid command mode: {other} (expected \"stdin\", \"argument\" or \"shell\")"
            )),
        }
    }
}
