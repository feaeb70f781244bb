// src/exec/invocation.rs

//! Turning a prompt into a concrete command line.
//!
//! `stdin` and `argument` modes build an argument vector and never involve a
//! shell, so the prompt needs no escaping at all. `shell` mode exists for
//! setups that need a pipeline; there the prompt goes through
//! [`shell_quote`] and nothing else.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::config::CommandSection;
use crate::types::InvocationMode;

/// Placeholder in `[command].shell_template` that receives the quoted prompt.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// A fully resolved command ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Written to the child's stdin, which is then closed. `None` gives the
    /// child a null stdin.
    pub stdin: Option<String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    /// Build the invocation for one prompt according to `command.mode`.
    pub fn for_prompt(command: &CommandSection, prompt: &str) -> Self {
        let (program, args, stdin) = match command.mode {
            InvocationMode::Stdin => (
                command.program.clone(),
                command.args.clone(),
                Some(prompt.to_string()),
            ),
            InvocationMode::Argument => {
                let mut args = command.args.clone();
                args.push(prompt.to_string());
                (command.program.clone(), args, None)
            }
            InvocationMode::Shell => {
                let script = command
                    .shell_template
                    .replace(PROMPT_PLACEHOLDER, &shell_quote(prompt));
                ("sh".to_string(), vec!["-c".to_string(), script], None)
            }
        };

        Self {
            program,
            args,
            stdin,
            working_dir: command.working_dir.clone(),
        }
    }

    /// A plain argv invocation, mostly useful for tests.
    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            working_dir: None,
        }
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Tokio command with all three stdio streams configured. Process group
    /// and kill-on-drop are left to the backend.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }

    /// Short human-readable form for logs. The prompt is not included.
    pub fn describe(&self) -> String {
        match self.program.as_str() {
            "sh" => "sh -c <script>".to_string(),
            _ => format!("{} ({} args)", self.program, self.args.len()),
        }
    }
}

/// Quote `s` as one POSIX shell word.
///
/// The whole string is wrapped in single quotes, inside which the shell
/// interprets nothing. A single quote cannot appear inside such a string, so
/// each one closes the quoting, emits an escaped quote and reopens:
/// `'` → `'\''`.
pub fn shell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
