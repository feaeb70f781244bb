// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure the executor can hit while serving a request ends up as a
//! `RelayError` inside `ExecutionOutcome::Failed`; the transport only ever
//! sees the rendered message.

use thiserror::Error;

use crate::engine::ActorId;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The external command could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Anything that went wrong after the process was started.
    #[error("process runtime error: {0}")]
    Runtime(String),

    #[error("access denied for actor '{0}'")]
    AccessDenied(ActorId),

    #[error("prompt is empty")]
    EmptyPrompt,
}

pub type Result<T> = std::result::Result<T, RelayError>;
