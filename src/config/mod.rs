// src/config/mod.rs

//! Configuration loading and validation for promptrelay.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a `ConfigFile` with parsed durations (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{format_duration, parse_duration};
pub use validate::MAX_SCHEDULE_DURATION;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    AccessSection, CommandSection, ConfigFile, GateSection, OutputSection, RawConfigFile,
    RawScheduleSection, Schedule,
};
