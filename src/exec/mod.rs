// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external command,
//! using `tokio::process::Command`, and for making sure it never outlives the
//! request that started it.
//!
//! - [`invocation`] turns a prompt into a concrete command line.
//! - [`backend`] provides the `ProcessBackend` trait and the
//!   `RealProcessBackend` used in production, which tests replace with a
//!   scripted fake.
//! - [`lifecycle`] owns the spawn / bounded wait / termination state machine.

pub mod backend;
pub mod invocation;
pub mod lifecycle;

pub use backend::{
    ProcessBackend, ProcessExit, ProcessHandle, RealProcessBackend, Termination, WaitFuture,
};
pub use invocation::{Invocation, shell_quote};
pub use lifecycle::{LifecycleOutcome, ManagedProcess, NO_RESPONSE, ProcessState};
