// src/transport/mod.rs

//! Transports: how prompts get in and events get out.
//!
//! - [`wire`] is the JSON line encoding of events.
//! - [`stdio`] serves prompts from stdin and writes events to stdout.

pub mod stdio;
pub mod wire;

pub use stdio::{WriterReporter, render, run_once, serve_lines};
pub use wire::{ErrorKind, InboundMessage, WireMessage, parse_inbound};
