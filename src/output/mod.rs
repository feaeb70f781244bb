// src/output/mod.rs

//! Post-processing of the raw text a finished command produced.
//!
//! - [`noise`] drops tooling/log lines by prefix.
//! - [`fence`] pulls the first fenced code block out of the reply.
//! - [`chunk`] splits long replies for transports with a message size limit.
//!
//! Everything here is pure and synchronous.

pub mod chunk;
pub mod fence;
pub mod noise;

pub use chunk::split_message;
pub use fence::{FENCE_MARKER, extract_first_code_block};
pub use noise::strip_noise;

use crate::config::OutputSection;

/// Knobs for [`postprocess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostprocessOptions {
    pub noise_prefixes: Vec<String>,
    pub code_languages: Vec<String>,
}

impl Default for PostprocessOptions {
    fn default() -> Self {
        Self::from(&OutputSection::default())
    }
}

impl From<&OutputSection> for PostprocessOptions {
    fn from(section: &OutputSection) -> Self {
        Self {
            noise_prefixes: section.noise_prefixes.clone(),
            code_languages: section.code_languages.clone(),
        }
    }
}

/// A cleaned reply, with the first code block split out if there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postprocessed {
    pub text: String,
    pub code: Option<String>,
}

impl Postprocessed {
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }
}

/// Noise filter first, then code block extraction.
pub fn postprocess(raw: &str, opts: &PostprocessOptions) -> Postprocessed {
    let cleaned = strip_noise(raw, &opts.noise_prefixes);
    match extract_first_code_block(&cleaned, &opts.code_languages) {
        Some(block) => Postprocessed {
            text: block.remaining_text,
            code: Some(block.code),
        },
        None => Postprocessed {
            text: cleaned,
            code: None,
        },
    }
}
