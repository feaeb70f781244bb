// src/output/fence.rs

//! First-code-block extraction.
//!
//! This is a heuristic, not a markdown parser: the text is cut at the first
//! two fence markers, whatever they are attached to. Later blocks stay in the
//! text as-is.

/// Delimiter of an embedded code block.
pub const FENCE_MARKER: &str = "```";

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Contents of the first block, language tag line removed, trimmed.
    pub code: String,
    /// The text around the block, rejoined and trimmed.
    pub remaining_text: String,
}

/// Cut the first fenced block out of `text`.
///
/// Returns `None` unless there are at least two fence markers. If the block
/// spans several lines and its first line is one of `languages`, that line
/// is dropped from the code.
pub fn extract_first_code_block(text: &str, languages: &[String]) -> Option<CodeBlock> {
    let open = text.find(FENCE_MARKER)?;
    let body_start = open + FENCE_MARKER.len();
    let close = body_start + text[body_start..].find(FENCE_MARKER)?;

    let before = &text[..open];
    let body = &text[body_start..close];
    let after = &text[close + FENCE_MARKER.len()..];

    let code = strip_language_tag(body, languages).trim().to_string();
    let remaining_text = format!("{}\n{}", before.trim_end(), after.trim_start())
        .trim()
        .to_string();

    Some(CodeBlock {
        code,
        remaining_text,
    })
}

fn strip_language_tag<'a>(body: &'a str, languages: &[String]) -> &'a str {
    match body.split_once('\n') {
        Some((first, rest)) if languages.iter().any(|l| l == first.trim()) => rest,
        _ => body,
    }
}
