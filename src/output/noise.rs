// src/output/noise.rs

/// Drop every line that starts with one of `prefixes`.
///
/// Works line by line, so a dropped line never reappears in the output. The
/// result is trimmed; if nothing is left, the input is returned unchanged
/// rather than an empty reply.
pub fn strip_noise(raw: &str, prefixes: &[String]) -> String {
    let kept: Vec<&str> = raw
        .split('\n')
        .filter(|line| !is_noise(line, prefixes))
        .collect();

    let joined = kept.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        raw.to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_noise(line: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| line.starts_with(p.as_str()))
}
