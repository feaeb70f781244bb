// src/output/chunk.rs

/// Split `text` into pieces of at most `limit` characters.
///
/// Pieces break on line boundaries where possible; a single line longer than
/// `limit` is cut on char boundaries. Newlines at a break are dropped, so
/// joining the pieces with `"\n"` gives back the original text whenever no
/// line had to be cut.
///
/// Text that already fits comes back as one piece. A `limit` of zero is
/// treated as one.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    // The chunk being filled, and its length in chars.
    let mut current: Option<String> = None;
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if let Some(buf) = current.as_mut() {
            // +1 for the newline joining `line` onto the chunk.
            if current_len + 1 + line_len <= limit {
                buf.push('\n');
                buf.push_str(line);
                current_len += 1 + line_len;
                continue;
            }
            chunks.push(std::mem::take(buf));
        }

        if line_len <= limit {
            current = Some(line.to_string());
            current_len = line_len;
        } else {
            let mut pieces = hard_split(line, limit);
            // Keep the tail open so following short lines can join it.
            let tail = pieces.pop();
            chunks.extend(pieces);
            current_len = tail.as_ref().map_or(0, |t| t.chars().count());
            current = tail;
        }
    }

    if let Some(buf) = current {
        chunks.push(buf);
    }

    chunks
}

fn hard_split(line: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(limit).map(|c| c.iter().collect()).collect()
}
