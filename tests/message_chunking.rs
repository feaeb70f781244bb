// tests/message_chunking.rs

use proptest::prelude::*;

use promptrelay::output::split_message;

#[test]
fn short_text_is_one_chunk() {
    assert_eq!(split_message("hello", 4000), vec!["hello".to_string()]);
    assert_eq!(split_message("", 10), vec![String::new()]);
}

#[test]
fn breaks_on_line_boundaries() {
    let text = "aaaa\nbbbb\ncccc";
    assert_eq!(split_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
}

#[test]
fn long_line_is_hard_split() {
    let text = "abcdefghij";
    assert_eq!(split_message(text, 4), vec!["abcd", "efgh", "ij"]);
}

#[test]
fn tail_of_long_line_joins_following_lines() {
    let text = "abcdefghij\nk";
    assert_eq!(split_message(text, 4), vec!["abcd", "efgh", "ij\nk"]);
}

#[test]
fn blank_lines_survive_at_chunk_starts() {
    let text = "aaaa\n\nbbbb";
    let chunks = split_message(text, 4);
    assert_eq!(chunks.join("\n"), text);
}

#[test]
fn counts_chars_not_bytes() {
    let text = "ééééé";
    assert_eq!(split_message(text, 5), vec![text.to_string()]);
    assert_eq!(split_message(text, 2), vec!["éé", "éé", "é"]);
}

#[test]
fn zero_limit_behaves_like_one() {
    assert_eq!(split_message("abc", 0), vec!["a", "b", "c"]);
}

#[test]
fn default_limit_splits_a_long_reply() {
    let line = "x".repeat(100);
    let text = vec![line; 100].join("\n");
    let chunks = split_message(&text, 4000);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
    assert_eq!(chunks.join("\n"), text);
}

proptest! {
    #[test]
    fn chunks_respect_the_limit(text in "[a-zé \n]{0,300}", limit in 1usize..50) {
        for chunk in split_message(&text, limit) {
            prop_assert!(chunk.chars().count() <= limit);
        }
    }

    #[test]
    fn rejoining_restores_text_when_no_line_is_cut(
        lines in proptest::collection::vec("[a-z ]{0,10}", 1..30),
        limit in 10usize..60,
    ) {
        let text = lines.join("\n");
        let chunks = split_message(&text, limit);
        prop_assert_eq!(chunks.join("\n"), text);
    }
}
