// tests/postprocess.rs

use proptest::prelude::*;

use promptrelay::output::{
    FENCE_MARKER, PostprocessOptions, extract_first_code_block, postprocess, strip_noise,
};

fn opts() -> PostprocessOptions {
    PostprocessOptions::default()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn fenced_python_example() {
    let raw = "Explanation text\n```python\nprint(1)\n```\nmore text";
    let out = postprocess(raw, &opts());

    assert_eq!(out.text, "Explanation text\nmore text");
    assert_eq!(out.code.as_deref(), Some("print(1)"));
    assert!(out.has_code());
}

#[test]
fn plain_text_has_no_code() {
    let out = postprocess("  just an answer \n", &opts());
    assert_eq!(out.text, "just an answer");
    assert!(out.code.is_none());
    assert!(!out.has_code());
}

#[test]
fn single_fence_marker_is_not_a_block() {
    let raw = "look: ``` oops";
    let out = postprocess(raw, &opts());
    assert_eq!(out.text, raw);
    assert!(out.code.is_none());
}

#[test]
fn unknown_language_tag_is_kept_in_code() {
    let raw = "x\n```rust\nfn main() {}\n```";
    let out = postprocess(raw, &opts());
    assert_eq!(out.code.as_deref(), Some("rust\nfn main() {}"));
    assert_eq!(out.text, "x");
}

#[test]
fn tag_only_block_keeps_the_word() {
    // No newline in the body: the word is the code, not a tag.
    let out = postprocess("run ```bash``` now", &opts());
    assert_eq!(out.code.as_deref(), Some("bash"));
    assert_eq!(out.text, "run\nnow");
}

#[test]
fn only_first_block_is_extracted() {
    let raw = "a\n```sh\nls\n```\nb\n```json\n{}\n```\nc";
    let out = postprocess(raw, &opts());
    assert_eq!(out.code.as_deref(), Some("ls"));
    assert_eq!(out.text, "a\nb\n```json\n{}\n```\nc");
}

#[test]
fn block_at_start_and_end() {
    let out = postprocess("```js\nconsole.log(1)\n```", &opts());
    assert_eq!(out.code.as_deref(), Some("console.log(1)"));
    assert_eq!(out.text, "");
}

#[test]
fn noise_lines_are_dropped_line_by_line() {
    let prefixes = strings(&["[", "Using model"]);
    let raw = "[debug] a\nreal line\nUsing model haiku\n  [indented] kept\nend";
    assert_eq!(
        strip_noise(raw, &prefixes),
        "real line\n  [indented] kept\nend"
    );
}

#[test]
fn all_noise_falls_back_to_raw() {
    let prefixes = strings(&["["]);
    let raw = "[a]\n[b]";
    assert_eq!(strip_noise(raw, &prefixes), raw);
}

#[test]
fn noise_is_filtered_before_code_extraction() {
    let raw = "Using model haiku\nhere:\n```bash\n[ -f x ] && echo y\n```";
    let out = postprocess(raw, &opts());
    // The line inside the block starts with '[' and is filtered like any
    // other.
    assert_eq!(out.code.as_deref(), Some(""));
    assert_eq!(out.text, "here:");
}

#[test]
fn custom_language_list() {
    let langs = strings(&["ruby"]);
    let block = extract_first_code_block("```ruby\nputs 1\n```", &langs).unwrap();
    assert_eq!(block.code, "puts 1");

    let block = extract_first_code_block("```python\nprint(1)\n```", &langs).unwrap();
    assert_eq!(block.code, "python\nprint(1)");
}

fn fence_free_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?\n\\[\\]]{0,200}".prop_filter("no fence", |s| !s.contains(FENCE_MARKER))
}

proptest! {
    #[test]
    fn no_fence_means_no_code(raw in fence_free_text()) {
        let o = opts();
        let out = postprocess(&raw, &o);
        prop_assert!(out.code.is_none());
        prop_assert_eq!(out.text, strip_noise(&raw, &o.noise_prefixes));
    }

    #[test]
    fn dropped_noise_lines_never_reappear(
        lines in proptest::collection::vec("[a-z ]{0,12}", 0..10),
        noise in proptest::collection::vec("\\[[a-z]{1,8}\\]", 1..5),
    ) {
        let mut all: Vec<String> = lines.clone();
        all.extend(noise.iter().cloned());
        let raw = all.join("\n");
        let prefixes = vec!["[".to_string()];
        let out = strip_noise(&raw, &prefixes);

        let any_kept = lines.iter().any(|l| !l.trim().is_empty());
        if any_kept {
            for line in out.split('\n') {
                prop_assert!(!line.starts_with('['));
            }
        } else {
            prop_assert_eq!(out, raw);
        }
    }

    #[test]
    fn recognised_tag_is_excluded_from_code(
        tag in prop::sample::select(vec!["bash", "sh", "python", "js", "json"]),
        body in "[a-z0-9 =()]{1,40}",
        before in "[a-z ]{0,20}",
        after in "[a-z ]{0,20}",
    ) {
        let raw = format!("{before}\n```{tag}\n{body}\n```\n{after}");
        let out = postprocess(&raw, &opts());
        let code = out.code.expect("block present");
        prop_assert_eq!(code, body.trim());
        prop_assert!(!out.text.contains(FENCE_MARKER));
    }
}
