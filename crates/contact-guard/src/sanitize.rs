//! Sanitization of raw form input

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

struct SanitizePatterns {
    tag: Regex,
    angle: Regex,
    js_scheme: Regex,
}

static PATTERNS: Lazy<SanitizePatterns> = Lazy::new(|| SanitizePatterns {
    // Anything that looks like markup: <b>, </script>, <img src=x ...>
    tag: Regex::new(r"<[^>]*>").expect("tag pattern"),
    // Stray angle brackets left after tag removal
    angle: Regex::new(r"[<>]").expect("angle pattern"),
    // Checked against the last 11 chars only
    js_scheme: Regex::new(r"(?i)^javascript:$").expect("javascript pattern"),
});

const JS_SCHEME_LEN: usize = "javascript:".len();

/// Strip markup and script-injection fragments from user text.
///
/// Tags and stray angle brackets go first. `javascript:` and `on<word>=`
/// are then removed while the text is rebuilt one character at a time, so a
/// fragment that only appears once an inner one is gone
/// (`javajavascript:script:`) is caught too, in linear time. The result
/// never contains `<`, `>`, `javascript:` or `on<word>=`, and
/// `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    let p = &*PATTERNS;
    let stripped = p.tag.replace_all(raw, "");
    let stripped = p.angle.replace_all(&stripped, "");
    strip_script_fragments(&stripped).trim().to_string()
}

/// Sanitize an untyped value. Anything that is not a string becomes empty.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rebuild `input` with every `javascript:` and `on<word>=` removed.
///
/// `out` never contains either fragment between steps. Both end in a fixed
/// character, so only a push of `:` or `=` can complete one, and only as a
/// suffix of `out`.
fn strip_script_fragments(input: &str) -> String {
    let mut out: Vec<char> = Vec::with_capacity(input.len());
    // For each char in `out`: start of the first "on" in the word run ending there
    let mut first_on: Vec<Option<usize>> = Vec::with_capacity(input.len());

    for c in input.chars() {
        match c {
            ':' if out.len() + 1 >= JS_SCHEME_LEN => {
                let start = out.len() + 1 - JS_SCHEME_LEN;
                let mut tail: String = out[start..].iter().collect();
                tail.push(c);
                if PATTERNS.js_scheme.is_match(&tail) {
                    out.truncate(start);
                    first_on.truncate(start);
                    continue;
                }
            }
            '=' => {
                // "on" plus at least one word char before the '='
                if let Some(Some(on)) = first_on.last().copied() {
                    if on + 2 < out.len() {
                        out.truncate(on);
                        first_on.truncate(on);
                        continue;
                    }
                }
            }
            _ => {}
        }

        let on = if is_word(c) {
            let prev = out.len().checked_sub(1);
            let inherited = prev.and_then(|i| first_on[i]);
            match prev {
                Some(i)
                    if inherited.is_none()
                        && c.eq_ignore_ascii_case(&'n')
                        && out[i].eq_ignore_ascii_case(&'o') =>
                {
                    Some(i)
                }
                _ => inherited,
            }
        } else {
            None
        };
        out.push(c);
        first_on.push(on);
    }

    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::{Duration, Instant};

    static RESIDUE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[<>]|(?i:javascript:)|(?i:on)[A-Za-z0-9_]+=").unwrap());

    fn assert_clean(output: &str) {
        assert!(!RESIDUE.is_match(output), "left residue in {output:?}");
    }

    #[test]
    fn test_script_tag_removed() {
        assert_eq!(sanitize("<script>alert(1)</script>"), "alert(1)");
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "Hello, I loved your climbing photo!";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize("  Ada Lovelace \n"), "Ada Lovelace");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_javascript_scheme_case_insensitive() {
        assert_eq!(sanitize("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize("go to jAvAsCrIpT:void(0) now"), "go to void(0) now");
    }

    #[test]
    fn test_event_handlers_removed() {
        assert_eq!(sanitize("x onclick=steal()"), "x steal()");
        assert_eq!(sanitize("ONMOUSEOVER=bad"), "bad");
    }

    #[test]
    fn test_stray_brackets_removed() {
        // Everything between a < and the next > reads as a tag
        assert_eq!(sanitize("a < b > c"), "a  c");
        assert_eq!(sanitize("5 > 3"), "5  3");
    }

    #[test]
    fn test_nested_fragments_do_not_survive() {
        let adversarial = [
            "javajavascript:script:alert(1)",
            "oonclick=nclick=x",
            "javascronclick=ipt:x",
            "<<script>script>alert(1)<</script>/script>",
            "<img src=x onerror=alert(1)>",
            "<a href=\"javascript:alert(1)\">click</a>",
            "on<b></b>load=x",
        ];
        for input in adversarial {
            let output = sanitize(input);
            assert_clean(&output);
            assert_eq!(sanitize(&output), output, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_idempotent_on_mixed_inputs() {
        let inputs = [
            "",
            "plain",
            "  padded  ",
            "<p>para</p>",
            "a<b",
            "x>y",
            "JAVASCRIPT:JAVASCRIPT:",
            "onon=x=",
            "Ünïcödé <i>text</i> ✓",
            " < javascript: onload= > ",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
            assert_clean(&once);
        }
    }

    #[test]
    fn test_deep_nesting_is_linear() {
        let depth = 50_000;
        let scheme = format!("{}{}alert(1)", "java".repeat(depth), "script:".repeat(depth));
        let handler = format!("{}{}x", "o".repeat(depth), "nclick=".repeat(depth));

        let started = Instant::now();
        assert_eq!(sanitize(&scheme), "alert(1)");
        assert_eq!(sanitize(&handler), "x");
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_handler_removes_from_first_on() {
        // The whole "onaonb=" run goes, not just the innermost "onb="
        assert_eq!(sanitize("x onaonb=y"), "x y");
        assert_eq!(sanitize("data-on=1"), "data-on=1");
        assert_eq!(sanitize("on=1"), "on=1");
    }

    #[test]
    fn test_sanitize_value_non_string() {
        assert_eq!(sanitize_value(&Value::String("<b>hi</b>".to_string())), "hi");
        assert_eq!(sanitize_value(&Value::Null), "");
        assert_eq!(sanitize_value(&serde_json::json!(42)), "");
        assert_eq!(sanitize_value(&serde_json::json!(["a"])), "");
    }

    // Inputs built from the characters that can form or split a fragment
    fn fragment_soup() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![
                Just("<".to_string()),
                Just(">".to_string()),
                Just("java".to_string()),
                Just("script:".to_string()),
                Just("JavaScript:".to_string()),
                Just("on".to_string()),
                Just("click=".to_string()),
                Just("=".to_string()),
                Just(" ".to_string()),
                "[a-zA-Z0-9_:=<> ]{1,4}",
            ],
            0..40,
        )
        .prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(input in any::<String>()) {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_sanitize_leaves_no_residue(input in any::<String>()) {
            let output = sanitize(&input);
            prop_assert!(!RESIDUE.is_match(&output), "left residue in {:?}", output);
        }

        #[test]
        fn prop_fragment_soup_is_clean_and_stable(input in fragment_soup()) {
            let once = sanitize(&input);
            prop_assert!(!RESIDUE.is_match(&once), "left residue in {:?}", once);
            prop_assert_eq!(sanitize(&once), once.clone());
            prop_assert_eq!(once.trim(), once.as_str());
        }
    }
}
