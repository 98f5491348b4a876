//! Markup sanitization.
//!
//! [`Sanitizer::sanitize`] is a total function: it never fails, it only
//! transforms. Steps run strictly in order:
//!
//! 1. Return the input unchanged if sanitization is disabled.
//! 2. Remove complete `<script>`, `<iframe>`, `<object>`, and `<embed>`
//!    blocks (non-greedy, case-insensitive).
//! 3. Strip any remaining tag whose name is not in the allow-list.
//! 4. Escape the five HTML-sensitive characters in the text between
//!    surviving tags.
//! 5. Trim leading and trailing whitespace.
//!
//! Entity escaping runs last; running it earlier would double-escape the
//! output of tag removal. Tags on the allow-list survive literally so they
//! can render as markup. Attributes on allowed tags are not inspected;
//! unsafe attribute payloads are the validator's job.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ChatConfig;

/// Entity bodies recognized by the escaper, without the leading `&`.
const ESCAPED_ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "#x27;"];

/// Compile a hard-coded pattern.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern compiles")
}

/// Complete embedded-content blocks, removed wholesale in step 2.
static BLOCK_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        compile(r"(?is)<script\b.*?</script>"),
        compile(r"(?is)<iframe\b.*?</iframe>"),
        compile(r"(?is)<object\b.*?</object>"),
        compile(r"(?is)<embed\b.*?</embed>"),
    ]
});

/// Generic tag shape used for allow-list stripping and escape boundaries.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]*>"));

/// Allow-list HTML sanitizer.
///
/// Built once from configuration; [`Sanitizer::sanitize`] can then be
/// called on any number of messages.
///
/// # Example
///
/// ```
/// use companion_chat::config::ChatConfig;
/// use companion_chat::security::Sanitizer;
///
/// let sanitizer = Sanitizer::new(&ChatConfig::default());
/// assert_eq!(
///     sanitizer.sanitize("<script>alert(1)</script>hello"),
///     "hello"
/// );
/// assert_eq!(
///     sanitizer.sanitize("<strong>hi</strong> & <bad>x</bad>"),
///     "<strong>hi</strong> &amp; x"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Sanitizer {
    enabled: bool,
    allowed: HashSet<String>,
}

impl Sanitizer {
    /// Build a sanitizer from configuration.
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            enabled: config.sanitize_input,
            allowed: config
                .allowed_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Sanitize a message. Total: never fails.
    #[must_use]
    pub fn sanitize(&self, input: &str) -> String {
        if !self.enabled {
            return input.to_string();
        }

        let mut text = input.to_string();
        for pattern in BLOCK_PATTERNS.iter() {
            text = pattern.replace_all(&text, "").into_owned();
        }

        let stripped = TAG_PATTERN
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                if self.is_allowed_tag(&caps[0]) {
                    caps[0].to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();

        let escaped = escape_outside_tags(&stripped);
        escaped.trim().to_string()
    }

    /// Whether a `<...>` token names an allow-listed tag.
    fn is_allowed_tag(&self, tag: &str) -> bool {
        tag_name(tag).is_some_and(|name| self.allowed.contains(&name))
    }
}

/// Escape text between surviving tags, leaving the tags themselves
/// untouched. After step 3 the only tokens matching the generic tag
/// shape are allow-listed tags.
fn escape_outside_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in TAG_PATTERN.find_iter(text) {
        escape_into(&text[last..m.start()], &mut out);
        out.push_str(m.as_str());
        last = m.end();
    }
    escape_into(&text[last..], &mut out);
    out
}

/// Extract the lowercased tag name from a `<...>` token.
///
/// Returns `None` when no leading ASCII-alphanumeric name exists
/// (such tokens are always stripped).
fn tag_name(tag: &str) -> Option<String> {
    let inner = tag.strip_prefix('<')?.strip_suffix('>')?;
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let name: String = inner
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

/// Escape the five HTML-sensitive characters into `out`.
///
/// An `&` that already begins one of the five produced entities is kept,
/// which makes sanitization idempotent on its own output.
fn escape_into(text: &str, out: &mut String) {
    let mut i = 0;
    while let Some(c) = text[i..].chars().next() {
        match c {
            '&' => {
                let rest = &text[i + 1..];
                if ESCAPED_ENTITIES.iter().any(|e| rest.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
        i += c.len_utf8();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::field_reassign_with_default
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(&ChatConfig::default())
    }

    #[test]
    fn test_script_block_removed() {
        assert_eq!(
            sanitizer().sanitize("<script>alert(1)</script>hello"),
            "hello"
        );
    }

    #[test]
    fn test_allowed_tag_survives_disallowed_stripped() {
        assert_eq!(
            sanitizer().sanitize("<strong>hi</strong> & <bad>x</bad>"),
            "<strong>hi</strong> &amp; x"
        );
    }

    #[test_case("<IFRAME src=x>evil</IFRAME>after", "after" ; "iframe block upper case")]
    #[test_case("<object data=x>o</object>kept", "kept" ; "object block")]
    #[test_case("<embed src=x>e</embed>kept", "kept" ; "embed block")]
    #[test_case("a<script >x</script>b", "ab" ; "script with attribute space")]
    fn test_block_removal(input: &str, expected: &str) {
        assert_eq!(sanitizer().sanitize(input), expected);
    }

    #[test]
    fn test_script_block_with_inner_angle_brackets() {
        // Block content may include < characters other than the closing tag
        assert_eq!(
            sanitizer().sanitize("<script>if (a < b) { x() }</script>ok"),
            "ok"
        );
    }

    #[test]
    fn test_nested_script_blocks_non_greedy() {
        // Non-greedy: each block ends at the first closing tag
        assert_eq!(
            sanitizer().sanitize("<script>a</script>mid<script>b</script>end"),
            "midend"
        );
    }

    #[test]
    fn test_all_allowed_tags_survive() {
        let input = "<br><strong>a</strong><em>b</em><p>c</p>";
        assert_eq!(sanitizer().sanitize(input), input);
    }

    #[test]
    fn test_allowed_tag_case_insensitive() {
        assert_eq!(sanitizer().sanitize("<STRONG>x</STRONG>"), "<STRONG>x</STRONG>");
    }

    #[test]
    fn test_disallowed_tags_stripped() {
        assert_eq!(sanitizer().sanitize("<div><span>x</span></div>"), "x");
    }

    #[test]
    fn test_entity_escaping() {
        // "< c >" parses as a name-less tag and is stripped, not escaped
        assert_eq!(
            sanitizer().sanitize(r#"a & b < c > d " e ' f"#),
            "a &amp; b  d &quot; e &#x27; f"
        );
    }

    #[test]
    fn test_unpaired_angle_brackets_escaped() {
        assert_eq!(sanitizer().sanitize("a > b and c < d"), "a &gt; b and c &lt; d");
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        assert_eq!(sanitizer().sanitize("  hello  "), "hello");
    }

    #[test]
    fn test_disabled_sanitizer_returns_input_unchanged() {
        let mut config = ChatConfig::default();
        config.sanitize_input = false;
        let sanitizer = Sanitizer::new(&config);
        assert_eq!(
            sanitizer.sanitize("  <script>x</script>  "),
            "  <script>x</script>  "
        );
    }

    #[test]
    fn test_empty_allow_list_strips_everything() {
        let mut config = ChatConfig::default();
        config.allowed_tags.clear();
        let sanitizer = Sanitizer::new(&config);
        assert_eq!(sanitizer.sanitize("<strong>x</strong>"), "x");
    }

    #[test]
    fn test_nameless_token_stripped() {
        assert_eq!(sanitizer().sanitize("a < b > c"), "a  c");
    }

    #[test]
    fn test_stray_angle_bracket_escaped() {
        assert_eq!(sanitizer().sanitize("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_idempotent_on_sanitized_output() {
        let cases = [
            "plain text",
            "<strong>hi</strong> & <bad>x</bad>",
            r#"a & b < c > d " e ' f"#,
            "<script>x</script><em>kept</em>",
        ];
        let sanitizer = sanitizer();
        for case in cases {
            let once = sanitizer.sanitize(case);
            assert_eq!(sanitizer.sanitize(&once), once, "input: {case}");
        }
    }

    #[test]
    fn test_tag_name_extraction() {
        assert_eq!(tag_name("<strong>"), Some("strong".to_string()));
        assert_eq!(tag_name("</strong>"), Some("strong".to_string()));
        assert_eq!(tag_name("<P class=x>"), Some("p".to_string()));
        assert_eq!(tag_name("<>"), None);
        assert_eq!(tag_name("< b >"), None);
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(input in ".{0,200}") {
            let sanitizer = sanitizer();
            let once = sanitizer.sanitize(&input);
            let twice = sanitizer.sanitize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_output_has_no_disallowed_tags(input in ".{0,200}") {
            let sanitizer = sanitizer();
            let output = sanitizer.sanitize(&input);
            for m in TAG_PATTERN.find_iter(&output) {
                prop_assert!(sanitizer.is_allowed_tag(m.as_str()));
            }
        }
    }
}
