//! Element stripping.
//!
//! An ordered table of single-pass substitutions removing markup that does not
//! nest recursively: comments, references, media and table containers, inline
//! HTML, external links, list markers. Headings are rewritten to the topic
//! marker followed by the title.
//!
//! Order matters: containers go before the inline tags inside them, and the
//! blacklist passes run before headings and whole-line spans are rewritten.

use super::delimiters::TOPIC_MARKER;
use super::patterns::Blacklists;
use super::sections::parse_heading;
use regex::Regex;
use std::sync::LazyLock;

/// Containers removed together with everything inside them.
const CONTAINER_TAGS: &[&str] = &[
    "gallery",
    "timeline",
    "table",
    "imagemap",
    "score",
    "syntaxhighlight",
];

static RE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("RE_COMMENT regex"));

static RE_REF_SELF_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<ref[^>]*?/>").expect("RE_REF_SELF_CLOSING regex"));

static RE_REF_PAIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<ref.*?</ref>").expect("RE_REF_PAIRED regex"));

static RE_CONTAINERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CONTAINER_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}.*?</{tag}>")).expect("RE_CONTAINERS regex"))
        .collect()
});

static RE_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br */?>").expect("RE_LINE_BREAK regex"));

static RE_INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:div|span|blockquote|nowiki|var|small|center|ins|ol|li|em|u|s)[^>]*?>")
        .expect("RE_INLINE_TAG regex")
});

static RE_TAG_ATTRIBUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+) [^>/]*>").expect("RE_TAG_ATTRIBUTES regex"));

static RE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'{2,}").expect("RE_EMPHASIS regex"));

static RE_BEHAVIOR_SWITCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__[A-Z]+__").expect("RE_BEHAVIOR_SWITCH regex"));

static RE_EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[http.*?\]").expect("RE_EXTERNAL_LINK regex"));

static RE_HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9A-Fa-f]{6}").expect("RE_HEX_COLOR regex"));

static RE_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[*#;:]+ *").expect("RE_LIST_MARKER regex"));

static RE_WHOLE_LINE_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\x{E000}[^\x{E000}\x{E001}].*\x{E001}$").expect("RE_WHOLE_LINE_TEMPLATE regex")
});

static RE_WHOLE_LINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\x{E002}[^\x{E002}\x{E003}].*\x{E003}$").expect("RE_WHOLE_LINE_LINK regex")
});

/// Strips non-recursive elements from remapped markup.
pub fn strip_elements(input: &str, blacklists: &Blacklists) -> String {
    let mut text = RE_COMMENT.replace_all(input, "").into_owned();
    text = RE_REF_SELF_CLOSING.replace_all(&text, "").into_owned();
    text = RE_REF_PAIRED.replace_all(&text, "").into_owned();

    for re in RE_CONTAINERS.iter() {
        text = re.replace_all(&text, "").into_owned();
    }

    text = RE_LINE_BREAK.replace_all(&text, " ").into_owned();
    text = RE_INLINE_TAG.replace_all(&text, "").into_owned();
    text = RE_TAG_ATTRIBUTES.replace_all(&text, "<$1>").into_owned();
    text = RE_EMPHASIS.replace_all(&text, "").into_owned();

    if let Some(re) = &blacklists.template_span {
        text = re.replace_all(&text, "").into_owned();
    }
    if let Some(re) = &blacklists.link_span {
        text = re.replace_all(&text, "").into_owned();
    }

    text = RE_BEHAVIOR_SWITCH.replace_all(&text, "").into_owned();
    text = RE_EXTERNAL_LINK.replace_all(&text, "").into_owned();
    text = RE_HEX_COLOR.replace_all(&text, "").into_owned();
    text = RE_LIST_MARKER.replace_all(&text, "").into_owned();
    text = rewrite_headings(&text);
    text = RE_WHOLE_LINE_TEMPLATE.replace_all(&text, "").into_owned();
    RE_WHOLE_LINE_LINK.replace_all(&text, "").into_owned()
}

/// Replaces every heading line with the topic marker and its title.
///
/// Uses the same heading grammar as section pruning, so a line is either a
/// heading in both stages or in neither.
fn rewrite_headings(input: &str) -> String {
    let mut result = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        match parse_heading(line) {
            Some(heading) => {
                result.push(TOPIC_MARKER);
                result.push_str(&heading.title);
                if line.ends_with('\n') {
                    result.push('\n');
                }
            }
            None if is_bare_heading_rule(line) => {
                if line.ends_with('\n') {
                    result.push('\n');
                }
            }
            None => result.push_str(line),
        }
    }

    result
}

/// A heading line with no title, such as `==` or `== ==`.
fn is_bare_heading_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.chars().all(|c| c == '=' || c == ' ' || c == '\t')
}
