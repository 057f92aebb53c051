//! Delimiter remapping.
//!
//! Wikitext nests through two-character delimiters (`{{ }}`, `[[ ]]`, `{| |}`).
//! Each one is rewritten into a single private-use sentinel so later passes can
//! match innermost spans with plain character classes.

/// Template open (`{{`).
pub const TEMPLATE_OPEN: char = '\u{E000}';
/// Template close (`}}`).
pub const TEMPLATE_CLOSE: char = '\u{E001}';
/// Link open (`[[`).
pub const LINK_OPEN: char = '\u{E002}';
/// Link close (`]]`).
pub const LINK_CLOSE: char = '\u{E003}';
/// Table open (`{|`).
pub const TABLE_OPEN: char = '\u{E004}';
/// Table close (`|}`).
pub const TABLE_CLOSE: char = '\u{E005}';

/// Prefix of a rewritten heading line. Never produced by width conversion or
/// by any later pass, so only real headings carry it.
pub const TOPIC_MARKER: char = '\u{E006}';

/// Native delimiter to sentinel, in replacement order.
const DELIMITER_MAPPINGS: &[(&str, char)] = &[
    ("{{", TEMPLATE_OPEN),
    ("}}", TEMPLATE_CLOSE),
    ("[[", LINK_OPEN),
    ("]]", LINK_CLOSE),
    ("{|", TABLE_OPEN),
    ("|}", TABLE_CLOSE),
];

/// Check if character is one of the sentinels.
pub fn is_sentinel(c: char) -> bool {
    (TEMPLATE_OPEN..=TABLE_CLOSE).contains(&c)
}

/// Rewrites native delimiters into sentinels.
///
/// Literal sentinel and topic marker code points already present in the input
/// are dropped first, so every sentinel in the output stands for exactly one
/// delimiter.
pub fn remap(input: &str) -> String {
    let mut result: String = input
        .chars()
        .filter(|&c| !is_sentinel(c) && c != TOPIC_MARKER)
        .collect();

    for (native, sentinel) in DELIMITER_MAPPINGS {
        if result.contains(native) {
            result = result.replace(native, &sentinel.to_string());
        }
    }

    result
}

/// Maps sentinels back to their native delimiters.
pub fn restore(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match DELIMITER_MAPPINGS.iter().find(|(_, s)| *s == c) {
            Some((native, _)) => result.push_str(native),
            None => result.push(c),
        }
    }
    result
}

/// Removes any sentinel left behind by unbalanced markup.
pub fn strip_sentinels(input: &str) -> String {
    input.chars().filter(|&c| !is_sentinel(c)).collect()
}
