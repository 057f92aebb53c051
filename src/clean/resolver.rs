//! Recursive template and link resolution.
//!
//! Templates and links nest without bound, so no single regex pass can match
//! them safely. Instead every pass rewrites only innermost spans (spans with no
//! template or link sentinel inside) and the loop runs until a pass makes no
//! substitution at all.
//!
//! Each substitution deletes one open/close sentinel pair, so a productive pass
//! strictly lowers the sentinel count: with K pairs the loop stops after at most
//! K + 1 passes. Unbalanced sentinels simply stop matching and are left for the
//! normalizer.

use super::patterns::Blacklists;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Innermost template: `{{ (lang|)? (name|)? (key=)? (:ns:)? DISPLAY (|rest)? }}`.
static RE_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?isx)
        \x{E000}
        (?:lang\|)?
        (?:[^\x{E000}-\x{E003}|]*?\|)?
        (?:[^\x{E000}-\x{E003}|=]*?=)?
        (?::\w+:)?
        ([^\x{E000}-\x{E003}|]*?)
        (?:\|[^\x{E000}-\x{E003}]*?)?
        \x{E001}
        ",
    )
    .expect("RE_TEMPLATE regex")
});

/// Innermost link: `[[ (target|)? (:ns:)? DISPLAY (|rest)? ]]`.
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?sx)
        \x{E002}
        (?:[^\x{E000}-\x{E003}|]*?\|)?
        (?::\w+:)?
        ([^\x{E000}-\x{E003}|]*?)
        (?:\|[^\x{E000}-\x{E003}]*?)?
        \x{E003}
        ",
    )
    .expect("RE_LINK regex")
});

/// Table with no nested table inside.
static RE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\x{E004}[^\x{E004}\x{E005}]*?\x{E005}").expect("RE_TABLE regex")
});

/// Result of resolving a document to its fixed point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved text; unbalanced sentinels may remain
    pub text: String,
    /// Passes run, including the final pass that changed nothing
    pub passes: usize,
    /// Total substitutions across all passes
    pub substitutions: usize,
}

/// Resolves templates, links and tables until nothing more matches.
pub fn resolve(input: &str, blacklists: &Blacklists) -> Resolution {
    let mut text = input.to_string();
    let mut passes = 0;
    let mut substitutions = 0;

    loop {
        passes += 1;

        let (next, templates) = resolve_templates(&text, blacklists);
        let (next, links) = resolve_links(&next, blacklists);
        let (next, tables) = remove_tables(&next);
        text = next;

        let count = templates + links + tables;
        if count == 0 {
            break;
        }
        substitutions += count;
    }

    tracing::trace!(passes, substitutions, "resolver reached fixed point");

    Resolution {
        text,
        passes,
        substitutions,
    }
}

/// One pass over innermost templates.
///
/// The blacklist is checked on every span as it becomes innermost, so a
/// blacklisted kind is dropped whole even when its arguments were resolved in
/// an earlier pass.
pub fn resolve_templates(text: &str, blacklists: &Blacklists) -> (String, usize) {
    replace_counting(&RE_TEMPLATE, text, |caps| {
        if blacklists.is_blacklisted_template(span_body(caps)) {
            String::new()
        } else {
            display_text(caps)
        }
    })
}

/// One pass over innermost links.
pub fn resolve_links(text: &str, blacklists: &Blacklists) -> (String, usize) {
    replace_counting(&RE_LINK, text, |caps| {
        if blacklists.is_blacklisted_link(span_body(caps)) {
            String::new()
        } else {
            display_text(caps)
        }
    })
}

/// One pass removing innermost tables.
pub fn remove_tables(text: &str) -> (String, usize) {
    replace_counting(&RE_TABLE, text, |_| String::new())
}

fn replace_counting<F>(re: &Regex, text: &str, mut replacement: F) -> (String, usize)
where
    F: FnMut(&Captures<'_>) -> String,
{
    let mut count = 0;
    let result = re.replace_all(text, |caps: &Captures<'_>| {
        count += 1;
        replacement(caps)
    });
    (result.into_owned(), count)
}

/// Text between the open and close sentinels of a match.
fn span_body<'h>(caps: &Captures<'h>) -> &'h str {
    let span = caps.get(0).map_or("", |m| m.as_str());
    let mut chars = span.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

fn display_text(caps: &Captures<'_>) -> String {
    caps.get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
