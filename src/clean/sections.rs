//! Section pruning.
//!
//! Removes whole sections (heading plus body, including deeper subsections)
//! whose heading title is on the exclusion list.

use crate::options::CleanOptions;
use regex::Regex;
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(=+)[ \t]*(.*?)[ \t]*(=+)[ \t]*$").expect("RE_HEADING regex"));

/// Maximum heading depth recognized by MediaWiki.
const MAX_DEPTH: usize = 6;

/// A parsed heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of `=` on each side (1-6)
    pub depth: usize,
    /// Heading text, trimmed
    pub title: String,
}

/// Parses a single line as a heading.
///
/// Unbalanced markers keep the surplus `=` in the title, as MediaWiki does:
/// `=== A ==` is a depth-2 heading titled `=A`.
pub fn parse_heading(line: &str) -> Option<Heading> {
    let line = line.trim_end_matches(['\n', '\r']);
    let caps = RE_HEADING.captures(line)?;

    let leading = caps[1].len();
    let trailing = caps[3].len();
    let depth = leading.min(trailing).min(MAX_DEPTH);

    let mut title = "=".repeat(leading - depth);
    title.push_str(&caps[2]);
    title.push_str(&"=".repeat(trailing - depth));
    let title = title.trim().to_string();

    if title.is_empty() {
        return None;
    }

    Some(Heading { depth, title })
}

/// Removes excluded sections from markup.
///
/// Sections are discovered top to bottom. An excluded section runs until the
/// next heading of equal or lesser depth; everything outside excluded sections
/// is kept byte for byte.
pub fn remove_sections(input: &str, options: &CleanOptions) -> String {
    let mut result = String::with_capacity(input.len());
    let mut skip_depth: Option<usize> = None;

    for line in input.split_inclusive('\n') {
        if let Some(heading) = parse_heading(line) {
            if skip_depth.is_some_and(|depth| heading.depth <= depth) {
                skip_depth = None;
            }
            if skip_depth.is_none() && options.is_excluded_section(&heading.title) {
                skip_depth = Some(heading.depth);
            }
        }

        if skip_depth.is_none() {
            result.push_str(line);
        }
    }

    result
}
