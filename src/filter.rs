//! Page precondition filter.
//!
//! Decides which dump pages are articles worth cleaning. Administrative
//! namespaces, list pages, redirects and disambiguation pages are skipped.

use crate::model::RawPage;
use crate::options::CleanOptions;
use serde::Serialize;

/// Why a page was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Title or text missing from the dump
    MissingField,
    /// Title in an administrative namespace
    Namespace,
    /// Title matches an excluded pattern (list pages)
    TitlePattern,
    /// Page is a redirect
    Redirect,
    /// Page is a disambiguation page
    Disambiguation,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingField => write!(f, "missing title or text"),
            SkipReason::Namespace => write!(f, "administrative namespace"),
            SkipReason::TitlePattern => write!(f, "excluded title"),
            SkipReason::Redirect => write!(f, "redirect"),
            SkipReason::Disambiguation => write!(f, "disambiguation"),
        }
    }
}

/// Verdict for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// Page enters the pipeline
    Accept,
    /// Page is skipped
    Skip(SkipReason),
}

impl PageVerdict {
    /// Returns true if the page enters the pipeline.
    pub fn is_accepted(&self) -> bool {
        matches!(self, PageVerdict::Accept)
    }
}

/// Page filter built from [`CleanOptions`].
#[derive(Debug, Clone, Copy)]
pub struct PageFilter<'a> {
    options: &'a CleanOptions,
}

impl<'a> PageFilter<'a> {
    /// Creates a filter over the option tables.
    pub fn new(options: &'a CleanOptions) -> Self {
        Self { options }
    }

    /// Classifies a raw page.
    pub fn check(&self, page: &RawPage) -> PageVerdict {
        match (&page.title, &page.text) {
            (Some(title), Some(text)) => self.check_fields(title, text),
            _ => PageVerdict::Skip(SkipReason::MissingField),
        }
    }

    /// Classifies a page by title and text.
    pub fn check_fields(&self, title: &str, text: &str) -> PageVerdict {
        let options = self.options;

        if options
            .excluded_title_prefixes
            .iter()
            .any(|prefix| title.starts_with(prefix.as_str()))
        {
            return PageVerdict::Skip(SkipReason::Namespace);
        }

        if options
            .excluded_title_substrings
            .iter()
            .any(|s| title.contains(s.as_str()))
        {
            return PageVerdict::Skip(SkipReason::TitlePattern);
        }

        if options
            .redirect_markers
            .iter()
            .any(|marker| starts_with_ignore_ascii_case(text, marker))
        {
            return PageVerdict::Skip(SkipReason::Redirect);
        }

        if options
            .disambiguation_markers
            .iter()
            .any(|marker| text.contains(marker.as_str()))
        {
            return PageVerdict::Skip(SkipReason::Disambiguation);
        }

        PageVerdict::Accept
    }
}

fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}
