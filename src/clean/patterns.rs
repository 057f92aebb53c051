//! Configurable blacklist patterns.
//!
//! Built once from [`CleanOptions`] when a [`Cleaner`](super::Cleaner) is
//! created; a pattern that fails to compile is reported there, before any
//! article is processed.

use crate::error::{Error, Result};
use crate::options::CleanOptions;
use regex::Regex;
use std::collections::BTreeSet;

/// Compiled blacklist patterns.
#[derive(Debug, Clone)]
pub struct Blacklists {
    /// Innermost template span whose kind is blacklisted (links may be inside).
    pub template_span: Option<Regex>,
    /// Blacklisted kind at the start of a template body.
    pub template_kind: Option<Regex>,
    /// Innermost link span whose namespace is blacklisted (templates may be inside).
    pub link_span: Option<Regex>,
    /// Blacklisted namespace at the start of a link body.
    pub link_namespace: Option<Regex>,
}

impl Blacklists {
    /// Compiles the blacklist patterns from options.
    pub fn compile(options: &CleanOptions) -> Result<Self> {
        let templates = alternation(&options.template_blacklist);
        let links = alternation(&options.link_namespace_blacklist);

        Ok(Self {
            template_span: templates
                .as_deref()
                .map(|alts| {
                    build(
                        "template_blacklist",
                        &format!(r"(?is)\x{{E000}}(?:{alts})[^\x{{E000}}\x{{E001}}]*?\x{{E001}}"),
                    )
                })
                .transpose()?,
            template_kind: templates
                .as_deref()
                .map(|alts| build("template_blacklist", &format!(r"(?i)^(?:{alts})")))
                .transpose()?,
            link_span: links
                .as_deref()
                .map(|alts| {
                    build(
                        "link_namespace_blacklist",
                        &format!(r"(?is)\x{{E002}}(?:{alts})[^\x{{E002}}\x{{E003}}]*?\x{{E003}}"),
                    )
                })
                .transpose()?,
            link_namespace: links
                .as_deref()
                .map(|alts| build("link_namespace_blacklist", &format!(r"(?i)^(?:{alts})")))
                .transpose()?,
        })
    }

    /// Returns true if a template body (text after the open sentinel) is blacklisted.
    pub fn is_blacklisted_template(&self, body: &str) -> bool {
        self.template_kind.as_ref().is_some_and(|re| re.is_match(body))
    }

    /// Returns true if a link body (text after the open sentinel) is blacklisted.
    pub fn is_blacklisted_link(&self, body: &str) -> bool {
        self.link_namespace.as_ref().is_some_and(|re| re.is_match(body))
    }
}

/// Joins escaped names into a regex alternation; `None` when empty.
fn alternation(names: &BTreeSet<String>) -> Option<String> {
    let escaped: Vec<String> = names
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| regex::escape(name))
        .collect();

    if escaped.is_empty() {
        None
    } else {
        Some(escaped.join("|"))
    }
}

fn build(name: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Pattern {
        name,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_kind_is_prefix_and_case_insensitive() {
        let lists = Blacklists::compile(&CleanOptions::default()).unwrap();
        assert!(lists.is_blacklisted_template("sfn|Smith|2020"));
        assert!(lists.is_blacklisted_template("SFNp|Smith|2020"));
        assert!(lists.is_blacklisted_template("Reflist"));
        assert!(lists.is_blacklisted_template("#if:x|y"));
        assert!(lists.is_blacklisted_template("要出典"));
        assert!(!lists.is_blacklisted_template("lang|en|Hello"));
    }

    #[test]
    fn test_link_namespace() {
        let lists = Blacklists::compile(&CleanOptions::default()).unwrap();
        assert!(lists.is_blacklisted_link("File:image.png|thumb"));
        assert!(lists.is_blacklisted_link("ファイル:画像.jpg"));
        assert!(!lists.is_blacklisted_link("Tokyo|capital"));
    }

    #[test]
    fn test_template_span_allows_nested_links() {
        let lists = Blacklists::compile(&CleanOptions::default()).unwrap();
        let re = lists.template_span.unwrap();
        let text = "a\u{E000}sfn|\u{E002}A\u{E003}|2020\u{E001}b";
        assert_eq!(re.replace_all(text, ""), "ab");
    }

    #[test]
    fn test_empty_blacklist_disables_patterns() {
        let mut options = CleanOptions::default();
        options.template_blacklist.clear();
        options.link_namespace_blacklist.clear();
        let lists = Blacklists::compile(&options).unwrap();
        assert!(lists.template_span.is_none());
        assert!(lists.link_span.is_none());
        assert!(!lists.is_blacklisted_template("sfn|x"));
        assert!(!lists.is_blacklisted_link("File:x"));
    }

    #[test]
    fn test_names_are_escaped() {
        let options = CleanOptions::default().with_blacklisted_template("a.b(");
        let lists = Blacklists::compile(&options).unwrap();
        assert!(lists.is_blacklisted_template("a.b(x"));
        assert!(!lists.is_blacklisted_template("axb(x"));
    }
}
