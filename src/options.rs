//! Cleaning configuration.
//!
//! These are the only tunable inputs of the pipeline; every other substitution
//! pattern is fixed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Section titles removed together with their bodies.
const DEFAULT_EXCLUDED_SECTIONS: &[&str] = &[
    "関連項目",
    "外部リンク",
    "参考文献",
    "Further readings",
    "注釈",
    "脚注",
    "出典",
    "個人成績",
];

/// Section title endings removed together with their bodies.
const DEFAULT_EXCLUDED_SECTION_SUFFIXES: &[&str] = &["一覧", "文献", "分類", "分野", "リスト", "作品"];

/// Template kind prefixes dropped without keeping any text.
const DEFAULT_TEMPLATE_BLACKLIST: &[&str] = &[
    "R", "coord", "Flatlist", "formatnum", "Gallery", "sfn", "harv", "要", "出典", "#", "-",
];

/// Link namespaces dropped without keeping any text.
const DEFAULT_LINK_NAMESPACE_BLACKLIST: &[&str] = &["ファイル", "File", "画像", ":ファイル", "Media"];

/// Administrative namespaces that never hold articles.
const DEFAULT_EXCLUDED_TITLE_PREFIXES: &[&str] = &[
    "Wikipedia:",
    "Category:",
    "Template:",
    "Help:",
    "Portal:",
    "プロジェクト:",
    "モジュール:",
    "特別:",
];

const DEFAULT_EXCLUDED_TITLE_SUBSTRINGS: &[&str] = &["一覧"];

const DEFAULT_REDIRECT_MARKERS: &[&str] = &["#REDIRECT", "#転送"];

const DEFAULT_DISAMBIGUATION_MARKERS: &[&str] = &["{{aimai}}", "{{Aimai}}"];

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Options controlling section pruning, blacklists and page filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanOptions {
    /// Section titles whose sections are removed (exact match).
    pub excluded_sections: BTreeSet<String>,
    /// Section title suffixes whose sections are removed.
    pub excluded_section_suffixes: BTreeSet<String>,
    /// Template kind name prefixes removed outright (case-insensitive).
    pub template_blacklist: BTreeSet<String>,
    /// Link target prefixes removed outright (case-insensitive).
    pub link_namespace_blacklist: BTreeSet<String>,
    /// Title prefixes of pages that are skipped.
    pub excluded_title_prefixes: BTreeSet<String>,
    /// Title substrings of pages that are skipped.
    pub excluded_title_substrings: BTreeSet<String>,
    /// Text prefixes marking redirect pages (ASCII case-insensitive).
    pub redirect_markers: BTreeSet<String>,
    /// Text fragments marking disambiguation pages.
    pub disambiguation_markers: BTreeSet<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            excluded_sections: to_set(DEFAULT_EXCLUDED_SECTIONS),
            excluded_section_suffixes: to_set(DEFAULT_EXCLUDED_SECTION_SUFFIXES),
            template_blacklist: to_set(DEFAULT_TEMPLATE_BLACKLIST),
            link_namespace_blacklist: to_set(DEFAULT_LINK_NAMESPACE_BLACKLIST),
            excluded_title_prefixes: to_set(DEFAULT_EXCLUDED_TITLE_PREFIXES),
            excluded_title_substrings: to_set(DEFAULT_EXCLUDED_TITLE_SUBSTRINGS),
            redirect_markers: to_set(DEFAULT_REDIRECT_MARKERS),
            disambiguation_markers: to_set(DEFAULT_DISAMBIGUATION_MARKERS),
        }
    }
}

impl CleanOptions {
    /// Creates options with the default tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses options from a JSON string. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Adds a section title to exclude.
    pub fn with_excluded_section(mut self, title: impl Into<String>) -> Self {
        self.excluded_sections.insert(title.into());
        self
    }

    /// Adds a section title suffix to exclude.
    pub fn with_excluded_section_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.excluded_section_suffixes.insert(suffix.into());
        self
    }

    /// Adds a template kind to drop.
    pub fn with_blacklisted_template(mut self, kind: impl Into<String>) -> Self {
        self.template_blacklist.insert(kind.into());
        self
    }

    /// Adds a link namespace to drop.
    pub fn with_blacklisted_link_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.link_namespace_blacklist.insert(namespace.into());
        self
    }

    /// Adds a title prefix whose pages are skipped.
    pub fn with_excluded_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_title_prefixes.insert(prefix.into());
        self
    }

    /// Returns true if a section with this title should be removed.
    pub fn is_excluded_section(&self, title: &str) -> bool {
        self.excluded_sections.contains(title)
            || self
                .excluded_section_suffixes
                .iter()
                .any(|suffix| title.ends_with(suffix.as_str()))
    }
}
