//! # Cleaning Pipeline
//!
//! Turns raw wikitext into normalized lines ready for record extraction.
//!
//! ## Pipeline Stages
//!
//! 1. **Delimiter remapping** - `{{ }}`, `[[ ]]`, `{| |}` to private sentinels
//! 2. **Section filtering** - drop boilerplate sections (references, external links, lists)
//! 3. **Element stripping** - comments, refs, containers, inline tags, heading markers
//! 4. **Recursive resolution** - innermost templates and links to display text, to a fixed point
//! 5. **Text normalization** - halfwidth conversion, whitespace, list markers, residue lines

pub mod delimiters;
pub mod elements;
pub mod normalize;
pub mod patterns;
pub mod resolver;
pub mod sections;

use crate::error::Result;
use crate::extract::extract_records;
use crate::model::{Page, Record};
use crate::options::CleanOptions;
use patterns::Blacklists;

/// A compiled cleaning pipeline.
///
/// Immutable after construction and shared by reference across worker
/// threads. Every configurable pattern is compiled in [`Cleaner::new`], so a
/// bad configuration fails before any article is processed.
#[derive(Debug, Clone)]
pub struct Cleaner {
    options: CleanOptions,
    blacklists: Blacklists,
}

impl Cleaner {
    /// Compiles a cleaner from options.
    pub fn new(options: CleanOptions) -> Result<Self> {
        let blacklists = Blacklists::compile(&options)?;
        Ok(Self {
            options,
            blacklists,
        })
    }

    /// Returns the options this cleaner was built from.
    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Runs stages 1-5 on raw markup.
    pub fn clean_markup(&self, raw: &str) -> String {
        let text = delimiters::remap(raw);
        let text = sections::remove_sections(&text, &self.options);
        let text = elements::strip_elements(&text, &self.blacklists);
        let resolution = resolver::resolve(&text, &self.blacklists);
        normalize::normalize_text(&resolution.text)
    }

    /// Cleans a page and extracts its records.
    pub fn process_page(&self, page: &Page) -> Vec<Record> {
        let text = self.clean_markup(&page.raw_markup);
        extract_records(&page.title, &text)
    }
}

/// Runs the cleaning stages with default options.
pub fn clean_markup_default(raw: &str) -> Result<String> {
    Ok(Cleaner::new(CleanOptions::default())?.clean_markup(raw))
}
