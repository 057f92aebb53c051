//! # unwiki
//!
//! A Rust library for turning Japanese Wikipedia dumps into sentence-level
//! training text.
//!
//! Nested wikitext (templates, links, tables, references, section headings)
//! is reduced to plain prose lines. Each line becomes a [`Record`] tagged with
//! its article title and the heading it sits under; boilerplate sections and
//! non-article pages are dropped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unwiki::process_article;
//!
//! fn main() -> unwiki::Result<()> {
//!     let records = process_article("東京都", "'''東京都'''は[[日本]]の首都である。")?;
//!     for record in records {
//!         println!("{}\t{}", record.topic_title, record.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Whole dumps
//!
//! ```no_run
//! use unwiki::Unwiki;
//!
//! let stats = Unwiki::new()
//!     .with_threads(8)
//!     .build()?
//!     .extract_dump("jawiki-latest-pages-articles.xml.bz2", "data", None)?;
//! println!("{} records", stats.records);
//! # Ok::<(), unwiki::Error>(())
//! ```

pub mod clean;
pub mod detect;
pub mod dump;
pub mod error;
pub mod extract;
pub mod filter;
pub mod model;
pub mod options;
pub mod runner;
pub mod sink;

// Re-exports
pub use clean::Cleaner;
pub use detect::{detect_compression, detect_compression_from_path, Compression};
pub use dump::{open_dump, DumpReader};
pub use error::{Error, Result};
pub use extract::{extract_records, Records};
pub use filter::{PageFilter, PageVerdict, SkipReason};
pub use model::{Page, RawPage, Record};
pub use options::CleanOptions;
pub use runner::{run, RunOptions, RunStats};
pub use sink::{
    open_sink, JsonlWriter, OutputFormat, ParquetWriter, RecordSink, DEFAULT_MAX_FILE_SIZE,
};

use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Cleans one article with default options and returns its records.
///
/// Pages the filter rejects (redirects, administrative namespaces, list and
/// disambiguation pages) yield no records.
///
/// # Example
///
/// ```no_run
/// use unwiki::process_article;
///
/// let records = process_article("東京都", "== 歴史 ==\n[[江戸]]時代に発展した。")?;
/// assert_eq!(records[0].topic_title, "歴史");
/// # Ok::<(), unwiki::Error>(())
/// ```
pub fn process_article(title: &str, markup: &str) -> Result<Vec<Record>> {
    Ok(Unwiki::new().build()?.process_article(title, markup))
}

/// Cleans raw wikitext with default options, returning normalized lines.
///
/// Heading lines come out as `# title`.
pub fn clean_text(markup: &str) -> Result<String> {
    let text = clean::clean_markup_default(markup)?;
    Ok(text.replace(clean::delimiters::TOPIC_MARKER, "# "))
}

/// Extracts a whole dump into rotating Parquet files with default options.
pub fn extract_dump(dump: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<RunStats> {
    Unwiki::new().build()?.extract_dump(dump, out_dir, None)
}

/// Builder for configuring a pipeline.
///
/// # Example
///
/// ```no_run
/// use unwiki::{CleanOptions, OutputFormat, Unwiki};
///
/// let pipeline = Unwiki::new()
///     .with_options(CleanOptions::default().with_excluded_section("年表"))
///     .sequential()
///     .with_max_file_size(100 * 1024 * 1024)
///     .with_output_format(OutputFormat::Jsonl)
///     .build()?;
/// # Ok::<(), unwiki::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Unwiki {
    clean_options: CleanOptions,
    run_options: RunOptions,
    max_file_size: u64,
    output_format: OutputFormat,
}

impl Default for Unwiki {
    fn default() -> Self {
        Self::new()
    }
}

impl Unwiki {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            clean_options: CleanOptions::default(),
            run_options: RunOptions::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            output_format: OutputFormat::default(),
        }
    }

    /// Sets the cleaning options.
    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.clean_options = options;
        self
    }

    /// Loads cleaning options from a JSON file.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.clean_options = CleanOptions::from_json_file(path)?;
        Ok(self)
    }

    /// Sets the run options.
    pub fn with_run_options(mut self, options: RunOptions) -> Self {
        self.run_options = options;
        self
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.run_options = self.run_options.sequential();
        self
    }

    /// Sets the number of worker threads (0 = all cores).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.run_options = self.run_options.with_threads(threads);
        self
    }

    /// Sets the number of pages cleaned per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.run_options = self.run_options.with_batch_size(batch_size);
        self
    }

    /// Sets the output file rotation threshold in bytes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the output file format.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Compiles the configured patterns.
    pub fn build(self) -> Result<Pipeline> {
        Ok(Pipeline {
            cleaner: Cleaner::new(self.clean_options)?,
            run_options: self.run_options,
            max_file_size: self.max_file_size,
            output_format: self.output_format,
        })
    }
}

/// A compiled pipeline ready to process pages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    cleaner: Cleaner,
    run_options: RunOptions,
    max_file_size: u64,
    output_format: OutputFormat,
}

impl Pipeline {
    /// Returns the underlying cleaner.
    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    /// Returns the run options.
    pub fn run_options(&self) -> &RunOptions {
        &self.run_options
    }

    /// Returns the output file format.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Filters, cleans and extracts one article.
    pub fn process_article(&self, title: &str, markup: &str) -> Vec<Record> {
        let filter = PageFilter::new(self.cleaner.options());
        match filter.check_fields(title, markup) {
            PageVerdict::Accept => self.cleaner.process_page(&Page::new(title, markup)),
            PageVerdict::Skip(_) => Vec::new(),
        }
    }

    /// Runs over any page stream into any sink.
    pub fn run<I, S>(&self, pages: I, sink: &mut S, cancel: Option<&AtomicBool>) -> Result<RunStats>
    where
        I: IntoIterator<Item = Result<RawPage>>,
        S: RecordSink + ?Sized,
    {
        runner::run(pages, &self.cleaner, sink, &self.run_options, cancel)
    }

    /// Streams a dump file into `{out_dir}/{n}.parquet` (or `.jsonl`).
    pub fn extract_dump(
        &self,
        dump: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        cancel: Option<&AtomicBool>,
    ) -> Result<RunStats> {
        let reader = DumpReader::from_path(dump)?;
        let mut sink = open_sink(self.output_format, out_dir, self.max_file_size)?;
        self.run(reader, sink.as_mut(), cancel)
    }
}
