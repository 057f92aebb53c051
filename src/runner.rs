//! Batch runner.
//!
//! Pulls pages from a reader, filters them, cleans each batch on a rayon pool
//! (or on the calling thread) and hands every article's records to a sink in
//! input order.

use crate::clean::Cleaner;
use crate::error::Result;
use crate::filter::{PageFilter, PageVerdict, SkipReason};
use crate::model::{Page, RawPage, Record};
use crate::sink::RecordSink;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options controlling how a run is scheduled.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Clean batches on a rayon pool
    pub parallel: bool,
    /// Worker threads (0 = rayon default)
    pub threads: usize,
    /// Pages read before a batch is cleaned
    pub batch_size: usize,
    /// Log progress every N articles (0 = never)
    pub progress_interval: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
            batch_size: 256,
            progress_interval: 10_000,
        }
    }
}

impl RunOptions {
    /// Creates default run options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleans on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Sets the progress log interval.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Pages pulled from the reader
    pub pages_read: usize,
    /// Articles cleaned and written
    pub articles: usize,
    /// Pages without a title or text
    pub skipped_missing: usize,
    /// Pages rejected by the page filter
    pub filtered: usize,
    /// Records written
    pub records: usize,
    /// Whether the run stopped early on request
    pub cancelled: bool,
}

/// Runs the pipeline over a page stream.
///
/// The cancellation flag is checked before each article is started, so an
/// article is either written whole or not at all. Reader and sink errors stop
/// the run.
pub fn run<I, S>(
    pages: I,
    cleaner: &Cleaner,
    sink: &mut S,
    options: &RunOptions,
    cancel: Option<&AtomicBool>,
) -> Result<RunStats>
where
    I: IntoIterator<Item = Result<RawPage>>,
    S: RecordSink + ?Sized,
{
    let pool = if options.parallel {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(options.threads)
                .build()?,
        )
    } else {
        None
    };

    tracing::info!(
        parallel = options.parallel,
        threads = pool.as_ref().map_or(1, |p| p.current_num_threads()),
        batch_size = options.batch_size,
        "starting run"
    );

    let filter = PageFilter::new(cleaner.options());
    let batch_size = options.batch_size.max(1);
    let mut pages = pages.into_iter();
    let mut stats = RunStats::default();
    let mut batch: Vec<Page> = Vec::with_capacity(batch_size);
    let mut exhausted = false;

    while !exhausted && !stats.cancelled {
        // === Fill ===
        batch.clear();
        while batch.len() < batch_size {
            if is_cancelled(cancel) {
                stats.cancelled = true;
                break;
            }

            let Some(raw) = pages.next() else {
                exhausted = true;
                break;
            };
            let raw = raw?;
            stats.pages_read += 1;

            match filter.check(&raw) {
                PageVerdict::Accept => {
                    if let Some(page) = raw.into_page() {
                        batch.push(page);
                    }
                }
                PageVerdict::Skip(SkipReason::MissingField) => {
                    stats.skipped_missing += 1;
                    tracing::debug!(title = raw.title.as_deref().unwrap_or(""), "page missing title or text");
                }
                PageVerdict::Skip(reason) => {
                    stats.filtered += 1;
                    tracing::debug!(title = raw.title.as_deref().unwrap_or(""), %reason, "page filtered");
                }
            }
        }

        if batch.is_empty() {
            continue;
        }

        // === Clean ===
        let results: Vec<Option<Vec<Record>>> = match &pool {
            Some(pool) => pool.install(|| {
                batch
                    .par_iter()
                    .map(|page| clean_unless_cancelled(cleaner, page, cancel))
                    .collect()
            }),
            None => batch
                .iter()
                .map(|page| clean_unless_cancelled(cleaner, page, cancel))
                .collect(),
        };

        // === Write ===
        write_results(results, sink, &mut stats, options.progress_interval)?;
    }

    sink.finish()?;

    tracing::info!(
        pages_read = stats.pages_read,
        articles = stats.articles,
        records = stats.records,
        filtered = stats.filtered,
        skipped_missing = stats.skipped_missing,
        cancelled = stats.cancelled,
        "run finished"
    );

    Ok(stats)
}

/// Writes cleaned articles in input order, stopping at the first one that was
/// cancelled so the output is always a prefix of the batch.
fn write_results<S>(
    results: Vec<Option<Vec<Record>>>,
    sink: &mut S,
    stats: &mut RunStats,
    progress_interval: usize,
) -> Result<()>
where
    S: RecordSink + ?Sized,
{
    for result in results {
        let Some(records) = result else {
            stats.cancelled = true;
            break;
        };

        sink.write_article(&records)?;
        stats.articles += 1;
        stats.records += records.len();

        if progress_interval > 0 && stats.articles % progress_interval == 0 {
            tracing::info!("{} articles processed", stats.articles);
        }
    }
    Ok(())
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

fn clean_unless_cancelled(
    cleaner: &Cleaner,
    page: &Page,
    cancel: Option<&AtomicBool>,
) -> Option<Vec<Record>> {
    if is_cancelled(cancel) {
        return None;
    }
    Some(cleaner.process_page(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::options::CleanOptions;
    use std::sync::atomic::AtomicUsize;

    fn cleaner() -> Cleaner {
        Cleaner::new(CleanOptions::default()).unwrap()
    }

    fn pages() -> Vec<Result<RawPage>> {
        vec![
            Ok(RawPage::new("東京都", "'''東京都'''は[[日本]]の首都である。\n== 歴史 ==\n江戸時代に発展した。")),
            Ok(RawPage::new("Category:日本", "[[Category:アジア]]")),
            Ok(RawPage::default()),
            Ok(RawPage::new("大阪", "#REDIRECT [[大阪市]]")),
            Ok(RawPage::new("大阪府", "大阪府は近畿地方の府である。")),
        ]
    }

    #[test]
    fn test_sequential_run() {
        let mut sink: Vec<Record> = Vec::new();
        let stats = run(
            pages(),
            &cleaner(),
            &mut sink,
            &RunOptions::new().sequential(),
            None,
        )
        .unwrap();

        assert_eq!(
            stats,
            RunStats {
                pages_read: 5,
                articles: 2,
                skipped_missing: 1,
                filtered: 2,
                records: 3,
                cancelled: false,
            }
        );
        assert_eq!(
            sink,
            vec![
                Record::new("東京都", "", "東京都は日本の首都である。"),
                Record::new("東京都", "歴史", "江戸時代に発展した。"),
                Record::new("大阪府", "", "大阪府は近畿地方の府である。"),
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let many: Vec<Result<RawPage>> = (0..50)
            .map(|i| {
                Ok(RawPage::new(
                    format!("記事{}", i),
                    format!("{{{{lang|en|Article {}}}}}は[[テスト|試験]]の記事である。\n== 概要 ==\n本文{}。", i, i),
                ))
            })
            .collect();
        let cloned: Vec<Result<RawPage>> = many
            .iter()
            .map(|p| Ok(p.as_ref().unwrap().clone()))
            .collect();

        let mut sequential: Vec<Record> = Vec::new();
        run(many, &cleaner(), &mut sequential, &RunOptions::new().sequential(), None).unwrap();

        let mut parallel: Vec<Record> = Vec::new();
        let options = RunOptions::new().with_threads(4).with_batch_size(7);
        let stats = run(cloned, &cleaner(), &mut parallel, &options, None).unwrap();

        assert_eq!(stats.articles, 50);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[0].text, "Article 0は試験の記事である。");
    }

    #[test]
    fn test_preset_cancellation_processes_nothing() {
        let flag = AtomicBool::new(true);
        let mut sink: Vec<Record> = Vec::new();
        let stats = run(pages(), &cleaner(), &mut sink, &RunOptions::new(), Some(&flag)).unwrap();

        assert!(stats.cancelled);
        assert_eq!(stats.articles, 0);
        assert_eq!(stats.pages_read, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancellation_between_articles() {
        struct CancelAfterFirst<'a> {
            flag: &'a AtomicBool,
            records: Vec<Record>,
        }

        impl RecordSink for CancelAfterFirst<'_> {
            fn write_article(&mut self, records: &[Record]) -> Result<()> {
                self.records.extend_from_slice(records);
                self.flag.store(true, Ordering::Relaxed);
                Ok(())
            }
        }

        let flag = AtomicBool::new(false);
        let mut sink = CancelAfterFirst {
            flag: &flag,
            records: Vec::new(),
        };
        let options = RunOptions::new().sequential().with_batch_size(1);
        let stats = run(pages(), &cleaner(), &mut sink, &options, Some(&flag)).unwrap();

        assert!(stats.cancelled);
        assert_eq!(stats.articles, 1);
        assert!(sink.records.iter().all(|r| r.article_title == "東京都"));
        assert_eq!(sink.records.len(), 2);
    }

    #[test]
    fn test_write_stops_at_first_cancelled_article() {
        let results = vec![
            Some(vec![Record::new("甲", "", "一つ目の記事です。")]),
            None,
            Some(vec![Record::new("丙", "", "三つ目の記事です。")]),
        ];
        let mut sink: Vec<Record> = Vec::new();
        let mut stats = RunStats::default();
        write_results(results, &mut sink, &mut stats, 0).unwrap();

        assert!(stats.cancelled);
        assert_eq!(stats.articles, 1);
        assert_eq!(sink, vec![Record::new("甲", "", "一つ目の記事です。")]);
    }

    #[test]
    fn test_reader_error_stops_run() {
        let input = vec![
            Ok(RawPage::new("A", "本文です。")),
            Err(Error::XmlParse("truncated".into())),
            Ok(RawPage::new("B", "本文です。")),
        ];
        let mut sink: Vec<Record> = Vec::new();
        let result = run(input, &cleaner(), &mut sink, &RunOptions::new().sequential(), None);
        assert!(matches!(result, Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_finish_called_once() {
        struct Counting<'a>(&'a AtomicUsize);

        impl RecordSink for Counting<'_> {
            fn write_article(&mut self, _records: &[Record]) -> Result<()> {
                Ok(())
            }

            fn finish(&mut self) -> Result<()> {
                self.0.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }

        let finished = AtomicUsize::new(0);
        let mut sink = Counting(&finished);
        run(pages(), &cleaner(), &mut sink, &RunOptions::new().with_batch_size(2), None).unwrap();
        assert_eq!(finished.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_all_filtered_batches_do_not_stop_run() {
        let mut input: Vec<Result<RawPage>> = (0..10)
            .map(|i| Ok(RawPage::new(format!("Category:{}", i), "x")))
            .collect();
        input.push(Ok(RawPage::new("最後", "最後の記事です。")));

        let mut sink: Vec<Record> = Vec::new();
        let options = RunOptions::new().sequential().with_batch_size(3);
        let stats = run(input, &cleaner(), &mut sink, &options, None).unwrap();
        assert_eq!(stats.filtered, 10);
        assert_eq!(sink, vec![Record::new("最後", "", "最後の記事です。")]);
    }
}
