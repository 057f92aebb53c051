//! Line classification and record extraction.
//!
//! Walks normalized lines once. Heading lines (topic marker plus title) update the current
//! topic and emit nothing; every other non-empty line becomes a [`Record`]
//! under the topic in effect at that point.

use crate::clean::delimiters::TOPIC_MARKER;
use crate::model::Record;
use std::str::Lines;

/// Classification of one normalized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A topic heading with its title
    Heading(&'a str),
    /// A body line
    Body(&'a str),
    /// Nothing to emit
    Empty,
}

/// Classifies a single normalized line.
pub fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(title) = line.strip_prefix(TOPIC_MARKER) {
        LineKind::Heading(title)
    } else if line.is_empty() {
        LineKind::Empty
    } else {
        LineKind::Body(line)
    }
}

/// Iterator over the records of one article.
///
/// The current topic starts empty and lives only as long as the iterator.
pub struct Records<'a> {
    article_title: &'a str,
    lines: Lines<'a>,
    topic: String,
}

impl<'a> Records<'a> {
    /// Creates an extractor over normalized text.
    pub fn new(article_title: &'a str, text: &'a str) -> Self {
        Self {
            article_title,
            lines: text.lines(),
            topic: String::new(),
        }
    }

    /// Returns the topic in effect after the lines consumed so far.
    pub fn current_topic(&self) -> &str {
        &self.topic
    }
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        for line in self.lines.by_ref() {
            match classify_line(line) {
                LineKind::Heading(title) => {
                    self.topic.clear();
                    self.topic.push_str(title);
                }
                LineKind::Body(text) => {
                    return Some(Record::new(self.article_title, self.topic.as_str(), text));
                }
                LineKind::Empty => {}
            }
        }
        None
    }
}

/// Extracts all records of one article.
pub fn extract_records(article_title: &str, text: &str) -> Vec<Record> {
    Records::new(article_title, text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_tracking() {
        let text = "\u{E006}Intro\nfirst body line\n\u{E006}History\nsecond body line";
        let records = extract_records("Article", text);
        assert_eq!(
            records,
            vec![
                Record::new("Article", "Intro", "first body line"),
                Record::new("Article", "History", "second body line"),
            ]
        );
    }

    #[test]
    fn test_lines_before_first_heading_have_empty_topic() {
        let records = extract_records("東京都", "導入文。\n\u{E006}歴史\n本文。");
        assert_eq!(records[0].topic_title, "");
        assert_eq!(records[1].topic_title, "歴史");
    }

    #[test]
    fn test_empty_lines_and_headings_emit_nothing() {
        let records = extract_records("A", "\n\u{E006}見出し\n\n\u{E006}次\n");
        assert!(records.is_empty());
    }

    #[test]
    fn test_consecutive_headings_last_wins() {
        let records = extract_records("A", "\u{E006}一\n\u{E006}二\n本文");
        assert_eq!(records, vec![Record::new("A", "二", "本文")]);
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("\u{E006}歴史"), LineKind::Heading("歴史"));
        assert_eq!(classify_line("# 見出し風"), LineKind::Body("# 見出し風"));
        assert_eq!(classify_line("#タグ"), LineKind::Body("#タグ"));
        assert_eq!(classify_line(""), LineKind::Empty);
    }

    #[test]
    fn test_iterator_state_is_per_article() {
        let mut first = Records::new("A", "\u{E006}歴史\n本文");
        assert!(first.next().is_some());
        assert_eq!(first.current_topic(), "歴史");

        let mut second = Records::new("A", "本文");
        assert_eq!(second.next().unwrap().topic_title, "");
    }
}
