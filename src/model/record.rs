//! Output records.

use serde::{Deserialize, Serialize};

/// One extracted line of article text.
///
/// Field names match the dataset schema: `article_title`, `topic_title`, `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Title of the article the line came from
    pub article_title: String,
    /// Most recent heading above the line, empty before the first heading
    pub topic_title: String,
    /// The cleaned line
    pub text: String,
}

impl Record {
    /// Creates a new record.
    pub fn new(
        article_title: impl Into<String>,
        topic_title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            article_title: article_title.into(),
            topic_title: topic_title.into(),
            text: text.into(),
        }
    }
}
