//! Pages as read from the dump.

/// One `<page>` element as read from the dump.
///
/// Either field may be missing in a truncated or malformed export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// Page title
    pub title: Option<String>,
    /// Wikitext of the latest revision
    pub text: Option<String>,
}

impl RawPage {
    /// Creates a raw page with both fields present.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
        }
    }

    /// Converts into a [`Page`] if both title and text are present.
    pub fn into_page(self) -> Option<Page> {
        match (self.title, self.text) {
            (Some(title), Some(raw_markup)) => Some(Page { title, raw_markup }),
            _ => None,
        }
    }
}

/// A complete page ready for cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Article title
    pub title: String,
    /// Raw wikitext
    pub raw_markup: String,
}

impl Page {
    /// Creates a new page.
    pub fn new(title: impl Into<String>, raw_markup: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_markup: raw_markup.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_page_requires_both_fields() {
        assert!(RawPage::new("東京", "本文").into_page().is_some());

        let no_text = RawPage {
            title: Some("東京".into()),
            text: None,
        };
        assert!(no_text.into_page().is_none());

        let no_title = RawPage {
            title: None,
            text: Some("本文".into()),
        };
        assert!(no_title.into_page().is_none());
    }
}
