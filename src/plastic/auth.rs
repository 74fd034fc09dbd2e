//! Authentication failure detection for Plastic output
//!
//! The CLI has no dedicated exit code for "not logged in", so failures are
//! recognised by case-insensitive keywords in its output.

use crate::config::DEFAULT_AUTH_KEYWORDS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKeywords {
    keywords: Vec<String>,
}

impl AuthKeywords {
    /// Build a matcher. Blank keywords are dropped so they cannot match everything.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True if `text` contains any keyword, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl Default for AuthKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_KEYWORDS)
    }
}
