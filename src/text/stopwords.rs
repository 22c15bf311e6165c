// Stopword filtering.
//
// The built-in list is the English + Chinese lists from the `stop-words`
// crate plus a few survey fillers. Callers can replace or extend it.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

/// Answers that carry no content but show up constantly in survey exports.
const SURVEY_FILLERS: &[&str] = &["na", "n/a", "none", "nothing", "无", "没有", "暂无"];

/// Removes tokens that appear verbatim in a stopword set.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: HashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        let mut words: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        words.extend(get(LANGUAGE::Chinese));
        words.extend(SURVEY_FILLERS.iter().map(|w| w.to_string()));
        Self { words }
    }
}

impl StopwordFilter {
    /// A filter using exactly the given words (no built-ins).
    pub fn from_words<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty filter that keeps every token.
    pub fn none() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    pub fn extend<S: Into<String>>(&mut self, words: impl IntoIterator<Item = S>) {
        self.words.extend(words.into_iter().map(Into::into));
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The subsequence of `tokens` not in the stopword set, order preserved.
    pub fn filter(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .filter(|t| !self.words.contains(t.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_filter_preserves_order() {
        let filter = StopwordFilter::from_words(["the", "was"]);
        let input = toks(&["the", "wait", "was", "long", "the"]);
        assert_eq!(filter.filter(&input), toks(&["wait", "long"]));
        // Input untouched
        assert_eq!(input.len(), 5);
    }

    #[test]
    fn test_default_has_english_and_fillers() {
        let filter = StopwordFilter::default();
        assert!(filter.contains("the"));
        assert!(filter.contains("nothing"));
        assert!(!filter.contains("staff"));
    }

    #[test]
    fn test_verbatim_match_only() {
        let filter = StopwordFilter::from_words(["the"]);
        assert_eq!(filter.filter(&toks(&["The", "theme"])), toks(&["The", "theme"]));
    }
}
