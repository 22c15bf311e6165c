// Sentiment lexicon: two ordered, disjoint lists of marker substrings.
//
// Order matters: when a word contains several markers from the same list,
// the first marker in list order is the one credited.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::text::tokenizer::normalize;

const DEFAULT_POSITIVE: &[&str] = &[
    "excellent", "great", "good", "satisfied", "happy", "helpful", "friendly",
    "convenient", "recommend", "love", "clean", "fast", "easy",
    "满意", "不错", "方便", "喜欢", "优秀", "干净", "快捷", "推荐", "很好",
];

const DEFAULT_NEGATIVE: &[&str] = &[
    "terrible", "bad", "poor", "slow", "dirty", "rude", "expensive",
    "disappointed", "problem", "complaint", "difficult", "broken",
    "失望", "不满", "太慢", "太贵", "问题", "麻烦", "糟糕", "投诉", "很差", "太差",
];

/// Positive and negative marker lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentLexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive: DEFAULT_POSITIVE.iter().map(|s| s.to_string()).collect(),
            negative: DEFAULT_NEGATIVE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SentimentLexicon {
    /// Build a lexicon from caller-supplied markers.
    ///
    /// Markers are normalized the same way document text is, blanks and
    /// duplicates are dropped (first occurrence kept). A marker present in
    /// both lists is rejected.
    pub fn new<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Result<Self, PipelineError> {
        let positive = clean(positive);
        let negative = clean(negative);

        let shared: Vec<String> = positive
            .iter()
            .filter(|m| negative.contains(m))
            .cloned()
            .collect();
        if !shared.is_empty() {
            return Err(PipelineError::invalid(format!(
                "markers in both positive and negative lexicons: {}",
                shared.join(", ")
            )));
        }

        Ok(Self { positive, negative })
    }

    pub fn positive(&self) -> &[String] {
        &self.positive
    }

    pub fn negative(&self) -> &[String] {
        &self.negative
    }
}

fn clean<S: AsRef<str>>(markers: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(markers.len());
    for m in markers {
        let m = normalize(m.as_ref().trim());
        if !m.is_empty() && !out.contains(&m) {
            out.push(m);
        }
    }
    out
}
