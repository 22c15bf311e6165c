// Lexicon sentiment scorer.
//
// Matching runs on the normalized raw text, never on segmenter tokens, so
// single characters and punctuated markers ("well-run") are still found.
//
//   PerWord    split the text into words at whitespace and sentence
//              punctuation; a word credits at most one marker per list, the
//              first (in lexicon order) it contains. Repeated words count every
//              time: "good service good staff" -> +2. Markers that span several
//              words ("not good") are counted per occurrence in the text.
//   PerMarker  each distinct marker found anywhere in the text is credited
//              once: "good service good staff" -> +1.
//
// score = positive - negative. Corpus polarity is
//   (sum positive - sum negative) / (sum positive + sum negative), 0 if no hits.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::lexicon::SentimentLexicon;
use crate::text::tokenizer::normalize;

/// How marker matches are counted within one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountingRule {
    #[default]
    PerWord,
    PerMarker,
}

impl FromStr for CountingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-word" | "word" => Ok(CountingRule::PerWord),
            "per-marker" | "marker" => Ok(CountingRule::PerMarker),
            other => Err(format!(
                "unknown counting rule '{other}' (expected per-word or per-marker)"
            )),
        }
    }
}

/// Sentiment stage tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub counting: CountingRule,
    /// Markers kept in each top-marker ranking
    pub top_markers: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            counting: CountingRule::PerWord,
            top_markers: 10,
        }
    }
}

/// Marker matches for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSentiment {
    pub positive: usize,
    pub negative: usize,
    /// positive - negative
    pub score: i64,
    /// Credited positive markers, in scan order, with repetition
    pub positive_markers: Vec<String>,
    /// Credited negative markers, in scan order, with repetition
    pub negative_markers: Vec<String>,
}

/// Corpus-wide sentiment aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Total positive marker matches across the corpus
    pub positive_count: usize,
    /// Total negative marker matches across the corpus
    pub negative_count: usize,
    /// Documents whose score is exactly 0
    pub neutral_count: usize,
    /// Documents with a score above 0
    pub positive_documents: usize,
    /// Documents with a score below 0
    pub negative_documents: usize,
    /// In [-1, 1]; 0 when no marker matched anywhere
    pub polarity_score: f64,
    pub top_positive: Vec<(String, usize)>,
    pub top_negative: Vec<(String, usize)>,
}

/// Scores documents against a lexicon.
#[derive(Debug, Clone, Default)]
pub struct SentimentScorer {
    lexicon: SentimentLexicon,
    rule: CountingRule,
}

impl SentimentScorer {
    pub fn new(lexicon: SentimentLexicon, rule: CountingRule) -> Self {
        Self { lexicon, rule }
    }

    pub fn rule(&self) -> CountingRule {
        self.rule
    }

    pub fn lexicon(&self) -> &SentimentLexicon {
        &self.lexicon
    }

    /// Score one document's raw text.
    pub fn score_document(&self, text: &str) -> DocumentSentiment {
        let text = normalize(text);
        let (positive_markers, negative_markers) = match self.rule {
            CountingRule::PerWord => {
                let words: Vec<&str> = text
                    .split(is_word_break)
                    .filter(|w| !w.is_empty())
                    .collect();
                let joined = words.join(" ");
                (
                    scan_words(&words, &joined, self.lexicon.positive()),
                    scan_words(&words, &joined, self.lexicon.negative()),
                )
            }
            CountingRule::PerMarker => (
                scan_text(&text, self.lexicon.positive()),
                scan_text(&text, self.lexicon.negative()),
            ),
        };

        let positive = positive_markers.len();
        let negative = negative_markers.len();
        DocumentSentiment {
            positive,
            negative,
            score: positive as i64 - negative as i64,
            positive_markers,
            negative_markers,
        }
    }

    /// Aggregate per-document results. `top_k` bounds the marker rankings;
    /// equal counts keep the order in which markers were first seen.
    pub fn summarize(&self, documents: &[DocumentSentiment], top_k: usize) -> SentimentSummary {
        let positive_count: usize = documents.iter().map(|d| d.positive).sum();
        let negative_count: usize = documents.iter().map(|d| d.negative).sum();

        SentimentSummary {
            positive_count,
            negative_count,
            neutral_count: documents.iter().filter(|d| d.score == 0).count(),
            positive_documents: documents.iter().filter(|d| d.score > 0).count(),
            negative_documents: documents.iter().filter(|d| d.score < 0).count(),
            polarity_score: polarity(positive_count, negative_count),
            top_positive: top_markers(documents.iter().map(|d| &d.positive_markers), top_k),
            top_negative: top_markers(documents.iter().map(|d| &d.negative_markers), top_k),
        }
    }
}

/// `(pos - neg) / (pos + neg)`, or 0 when nothing matched.
pub fn polarity(positive: usize, negative: usize) -> f64 {
    let total = positive + negative;
    if total == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / total as f64
    }
}

/// Whitespace, ASCII punctuation other than `-` and `'`, and CJK punctuation.
/// Full-width punctuation is already folded to ASCII by `normalize`.
fn is_word_break(c: char) -> bool {
    c.is_whitespace()
        || (c.is_ascii_punctuation() && c != '-' && c != '\'')
        || ('\u{3001}'..='\u{303F}').contains(&c)
}

fn scan_words(words: &[&str], joined: &str, markers: &[String]) -> Vec<String> {
    let (phrases, singles): (Vec<&String>, Vec<&String>) =
        markers.iter().partition(|m| m.chars().any(is_word_break));

    let mut found: Vec<String> = words
        .iter()
        .filter_map(|word| singles.iter().find(|m| word.contains(m.as_str())))
        .map(|m| m.to_string())
        .collect();
    for phrase in phrases {
        let hits = joined.matches(phrase.as_str()).count();
        found.extend(std::iter::repeat(phrase.clone()).take(hits));
    }
    found
}

fn scan_text(text: &str, markers: &[String]) -> Vec<String> {
    markers
        .iter()
        .filter(|m| text.contains(m.as_str()))
        .cloned()
        .collect()
}

fn top_markers<'a>(
    per_document: impl Iterator<Item = &'a Vec<String>>,
    top_k: usize,
) -> Vec<(String, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for markers in per_document {
        for m in markers {
            *counts.entry(m.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(m, c)| (m.to_string(), c))
        .collect();
    // Stable sort keeps first-seen order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer(rule: CountingRule) -> SentimentScorer {
        let lexicon = SentimentLexicon::new(&["good"], &["bad"]).unwrap();
        SentimentScorer::new(lexicon, rule)
    }

    #[test]
    fn test_per_word_counts_occurrences() {
        let s = scorer(CountingRule::PerWord);
        let text = "good service good staff";
        let result = s.score_document(text);
        assert_eq!(result.positive, 2);
        assert_eq!(result.score, 2);
    }

    #[test]
    fn test_per_marker_counts_once() {
        let s = scorer(CountingRule::PerMarker);
        let text = "good service good staff";
        let result = s.score_document(text);
        assert_eq!(result.positive, 1);
        assert_eq!(result.score, 1);
    }

    #[test]
    fn test_first_marker_wins_within_a_word() {
        let lexicon = SentimentLexicon::new(&["great", "eat"], &["never"]).unwrap();
        let s = SentimentScorer::new(lexicon, CountingRule::PerWord);
        let result = s.score_document("greatest");
        assert_eq!(result.positive_markers, vec!["great".to_string()]);
    }

    #[test]
    fn test_word_matches_both_lists_independently() {
        let lexicon = SentimentLexicon::new(&["满意"], &["不满"]).unwrap();
        let s = SentimentScorer::new(lexicon, CountingRule::PerWord);
        let result = s.score_document("不满意");
        assert_eq!((result.positive, result.negative, result.score), (1, 1, 0));
    }

    #[test]
    fn test_single_character_marker_before_punctuation() {
        let lexicon = SentimentLexicon::new(&["好"], &["差"]).unwrap();
        let s = SentimentScorer::new(lexicon, CountingRule::PerWord);
        assert_eq!(s.score_document("差！").negative, 1);
        assert_eq!(s.score_document("服务 差。环境 差").negative, 2);
    }

    #[test]
    fn test_phrase_markers_count_each_occurrence() {
        let lexicon = SentimentLexicon::new(&["well-run"], &["not good", "bad"]).unwrap();
        let s = SentimentScorer::new(lexicon, CountingRule::PerWord);
        let result =
            s.score_document("The clinic is well-run, but the food was NOT  good. Not good!");
        assert_eq!(result.positive_markers, vec!["well-run".to_string()]);
        assert_eq!(result.negative_markers, vec!["not good".to_string(); 2]);
        assert_eq!(result.score, -1);
    }

    #[test]
    fn test_polarity_bounds() {
        assert_eq!(polarity(0, 0), 0.0);
        assert_eq!(polarity(3, 0), 1.0);
        assert_eq!(polarity(0, 2), -1.0);
        assert!((polarity(3, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_top_markers_tie_keeps_first_seen() {
        let lexicon = SentimentLexicon::new(&["tasty", "cheap", "quick"], &["x1"]).unwrap();
        let s = SentimentScorer::new(lexicon, CountingRule::PerWord);
        let docs = vec![
            s.score_document("quick tasty"),
            s.score_document("cheap tasty"),
            s.score_document("cheap"),
        ];
        let summary = s.summarize(&docs, 2);
        assert_eq!(
            summary.top_positive,
            vec![("tasty".to_string(), 2), ("cheap".to_string(), 2)]
        );
        assert_eq!(summary.neutral_count, 0);
    }

    #[test]
    fn test_counting_rule_parse() {
        assert_eq!("per-word".parse::<CountingRule>(), Ok(CountingRule::PerWord));
        assert_eq!("PER-MARKER".parse::<CountingRule>(), Ok(CountingRule::PerMarker));
        assert!("sometimes".parse::<CountingRule>().is_err());
    }
}
