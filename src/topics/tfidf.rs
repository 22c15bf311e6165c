// TF-IDF vectorizer over filtered token lists.
//
// Each document is one row of the document-term matrix. The vocabulary is
// fixed at fit time: the `max_features` most frequent terms across the corpus
// (ties broken alphabetically), renumbered in ascending term order. Words
// that appear in every document get the minimum IDF, words distinctive to a
// few documents get boosted.
//
//   idf(t)   = ln((1 + n_docs) / (1 + df(t))) + 1
//   w(d, t)  = count(d, t) * idf(t), then each row is L2-normalized

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;

/// Vectorizer tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Upper bound on vocabulary size
    pub max_features: usize,
    /// Terms must appear in at least this many documents
    pub min_df: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            min_df: 1,
        }
    }
}

/// Stable mapping from term to feature id. Immutable after fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, usize>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        Self::from_sorted(terms)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

impl Vocabulary {
    fn from_sorted(terms: Vec<String>) -> Self {
        let ids = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, ids }
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: usize) -> Option<&str> {
        self.terms.get(id).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Sparse feature vector: `(feature_id, weight)` pairs in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, w)| *w == 0.0)
    }

    pub fn get(&self, id: usize) -> f64 {
        self.entries
            .binary_search_by_key(&id, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for &(id, w) in &self.entries {
            if id < dim {
                dense[id] = w;
            }
        }
        dense
    }
}

/// Document-term matrix: one sparse row per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermMatrix {
    pub rows: Vec<SparseVector>,
    pub n_features: usize,
}

impl TermMatrix {
    pub fn n_docs(&self) -> usize {
        self.rows.len()
    }
}

/// A fitted TF-IDF vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Build the vocabulary and IDF weights from every document's filtered
    /// tokens.
    ///
    /// Fails with `EmptyVocabulary` if no term survives (every token list
    /// empty, or `min_df` removes everything).
    pub fn fit(docs: &[Vec<String>], config: &VectorizerConfig) -> Result<Self, PipelineError> {
        if config.max_features == 0 {
            return Err(PipelineError::invalid("max_features must be at least 1"));
        }

        // term -> (total count, document frequency)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for tokens in docs {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                let entry = stats.entry(token.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(token.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .filter(|(_, (_, df))| *df >= config.min_df.max(1))
            .map(|(t, (count, df))| (t, count, df))
            .collect();

        if ranked.is_empty() {
            return Err(PipelineError::EmptyVocabulary);
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(config.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        let n_docs = docs.len() as f64;
        let idf = ranked
            .iter()
            .map(|(_, _, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let vocabulary = Vocabulary::from_sorted(ranked.iter().map(|(t, _, _)| t.to_string()).collect());

        info!(
            documents = docs.len(),
            vocabulary = vocabulary.len(),
            max_features = config.max_features,
            "Fitted TF-IDF vocabulary"
        );

        Ok(Self { vocabulary, idf })
    }

    /// Map one token list onto the fixed vocabulary. Out-of-vocabulary tokens
    /// are ignored; a document with none in vocabulary is the zero vector.
    pub fn transform(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(id) = self.vocabulary.id(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf as f64 * self.idf[id]))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseVector { entries }
    }

    /// Transform every document. Rows are independent, so this runs in parallel.
    pub fn transform_all(&self, docs: &[Vec<String>]) -> TermMatrix {
        TermMatrix {
            rows: docs.par_iter().map(|tokens| self.transform(tokens)).collect(),
            n_features: self.vocabulary.len(),
        }
    }

    pub fn fit_transform(
        docs: &[Vec<String>],
        config: &VectorizerConfig,
    ) -> Result<(Self, TermMatrix), PipelineError> {
        let vectorizer = Self::fit(docs, config)?;
        let matrix = vectorizer.transform_all(docs);
        Ok((vectorizer, matrix))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_vocabulary_is_sorted_and_capped() {
        let corpus = docs(&[
            &["staff", "wait", "staff"],
            &["wait", "price"],
            &["staff", "room"],
        ]);
        let config = VectorizerConfig {
            max_features: 2,
            min_df: 1,
        };
        let v = TfIdfVectorizer::fit(&corpus, &config).unwrap();
        // staff (3) and wait (2) are the most frequent; ids in term order
        assert_eq!(v.vocabulary().terms(), &["staff".to_string(), "wait".to_string()]);
        assert_eq!(v.vocabulary().id("wait"), Some(1));
        assert_eq!(v.vocabulary().id("price"), None);
    }

    #[test]
    fn test_frequency_ties_break_alphabetically() {
        let corpus = docs(&[&["zeta", "alpha", "mid"]]);
        let config = VectorizerConfig {
            max_features: 2,
            min_df: 1,
        };
        let v = TfIdfVectorizer::fit(&corpus, &config).unwrap();
        assert_eq!(v.vocabulary().terms(), &["alpha".to_string(), "mid".to_string()]);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let corpus = docs(&[&["good", "staff", "good"], &["bad", "wait"]]);
        let (_, m) = TfIdfVectorizer::fit_transform(&corpus, &VectorizerConfig::default()).unwrap();
        for row in &m.rows {
            let norm: f64 = row.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let corpus = docs(&[&["service", "rude"], &["service", "fast"], &["service", "cheap"]]);
        let (v, m) = TfIdfVectorizer::fit_transform(&corpus, &VectorizerConfig::default()).unwrap();
        let service = v.vocabulary().id("service").unwrap();
        let rude = v.vocabulary().id("rude").unwrap();
        assert!(m.rows[0].get(rude) > m.rows[0].get(service));
    }

    #[test]
    fn test_out_of_vocabulary_is_zero_vector() {
        let corpus = docs(&[&["staff"]]);
        let v = TfIdfVectorizer::fit(&corpus, &VectorizerConfig::default()).unwrap();
        let row = v.transform(&["unknown".to_string()]);
        assert!(row.is_zero());
        assert!(row.entries.is_empty());
    }

    #[test]
    fn test_empty_corpus_fails() {
        let corpus = docs(&[&[], &[]]);
        assert!(matches!(
            TfIdfVectorizer::fit(&corpus, &VectorizerConfig::default()),
            Err(PipelineError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_min_df_can_empty_vocabulary() {
        let corpus = docs(&[&["a1"], &["b2"]]);
        let config = VectorizerConfig {
            max_features: 10,
            min_df: 2,
        };
        assert!(matches!(
            TfIdfVectorizer::fit(&corpus, &config),
            Err(PipelineError::EmptyVocabulary)
        ));
    }
}
