// Column-major export of the augmented corpus.
//
// One column per derived field, one entry per document, in corpus order.
// File writers and spreadsheet exporters consume this as-is.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterResult;
use crate::corpus::{Corpus, FieldValue};
use crate::sentiment::DocumentSentiment;
use crate::topics::DocumentTopics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusTable {
    pub index: Vec<usize>,
    pub text: Vec<String>,
    pub tokens: Vec<Vec<String>>,
    pub filtered_tokens: Vec<Vec<String>>,
    pub topic_weights: Vec<Vec<f64>>,
    pub primary_topic: Vec<usize>,
    pub sentiment_score: Vec<i64>,
    pub positive_count: Vec<usize>,
    pub negative_count: Vec<usize>,
    pub cluster_id: Vec<usize>,
    /// Structured attributes, one column per schema attribute
    pub attributes: IndexMap<String, Vec<FieldValue>>,
}

impl CorpusTable {
    pub fn build(
        corpus: &Corpus,
        tokens: &[Vec<String>],
        filtered_tokens: &[Vec<String>],
        topics: &DocumentTopics,
        sentiments: &[DocumentSentiment],
        clusters: &ClusterResult,
    ) -> Self {
        let mut attributes: IndexMap<String, Vec<FieldValue>> = corpus
            .schema
            .attribute_fields
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(corpus.len())))
            .collect();
        for doc in &corpus.documents {
            for (name, column) in attributes.iter_mut() {
                column.push(doc.attributes.get(name).cloned().unwrap_or(FieldValue::Null));
            }
        }

        Self {
            index: corpus.documents.iter().map(|d| d.index).collect(),
            text: corpus.documents.iter().map(|d| d.text.clone()).collect(),
            tokens: tokens.to_vec(),
            filtered_tokens: filtered_tokens.to_vec(),
            topic_weights: topics.to_rows(),
            primary_topic: topics.primary_topics(),
            sentiment_score: sentiments.iter().map(|s| s.score).collect(),
            positive_count: sentiments.iter().map(|s| s.positive).collect(),
            negative_count: sentiments.iter().map(|s| s.negative).collect(),
            cluster_id: clusters.labels.clone(),
            attributes,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }
}
