// Report synthesis: per-cluster and per-topic summary records.
//
// Pure aggregation over the outputs of the earlier stages. Nothing here is
// random and nothing is recomputed; the synthesizer only counts, averages
// and ranks what it is handed.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cluster::ClusterResult;
use crate::corpus::Corpus;
use crate::error::Warning;
use crate::sentiment::{CountingRule, DocumentSentiment, SentimentSummary};
use crate::topics::TopicModel;

/// Topics that are primary for fewer than this share of documents get a
/// `NegligibleTopic` warning.
pub const NEGLIGIBLE_PREVALENCE: f64 = 0.01;

/// Summary of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub size: usize,
    /// Share of the corpus, 0-100
    pub percentage: f64,
    /// Most common primary topic among members; `None` for an empty cluster
    pub dominant_topic_id: Option<usize>,
    /// Mean of each requested numeric attribute over members that have it
    pub attribute_means: IndexMap<String, f64>,
    /// Mean document sentiment score of the members
    pub mean_sentiment: f64,
    /// Strongest centroid features, by name
    pub top_features: Vec<(String, f64)>,
}

/// Summary of one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic_id: usize,
    pub keywords: Vec<String>,
    /// Normalized in-topic weight of each keyword, same order as `keywords`
    pub keyword_weights: Vec<f64>,
    /// Fraction of documents whose primary topic is this one
    pub prevalence: f64,
}

/// Settings echoed into the report so a reader can reproduce the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    pub n_topics: usize,
    pub n_clusters: usize,
    pub seed: u64,
    pub max_features: usize,
    pub attribute_weight: f64,
    pub counting: CountingRule,
}

/// The structured record tree handed to rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub documents: usize,
    pub vocabulary_size: usize,
    pub settings: RunSettings,
    pub topics: Vec<TopicSummary>,
    pub clusters: Vec<ClusterSummary>,
    pub sentiment: SentimentSummary,
    /// Within-cluster sum of squares of the chosen clustering
    pub inertia: f64,
    pub warnings: Vec<Warning>,
}

/// Everything the synthesizer aggregates, borrowed from the stage outputs.
pub struct ReportInputs<'a> {
    pub corpus: &'a Corpus,
    pub vocabulary_size: usize,
    pub topic_model: &'a TopicModel,
    pub primary_topics: &'a [usize],
    pub sentiments: &'a [DocumentSentiment],
    pub sentiment_summary: SentimentSummary,
    pub clusters: &'a ClusterResult,
    pub feature_names: &'a [String],
    pub settings: RunSettings,
    /// Warnings raised by earlier stages
    pub warnings: Vec<Warning>,
    pub generated_at: DateTime<Utc>,
}

/// Builds `AnalysisReport`s.
#[derive(Debug, Clone)]
pub struct ReportSynthesizer {
    /// Attributes whose per-cluster means are reported
    pub attributes: Vec<String>,
    pub top_keywords: usize,
    pub top_features: usize,
}

impl Default for ReportSynthesizer {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            top_keywords: 10,
            top_features: 3,
        }
    }
}

impl ReportSynthesizer {
    pub fn synthesize(&self, inputs: ReportInputs<'_>) -> AnalysisReport {
        let (topics, topic_warnings) = self.topic_summaries(inputs.topic_model, inputs.primary_topics);
        let clusters = self.cluster_summaries(
            inputs.corpus,
            inputs.primary_topics,
            inputs.sentiments,
            inputs.clusters,
            inputs.feature_names,
        );

        let mut warnings = inputs.warnings;
        warnings.extend(inputs.clusters.warnings.iter().cloned());
        warnings.extend(topic_warnings);

        AnalysisReport {
            generated_at: inputs.generated_at,
            documents: inputs.corpus.len(),
            vocabulary_size: inputs.vocabulary_size,
            settings: inputs.settings,
            topics,
            clusters,
            sentiment: inputs.sentiment_summary,
            inertia: inputs.clusters.inertia,
            warnings,
        }
    }

    /// Keywords and prevalence for every topic, plus a warning for each topic
    /// below `NEGLIGIBLE_PREVALENCE`.
    pub fn topic_summaries(
        &self,
        model: &TopicModel,
        primary_topics: &[usize],
    ) -> (Vec<TopicSummary>, Vec<Warning>) {
        let n_docs = primary_topics.len();
        let mut counts = vec![0usize; model.n_topics()];
        for &t in primary_topics {
            if let Some(c) = counts.get_mut(t) {
                *c += 1;
            }
        }

        let mut warnings = Vec::new();
        let summaries = counts
            .iter()
            .enumerate()
            .map(|(topic_id, &count)| {
                let prevalence = if n_docs == 0 {
                    0.0
                } else {
                    count as f64 / n_docs as f64
                };
                if n_docs > 0 && prevalence < NEGLIGIBLE_PREVALENCE {
                    let w = Warning::NegligibleTopic {
                        topic_id,
                        prevalence,
                    };
                    warn!(warning = %w, "Degenerate topic");
                    warnings.push(w);
                }

                let keywords = model.top_keywords(topic_id, self.top_keywords);
                TopicSummary {
                    topic_id,
                    keyword_weights: keywords.iter().map(|k| k.weight).collect(),
                    keywords: keywords.into_iter().map(|k| k.term).collect(),
                    prevalence,
                }
            })
            .collect();

        (summaries, warnings)
    }

    /// One summary per cluster id, including empty clusters.
    pub fn cluster_summaries(
        &self,
        corpus: &Corpus,
        primary_topics: &[usize],
        sentiments: &[DocumentSentiment],
        clusters: &ClusterResult,
        feature_names: &[String],
    ) -> Vec<ClusterSummary> {
        let n_docs = clusters.labels.len();

        (0..clusters.n_clusters())
            .map(|cluster_id| {
                let members: Vec<usize> = clusters
                    .labels
                    .iter()
                    .enumerate()
                    .filter(|(_, &l)| l == cluster_id)
                    .map(|(i, _)| i)
                    .collect();
                let size = members.len();

                let percentage = if n_docs == 0 {
                    0.0
                } else {
                    size as f64 / n_docs as f64 * 100.0
                };

                let dominant_topic_id =
                    mode(members.iter().filter_map(|&i| primary_topics.get(i).copied()));

                let mut attribute_means = IndexMap::new();
                for name in &self.attributes {
                    let values: Vec<f64> = members
                        .iter()
                        .filter_map(|&i| corpus.documents.get(i).and_then(|d| d.attribute(name)))
                        .collect();
                    if !values.is_empty() {
                        attribute_means.insert(name.clone(), mean(&values));
                    }
                }

                let scores: Vec<f64> = members
                    .iter()
                    .filter_map(|&i| sentiments.get(i).map(|s| s.score as f64))
                    .collect();

                ClusterSummary {
                    cluster_id,
                    size,
                    percentage,
                    dominant_topic_id,
                    attribute_means,
                    mean_sentiment: if scores.is_empty() { 0.0 } else { mean(&scores) },
                    top_features: clusters.strongest_features(
                        cluster_id,
                        feature_names,
                        self.top_features,
                    ),
                }
            })
            .collect()
    }
}

/// Most frequent value; the smallest value wins ties.
fn mode(values: impl Iterator<Item = usize>) -> Option<usize> {
    let mut counts: std::collections::BTreeMap<usize, usize> = std::collections::BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    // BTreeMap iterates in ascending key order, so the first maximum is the lowest id
    let mut best: Option<(usize, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_breaks_ties_low() {
        assert_eq!(mode([2, 1, 2, 1].into_iter()), Some(1));
        assert_eq!(mode([3, 3, 0].into_iter()), Some(3));
        assert_eq!(mode(std::iter::empty()), None);
    }

    fn fitted_model(n_topics: usize) -> TopicModel {
        use crate::topics::{TfIdfVectorizer, TopicConfig, VectorizerConfig};

        let docs: Vec<Vec<String>> = [
            "nurse friendly helpful",
            "parking fee expensive",
            "queue registration long",
            "nurse helpful night",
        ]
        .iter()
        .map(|d| d.split_whitespace().map(str::to_string).collect())
        .collect();
        let (vectorizer, matrix) =
            TfIdfVectorizer::fit_transform(&docs, &VectorizerConfig::default()).unwrap();
        let (model, _) =
            TopicModel::fit(&matrix, vectorizer.vocabulary(), &TopicConfig::new(n_topics)).unwrap();
        model
    }

    #[test]
    fn test_topic_without_primary_documents_is_negligible() {
        let synthesizer = ReportSynthesizer::default();
        let (summaries, warnings) = synthesizer.topic_summaries(&fitted_model(3), &[0, 1, 0, 1]);

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].prevalence, 0.0);
        assert!((summaries[0].prevalence - 0.5).abs() < 1e-12);
        assert_eq!(
            warnings,
            vec![Warning::NegligibleTopic {
                topic_id: 2,
                prevalence: 0.0,
            }]
        );
    }

    #[test]
    fn test_no_documents_means_no_topic_warnings() {
        let synthesizer = ReportSynthesizer::default();
        let (summaries, warnings) = synthesizer.topic_summaries(&fitted_model(2), &[]);
        assert!(summaries.iter().all(|t| t.prevalence == 0.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 6.0]) - 3.0).abs() < 1e-12);
    }
}
