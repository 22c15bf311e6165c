// Survey analysis pipeline: corpus -> tokens -> topics -> sentiment -> clusters.
//
// Stages run strictly in this order, each consuming the full output of the
// previous one and returning a new structure (documents are never mutated):
// 1. Tokenize every document (parallel per document)
// 2. Drop stopwords
// 3. Fit the TF-IDF vocabulary and build the document-term matrix
// 4. Fit the topic model and read off per-document topic weights
// 5. Score sentiment against the lexicon
// 6. Build cluster features and run k-means
// 7. Aggregate everything into the report
//
// Parameters that can be checked without touching the data are checked
// before step 1.

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cluster::{ClusterConfig, ClusterFeatures, ClusterResult, KMeans};
use crate::config::AnalysisConfig;
use crate::corpus::{Corpus, Record, Schema};
use crate::error::{PipelineError, Warning};
use crate::report::{AnalysisReport, CorpusTable, ReportInputs, ReportSynthesizer, RunSettings};
use crate::sentiment::{DocumentSentiment, SentimentConfig, SentimentScorer};
use crate::text::{StopwordFilter, Tokenizer};
use crate::topics::{
    DocumentTopics, TermMatrix, TfIdfVectorizer, TopicConfig, TopicModel, VectorizerConfig,
};

/// Every intermediate and final product of one run.
pub struct AnalysisOutput {
    pub tokens: Vec<Vec<String>>,
    pub filtered_tokens: Vec<Vec<String>>,
    pub vectorizer: TfIdfVectorizer,
    pub term_matrix: TermMatrix,
    pub topic_model: TopicModel,
    pub document_topics: DocumentTopics,
    pub primary_topics: Vec<usize>,
    pub sentiments: Vec<DocumentSentiment>,
    pub features: ClusterFeatures,
    pub clusters: ClusterResult,
    pub report: AnalysisReport,
}

impl AnalysisOutput {
    /// The augmented corpus, one column per derived field.
    pub fn corpus_table(&self, corpus: &Corpus) -> CorpusTable {
        CorpusTable::build(
            corpus,
            &self.tokens,
            &self.filtered_tokens,
            &self.document_topics,
            &self.sentiments,
            &self.clusters,
        )
    }
}

/// The configured pipeline. Holds stage collaborators and tunables only; no
/// state survives between runs.
pub struct Analysis {
    tokenizer: Tokenizer,
    stopwords: StopwordFilter,
    scorer: SentimentScorer,
    vectorizer: VectorizerConfig,
    topics: TopicConfig,
    clusters: ClusterConfig,
    sentiment: SentimentConfig,
    show_progress: bool,
}

impl Analysis {
    /// Pipeline with the default tokenizer, stopwords and lexicon, and the
    /// stage tunables from `config`.
    ///
    /// The word-list files named in `config` are not read here; use
    /// [`AnalysisConfig::build_analysis`] to load them, or pass the lists in
    /// through `with_stopwords` and `with_scorer`.
    pub fn new(config: &AnalysisConfig) -> Self {
        if config.has_word_list_overrides() {
            warn!(
                "Word-list files are configured but ignored; \
                 use AnalysisConfig::build_analysis to load them"
            );
        }
        Self {
            tokenizer: Tokenizer::default(),
            stopwords: StopwordFilter::default(),
            scorer: SentimentScorer::new(Default::default(), config.sentiment.counting),
            vectorizer: config.vectorizer.clone(),
            topics: config.topics.clone(),
            clusters: config.clusters.clone(),
            sentiment: config.sentiment.clone(),
            show_progress: false,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_stopwords(mut self, stopwords: StopwordFilter) -> Self {
        self.stopwords = stopwords;
        self
    }

    pub fn with_scorer(mut self, scorer: SentimentScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Validate `records` against `schema`, build the corpus and run it.
    /// Schema warnings end up in the report.
    pub fn run_records(
        &self,
        schema: Schema,
        records: &[Record],
    ) -> Result<(Corpus, AnalysisOutput), PipelineError> {
        let (corpus, warnings) = Corpus::from_records(schema, records)?;
        for w in &warnings {
            warn!(warning = %w, "Input shape");
        }
        let output = self.execute(&corpus, warnings)?;
        Ok((corpus, output))
    }

    /// Run every stage over an already-built corpus.
    pub fn run(&self, corpus: &Corpus) -> Result<AnalysisOutput, PipelineError> {
        self.execute(corpus, Vec::new())
    }

    /// Checks that need no data beyond the document count.
    pub fn validate(&self, n_docs: usize) -> Result<(), PipelineError> {
        if self.vectorizer.max_features == 0 {
            return Err(PipelineError::invalid("max_features must be at least 1"));
        }
        self.topics.validate(self.vectorizer.max_features)?;
        self.clusters.validate(n_docs)?;
        let w = self.clusters.attribute_weight;
        if !w.is_finite() || w < 0.0 {
            return Err(PipelineError::invalid(format!(
                "attribute weight must be a non-negative number, got {w}"
            )));
        }
        Ok(())
    }

    fn execute(
        &self,
        corpus: &Corpus,
        warnings: Vec<Warning>,
    ) -> Result<AnalysisOutput, PipelineError> {
        self.validate(corpus.len())?;
        info!(
            documents = corpus.len(),
            segmenter = self.tokenizer.segmenter_name(),
            "Starting analysis"
        );

        let tokens = self.tokenize(corpus)?;
        let filtered_tokens = self.filter(&tokens);

        let (vectorizer, term_matrix) =
            TfIdfVectorizer::fit_transform(&filtered_tokens, &self.vectorizer)?;
        let (topic_model, document_topics) =
            TopicModel::fit(&term_matrix, vectorizer.vocabulary(), &self.topics)?;
        let primary_topics = document_topics.primary_topics();

        let sentiments = self.score_sentiment(corpus);
        let sentiment_summary = self.scorer.summarize(&sentiments, self.sentiment.top_markers);
        info!(
            positive = sentiment_summary.positive_count,
            negative = sentiment_summary.negative_count,
            polarity = sentiment_summary.polarity_score,
            "Scored sentiment"
        );

        let features = ClusterFeatures::fused(
            &document_topics,
            corpus,
            &corpus.schema.attribute_fields,
            self.clusters.attribute_weight,
        );
        let clusters = KMeans::new(self.clusters.clone()).fit(&features.rows)?;

        let synthesizer = ReportSynthesizer {
            attributes: corpus.schema.attribute_fields.clone(),
            top_keywords: self.topics.top_n,
            top_features: self.clusters.top_features,
        };
        let report = synthesizer.synthesize(ReportInputs {
            corpus,
            vocabulary_size: vectorizer.vocabulary().len(),
            topic_model: &topic_model,
            primary_topics: &primary_topics,
            sentiments: &sentiments,
            sentiment_summary,
            clusters: &clusters,
            feature_names: &features.names,
            settings: RunSettings {
                n_topics: self.topics.n_topics,
                n_clusters: self.clusters.n_clusters,
                seed: self.topics.seed,
                max_features: self.vectorizer.max_features,
                attribute_weight: self.clusters.attribute_weight,
                counting: self.scorer.rule(),
            },
            warnings,
            generated_at: Utc::now(),
        });

        info!(
            topics = report.topics.len(),
            clusters = report.clusters.len(),
            warnings = report.warnings.len(),
            "Analysis complete"
        );

        Ok(AnalysisOutput {
            tokens,
            filtered_tokens,
            vectorizer,
            term_matrix,
            topic_model,
            document_topics,
            primary_topics,
            sentiments,
            features,
            clusters,
            report,
        })
    }

    /// Tokenize every document. A segmenter failure aborts the stage.
    pub fn tokenize(&self, corpus: &Corpus) -> Result<Vec<Vec<String>>, PipelineError> {
        let pb = self.progress_bar(corpus.len(), "Tokenizing");
        let tokens = corpus
            .documents
            .par_iter()
            .map(|doc| {
                let result = self.tokenizer.tokenize(&doc.text);
                pb.inc(1);
                result
            })
            .collect::<Result<Vec<_>, _>>();
        pb.finish_and_clear();

        let tokens = tokens?;
        info!(
            documents = tokens.len(),
            tokens = tokens.iter().map(Vec::len).sum::<usize>(),
            "Tokenized corpus"
        );
        Ok(tokens)
    }

    pub fn filter(&self, tokens: &[Vec<String>]) -> Vec<Vec<String>> {
        tokens.par_iter().map(|t| self.stopwords.filter(t)).collect()
    }

    pub fn score_sentiment(&self, corpus: &Corpus) -> Vec<DocumentSentiment> {
        corpus
            .documents
            .par_iter()
            .map(|doc| self.scorer.score_document(&doc.text))
            .collect()
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))
        {
            pb.set_style(style);
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(topics: usize, clusters: usize) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.topics.n_topics = topics;
        config.clusters.n_clusters = clusters;
        config
    }

    #[test]
    fn test_fails_fast_on_too_many_clusters() {
        let corpus = Corpus::from_texts(&["good", "bad", "fine"]);
        let err = Analysis::new(&config(2, 5)).run(&corpus).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    #[test]
    fn test_zero_topics_rejected() {
        let analysis = Analysis::new(&config(0, 1));
        assert!(matches!(
            analysis.validate(3),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_empty_vocabulary_propagates() {
        let corpus = Corpus::from_texts(&["the and of", "a an", "!!!"]);
        let err = Analysis::new(&config(1, 1)).run(&corpus).err().unwrap();
        assert!(matches!(err, PipelineError::EmptyVocabulary));
    }
}
