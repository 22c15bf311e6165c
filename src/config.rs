use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::cluster::ClusterConfig;
use crate::pipeline::Analysis;
use crate::sentiment::{CountingRule, SentimentConfig, SentimentLexicon, SentimentScorer};
use crate::text::StopwordFilter;
use crate::topics::{TopicConfig, VectorizerConfig};

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy; CLI flags override
/// whatever is read here. Each stage gets its own config struct.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub vectorizer: VectorizerConfig,
    pub topics: TopicConfig,
    pub clusters: ClusterConfig,
    pub sentiment: SentimentConfig,
    /// One token per line; replaces the built-in stopword list
    pub stopwords_path: Option<PathBuf>,
    /// One marker per line; replaces the built-in positive markers
    pub positive_lexicon_path: Option<PathBuf>,
    /// One marker per line; replaces the built-in negative markers
    pub negative_lexicon_path: Option<PathBuf>,
    pub show_progress: bool,
}

impl AnalysisConfig {
    /// Load configuration from `CANVASS_*` environment variables.
    ///
    /// Unset variables keep their defaults. A set but malformed value is an
    /// error naming the variable.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `load`, reading from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            show_progress: true,
            ..Default::default()
        };

        let seed = parse_var(&lookup, "CANVASS_SEED")?.unwrap_or(config.topics.seed);

        if let Some(n) = parse_var(&lookup, "CANVASS_TOPICS")? {
            config.topics.n_topics = n;
        }
        if let Some(n) = parse_var(&lookup, "CANVASS_LDA_ITERATIONS")? {
            config.topics.max_iter = n;
        }
        if let Some(n) = parse_var(&lookup, "CANVASS_TOP_KEYWORDS")? {
            config.topics.top_n = n;
        }
        config.topics.seed = seed;

        if let Some(n) = parse_var(&lookup, "CANVASS_MAX_FEATURES")? {
            config.vectorizer.max_features = n;
        }
        if let Some(n) = parse_var(&lookup, "CANVASS_MIN_DF")? {
            config.vectorizer.min_df = n;
        }

        if let Some(n) = parse_var(&lookup, "CANVASS_CLUSTERS")? {
            config.clusters.n_clusters = n;
        }
        if let Some(n) = parse_var(&lookup, "CANVASS_KMEANS_ITERATIONS")? {
            config.clusters.max_iter = n;
        }
        if let Some(n) = parse_var(&lookup, "CANVASS_KMEANS_RUNS")? {
            config.clusters.n_init = n;
        }
        if let Some(w) = parse_var(&lookup, "CANVASS_ATTRIBUTE_WEIGHT")? {
            config.clusters.attribute_weight = w;
        }
        config.clusters.seed = seed;

        if let Some(n) = parse_var(&lookup, "CANVASS_TOP_MARKERS")? {
            config.sentiment.top_markers = n;
        }
        if let Some(rule) = lookup("CANVASS_COUNTING") {
            config.sentiment.counting = rule
                .parse::<CountingRule>()
                .map_err(|e| anyhow::anyhow!("CANVASS_COUNTING: {e}"))?;
        }

        config.stopwords_path = lookup("CANVASS_STOPWORDS").map(PathBuf::from);
        config.positive_lexicon_path = lookup("CANVASS_POSITIVE_LEXICON").map(PathBuf::from);
        config.negative_lexicon_path = lookup("CANVASS_NEGATIVE_LEXICON").map(PathBuf::from);

        Ok(config)
    }

    /// Apply one seed to every randomized stage.
    pub fn set_seed(&mut self, seed: u64) {
        self.topics.seed = seed;
        self.clusters.seed = seed;
    }

    /// The stopword filter: the override file if configured, else built-ins.
    pub fn stopword_filter(&self) -> Result<StopwordFilter> {
        match &self.stopwords_path {
            Some(path) => Ok(StopwordFilter::from_words(read_word_list(path)?)),
            None => Ok(StopwordFilter::default()),
        }
    }

    /// The sentiment lexicon, with either list replaced by its override file.
    pub fn lexicon(&self) -> Result<SentimentLexicon> {
        let defaults = SentimentLexicon::default();
        let positive = match &self.positive_lexicon_path {
            Some(path) => read_word_list(path)?,
            None => defaults.positive().to_vec(),
        };
        let negative = match &self.negative_lexicon_path {
            Some(path) => read_word_list(path)?,
            None => defaults.negative().to_vec(),
        };
        Ok(SentimentLexicon::new(&positive, &negative)?)
    }

    pub fn scorer(&self) -> Result<SentimentScorer> {
        Ok(SentimentScorer::new(self.lexicon()?, self.sentiment.counting))
    }

    /// True when any stopword or lexicon override file is set.
    pub fn has_word_list_overrides(&self) -> bool {
        self.stopwords_path.is_some()
            || self.positive_lexicon_path.is_some()
            || self.negative_lexicon_path.is_some()
    }

    /// Build the pipeline with every configured collaborator loaded.
    pub fn build_analysis(&self) -> Result<Analysis> {
        let tunables = AnalysisConfig {
            stopwords_path: None,
            positive_lexicon_path: None,
            negative_lexicon_path: None,
            ..self.clone()
        };
        Ok(Analysis::new(&tunables)
            .with_stopwords(self.stopword_filter()?)
            .with_scorer(self.scorer()?)
            .show_progress(self.show_progress))
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is not valid: {e}")),
        _ => Ok(None),
    }
}

/// One entry per non-blank line; lines starting with `#` are comments.
fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read word list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AnalysisConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.topics.n_topics, 5);
        assert_eq!(config.clusters.n_clusters, 4);
        assert_eq!(config.vectorizer.max_features, 1000);
        assert_eq!(config.topics.seed, 42);
        assert_eq!(config.sentiment.counting, CountingRule::PerWord);
        assert!(config.show_progress);
    }

    #[test]
    fn test_overrides_and_shared_seed() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("CANVASS_TOPICS", "3"),
            ("CANVASS_CLUSTERS", " 2 "),
            ("CANVASS_SEED", "7"),
            ("CANVASS_ATTRIBUTE_WEIGHT", "0.5"),
            ("CANVASS_COUNTING", "per-marker"),
        ]))
        .unwrap();
        assert_eq!(config.topics.n_topics, 3);
        assert_eq!(config.clusters.n_clusters, 2);
        assert_eq!(config.topics.seed, 7);
        assert_eq!(config.clusters.seed, 7);
        assert!((config.clusters.attribute_weight - 0.5).abs() < 1e-12);
        assert_eq!(config.sentiment.counting, CountingRule::PerMarker);
    }

    #[test]
    fn test_malformed_value_names_variable() {
        let err = AnalysisConfig::from_lookup(lookup(&[("CANVASS_TOPICS", "five")])).unwrap_err();
        assert!(err.to_string().contains("CANVASS_TOPICS"));
    }

    #[test]
    fn test_build_analysis_loads_word_lists() {
        let dir = env::temp_dir().join(format!("canvass-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let positive = dir.join("positive.txt");
        let stopwords = dir.join("stopwords.txt");
        std::fs::write(&positive, "# clinic praise\nsplendid\n").unwrap();
        std::fs::write(&stopwords, "visit\n").unwrap();

        let config = AnalysisConfig {
            positive_lexicon_path: Some(positive),
            stopwords_path: Some(stopwords),
            ..Default::default()
        };
        assert!(config.has_word_list_overrides());
        let analysis = config.build_analysis().unwrap();

        let corpus = crate::corpus::Corpus::from_texts(&["a splendid visit"]);
        assert_eq!(analysis.score_sentiment(&corpus)[0].positive, 1);
        let tokens = vec![vec!["splendid".to_string(), "visit".to_string()]];
        assert_eq!(analysis.filter(&tokens), vec![vec!["splendid".to_string()]]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_new_ignores_word_lists() {
        let config = AnalysisConfig {
            positive_lexicon_path: Some(PathBuf::from("/nonexistent/positive.txt")),
            ..Default::default()
        };
        let corpus = crate::corpus::Corpus::from_texts(&["a splendid visit, very helpful"]);
        let sentiments = Analysis::new(&config).score_sentiment(&corpus);
        assert_eq!(sentiments[0].positive_markers, vec!["helpful".to_string()]);
    }

    #[test]
    fn test_missing_word_list_is_error() {
        let config = AnalysisConfig {
            stopwords_path: Some(PathBuf::from("/nonexistent/canvass-stopwords.txt")),
            ..Default::default()
        };
        assert!(config.stopword_filter().is_err());
    }
}
