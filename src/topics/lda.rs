// Latent Dirichlet Allocation, fitted by batch variational Bayes.
//
// Documents are mixtures of topics, topics are distributions over the
// vocabulary. Works directly on the real-valued TF-IDF matrix: each nonzero
// cell acts as a (fractional) word count.
//
// Per outer iteration:
//   E-step  for every document, iterate its variational topic proportions
//           `gamma` against the current expected log topic-word weights
//   M-step  lambda = eta + sufficient statistics gathered in the E-step
//
// Only the initial `lambda` is random, drawn from Gamma(100, 1/100) using the
// configured seed, so a fixed seed and input always give the same model.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::digamma;
use tracing::{debug, info};

use super::tfidf::{SparseVector, TermMatrix, Vocabulary};
use crate::error::PipelineError;

/// Outer iterations always run before the convergence check may stop the fit.
const MIN_ITERATIONS: usize = 10;

/// Topic model tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Number of topics to infer
    pub n_topics: usize,
    /// Outer EM iterations
    pub max_iter: usize,
    /// Inner iterations per document in the E-step
    pub doc_max_iter: usize,
    /// Mean absolute change below which an E-step (or the whole fit) stops early
    pub tolerance: f64,
    /// Document-topic prior; defaults to 1 / n_topics
    pub alpha: Option<f64>,
    /// Topic-word prior; defaults to 1 / n_topics
    pub eta: Option<f64>,
    /// Seed for the initial topic-word parameters
    pub seed: u64,
    /// Keywords reported per topic
    pub top_n: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            n_topics: 5,
            max_iter: 50,
            doc_max_iter: 100,
            tolerance: 1e-3,
            alpha: None,
            eta: None,
            seed: 42,
            top_n: 10,
        }
    }
}

impl TopicConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_iter(mut self, n: usize) -> Self {
        self.max_iter = n;
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Reject topic counts outside `1..=vocabulary_size` and non-positive priors.
    pub fn validate(&self, vocabulary_size: usize) -> Result<(), PipelineError> {
        if self.n_topics == 0 {
            return Err(PipelineError::invalid("topic count must be at least 1"));
        }
        if vocabulary_size > 0 && self.n_topics > vocabulary_size {
            return Err(PipelineError::invalid(format!(
                "topic count {} exceeds vocabulary size {}",
                self.n_topics, vocabulary_size
            )));
        }
        for (name, prior) in [("alpha", self.alpha), ("eta", self.eta)] {
            if matches!(prior, Some(p) if p <= 0.0) {
                return Err(PipelineError::invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Per-document topic proportions produced by the model.
#[derive(Debug, Clone)]
pub struct DocumentTopics {
    /// n_docs x n_topics, every row non-negative and summing to 1
    pub weights: Array2<f64>,
}

impl DocumentTopics {
    pub fn n_docs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_topics(&self) -> usize {
        self.weights.ncols()
    }

    pub fn row(&self, doc: usize) -> Vec<f64> {
        self.weights.row(doc).to_vec()
    }

    /// Argmax topic of every document (lowest index wins ties).
    pub fn primary_topics(&self) -> Vec<usize> {
        self.weights
            .axis_iter(Axis(0))
            .map(|row| primary_topic(&row.to_vec()))
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.weights.axis_iter(Axis(0)).map(|r| r.to_vec()).collect()
    }
}

/// A single topic keyword with its normalized weight in the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicKeyword {
    pub term: String,
    pub weight: f64,
}

/// A fitted LDA model. The topic-word parameters are frozen after `fit`.
#[derive(Debug, Clone)]
pub struct TopicModel {
    /// Variational topic-word parameters, n_topics x n_features
    lambda: Array2<f64>,
    /// exp(E[log beta]), cached from the final lambda
    exp_elog_beta: Array2<f64>,
    terms: Vec<String>,
    alpha: f64,
    doc_max_iter: usize,
    tolerance: f64,
}

impl TopicModel {
    /// Fit `config.n_topics` topics to the document-term matrix and return the
    /// model together with every document's topic proportions.
    pub fn fit(
        matrix: &TermMatrix,
        vocabulary: &Vocabulary,
        config: &TopicConfig,
    ) -> Result<(Self, DocumentTopics), PipelineError> {
        if matrix.n_features == 0 || vocabulary.is_empty() {
            return Err(PipelineError::EmptyVocabulary);
        }
        config.validate(vocabulary.len())?;

        let n_topics = config.n_topics;
        let n_features = matrix.n_features;
        let alpha = config.alpha.unwrap_or(1.0 / n_topics as f64);
        let eta = config.eta.unwrap_or(1.0 / n_topics as f64);

        let mut rng = StdRng::seed_from_u64(config.seed);
        let init = Gamma::new(100.0, 0.01)
            .map_err(|e| PipelineError::invalid(format!("gamma prior: {e}")))?;
        let lambda = Array2::from_shape_simple_fn((n_topics, n_features), || init.sample(&mut rng));

        let mut model = Self {
            exp_elog_beta: exp_dirichlet_expectation(&lambda),
            lambda,
            terms: vocabulary.terms().to_vec(),
            alpha,
            doc_max_iter: config.doc_max_iter,
            tolerance: config.tolerance,
        };

        let mut previous: Option<Array2<f64>> = None;
        let mut iterations = 0;

        for iter in 0..config.max_iter {
            iterations = iter + 1;

            let mut sstats = Array2::<f64>::zeros((n_topics, n_features));
            let mut theta = Array2::<f64>::zeros((matrix.n_docs(), n_topics));
            for (d, row) in matrix.rows.iter().enumerate() {
                let gamma = model.infer_document(row, Some(&mut sstats));
                theta.row_mut(d).assign(&normalize(&gamma));
            }

            // M-step
            model.lambda = &sstats * &model.exp_elog_beta + eta;
            model.exp_elog_beta = exp_dirichlet_expectation(&model.lambda);

            if let Some(prev) = &previous {
                let change = (&theta - prev).mapv(f64::abs).mean().unwrap_or(0.0);
                debug!(iteration = iterations, mean_change = change, "LDA iteration");
                if iterations >= MIN_ITERATIONS && change < config.tolerance {
                    break;
                }
            }
            previous = Some(theta);
        }

        let doc_topics = model.transform(matrix);

        info!(
            topics = n_topics,
            documents = matrix.n_docs(),
            vocabulary = n_features,
            iterations,
            "Fitted topic model"
        );

        Ok((model, doc_topics))
    }

    /// Topic proportions for documents against the frozen model. Documents
    /// with no in-vocabulary terms get the uniform distribution.
    pub fn transform(&self, matrix: &TermMatrix) -> DocumentTopics {
        let n_topics = self.n_topics();
        let mut weights = Array2::<f64>::zeros((matrix.n_docs(), n_topics));
        for (d, row) in matrix.rows.iter().enumerate() {
            let gamma = self.infer_document(row, None);
            weights.row_mut(d).assign(&normalize(&gamma));
        }
        DocumentTopics { weights }
    }

    /// Variational E-step for one document. Returns its `gamma` and, when
    /// given a sufficient-statistics buffer, accumulates into it.
    fn infer_document(&self, row: &SparseVector, sstats: Option<&mut Array2<f64>>) -> Array1<f64> {
        let n_topics = self.n_topics();
        let entries: Vec<(usize, f64)> = row
            .entries
            .iter()
            .copied()
            .filter(|(id, w)| *w > 0.0 && *id < self.lambda.ncols())
            .collect();

        if entries.is_empty() {
            return Array1::from_elem(n_topics, self.alpha);
        }

        let mut gamma = Array1::<f64>::ones(n_topics);
        let mut exp_elog_theta = exp_dirichlet_expectation_1d(gamma.view());
        let mut phinorm = self.phinorm(&entries, &exp_elog_theta);

        for _ in 0..self.doc_max_iter {
            let last = gamma.clone();

            for k in 0..n_topics {
                let dot: f64 = entries
                    .iter()
                    .zip(&phinorm)
                    .map(|((id, cnt), norm)| cnt / norm * self.exp_elog_beta[[k, *id]])
                    .sum();
                gamma[k] = self.alpha + exp_elog_theta[k] * dot;
            }

            exp_elog_theta = exp_dirichlet_expectation_1d(gamma.view());
            phinorm = self.phinorm(&entries, &exp_elog_theta);

            let change = (&gamma - &last).mapv(f64::abs).mean().unwrap_or(0.0);
            if change < self.tolerance {
                break;
            }
        }

        if let Some(sstats) = sstats {
            for ((id, cnt), norm) in entries.iter().zip(&phinorm) {
                for k in 0..n_topics {
                    sstats[[k, *id]] += exp_elog_theta[k] * cnt / norm;
                }
            }
        }

        gamma
    }

    fn phinorm(&self, entries: &[(usize, f64)], exp_elog_theta: &Array1<f64>) -> Vec<f64> {
        entries
            .iter()
            .map(|(id, _)| {
                exp_elog_theta
                    .iter()
                    .enumerate()
                    .map(|(k, t)| t * self.exp_elog_beta[[k, *id]])
                    .sum::<f64>()
                    + 1e-100
            })
            .collect()
    }

    pub fn n_topics(&self) -> usize {
        self.lambda.nrows()
    }

    /// Topic-word distributions: each row of lambda normalized to sum to 1.
    pub fn topic_word_distribution(&self) -> Array2<f64> {
        let mut dist = self.lambda.clone();
        for mut row in dist.axis_iter_mut(Axis(0)) {
            let sum = row.sum();
            if sum > 0.0 {
                row /= sum;
            }
        }
        dist
    }

    /// Top `n` keywords of `topic`: weight descending, ties by ascending
    /// feature id.
    pub fn top_keywords(&self, topic: usize, n: usize) -> Vec<TopicKeyword> {
        if topic >= self.n_topics() {
            return Vec::new();
        }
        let row = self.lambda.row(topic);
        let sum = row.sum();

        let mut ids: Vec<usize> = (0..row.len()).collect();
        ids.sort_by(|&a, &b| {
            row[b]
                .partial_cmp(&row[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        ids.into_iter()
            .take(n)
            .map(|id| TopicKeyword {
                term: self.terms[id].clone(),
                weight: if sum > 0.0 { row[id] / sum } else { 0.0 },
            })
            .collect()
    }
}

/// Index of the largest weight; the first (lowest) index wins ties.
pub fn primary_topic(weights: &[f64]) -> usize {
    let mut best = 0;
    for (i, w) in weights.iter().enumerate() {
        if *w > weights[best] {
            best = i;
        }
    }
    best
}

fn normalize(v: &Array1<f64>) -> Array1<f64> {
    let sum = v.sum();
    if sum > 0.0 {
        v / sum
    } else {
        Array1::from_elem(v.len(), 1.0 / v.len() as f64)
    }
}

/// exp(E[log X]) for X ~ Dirichlet(row), applied row by row.
fn exp_dirichlet_expectation(params: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(params.raw_dim());
    for (i, row) in params.axis_iter(Axis(0)).enumerate() {
        out.row_mut(i).assign(&exp_dirichlet_expectation_1d(row));
    }
    out
}

fn exp_dirichlet_expectation_1d(params: ArrayView1<f64>) -> Array1<f64> {
    let psi_total = digamma(params.sum());
    params.mapv(|p| (digamma(p) - psi_total).exp())
}
