// K-means clustering (Lloyd's algorithm, k-means++ seeding).
//
// 1. Seed centroids with k-means++: first uniformly, the rest with
//    probability proportional to squared distance from the nearest seed
// 2. Assign each row to its nearest centroid (Euclidean, lowest index on ties)
// 3. Move each centroid to the mean of its rows; a centroid that lost all
//    its rows stays where it was
// 4. Repeat until no assignment changes or `max_iter` is reached
//
// The whole procedure runs `n_init` times from one seeded RNG and the run
// with the lowest inertia wins, so a fixed seed always gives the same result.

use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Warning};

/// Clusterer tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub n_clusters: usize,
    /// Lloyd iterations per run
    pub max_iter: usize,
    /// Independent restarts; the lowest-inertia run is kept
    pub n_init: usize,
    pub seed: u64,
    /// Weight of standardized attribute columns (0 = topics only)
    pub attribute_weight: f64,
    /// Strongest features reported per cluster
    pub top_features: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 4,
            max_iter: 300,
            n_init: 10,
            seed: 42,
            attribute_weight: 0.0,
            top_features: 3,
        }
    }
}

impl ClusterConfig {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            ..Default::default()
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject K outside `1..=n_docs`.
    pub fn validate(&self, n_docs: usize) -> Result<(), PipelineError> {
        if self.n_clusters == 0 {
            return Err(PipelineError::invalid("cluster count must be at least 1"));
        }
        if self.n_clusters > n_docs {
            return Err(PipelineError::invalid(format!(
                "cluster count {} exceeds document count {}",
                self.n_clusters, n_docs
            )));
        }
        Ok(())
    }
}

/// Output of a k-means fit.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Cluster id of every row
    pub labels: Vec<usize>,
    /// n_clusters x n_features
    pub centroids: Array2<f64>,
    /// Members per cluster; sums to the row count
    pub sizes: Vec<usize>,
    /// Sum of squared distances to assigned centroids
    pub inertia: f64,
    /// Lloyd iterations of the winning run
    pub iterations: usize,
    pub warnings: Vec<Warning>,
}

impl ClusterResult {
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Highest-weighted centroid features of `cluster`, ties by lower index.
    pub fn strongest_features(&self, cluster: usize, names: &[String], n: usize) -> Vec<(String, f64)> {
        if cluster >= self.n_clusters() {
            return Vec::new();
        }
        let centroid = self.centroids.row(cluster);
        let mut idx: Vec<usize> = (0..centroid.len()).collect();
        idx.sort_by(|&a, &b| {
            centroid[b]
                .partial_cmp(&centroid[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        idx.into_iter()
            .take(n)
            .map(|i| {
                let name = names.get(i).cloned().unwrap_or_else(|| format!("feature_{i}"));
                (name, centroid[i])
            })
            .collect()
    }
}

/// K-means clusterer.
#[derive(Debug, Clone)]
pub struct KMeans {
    config: ClusterConfig,
}

impl KMeans {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Partition the rows of `data` into `n_clusters` groups.
    pub fn fit(&self, data: &Array2<f64>) -> Result<ClusterResult, PipelineError> {
        let n = data.nrows();
        self.config.validate(n)?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<(Vec<usize>, Array2<f64>, f64, usize)> = None;

        for run in 0..self.config.n_init.max(1) {
            let seeds = self.plusplus_init(data, &mut rng);
            let (labels, centroids, iterations) = self.lloyd(data, seeds);
            let inertia = inertia(data, &centroids, &labels);
            debug!(run, inertia, iterations, "k-means run");

            let better = match &best {
                Some((_, _, best_inertia, _)) => inertia < *best_inertia,
                None => true,
            };
            if better {
                best = Some((labels, centroids, inertia, iterations));
            }
        }

        let (labels, centroids, inertia, iterations) =
            best.ok_or_else(|| PipelineError::invalid("k-means produced no run"))?;

        let mut sizes = vec![0usize; self.config.n_clusters];
        for &l in &labels {
            sizes[l] += 1;
        }

        let warnings: Vec<Warning> = sizes
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == 0)
            .map(|(cluster_id, _)| Warning::EmptyCluster { cluster_id })
            .collect();
        for w in &warnings {
            warn!(warning = %w, "Degenerate clustering");
        }

        info!(
            clusters = self.config.n_clusters,
            documents = n,
            inertia,
            iterations,
            "Fitted k-means"
        );

        Ok(ClusterResult {
            labels,
            centroids,
            sizes,
            inertia,
            iterations,
            warnings,
        })
    }

    /// k-means++ seeding.
    fn plusplus_init(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = data.nrows();
        let k = self.config.n_clusters;
        let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

        let first = rng.gen_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        let mut min_dist: Vec<f64> = data
            .axis_iter(Axis(0))
            .map(|row| squared_distance(row, centroids.row(0)))
            .collect();

        for c in 1..k {
            let total: f64 = min_dist.iter().sum();
            let chosen = if total > 0.0 {
                let threshold = rng.gen::<f64>() * total;
                let mut cumsum = 0.0;
                let mut pick = n - 1;
                for (i, d) in min_dist.iter().enumerate() {
                    cumsum += d;
                    if cumsum >= threshold && *d > 0.0 {
                        pick = i;
                        break;
                    }
                }
                pick
            } else {
                // Every row coincides with a seed already
                rng.gen_range(0..n)
            };

            centroids.row_mut(c).assign(&data.row(chosen));
            for (i, row) in data.axis_iter(Axis(0)).enumerate() {
                let d = squared_distance(row, centroids.row(c));
                if d < min_dist[i] {
                    min_dist[i] = d;
                }
            }
        }

        centroids
    }

    /// Lloyd iterations from the given seeds.
    fn lloyd(&self, data: &Array2<f64>, mut centroids: Array2<f64>) -> (Vec<usize>, Array2<f64>, usize) {
        let mut labels = assign(data, &centroids);
        let mut iterations = 0;

        for _ in 0..self.config.max_iter {
            iterations += 1;
            centroids = update_centroids(data, &labels, &centroids);
            let next = assign(data, &centroids);
            if next == labels {
                break;
            }
            labels = next;
        }

        (labels, centroids, iterations)
    }
}

/// Nearest centroid for every row; the lowest centroid index wins ties.
pub fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
                let d = squared_distance(row, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            best
        })
        .collect()
}

fn update_centroids(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];
    for (row, &l) in data.axis_iter(Axis(0)).zip(labels) {
        let mut target = sums.row_mut(l);
        target += &row;
        counts[l] += 1;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mut row = sums.row_mut(c);
            row /= count as f64;
        } else {
            sums.row_mut(c).assign(&previous.row(c));
        }
    }
    sums
}

fn inertia(data: &Array2<f64>, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    data.axis_iter(Axis(0))
        .zip(labels)
        .map(|(row, &l)| squared_distance(row, centroids.row(l)))
        .sum()
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
