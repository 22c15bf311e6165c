// Respondent clustering: feature construction and k-means.
//
// The feature space is each document's topic-weight vector, optionally
// fused with standardized numeric attributes so that respondents who talk
// about the same things *and* look alike demographically land together.

pub mod features;
pub mod kmeans;

pub use features::ClusterFeatures;
pub use kmeans::{ClusterConfig, ClusterResult, KMeans};
