// Error taxonomy and non-fatal warnings for the analysis pipeline.
//
// Fatal conditions are `PipelineError` variants returned from the stage that
// hit them. Everything that lets the pipeline finish (a cluster that emptied
// out, a topic nobody talks about, a field missing from a few rows) is a
// `Warning` carried along to the final report instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a pipeline stage can return.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required field(s) absent from the input records.
    #[error("input is missing required field(s): {}", missing.join(", "))]
    InputShape { missing: Vec<String> },

    /// No document produced a single usable token, so there is nothing to fit.
    #[error("vocabulary is empty: no document has any token left after stopword filtering")]
    EmptyVocabulary,

    /// A tunable parameter is out of range for the corpus at hand.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An external collaborator (e.g. a segmentation engine) failed.
    /// The core never retries these.
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: String,
        reason: String,
    },
}

impl PipelineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// A non-fatal condition surfaced alongside the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A schema field was absent from some records; a default was used.
    MissingField { field: String, records: usize },
    /// A cluster ended the fit with no members.
    EmptyCluster { cluster_id: usize },
    /// A topic is the primary topic of (almost) no document.
    NegligibleTopic { topic_id: usize, prevalence: f64 },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingField { field, records } => {
                write!(f, "field '{field}' missing from {records} record(s); treated as empty")
            }
            Warning::EmptyCluster { cluster_id } => {
                write!(f, "cluster {cluster_id} has no members")
            }
            Warning::NegligibleTopic {
                topic_id,
                prevalence,
            } => write!(
                f,
                "topic {topic_id} is primary for only {:.1}% of documents",
                prevalence * 100.0
            ),
        }
    }
}
