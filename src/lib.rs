// Canvass: open-text survey analytics
//
// This is the library root. Each module corresponds to one stage (or one
// supporting concern) of the analysis pipeline.

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod text;
pub mod topics;

pub use error::{PipelineError, Warning};
pub use pipeline::{Analysis, AnalysisOutput};
