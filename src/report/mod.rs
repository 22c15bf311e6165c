// Report synthesis and output: summary records, column-major export and
// terminal display.

pub mod export;
pub mod summary;
pub mod terminal;

pub use export::CorpusTable;
pub use summary::{
    AnalysisReport, ClusterSummary, ReportInputs, ReportSynthesizer, RunSettings, TopicSummary,
    NEGLIGIBLE_PREVALENCE,
};
