// Segmenter trait: the seam for external word-boundary detection.
//
// Languages written without spaces need a morphological segmentation engine.
// The pipeline only sees this trait, so an engine-backed implementation can
// replace the built-in regex fallback without touching any stage.

use crate::error::PipelineError;

/// Splits one text into surface-form tokens.
///
/// Implementations must be idempotent and free of side effects visible to
/// the pipeline. A failing engine reports `PipelineError::CollaboratorUnavailable`;
/// the pipeline does not retry.
pub trait Segmenter: Send + Sync {
    /// Segment a single text. Never called with blank input.
    fn segment(&self, text: &str) -> Result<Vec<String>, PipelineError>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "segmenter"
    }
}
